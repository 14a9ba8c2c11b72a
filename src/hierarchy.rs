//! The grid index of a dataset
//!
//! Idefix does not refine, so the index always holds a single grid covering
//! the whole domain. Building the index also records the byte offset of every
//! field in the file so that fields can later be streamed in any order.

use crate::parse::FieldOffsetIndex;
use crate::prelude::*;

use std::fmt;
use std::fs::File;
use std::io::BufReader;

#[derive(Debug, Clone, PartialEq)]
pub struct IdefixGrid {
    pub id: usize,
    pub level: usize,
    pub dims: [usize; 3],
    pub left_edge: [f64; 3],
    pub right_edge: [f64; 3],
    /// cell width in every direction
    pub dx: [f64; 3],
    pub particle_count: usize,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

impl IdefixGrid {
    pub fn cell_count(&self) -> usize {
        self.dims.iter().product()
    }
}

impl fmt::Display for IdefixGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdefixGrid_{:04} ({:?})", self.id, self.dims)
    }
}

/// Single grid index over a dataset
///
/// Borrows the dataset it was built from, and therefore cannot outlive it.
#[derive(Debug)]
pub struct IdefixHierarchy<'ds> {
    dataset: &'ds IdefixDataset,
    field_list: Vec<(String, String)>,
    num_grids: usize,
    grid_left_edge: Vec<[f64; 3]>,
    grid_right_edge: Vec<[f64; 3]>,
    grid_dimensions: Vec<[usize; 3]>,
    grid_levels: Vec<usize>,
    grid_particle_count: Vec<usize>,
    max_level: usize,
    field_offsets: FieldOffsetIndex,
    grids: Vec<IdefixGrid>,
}

impl<'ds> IdefixHierarchy<'ds> {
    /// an empty index, [`GridIndex::setup`] fills it in
    pub fn new(dataset: &'ds IdefixDataset) -> Self {
        Self {
            dataset,
            field_list: Vec::new(),
            num_grids: 0,
            grid_left_edge: Vec::new(),
            grid_right_edge: Vec::new(),
            grid_dimensions: Vec::new(),
            grid_levels: Vec::new(),
            grid_particle_count: Vec::new(),
            max_level: 0,
            field_offsets: FieldOffsetIndex::default(),
            grids: Vec::new(),
        }
    }

    /// create the index and run every setup step
    pub fn build(dataset: &'ds IdefixDataset) -> Result<Self, Error> {
        let mut index = Self::new(dataset);
        index.setup()?;
        Ok(index)
    }

    pub fn dataset(&self) -> &'ds IdefixDataset {
        self.dataset
    }

    pub fn dataset_type(&self) -> &'static str {
        self.dataset.dataset_type()
    }

    /// `(fluid type, field name)` of every field that can be read
    pub fn field_list(&self) -> &[(String, String)] {
        &self.field_list
    }

    pub fn num_grids(&self) -> usize {
        self.num_grids
    }

    pub fn max_level(&self) -> usize {
        self.max_level
    }

    pub fn grids(&self) -> &[IdefixGrid] {
        &self.grids
    }

    pub fn grid_particle_count(&self) -> &[usize] {
        &self.grid_particle_count
    }

    pub fn field_offsets(&self) -> &FieldOffsetIndex {
        &self.field_offsets
    }

    /// byte offset of `field` in the file
    pub fn field_offset(&self, field: &str) -> Result<u64, Error> {
        self.field_offsets
            .get(field)
            .copied()
            .ok_or_else(|| Error::UnknownField(field.to_string()))
    }

    /// whether `(ftype, fname)` is one of the fields in [`Self::field_list`]
    pub fn has_field(&self, ftype: &str, fname: &str) -> bool {
        self.field_list
            .iter()
            .any(|(t, n)| t == ftype && n == fname)
    }
}

impl<'ds> GridIndex for IdefixHierarchy<'ds> {
    fn detect_output_fields(&mut self) {
        let ftype = self.dataset_type().to_string();
        self.field_list = self
            .dataset
            .detected_fields()
            .iter()
            .map(|name| (ftype.clone(), name.clone()))
            .collect();
    }

    fn count_grids(&mut self) {
        self.num_grids = 1;
    }

    fn parse_index(&mut self) -> Result<(), Error> {
        let ds = self.dataset;
        let domain = ds.domain();

        self.grid_left_edge = vec![domain.left_edge; self.num_grids];
        self.grid_right_edge = vec![domain.right_edge; self.num_grids];
        self.grid_dimensions = vec![domain.dimensions; self.num_grids];
        self.grid_particle_count = vec![0; self.num_grids];
        self.grid_levels = vec![1; self.num_grids];
        self.max_level = 1;

        let file = File::open(ds.path())?;
        let mut reader = BufReader::new(file);
        self.field_offsets = ds.format().field_offset_index(&mut reader)?;
        tracing::debug!(fields = self.field_offsets.len(), "built field offset index");

        Ok(())
    }

    fn populate_grid_objects(&mut self) {
        self.grids = (0..self.num_grids)
            .map(|id| {
                let left_edge = self.grid_left_edge[id];
                let right_edge = self.grid_right_edge[id];
                let dims = self.grid_dimensions[id];

                let mut dx = [0.0; 3];
                for axis in 0..3 {
                    dx[axis] = (right_edge[axis] - left_edge[axis]) / dims[axis] as f64;
                }

                IdefixGrid {
                    id,
                    level: self.grid_levels[id],
                    dims,
                    left_edge,
                    right_edge,
                    dx,
                    particle_count: self.grid_particle_count[id],
                    parent: None,
                    children: Vec::new(),
                }
            })
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatasetConfig;
    use crate::dataset::tests::sample_dump;
    use crate::parse::vtk::tests::rectilinear_sample;

    use std::fs;

    #[test]
    fn single_grid_over_the_domain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.0010.dmp");
        fs::write(&path, sample_dump("Idefix v1.1.0 Dump Data")).unwrap();

        let ds = IdefixDataset::load(&path, DatasetConfig::default()).unwrap();
        let index = ds.index().unwrap();

        assert_eq!(index.num_grids(), 1);
        assert_eq!(index.max_level(), 1);
        assert_eq!(index.grid_particle_count(), [0]);

        let grid = &index.grids()[0];
        assert_eq!(grid.id, 0);
        assert_eq!(grid.level, 1);
        assert_eq!(grid.parent, None);
        assert!(grid.children.is_empty());
        assert_eq!(grid.dims, ds.domain_dimensions());
        assert_eq!(grid.left_edge, ds.domain_left_edge());
        assert_eq!(grid.right_edge, ds.domain_right_edge());
        assert_eq!(grid.dx, [0.25, 1.0, 1.0]);
        assert_eq!(grid.cell_count(), 8);
    }

    #[test]
    fn field_list_and_offsets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.0011.dmp");
        fs::write(&path, sample_dump("Idefix v1.1.0 Dump Data")).unwrap();

        let ds = IdefixDataset::load(&path, DatasetConfig::default()).unwrap();
        let index = ds.index().unwrap();

        let names: Vec<_> = index.field_list().iter().map(|(_, n)| n.as_str()).collect();
        assert_eq!(names, ["Vc-RHO", "Vc-VX2", "Vs-BX1s"]);
        assert!(index.field_list().iter().all(|(t, _)| t == "idefix"));
        assert!(index.has_field("idefix", "Vc-RHO"));
        assert!(!index.has_field("gas", "Vc-RHO"));

        for (_, name) in index.field_list() {
            assert!(index.field_offset(name).is_ok());
        }
        assert!(matches!(
            index.field_offset("Vc-MISSING"),
            Err(Error::UnknownField(name)) if name == "Vc-MISSING"
        ));

        // rebuilding gives the same offsets
        let again = ds.index().unwrap();
        assert_eq!(index.field_offsets(), again.field_offsets());
    }

    #[test]
    fn grid_display() {
        let grid = IdefixGrid {
            id: 0,
            level: 1,
            dims: [64, 64, 1],
            left_edge: [0.0; 3],
            right_edge: [1.0; 3],
            dx: [1.0 / 64.0, 1.0 / 64.0, 1.0],
            particle_count: 0,
            parent: None,
            children: Vec::new(),
        };
        assert_eq!(grid.to_string(), "IdefixGrid_0000 ([64, 64, 1])");
    }

    #[test]
    fn vtk_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.0003.vtk");
        fs::write(&path, rectilinear_sample()).unwrap();

        let ds = IdefixDataset::load(&path, DatasetConfig::default()).unwrap();
        let index = ds.index().unwrap();

        assert_eq!(index.grids()[0].dims, [4, 2, 1]);
        assert_eq!(index.field_offsets().keys().collect::<Vec<_>>(), ["Vc-PRS", "Vc-RHO"]);
    }
}
