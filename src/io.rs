//! # Reading field data
//!
//! [`IoHandler`] streams fields out of the file of a dataset using the offsets
//! recorded by its [`IdefixHierarchy`]. Every read opens the file once and
//! seeks to the recorded offsets, so fields can be requested in any order.
//!
//! Idefix outputs carry no particles and every particle read fails with
//! [`Error::Unsupported`].

use crate::data::FieldArray;
use crate::prelude::*;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;

const PARTICLES_UNSUPPORTED: &str = "Particles are not currently supported for Idefix";
const CHUNKS_UNSUPPORTED: &str = "Chunk data reads are not implemented for Idefix";

/// `(fluid type, field name)`
pub type FieldKey = (String, String);

/// particle positions of one particle type
pub type ParticleCoords = (String, [Vec<f64>; 3]);

#[derive(Debug, Clone, Copy)]
pub struct IoHandler<'h> {
    index: &'h IdefixHierarchy<'h>,
}

impl<'h> IoHandler<'h> {
    pub fn new(index: &'h IdefixHierarchy<'h>) -> Self {
        Self { index }
    }

    fn open(&self) -> Result<BufReader<File>, Error> {
        let file = File::open(self.index.dataset().path())?;
        Ok(BufReader::new(file))
    }

    fn read_field<R: Read + Seek>(
        &self,
        reader: &mut R,
        grid: &IdefixGrid,
        name: &str,
    ) -> Result<FieldArray, Error> {
        let offset = self.index.field_offset(name)?;
        let format = self.index.dataset().format();
        tracing::debug!(field = name, offset, grid = %grid, "reading field");
        Ok(format.read_single_field(reader, offset, grid.dims)?)
    }

    /// read every requested field of every grid
    ///
    /// The values of each field are widened to `f64` and concatenated over the
    /// grids, x1 fastest. Fields that are not in the field list of the index
    /// are an [`Error::UnknownField`].
    pub fn read_fluid_selection(
        &self,
        fields: &[FieldKey],
    ) -> Result<BTreeMap<FieldKey, Vec<f64>>, Error> {
        let mut reader = self.open()?;
        let mut data = BTreeMap::new();

        for (ftype, fname) in fields {
            if !self.index.has_field(ftype, fname) {
                return Err(Error::UnknownField(format!("({ftype}, {fname})")));
            }

            let mut values = Vec::new();
            for grid in self.index.grids() {
                self.read_field(&mut reader, grid, fname)?
                    .extend_column_major(&mut values);
            }
            data.insert((ftype.clone(), fname.clone()), values);
        }

        Ok(data)
    }

    /// one field of one grid, widened to `f64`
    pub fn read_grid_field(&self, grid: &IdefixGrid, name: &str) -> Result<Array3<f64>, Error> {
        let mut reader = self.open()?;
        Ok(self.read_field(&mut reader, grid, name)?.into_f64())
    }

    /// one field of one grid, in the precision it is stored with
    pub fn read_grid_field_native(&self, grid: &IdefixGrid, name: &str) -> Result<FieldArray, Error> {
        let mut reader = self.open()?;
        self.read_field(&mut reader, grid, name)
    }

    /// stream one field of one grid into `out`, x1 fastest.
    ///
    /// `out` must hold exactly as many values as the field.
    pub fn read_field_into(
        &self,
        grid: &IdefixGrid,
        name: &str,
        out: &mut [f64],
    ) -> Result<(), Error> {
        let mut reader = self.open()?;
        let field = self.read_field(&mut reader, grid, name)?;

        let mut values = Vec::with_capacity(out.len());
        field.extend_column_major(&mut values);

        if values.len() != out.len() {
            return Err(Error::BufferLength {
                expected: values.len(),
                actual: out.len(),
            });
        }

        out.copy_from_slice(&values);
        Ok(())
    }

    pub fn read_particle_coords(&self, _ptypes: &[&str]) -> Result<Vec<ParticleCoords>, Error> {
        Err(Error::Unsupported(PARTICLES_UNSUPPORTED))
    }

    pub fn read_particle_fields(
        &self,
        _ptf: &BTreeMap<String, Vec<String>>,
    ) -> Result<BTreeMap<FieldKey, Vec<f64>>, Error> {
        Err(Error::Unsupported(PARTICLES_UNSUPPORTED))
    }

    pub fn read_chunk_data(
        &self,
        _grids: &[IdefixGrid],
        _fields: &[FieldKey],
    ) -> Result<BTreeMap<FieldKey, Vec<f64>>, Error> {
        Err(Error::Unsupported(CHUNKS_UNSUPPORTED))
    }
}
