//! # Domain information
//!
//! Idefix runs on a single uniform block per direction. The [`Domain`] of a
//! dataset is derived from the coordinate records of the file: the extent of
//! the `x1`, `x2`, `x3` records gives the number of cells in each direction
//! and the first / last entries of the `xl*` / `xr*` edge arrays give the
//! domain edges.

use crate::data::{FieldPropertiesMap, Metadata};
use crate::prelude::*;

use std::convert::TryFrom;

const AXES: [&str; 3] = ["x1", "x2", "x3"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
/// Coordinate system of a run
pub enum Geometry {
    #[display(fmt = "cartesian")]
    Cartesian,
    #[display(fmt = "cylindrical")]
    Cylindrical,
    #[display(fmt = "polar")]
    Polar,
    #[display(fmt = "spherical")]
    Spherical,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown geometry code {0}, expected one of 1 (cartesian), 2 (cylindrical), 3 (polar), 4 (spherical)")]
pub struct UnknownGeometry(pub i64);

impl TryFrom<i64> for Geometry {
    type Error = UnknownGeometry;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Cartesian),
            2 => Ok(Self::Cylindrical),
            3 => Ok(Self::Polar),
            4 => Ok(Self::Spherical),
            other => Err(UnknownGeometry(other)),
        }
    }
}

/// the number of directions with more than one cell
pub fn dimensionality(domain_dimensions: &[usize; 3]) -> usize {
    domain_dimensions.iter().filter(|n| **n > 1).count()
}

#[derive(Debug, Clone, PartialEq)]
/// Extent, resolution, and boundary information of the whole computational domain
pub struct Domain {
    pub left_edge: [f64; 3],
    pub right_edge: [f64; 3],
    pub dimensions: [usize; 3],
    pub dimensionality: usize,
    pub periodicity: [bool; 3],
    pub geometry: Geometry,
}

impl Domain {
    /// derive the domain from the records of a file
    ///
    /// Only the first left edge and the last right edge of every direction are
    /// read. Files with several blocks per direction therefore still produce
    /// the correct outer edges, but the blocks are treated as one uniform block.
    pub fn from_records(fprops: &FieldPropertiesMap, fdata: &Metadata) -> Result<Self, Error> {
        let mut dimensions = [1; 3];
        let mut left_edge = [0.0; 3];
        let mut right_edge = [0.0; 3];

        for (idx, axis) in AXES.iter().enumerate() {
            let props = fprops
                .get(axis)
                .ok_or_else(|| Error::MissingMetadata(axis.to_string()))?;
            dimensions[idx] = props.last_extent();

            let dir = idx + 1;
            left_edge[idx] = fdata.f64_array(&format!("xl{dir}"))?[0];
            right_edge[idx] = *fdata
                .f64_array(&format!("xr{dir}"))?
                .last()
                .ok_or_else(|| Error::MissingMetadata(format!("xr{dir}")))?;
        }

        let mut periodicity = [false; 3];
        for (slot, flag) in periodicity.iter_mut().zip(fdata.i64_array("periodicity")?) {
            *slot = flag != 0;
        }

        let geometry = Geometry::try_from(fdata.i64_scalar("geometry")?)?;

        Ok(Self {
            left_edge,
            right_edge,
            dimensionality: dimensionality(&dimensions),
            dimensions,
            periodicity,
            geometry,
        })
    }

    /// width of one cell in every direction
    pub fn cell_widths(&self) -> [f64; 3] {
        let mut dx = [0.0; 3];
        for idx in 0..3 {
            dx[idx] = (self.right_edge[idx] - self.left_edge[idx]) / self.dimensions[idx] as f64;
        }
        dx
    }
}
