//! typed records read from the binary files
//!
//! Both file formats are reduced to the same two containers: a
//! [`FieldPropertiesMap`] describing the shape and type of every record in
//! the file, and a [`Metadata`] map holding the (small) values of every record
//! that is not bulk field data.

use crate::parse::error;
use crate::prelude::*;
use crate::utils;

use ndarray::ShapeBuilder;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// On-disk element type of a record
pub enum DataType {
    Double,
    Single,
    Integer,
    Bool,
}

impl DataType {
    /// size in bytes of one element
    pub fn size(&self) -> usize {
        match self {
            Self::Double => 8,
            Self::Single | Self::Integer => 4,
            Self::Bool => 1,
        }
    }

    /// decode the type code stored in a dmp record
    pub(crate) fn from_code(field: &str, code: i32) -> Result<Self, error::Record> {
        match code {
            0 => Ok(Self::Double),
            1 => Ok(Self::Single),
            2 => Ok(Self::Integer),
            3 => Ok(Self::Bool),
            _ => Err(error::UnknownDataType::new(field.into(), code).into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Constructor)]
/// Type and shape of a single record in a file
pub struct FieldProperties {
    pub dtype: DataType,
    pub ndim: usize,
    pub dims: Vec<usize>,
}

impl FieldProperties {
    /// total number of elements in the record, `None` if the shape overflows
    pub fn count(&self) -> Option<usize> {
        utils::checked_product(&self.dims)
    }

    /// number of payload bytes that follow the record header, `None` if the
    /// shape overflows
    pub fn payload_bytes(&self) -> Option<usize> {
        self.count()?.checked_mul(self.dtype.size())
    }

    /// records holding exactly one value
    pub fn is_scalar(&self) -> bool {
        self.ndim == 1 && self.dims == [1]
    }

    /// the last extent of the shape, the value the dataset uses to size the domain
    pub fn last_extent(&self) -> usize {
        self.dims.last().copied().unwrap_or(1)
    }

    /// shape padded (or truncated) to three axes
    pub(crate) fn dims3(&self) -> [usize; 3] {
        let mut out = [1; 3];
        for (slot, dim) in out.iter_mut().zip(self.dims.iter()) {
            *slot = *dim;
        }
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deref)]
/// Field name to [`FieldProperties`], in the order the fields appear in the file
pub struct FieldPropertiesMap(Vec<(String, FieldProperties)>);

impl FieldPropertiesMap {
    pub(crate) fn push(&mut self, name: String, props: FieldProperties) {
        self.0.push((name, props));
    }

    pub fn get(&self, name: &str) -> Option<&FieldProperties> {
        self.0
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, props)| props)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
/// The values of a non-bulk record. Scalars are stored as length one vectors.
pub enum MetadataValue {
    Double(Vec<f64>),
    Single(Vec<f32>),
    Integer(Vec<i32>),
    Bool(Vec<bool>),
}

impl MetadataValue {
    pub fn len(&self) -> usize {
        match self {
            Self::Double(x) => x.len(),
            Self::Single(x) => x.len(),
            Self::Integer(x) => x.len(),
            Self::Bool(x) => x.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// widen every element to `f64`
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self {
            Self::Double(x) => x.clone(),
            Self::Single(x) => x.iter().map(|v| *v as f64).collect(),
            Self::Integer(x) => x.iter().map(|v| *v as f64).collect(),
            Self::Bool(x) => x.iter().map(|v| if *v { 1.0 } else { 0.0 }).collect(),
        }
    }

    /// integer view of every element. Floating point values are truncated.
    pub fn to_i64_vec(&self) -> Vec<i64> {
        match self {
            Self::Double(x) => x.iter().map(|v| *v as i64).collect(),
            Self::Single(x) => x.iter().map(|v| *v as i64).collect(),
            Self::Integer(x) => x.iter().map(|v| *v as i64).collect(),
            Self::Bool(x) => x.iter().map(|v| *v as i64).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deref, DerefMut)]
/// Field name to value for every record that is not bulk field data
pub struct Metadata(BTreeMap<String, MetadataValue>);

impl Metadata {
    fn value(&self, key: &str) -> Result<&MetadataValue, Error> {
        self.0
            .get(key)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| Error::MissingMetadata(key.to_string()))
    }

    /// every element of the record widened to `f64`
    pub fn f64_array(&self, key: &str) -> Result<Vec<f64>, Error> {
        Ok(self.value(key)?.to_f64_vec())
    }

    /// the first element of the record as `f64`
    pub fn f64_scalar(&self, key: &str) -> Result<f64, Error> {
        Ok(self.value(key)?.to_f64_vec()[0])
    }

    /// every element of the record as an integer
    pub fn i64_array(&self, key: &str) -> Result<Vec<i64>, Error> {
        Ok(self.value(key)?.to_i64_vec())
    }

    /// the first element of the record as an integer
    pub fn i64_scalar(&self, key: &str) -> Result<i64, Error> {
        Ok(self.value(key)?.to_i64_vec()[0])
    }
}

#[derive(Debug, Clone, PartialEq)]
/// One field streamed out of a file, in the precision it was stored with
///
/// Index `[i, j, k]` addresses the `x1`, `x2`, `x3` directions.
pub enum FieldArray {
    Double(Array3<f64>),
    Single(Array3<f32>),
}

impl FieldArray {
    pub fn dims(&self) -> [usize; 3] {
        let shape = match self {
            Self::Double(arr) => arr.shape(),
            Self::Single(arr) => arr.shape(),
        };
        [shape[0], shape[1], shape[2]]
    }

    pub fn dtype(&self) -> DataType {
        match self {
            Self::Double(_) => DataType::Double,
            Self::Single(_) => DataType::Single,
        }
    }

    /// widen to double precision
    pub fn into_f64(self) -> Array3<f64> {
        match self {
            Self::Double(arr) => arr,
            Self::Single(arr) => arr.mapv(|v| v as f64),
        }
    }

    /// append the values to `out` in column-major (x1 fastest) order
    pub fn extend_column_major(&self, out: &mut Vec<f64>) {
        match self {
            Self::Double(arr) => out.extend(arr.t().iter().copied()),
            Self::Single(arr) => out.extend(arr.t().iter().map(|v| *v as f64)),
        }
    }
}

impl<T> FromBuffer<T> for Array3<T> {
    fn from_buffer(buffer: Vec<T>, dims: [usize; 3]) -> Result<Self, error::PayloadLength> {
        let expected = utils::checked_product(&dims).unwrap_or(usize::MAX);
        if buffer.len() != expected {
            return Err(error::PayloadLength::new(expected, buffer.len()));
        }

        // the files are written x1 fastest
        let shape = (dims[0], dims[1], dims[2]).f();
        Array3::from_shape_vec(shape, buffer)
            .map_err(|_| error::PayloadLength::new(expected, expected))
    }
}

impl<T> FromBuffer<T> for Vec<T> {
    fn from_buffer(buffer: Vec<T>, dims: [usize; 3]) -> Result<Self, error::PayloadLength> {
        let expected = utils::checked_product(&dims).unwrap_or(usize::MAX);
        if buffer.len() != expected {
            return Err(error::PayloadLength::new(expected, buffer.len()));
        }
        Ok(buffer)
    }
}
