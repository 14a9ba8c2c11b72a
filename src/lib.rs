#![doc = include_str!("../README.md")]

pub mod config;
pub mod data;
pub mod dataset;
pub mod fields;
pub mod hierarchy;
pub mod inifile;
pub mod io;
pub mod mesh;
pub mod parse;
pub mod prelude;
#[doc(hidden)]
pub mod testing;
mod traits;
mod utils;

pub use config::{CodeUnits, DatasetConfig};
pub use data::{DataType, FieldArray, FieldProperties, FieldPropertiesMap, Metadata, MetadataValue};
pub use dataset::{IdefixDataset, IdefixVersion};
pub use hierarchy::{IdefixGrid, IdefixHierarchy};
pub use inifile::{IdefixInifile, InifileError};
pub use io::IoHandler;
pub use mesh::{Domain, Geometry};
pub use parse::{FieldOffsetIndex, FileFormat, FileRecords, ParseError};

pub use traits::{FromBuffer, GridIndex};

pub use ndarray;

/// general purpose error enumeration for possible causes of failure.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("An io error occured: `{0}`")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Parse(#[from] parse::ParseError),
    #[error("Could not read the ini file: {0}")]
    Inifile(#[from] inifile::InifileError),
    #[error("{0}")]
    UnknownGeometry(#[from] mesh::UnknownGeometry),
    #[error("`{}` is not an Idefix dmp or vtk file", .0.display())]
    UnknownFormat(std::path::PathBuf),
    #[error("required record `{0}` is missing from the file")]
    MissingMetadata(String),
    #[error("no field `{0}` in the file")]
    UnknownField(String),
    #[error("field `{field}` has shape {actual:?} but the domain has {expected:?} cells")]
    FieldShape {
        field: String,
        expected: [usize; 3],
        actual: [usize; 3],
    },
    #[error("buffer holds {actual} values but the field has {expected}")]
    BufferLength { expected: usize, actual: usize },
    #[error("unknown code unit `{0}`")]
    UnknownUnit(String),
    #[error("{0}")]
    Unsupported(&'static str),
}
