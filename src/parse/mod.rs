//! reading and parsing Idefix output files
//!
//! Both supported formats expose the same operations: reading the text header,
//! reading every record apart from the bulk field data, building a
//! [`FieldOffsetIndex`], and streaming a single field back out of the file.
//! [`FileFormat`] selects between the two implementations.

pub mod dmp;
pub mod error;
pub mod vtk;

pub use error::ParseError;

use crate::data::{FieldArray, FieldPropertiesMap, Metadata};
use crate::prelude::*;

use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, DerefMut)]
/// Byte offset of every field in a file, keyed by field name
///
/// Built once when the index of a dataset is parsed and only read afterwards.
pub struct FieldOffsetIndex(BTreeMap<String, u64>);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
/// The on-disk formats written by Idefix
pub enum FileFormat {
    /// `dump.NNNN.dmp` restart dumps
    #[display(fmt = "dmp")]
    Dmp,
    /// legacy binary vtk files
    #[display(fmt = "vtk")]
    Vtk,
}

impl FileFormat {
    /// find the format of the file at `path`, if it is an Idefix file at all
    pub fn detect(path: &Path) -> Option<Self> {
        [Self::Dmp, Self::Vtk]
            .into_iter()
            .find(|format| format.is_valid(path))
    }

    /// check whether the file at `path` is an Idefix file of this format.
    ///
    /// Never fails: any error while reading the header means the file is not valid.
    pub fn is_valid(&self, path: &Path) -> bool {
        match self {
            Self::Dmp => dmp::is_valid(path),
            Self::Vtk => vtk::is_valid(path),
        }
    }

    /// the text header written by Idefix
    pub fn read_header(&self, path: &Path) -> Result<String, ParseError> {
        match self {
            Self::Dmp => dmp::read_header(path),
            Self::Vtk => vtk::read_header(path),
        }
    }

    /// the properties of every record, and the values of every record that is
    /// not bulk field data (or of every record when `skip_data` is false)
    pub fn read_fields_metadata(
        &self,
        path: &Path,
        skip_data: bool,
    ) -> Result<FileRecords, ParseError> {
        let (fields, metadata, warnings) = match self {
            Self::Dmp => {
                let (fields, metadata) = dmp::read_idefix_dmpfile(path, skip_data)?;
                (fields, metadata, Vec::new())
            }
            Self::Vtk => {
                let file = std::fs::File::open(path).map_err(error::Header::from)?;
                vtk::read_vtk_records(&mut std::io::BufReader::new(file), skip_data)?
            }
        };

        Ok(FileRecords {
            fields,
            metadata,
            warnings,
        })
    }

    /// scan a file for the offset of every field
    pub fn field_offset_index<R: BufRead + Seek>(
        &self,
        reader: &mut R,
    ) -> Result<FieldOffsetIndex, ParseError> {
        match self {
            Self::Dmp => dmp::get_field_offset_index(reader),
            Self::Vtk => vtk::get_field_offset_index(reader),
        }
    }

    /// read the field stored at `offset`. `dims` is the cell count of the grid
    /// the field belongs to; dmp records carry their own shape and ignore it.
    pub fn read_single_field<R: Read + Seek>(
        &self,
        reader: &mut R,
        offset: u64,
        dims: [usize; 3],
    ) -> Result<FieldArray, ParseError> {
        match self {
            Self::Dmp => dmp::read_single_field(reader, offset),
            Self::Vtk => vtk::read_single_field(reader, offset, dims),
        }
    }

    /// whether a record name refers to field data that can be exposed to readers.
    /// Both formats name it `Vc-XXX` (cell centred) or `Vs-XXXs` (face centred).
    pub fn is_output_field(&self, name: &str) -> bool {
        dmp::is_bulk_field(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Everything read from a file apart from the bulk field data
pub struct FileRecords {
    pub fields: FieldPropertiesMap,
    pub metadata: Metadata,
    /// defaults the reader had to assume for missing entries
    pub warnings: Vec<String>,
}
