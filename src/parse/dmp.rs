//! reading Idefix `dump.NNNN.dmp` restart files
//!
//! A dump starts with a fixed size text header, followed by a sequence of
//! records. Every record is a NUL padded name, an `i32` type code, an `i32`
//! number of dimensions, the extent of each dimension (`i32`), and finally the
//! raw little-endian payload. The sequence ends with a record named `eof`.

use super::error;
use super::FieldOffsetIndex;
use crate::data::{DataType, FieldArray, FieldProperties, FieldPropertiesMap, Metadata, MetadataValue};
use crate::prelude::*;
use crate::utils::{self, Endian};

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// size in bytes of the text header at the start of every dump
pub const HEADER_SIZE: usize = 128;
/// size in bytes of the name of every record
pub const NAME_SIZE: usize = 16;

const MAX_DIMENSIONS: i32 = 5;
const END_OF_FILE: &str = "eof";

fn dump_filename_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^dump\.\d{4}\.dmp$").unwrap())
}

/// check that the file name (not the full path) looks like `dump.0042.dmp`
pub fn is_dump_filename(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| dump_filename_regex().is_match(name))
        .unwrap_or(false)
}

/// read the text header of the dump at `path`
pub fn read_header(path: &Path) -> Result<String, ParseError> {
    let mut file = std::fs::File::open(path).map_err(error::Header::from)?;
    read_header_from(&mut file)
}

pub(crate) fn read_header_from<R: Read>(reader: &mut R) -> Result<String, ParseError> {
    let mut header = [0; HEADER_SIZE];
    reader
        .read_exact(&mut header)
        .map_err(error::Header::from)?;
    Ok(utils::null_terminated(&header))
}

/// strict name match plus an `idefix` marker anywhere in the header
pub(crate) fn is_valid(path: &Path) -> bool {
    if !is_dump_filename(path) {
        return false;
    }

    match read_header(path) {
        Ok(header) => header.to_lowercase().contains("idefix"),
        Err(_) => false,
    }
}

/// bulk field data is stored under names starting with `Vc-` or `Vs-`
pub(crate) fn is_bulk_field(name: &str) -> bool {
    name.starts_with("Vc-") || name.starts_with("Vs-")
}

/// read the name of the next record, returning `None` at the `eof` record
fn read_field_name<R: Read>(reader: &mut R) -> Result<Option<String>, error::Record> {
    let mut name = [0; NAME_SIZE];
    reader.read_exact(&mut name)?;
    let name = utils::null_terminated(&name);

    if name == END_OF_FILE {
        Ok(None)
    } else {
        Ok(Some(name))
    }
}

/// read the type code, the number of dimensions and the extents of a record
fn read_field_properties<R: Read>(
    reader: &mut R,
    field: &str,
) -> Result<FieldProperties, error::Record> {
    let code = utils::read_i32_le(reader)?;
    let dtype = DataType::from_code(field, code)?;

    let ndim = utils::read_i32_le(reader)?;
    if !(1..=MAX_DIMENSIONS).contains(&ndim) {
        let reason = format!("expected between 1 and {MAX_DIMENSIONS} dimensions, got {ndim}");
        return Err(error::InvalidDimensions::new(field.into(), reason).into());
    }

    let raw_dims: Vec<i32> = utils::read_values(reader, ndim as usize, Endian::Little)?;

    let mut dims = Vec::with_capacity(raw_dims.len());
    for dim in raw_dims {
        if dim < 0 {
            let reason = format!("negative extent {dim}");
            return Err(error::InvalidDimensions::new(field.into(), reason).into());
        }
        dims.push(dim as usize);
    }

    let props = FieldProperties::new(dtype, ndim as usize, dims);
    payload_size(field, &props)?;
    Ok(props)
}

/// element count and byte size of the payload of a record
///
/// Shapes whose size does not fit a file offset are rejected.
fn payload_size(field: &str, props: &FieldProperties) -> Result<(usize, i64), error::Record> {
    let too_large = || {
        let reason = format!("a payload of shape {:?} does not fit in memory", props.dims);
        error::InvalidDimensions::new(field.into(), reason)
    };

    let count = props.count().ok_or_else(too_large)?;
    let bytes = props
        .payload_bytes()
        .and_then(|bytes| i64::try_from(bytes).ok())
        .ok_or_else(too_large)?;
    Ok((count, bytes))
}

/// read the name and properties of the next record
pub(crate) fn read_next_field<R: Read>(
    reader: &mut R,
) -> Result<Option<(String, FieldProperties)>, error::Record> {
    let name = match read_field_name(reader)? {
        Some(name) => name,
        None => return Ok(None),
    };

    let props = read_field_properties(reader, &name)?;
    Ok(Some((name, props)))
}

fn read_metadata_value<R: Read>(
    reader: &mut R,
    field: &str,
    props: &FieldProperties,
) -> Result<MetadataValue, error::Record> {
    let (count, _) = payload_size(field, props)?;

    let value = match props.dtype {
        DataType::Double => MetadataValue::Double(utils::read_values(reader, count, Endian::Little)?),
        DataType::Single => MetadataValue::Single(utils::read_values(reader, count, Endian::Little)?),
        DataType::Integer => {
            MetadataValue::Integer(utils::read_values(reader, count, Endian::Little)?)
        }
        DataType::Bool => {
            let bytes = utils::read_bytes(reader, count)?;
            MetadataValue::Bool(bytes.into_iter().map(|b| b != 0).collect())
        }
    };

    Ok(value)
}

fn skip_payload<R: Seek>(
    reader: &mut R,
    field: &str,
    props: &FieldProperties,
) -> Result<(), error::Record> {
    let (_, bytes) = payload_size(field, props)?;
    reader.seek(SeekFrom::Current(bytes))?;
    Ok(())
}

/// read the properties of every record and the values of every record that
/// is not bulk field data
///
/// With `skip_data` the payload of the `Vc-` / `Vs-` fields is seeked over,
/// otherwise it is read and stored in the metadata as well.
pub fn read_idefix_dump_from_buffer<R: Read + Seek>(
    reader: &mut R,
    skip_data: bool,
) -> Result<(FieldPropertiesMap, Metadata), ParseError> {
    let mut fprops = FieldPropertiesMap::default();
    let mut fdata = Metadata::default();

    reader
        .seek(SeekFrom::Start(HEADER_SIZE as u64))
        .map_err(error::Header::from)?;

    while let Some((name, props)) = read_next_field(reader)? {
        if skip_data && is_bulk_field(&name) {
            skip_payload(reader, &name, &props)?;
        } else {
            let value = read_metadata_value(reader, &name, &props)?;
            fdata.insert(name.clone(), value);
        }

        tracing::trace!(field = %name, dims = ?props.dims, "read dmp record");
        fprops.push(name, props);
    }

    Ok((fprops, fdata))
}

/// open the dump at `path` and read its records. See [`read_idefix_dump_from_buffer`]
pub fn read_idefix_dmpfile(
    path: &Path,
    skip_data: bool,
) -> Result<(FieldPropertiesMap, Metadata), ParseError> {
    let file = std::fs::File::open(path).map_err(error::Header::from)?;
    let mut reader = std::io::BufReader::new(file);
    read_idefix_dump_from_buffer(&mut reader, skip_data)
}

/// map every record name to the offset of the start of its record
pub fn get_field_offset_index<R: Read + Seek>(
    reader: &mut R,
) -> Result<FieldOffsetIndex, ParseError> {
    let mut index = FieldOffsetIndex::default();

    reader
        .seek(SeekFrom::Start(HEADER_SIZE as u64))
        .map_err(error::Header::from)?;

    loop {
        let offset = reader.stream_position().map_err(error::Record::from)?;

        let (name, props) = match read_next_field(reader)? {
            Some(next) => next,
            None => break,
        };

        skip_payload(reader, &name, &props)?;
        index.insert(name, offset);
    }

    Ok(index)
}

/// seek to a record found by [`get_field_offset_index`] and read its payload
pub fn read_single_field<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
) -> Result<FieldArray, ParseError> {
    reader
        .seek(SeekFrom::Start(offset))
        .map_err(error::Record::from)?;

    let (name, props) = read_next_field(reader)?.ok_or_else(|| {
        error::Record::from(error::InvalidDimensions::new(
            END_OF_FILE.into(),
            "offset points at the end of file record".into(),
        ))
    })?;

    if props.ndim > 3 {
        let reason = format!("field data has {} dimensions, at most 3 are supported", props.ndim);
        return Err(error::Record::from(error::InvalidDimensions::new(name, reason)).into());
    }

    let dims = props.dims3();
    let (count, _) = payload_size(&name, &props)?;

    let array = match props.dtype {
        DataType::Double => {
            let buffer = utils::read_values(reader, count, Endian::Little)
                .map_err(error::Record::from)?;
            FieldArray::Double(Array3::from_buffer(buffer, dims).map_err(error::Record::from)?)
        }
        DataType::Single => {
            let buffer = utils::read_values(reader, count, Endian::Little)
                .map_err(error::Record::from)?;
            FieldArray::Single(Array3::from_buffer(buffer, dims).map_err(error::Record::from)?)
        }
        other => {
            let value = format!("{other:?} data in field `{name}`");
            return Err(error::Record::from(error::UnsupportedValue::new("field type", value)).into());
        }
    };

    Ok(array)
}
