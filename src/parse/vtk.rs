//! reading the legacy vtk files written by Idefix
//!
//! Idefix writes binary (big-endian) legacy vtk files. The ascii keyword lines
//! describe the payload that immediately follows them:
//!
//! ```text
//! # vtk DataFile Version 2.0
//! Idefix v1.1.0 VTK Data
//! BINARY
//! DATASET RECTILINEAR_GRID
//! FIELD FieldData 3
//! TIME 1 1 double
//! <8 bytes>
//! GEOMETRY 1 1 int
//! <4 bytes>
//! PERIODICITY 3 1 int
//! <12 bytes>
//! DIMENSIONS 65 65 2
//! X_COORDINATES 65 float
//! <65 * 4 bytes>
//! Y_COORDINATES 65 float
//! <65 * 4 bytes>
//! Z_COORDINATES 2 float
//! <2 * 4 bytes>
//! CELL_DATA 4096
//! SCALARS RHO float
//! LOOKUP_TABLE default
//! <4096 * 4 bytes>
//! ```
//!
//! Non-cartesian runs are written as a `STRUCTURED_GRID` with a `POINTS` section
//! holding the cartesian position of every node instead of the three
//! coordinate sections.
//!
//! The contents are translated into the same [`FieldPropertiesMap`] and
//! [`Metadata`] keys that a dmp file produces (`x1`, `xl1`, `xr1`, ..., `time`,
//! `geometry`, `periodicity`) so datasets do not need to care which format they
//! were read from.

use super::error;
use super::FieldOffsetIndex;
use crate::data::{DataType, FieldArray, FieldProperties, FieldPropertiesMap, Metadata, MetadataValue};
use crate::prelude::*;
use crate::utils::{self, Endian};

use nom::bytes::complete::is_not;
use nom::character::complete::space1;
use nom::combinator::all_consuming;
use nom::multi::separated_list1;
use nom::IResult;

use std::f64::consts::TAU;
use std::path::Path;

const FILE_VERSION_PREFIX: &str = "# vtk DataFile Version";
/// keyword lines are short, this keeps binary files from being read whole
const MAX_LINE_LENGTH: u64 = 1024;

/// geometry code of polar runs
const POLAR: i64 = 3;
/// geometry code of spherical runs
const SPHERICAL: i64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GridKind {
    Rectilinear,
    Structured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueType {
    Float,
    Double,
    Int,
}

impl ValueType {
    fn parse(token: &str) -> Result<Self, error::Vtk> {
        match token {
            "float" => Ok(Self::Float),
            "double" => Ok(Self::Double),
            "int" => Ok(Self::Int),
            other => Err(error::UnsupportedValue::new("vtk data type", other.into()).into()),
        }
    }

    fn size(&self) -> usize {
        match self {
            Self::Float | Self::Int => 4,
            Self::Double => 8,
        }
    }

    fn read<R: Read>(&self, reader: &mut R, count: usize) -> Result<MetadataValue, error::Vtk> {
        let value = match self {
            Self::Float => MetadataValue::Single(utils::read_values(reader, count, Endian::Big)?),
            Self::Double => MetadataValue::Double(utils::read_values(reader, count, Endian::Big)?),
            Self::Int => MetadataValue::Integer(utils::read_values(reader, count, Endian::Big)?),
        };
        Ok(value)
    }
}

/// Everything in a vtk file apart from the cell data payloads
#[derive(Debug, Clone)]
struct VtkLayout {
    header: String,
    kind: GridKind,
    field_data: Metadata,
    node_dims: [usize; 3],
    coordinates: Option<[Vec<f64>; 3]>,
    points: Option<Vec<f64>>,
    cell_count: usize,
    cell_fields: Vec<CellField>,
}

#[derive(Debug, Clone)]
struct CellField {
    name: String,
    offset: u64,
    values: Option<MetadataValue>,
}

/// split a keyword line into whitespace separated tokens
fn tokens(line: &str) -> IResult<&str, Vec<&str>> {
    all_consuming(separated_list1(space1, is_not(" \t")))(line)
}

fn split_line<'a>(line: &'a str, what: &'static str) -> Result<Vec<&'a str>, error::Vtk> {
    tokens(line)
        .map(|(_, tokens)| tokens)
        .map_err(|_| error::MalformedLine::new(line.into(), what).into())
}

fn parse_count(token: &str, line: &str) -> Result<usize, error::Vtk> {
    token
        .parse()
        .map_err(|_| error::MalformedLine::new(line.into(), "a count").into())
}

/// number of values announced by a line and the bytes they take up
fn payload_size(counts: &[usize], dtype: ValueType, line: &str) -> Result<(usize, usize), error::Vtk> {
    utils::checked_product(counts)
        .and_then(|count| Some((count, count.checked_mul(dtype.size())?)))
        .filter(|(_, bytes)| i64::try_from(*bytes).is_ok())
        .ok_or_else(|| error::MalformedLine::new(line.into(), "a payload that fits in memory").into())
}

/// cell data arrays are exposed under the dmp name of cell centred fields
pub(crate) fn output_name(name: &str) -> String {
    format!("Vc-{name}")
}

/// Reads the ascii lines of the file while keeping track of the binary sections
struct LineReader<'r, R> {
    reader: &'r mut R,
}

impl<'r, R: BufRead + Seek> LineReader<'r, R> {
    fn new(reader: &'r mut R) -> Self {
        Self { reader }
    }

    /// skip the whitespace left between a binary section and the next keyword
    fn skip_whitespace(&mut self) -> Result<(), error::Vtk> {
        loop {
            let buffer = self.reader.fill_buf()?;
            if buffer.is_empty() {
                return Ok(());
            }

            let whitespace = buffer
                .iter()
                .take_while(|b| b.is_ascii_whitespace())
                .count();
            let exhausted = whitespace == buffer.len();
            self.reader.consume(whitespace);

            if !exhausted {
                return Ok(());
            }
        }
    }

    /// the next non-empty line, without the line ending. `None` at the end of the file
    fn next_line(&mut self) -> Result<Option<String>, error::Vtk> {
        self.skip_whitespace()?;
        self.raw_line()
    }

    /// the next line, exactly where the reader currently is
    fn raw_line(&mut self) -> Result<Option<String>, error::Vtk> {
        let mut bytes = Vec::new();
        let read = (&mut *self.reader)
            .take(MAX_LINE_LENGTH)
            .read_until(b'\n', &mut bytes)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&bytes).trim().to_string()))
    }

    fn expect_line(&mut self, expected: &str) -> Result<String, error::Vtk> {
        self.next_line()?
            .ok_or_else(|| error::UnexpectedLine::new(expected.into(), "end of file".into()).into())
    }

    fn position(&mut self) -> Result<u64, error::Vtk> {
        Ok(self.reader.stream_position()?)
    }

    fn skip_bytes(&mut self, count: i64) -> Result<(), error::Vtk> {
        self.reader.seek(SeekFrom::Current(count))?;
        Ok(())
    }
}

/// read the first two lines of the file, returning the second one (the Idefix header)
fn read_header_lines<R: BufRead + Seek>(lines: &mut LineReader<'_, R>) -> Result<String, error::Vtk> {
    let version = lines.raw_line()?.unwrap_or_default();
    if !version.starts_with(FILE_VERSION_PREFIX) {
        return Err(error::UnexpectedLine::new(FILE_VERSION_PREFIX.into(), version).into());
    }

    let header = lines.raw_line()?.ok_or_else(|| {
        error::UnexpectedLine::new("a header line".into(), "end of file".into())
    })?;

    Ok(header)
}

/// read the header line of the vtk file at `path`
pub fn read_header(path: &Path) -> Result<String, ParseError> {
    let file = std::fs::File::open(path).map_err(error::Header::from)?;
    let mut reader = std::io::BufReader::new(file);
    read_header_from(&mut reader)
}

pub(crate) fn read_header_from<R: BufRead + Seek>(reader: &mut R) -> Result<String, ParseError> {
    let mut lines = LineReader::new(reader);
    Ok(read_header_lines(&mut lines)?)
}

/// the vtk header has to carry the `Idefix` marker
pub(crate) fn is_valid(path: &Path) -> bool {
    match read_header(path) {
        Ok(header) => header.contains("Idefix"),
        Err(_) => false,
    }
}

/// read the entries of a `FIELD FieldData n` section
fn read_field_data<R: BufRead + Seek>(
    lines: &mut LineReader<'_, R>,
    entries: usize,
    field_data: &mut Metadata,
) -> Result<(), error::Vtk> {
    for _ in 0..entries {
        let line = lines.expect_line("a field data entry")?;
        let parts = split_line(&line, "a field data entry")?;

        if parts.len() != 4 {
            return Err(error::MalformedLine::new(line, "a field data entry").into());
        }

        let components = parse_count(parts[1], &line)?;
        let tuples = parse_count(parts[2], &line)?;
        let dtype = ValueType::parse(parts[3])?;

        let (count, _) = payload_size(&[components, tuples], dtype, &line)?;
        let value = dtype.read(&mut *lines.reader, count)?;

        tracing::debug!(entry = parts[0], "read vtk field data entry");
        field_data.insert(parts[0].to_lowercase(), value);
    }

    Ok(())
}

fn read_coordinates<R: BufRead + Seek>(
    lines: &mut LineReader<'_, R>,
    line: &str,
    parts: &[&str],
) -> Result<Vec<f64>, error::Vtk> {
    if parts.len() != 3 {
        return Err(error::MalformedLine::new(line.into(), "a coordinate section").into());
    }
    let count = parse_count(parts[1], line)?;
    let dtype = ValueType::parse(parts[2])?;
    let (count, _) = payload_size(&[count], dtype, line)?;
    Ok(dtype.read(&mut *lines.reader, count)?.to_f64_vec())
}

fn read_layout<R: BufRead + Seek>(reader: &mut R, skip_data: bool) -> Result<VtkLayout, error::Vtk> {
    let mut lines = LineReader::new(reader);

    let header = read_header_lines(&mut lines)?;

    let encoding = lines.expect_line("BINARY")?;
    if encoding != "BINARY" {
        return Err(error::UnsupportedValue::new("vtk encoding", encoding).into());
    }

    let dataset = lines.expect_line("DATASET")?;
    let kind = match dataset.as_str() {
        "DATASET RECTILINEAR_GRID" => GridKind::Rectilinear,
        "DATASET STRUCTURED_GRID" => GridKind::Structured,
        _ => return Err(error::UnsupportedValue::new("vtk dataset", dataset).into()),
    };

    let mut field_data = Metadata::default();
    let mut node_dims = None;
    let mut coordinates: [Option<Vec<f64>>; 3] = [None, None, None];
    let mut points = None;
    let mut cell_count = None;
    let mut cell_bytes = 0;

    // geometry sections, up to the start of the cell data
    while let Some(line) = lines.next_line()? {
        let parts = split_line(&line, "a vtk section")?;

        match parts[0] {
            "FIELD" => {
                let entries = parts
                    .get(2)
                    .ok_or_else(|| error::MalformedLine::new(line.clone(), "a FIELD section"))?;
                let entries = parse_count(entries, &line)?;
                read_field_data(&mut lines, entries, &mut field_data)?;
            }
            "DIMENSIONS" => {
                if parts.len() != 4 {
                    return Err(error::MalformedLine::new(line, "DIMENSIONS").into());
                }
                node_dims = Some([
                    parse_count(parts[1], &line)?,
                    parse_count(parts[2], &line)?,
                    parse_count(parts[3], &line)?,
                ]);
            }
            "X_COORDINATES" => coordinates[0] = Some(read_coordinates(&mut lines, &line, &parts)?),
            "Y_COORDINATES" => coordinates[1] = Some(read_coordinates(&mut lines, &line, &parts)?),
            "Z_COORDINATES" => coordinates[2] = Some(read_coordinates(&mut lines, &line, &parts)?),
            "POINTS" => {
                if parts.len() != 3 {
                    return Err(error::MalformedLine::new(line, "POINTS").into());
                }
                let count = parse_count(parts[1], &line)?;
                let dtype = ValueType::parse(parts[2])?;
                let (count, _) = payload_size(&[3, count], dtype, &line)?;
                points = Some(dtype.read(&mut *lines.reader, count)?.to_f64_vec());
            }
            "CELL_DATA" => {
                let count = parts
                    .get(1)
                    .ok_or_else(|| error::MalformedLine::new(line.clone(), "CELL_DATA"))?;
                let count = parse_count(count, &line)?;
                cell_bytes = payload_size(&[count], ValueType::Float, &line)?.1;
                cell_count = Some(count);
                break;
            }
            other => {
                return Err(error::UnsupportedValue::new("vtk section", other.into()).into());
            }
        }
    }

    let node_dims = node_dims.ok_or(error::MissingSection::new("DIMENSIONS"))?;
    let cell_count = cell_count.ok_or(error::MissingSection::new("CELL_DATA"))?;

    let coordinates = match kind {
        GridKind::Rectilinear => {
            let [x, y, z] = coordinates;
            Some([
                x.ok_or(error::MissingSection::new("X_COORDINATES"))?,
                y.ok_or(error::MissingSection::new("Y_COORDINATES"))?,
                z.ok_or(error::MissingSection::new("Z_COORDINATES"))?,
            ])
        }
        GridKind::Structured => {
            if points.is_none() {
                return Err(error::MissingSection::new("POINTS").into());
            }
            None
        }
    };

    // cell data arrays
    let mut cell_fields = Vec::new();
    while let Some(line) = lines.next_line()? {
        let parts = split_line(&line, "a SCALARS section")?;

        if parts[0] != "SCALARS" || parts.len() < 3 {
            return Err(error::UnsupportedValue::new("cell data section", line).into());
        }

        let name = parts[1].to_string();
        if ValueType::parse(parts[2])? != ValueType::Float {
            return Err(error::UnsupportedValue::new("cell data type", parts[2].into()).into());
        }
        if let Some(components) = parts.get(3) {
            if parse_count(components, &line)? != 1 {
                return Err(error::UnsupportedValue::new("number of components", line).into());
            }
        }

        let lookup = lines.expect_line("LOOKUP_TABLE")?;
        if !lookup.starts_with("LOOKUP_TABLE") {
            return Err(error::UnexpectedLine::new("LOOKUP_TABLE".into(), lookup).into());
        }

        let offset = lines.position()?;
        tracing::debug!(field = %name, offset, "found vtk cell data");

        let values = if skip_data {
            lines.skip_bytes(cell_bytes as i64)?;
            None
        } else {
            Some(ValueType::Float.read(&mut *lines.reader, cell_count)?)
        };

        cell_fields.push(CellField { name, offset, values });
    }

    Ok(VtkLayout {
        header,
        kind,
        field_data,
        node_dims,
        coordinates,
        points,
        cell_count,
        cell_fields,
    })
}

/// move cartesian node positions into the coordinate system of the run
fn to_native(geometry: i64, [x, y, z]: [f64; 3]) -> [f64; 3] {
    match geometry {
        POLAR => [x.hypot(y), y.atan2(x).rem_euclid(TAU), z],
        SPHERICAL => {
            let r = (x * x + y * y + z * z).sqrt();
            let theta = if r > 0.0 { (z / r).clamp(-1.0, 1.0).acos() } else { 0.0 };
            [r, theta, y.atan2(x).rem_euclid(TAU)]
        }
        _ => [x, y, z],
    }
}

/// keep azimuthal coordinates increasing across the `2π` cut
fn unwrap_angles(values: &mut [f64]) {
    for idx in 1..values.len() {
        while values[idx] < values[idx - 1] {
            values[idx] += TAU;
        }
    }
}

/// native coordinates along the three grid lines through the first node
fn structured_coordinates(points: &[f64], node_dims: [usize; 3], geometry: i64) -> [Vec<f64>; 3] {
    let [n1, n2, _] = node_dims;
    let node = |i: usize, j: usize, k: usize| {
        let idx = 3 * (i + n1 * (j + n2 * k));
        to_native(geometry, [points[idx], points[idx + 1], points[idx + 2]])
    };

    let mut out: [Vec<f64>; 3] = Default::default();
    for (axis, coords) in out.iter_mut().enumerate() {
        *coords = (0..node_dims[axis])
            .map(|step| {
                let mut ijk = [0; 3];
                ijk[axis] = step;
                node(ijk[0], ijk[1], ijk[2])[axis]
            })
            .collect();
    }

    let azimuthal = match geometry {
        POLAR => Some(1),
        SPHERICAL => Some(2),
        _ => None,
    };
    if let Some(axis) = azimuthal {
        unwrap_angles(&mut out[axis]);
    }

    out
}

/// cell extent, cell centres, and cell left / right edges of one axis
fn cells_from_nodes(nodes: &[f64]) -> (usize, Vec<f64>, Vec<f64>, Vec<f64>) {
    if nodes.len() < 2 {
        // a collapsed direction
        return (1, vec![0.5], vec![0.0], vec![1.0]);
    }

    let left = nodes[..nodes.len() - 1].to_vec();
    let right = nodes[1..].to_vec();
    let centres = left.iter().zip(&right).map(|(l, r)| 0.5 * (l + r)).collect();

    (left.len(), centres, left, right)
}

impl VtkLayout {
    fn geometry(&self) -> Result<i64, error::Vtk> {
        match self.field_data.get("geometry") {
            Some(value) if !value.is_empty() => Ok(value.to_i64_vec()[0]),
            _ => match self.kind {
                GridKind::Rectilinear => Ok(1),
                GridKind::Structured => Err(error::MissingSection::new("GEOMETRY").into()),
            },
        }
    }

    fn node_coordinates(&self, geometry: i64) -> Result<[Vec<f64>; 3], error::Vtk> {
        match (&self.coordinates, &self.points) {
            (Some(coordinates), _) => {
                for (coords, expected) in coordinates.iter().zip(self.node_dims) {
                    if coords.len() != expected {
                        return Err(error::PayloadLength::new(expected, coords.len()).into());
                    }
                }
                Ok(coordinates.clone())
            }
            (None, Some(points)) => {
                let expected = utils::checked_product(&self.node_dims)
                    .and_then(|nodes| nodes.checked_mul(3))
                    .ok_or_else(|| self.oversized_grid())?;
                if points.len() != expected {
                    return Err(error::PayloadLength::new(expected, points.len()).into());
                }
                Ok(structured_coordinates(points, self.node_dims, geometry))
            }
            (None, None) => Err(error::MissingSection::new("POINTS").into()),
        }
    }

    fn cell_dims(&self) -> [usize; 3] {
        self.node_dims.map(|n| n.saturating_sub(1).max(1))
    }

    fn oversized_grid(&self) -> error::Vtk {
        error::UnsupportedValue::new("grid size", format!("{:?} nodes", self.node_dims)).into()
    }

    /// translate into the records a dmp file would hold, along with the
    /// defaults that had to be assumed for missing entries
    fn into_records(self) -> Result<(FieldPropertiesMap, Metadata, Vec<String>), error::Vtk> {
        let geometry = self.geometry()?;
        let nodes = self.node_coordinates(geometry)?;
        let cell_dims = self.cell_dims();

        let expected_cells =
            utils::checked_product(&cell_dims).ok_or_else(|| self.oversized_grid())?;
        if expected_cells != self.cell_count {
            return Err(error::PayloadLength::new(expected_cells, self.cell_count).into());
        }

        let mut fprops = FieldPropertiesMap::default();
        let mut fdata = self.field_data;
        let mut warnings = Vec::new();

        if !fdata.contains_key("time") {
            warnings.push("vtk file has no TIME entry, assuming t=0".to_string());
            fdata.insert("time".into(), MetadataValue::Double(vec![0.0]));
        }
        fdata.insert("geometry".into(), MetadataValue::Integer(vec![geometry as i32]));
        if !fdata.contains_key("periodicity") {
            warnings.push(
                "vtk file has no PERIODICITY entry, assuming no periodic direction".to_string(),
            );
            fdata.insert("periodicity".into(), MetadataValue::Integer(vec![0; 3]));
        }

        for (idx, axis_nodes) in nodes.iter().enumerate() {
            let (count, centres, left, right) = cells_from_nodes(axis_nodes);
            let dir = idx + 1;

            fprops.push(
                format!("x{dir}"),
                FieldProperties::new(DataType::Double, 1, vec![count]),
            );
            fdata.insert(format!("x{dir}"), MetadataValue::Double(centres));
            fdata.insert(format!("xl{dir}"), MetadataValue::Double(left));
            fdata.insert(format!("xr{dir}"), MetadataValue::Double(right));
        }

        for field in self.cell_fields {
            let name = output_name(&field.name);
            let props = FieldProperties::new(DataType::Single, 3, cell_dims.to_vec());
            if let Some(values) = field.values {
                fdata.insert(name.clone(), values);
            }
            fprops.push(name, props);
        }

        Ok((fprops, fdata, warnings))
    }
}

/// read a vtk file, returning the advisory warnings instead of logging them
pub(crate) fn read_vtk_records<R: BufRead + Seek>(
    reader: &mut R,
    skip_data: bool,
) -> Result<(FieldPropertiesMap, Metadata, Vec<String>), ParseError> {
    let layout = read_layout(reader, skip_data)?;
    tracing::debug!(header = %layout.header, "parsed vtk layout");
    Ok(layout.into_records()?)
}

/// read the geometry and field descriptions of a vtk file
///
/// Cell data arrays are named `Vc-<NAME>`. With `skip_data` their payloads are
/// seeked over, otherwise they are stored in the metadata as well. Defaults
/// assumed for a missing `TIME` or `PERIODICITY` entry are logged.
pub fn read_idefix_vtk_from_buffer<R: BufRead + Seek>(
    reader: &mut R,
    skip_data: bool,
) -> Result<(FieldPropertiesMap, Metadata), ParseError> {
    let (fprops, fdata, warnings) = read_vtk_records(reader, skip_data)?;
    for warning in warnings {
        tracing::warn!("{warning}");
    }
    Ok((fprops, fdata))
}

/// open the vtk file at `path` and read it. See [`read_idefix_vtk_from_buffer`]
pub fn read_idefix_vtkfile(
    path: &Path,
    skip_data: bool,
) -> Result<(FieldPropertiesMap, Metadata), ParseError> {
    let file = std::fs::File::open(path).map_err(error::Header::from)?;
    let mut reader = std::io::BufReader::new(file);
    read_idefix_vtk_from_buffer(&mut reader, skip_data)
}

/// map every cell data array to the offset of its first payload byte
pub fn get_field_offset_index<R: BufRead + Seek>(
    reader: &mut R,
) -> Result<FieldOffsetIndex, ParseError> {
    reader.seek(SeekFrom::Start(0)).map_err(error::Vtk::from)?;
    let layout = read_layout(reader, true)?;

    let mut index = FieldOffsetIndex::default();
    for field in layout.cell_fields {
        index.insert(output_name(&field.name), field.offset);
    }

    Ok(index)
}

/// read one cell data array of `dims` cells starting at `offset`
pub fn read_single_field<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
    dims: [usize; 3],
) -> Result<FieldArray, ParseError> {
    reader
        .seek(SeekFrom::Start(offset))
        .map_err(error::Vtk::from)?;

    let count = utils::checked_product(&dims).ok_or_else(|| {
        error::Vtk::from(error::UnsupportedValue::new("grid size", format!("{dims:?} cells")))
    })?;
    let buffer: Vec<f32> =
        utils::read_values(reader, count, Endian::Big).map_err(error::Vtk::from)?;
    let array = Array3::from_buffer(buffer, dims).map_err(error::Vtk::from)?;

    Ok(FieldArray::Single(array))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::testing::VtkWriter;
    use std::io::Cursor;

    /// a 4 x 2 x 1 cartesian grid with two cell arrays
    pub(crate) fn rectilinear_sample() -> Vec<u8> {
        let rho: Vec<f32> = (0..8).map(|x| x as f32).collect();
        let prs: Vec<f32> = (0..8).map(|x| 10.0 + x as f32).collect();

        VtkWriter::new("Idefix v1.1.0 VTK Data", "RECTILINEAR_GRID")
            .line("FIELD FieldData 3")
            .line("TIME 1 1 double")
            .doubles(&[1.5])
            .line("GEOMETRY 1 1 int")
            .ints(&[1])
            .line("PERIODICITY 3 1 int")
            .ints(&[1, 1, 0])
            .line("DIMENSIONS 5 3 1")
            .line("X_COORDINATES 5 float")
            .floats(&[0.0, 0.25, 0.5, 0.75, 1.0])
            .line("Y_COORDINATES 3 float")
            .floats(&[-1.0, 0.0, 1.0])
            .line("Z_COORDINATES 1 float")
            .floats(&[0.0])
            .line("CELL_DATA 8")
            .scalars("RHO", &rho)
            .scalars("PRS", &prs)
            .finish()
    }

    #[test]
    fn header_line() {
        let mut reader = Cursor::new(rectilinear_sample());
        let header = read_header_from(&mut reader).unwrap();
        assert_eq!(header, "Idefix v1.1.0 VTK Data");
    }

    #[test]
    fn not_a_vtk_file() {
        let mut reader = Cursor::new(b"Idefix v1.1.0 Dump Data\0\0\0".to_vec());
        assert!(read_header_from(&mut reader).is_err());
    }

    #[test]
    fn rectilinear_records() {
        let mut reader = Cursor::new(rectilinear_sample());
        let (fprops, fdata) = read_idefix_vtk_from_buffer(&mut reader, true).unwrap();

        assert_eq!(fprops.get("x1").unwrap().dims, [4]);
        assert_eq!(fprops.get("x2").unwrap().dims, [2]);
        assert_eq!(fprops.get("x3").unwrap().dims, [1]);
        assert_eq!(fprops.get("Vc-RHO").unwrap().dims, [4, 2, 1]);
        assert!(fprops.get("RHO").is_none());

        assert_eq!(fdata.f64_array("xl1").unwrap()[0], 0.0);
        assert_eq!(*fdata.f64_array("xr1").unwrap().last().unwrap(), 1.0);
        assert_eq!(fdata.f64_array("xl2").unwrap()[0], -1.0);
        assert_eq!(fdata.f64_array("xl3").unwrap(), [0.0]);
        assert_eq!(fdata.f64_array("xr3").unwrap(), [1.0]);
        assert_eq!(fdata.f64_scalar("time").unwrap(), 1.5);
        assert_eq!(fdata.i64_array("periodicity").unwrap(), [1, 1, 0]);
        assert!(fdata.get("Vc-RHO").is_none());
    }

    #[test]
    fn full_read_keeps_cell_data() {
        let mut reader = Cursor::new(rectilinear_sample());
        let (_, fdata) = read_idefix_vtk_from_buffer(&mut reader, false).unwrap();
        assert_eq!(fdata.f64_array("Vc-PRS").unwrap()[7], 17.0);
    }

    #[test]
    fn stream_cell_data() {
        let mut reader = Cursor::new(rectilinear_sample());
        let index = get_field_offset_index(&mut reader).unwrap();

        assert_eq!(index.keys().collect::<Vec<_>>(), ["Vc-PRS", "Vc-RHO"]);
        let prs = read_single_field(&mut reader, index["Vc-PRS"], [4, 2, 1]).unwrap();
        let rho = read_single_field(&mut reader, index["Vc-RHO"], [4, 2, 1]).unwrap();

        assert_eq!(prs.dtype(), DataType::Single);
        assert_eq!(prs.into_f64()[[0, 1, 0]], 14.0);
        assert_eq!(rho.into_f64()[[3, 1, 0]], 7.0);
    }

    #[test]
    fn missing_field_data_defaults() {
        let bytes = VtkWriter::new("Idefix v0.9 VTK Data", "RECTILINEAR_GRID")
            .line("DIMENSIONS 2 1 1")
            .line("X_COORDINATES 2 float")
            .floats(&[0.0, 2.0])
            .line("Y_COORDINATES 1 float")
            .floats(&[0.0])
            .line("Z_COORDINATES 1 float")
            .floats(&[0.0])
            .line("CELL_DATA 1")
            .finish();

        let (_, fdata, warnings) = read_vtk_records(&mut Cursor::new(bytes), true).unwrap();
        assert_eq!(fdata.f64_scalar("time").unwrap(), 0.0);
        assert_eq!(fdata.i64_scalar("geometry").unwrap(), 1);
        assert_eq!(fdata.i64_array("periodicity").unwrap(), [0, 0, 0]);

        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("no TIME entry"));
        assert!(warnings[1].contains("no PERIODICITY entry"));
    }

    #[test]
    fn complete_field_data_has_no_warnings() {
        let (_, _, warnings) =
            read_vtk_records(&mut Cursor::new(rectilinear_sample()), true).unwrap();
        assert!(warnings.is_empty());
    }

    #[test]
    fn cell_count_mismatch() {
        let bytes = VtkWriter::new("Idefix", "RECTILINEAR_GRID")
            .line("DIMENSIONS 3 1 1")
            .line("X_COORDINATES 3 float")
            .floats(&[0.0, 1.0, 2.0])
            .line("Y_COORDINATES 1 float")
            .floats(&[0.0])
            .line("Z_COORDINATES 1 float")
            .floats(&[0.0])
            .line("CELL_DATA 5")
            .finish();

        let out = read_idefix_vtk_from_buffer(&mut Cursor::new(bytes), true);
        assert!(matches!(out, Err(ParseError::Vtk(error::Vtk::PayloadLength(_)))));
    }

    #[test]
    fn overflowing_counts_are_rejected() {
        let bytes = VtkWriter::new("Idefix", "RECTILINEAR_GRID")
            .line("DIMENSIONS 2 1 1")
            .line("X_COORDINATES 4611686018427387905 float")
            .floats(&[0.0, 1.0])
            .finish();
        let out = read_idefix_vtk_from_buffer(&mut Cursor::new(bytes), true);
        assert!(matches!(out, Err(ParseError::Vtk(error::Vtk::MalformedLine(_)))));

        let bytes = VtkWriter::new("Idefix", "STRUCTURED_GRID")
            .line("DIMENSIONS 2 1 1")
            .line("POINTS 6148914691236517206 float")
            .finish();
        let out = read_idefix_vtk_from_buffer(&mut Cursor::new(bytes), true);
        assert!(matches!(out, Err(ParseError::Vtk(error::Vtk::MalformedLine(_)))));

        let bytes = VtkWriter::new("Idefix", "RECTILINEAR_GRID")
            .line("FIELD FieldData 1")
            .line("TIME 4294967296 4294967296 double")
            .finish();
        let out = read_idefix_vtk_from_buffer(&mut Cursor::new(bytes), true);
        assert!(matches!(out, Err(ParseError::Vtk(error::Vtk::MalformedLine(_)))));
    }

    #[test]
    fn oversized_sections_hit_the_end_of_file() {
        let bytes = VtkWriter::new("Idefix", "RECTILINEAR_GRID")
            .line("DIMENSIONS 2 1 1")
            .line("X_COORDINATES 1000000000000 float")
            .floats(&[0.0, 1.0])
            .finish();
        let out = read_idefix_vtk_from_buffer(&mut Cursor::new(bytes), true);
        assert!(matches!(out, Err(ParseError::Vtk(error::Vtk::Io(_)))));
    }

    #[test]
    fn oversized_grids_are_rejected() {
        let bytes = VtkWriter::new("Idefix", "STRUCTURED_GRID")
            .line("FIELD FieldData 1")
            .line("GEOMETRY 1 1 int")
            .ints(&[1])
            .line("DIMENSIONS 4294967297 4294967297 2")
            .line("POINTS 1 float")
            .floats(&[0.0, 0.0, 0.0])
            .line("CELL_DATA 1")
            .finish();
        let out = read_idefix_vtk_from_buffer(&mut Cursor::new(bytes), true);
        assert!(matches!(out, Err(ParseError::Vtk(error::Vtk::UnsupportedValue(_)))));

        let out = read_single_field(&mut Cursor::new(vec![0u8; 8]), 0, [usize::MAX, 2, 1]);
        assert!(matches!(out, Err(ParseError::Vtk(error::Vtk::UnsupportedValue(_)))));
    }

    #[test]
    fn ascii_files_rejected() {
        let mut bytes = rectilinear_sample();
        let text = String::from_utf8_lossy(&bytes[..60]).replace("BINARY", "ASCII ");
        bytes[..60].copy_from_slice(text.as_bytes());

        let out = read_idefix_vtk_from_buffer(&mut Cursor::new(bytes), true);
        assert!(matches!(out, Err(ParseError::Vtk(error::Vtk::UnsupportedValue(_)))));
    }

    #[test]
    fn structured_spherical_grid() {
        // r in {1, 2}, theta in {pi/4, pi/2}, phi in {0, pi/2}, written as cartesian nodes
        let radii = [1.0f64, 2.0];
        let thetas = [std::f64::consts::FRAC_PI_4, std::f64::consts::FRAC_PI_2];
        let phis = [0.0f64, std::f64::consts::FRAC_PI_2];

        let mut points = Vec::new();
        for phi in phis {
            for theta in thetas {
                for r in radii {
                    points.push((r * theta.sin() * phi.cos()) as f32);
                    points.push((r * theta.sin() * phi.sin()) as f32);
                    points.push((r * theta.cos()) as f32);
                }
            }
        }

        let bytes = VtkWriter::new("Idefix v1.1.0 VTK Data", "STRUCTURED_GRID")
            .line("FIELD FieldData 1")
            .line("GEOMETRY 1 1 int")
            .ints(&[4])
            .line("DIMENSIONS 2 2 2")
            .line("POINTS 8 float")
            .floats(&points)
            .line("CELL_DATA 1")
            .line("SCALARS RHO float")
            .line("LOOKUP_TABLE default")
            .floats(&[3.0])
            .finish();

        let (_, fdata) = read_idefix_vtk_from_buffer(&mut Cursor::new(bytes), true).unwrap();

        let close = |a: f64, b: f64| (a - b).abs() < 1e-5;
        assert!(close(fdata.f64_array("xl1").unwrap()[0], 1.0));
        assert!(close(fdata.f64_array("xr1").unwrap()[0], 2.0));
        assert!(close(fdata.f64_array("xl2").unwrap()[0], thetas[0]));
        assert!(close(fdata.f64_array("xr2").unwrap()[0], thetas[1]));
        assert!(close(fdata.f64_array("xl3").unwrap()[0], 0.0));
        assert!(close(fdata.f64_array("xr3").unwrap()[0], phis[1]));
        assert_eq!(fdata.i64_scalar("geometry").unwrap(), 4);
    }

    #[test]
    fn structured_grid_needs_geometry() {
        let bytes = VtkWriter::new("Idefix", "STRUCTURED_GRID")
            .line("DIMENSIONS 2 1 1")
            .line("POINTS 2 float")
            .floats(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0])
            .line("CELL_DATA 1")
            .finish();

        let out = read_idefix_vtk_from_buffer(&mut Cursor::new(bytes), true);
        assert!(matches!(out, Err(ParseError::Vtk(error::Vtk::MissingSection(_)))));
    }

    #[test]
    fn azimuth_unwrapped_across_cut() {
        let mut phis = vec![6.0, 0.1, 0.3];
        unwrap_angles(&mut phis);
        assert!(phis.windows(2).all(|w| w[0] < w[1]));
    }
}
