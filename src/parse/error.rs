use crate::prelude::*;

/// An error caused while parsing a dmp or vtk file
#[derive(Debug, thiserror::Error, From)]
pub enum ParseError {
    #[error("Error parsing the file header: {0}")]
    Header(Header),
    #[error("Error parsing a dmp field record: {0}")]
    Record(Record),
    #[error("Error parsing an Idefix vtk file: {0}")]
    Vtk(Vtk),
}

#[derive(Debug, thiserror::Error, From)]
pub enum Header {
    #[error("failed to read the header: {0}")]
    Io(std::io::Error),
    #[error("{0}")]
    UnexpectedLine(UnexpectedLine),
}

#[derive(Debug, thiserror::Error, From)]
pub enum Record {
    #[error("failed to read the record: {0}")]
    Io(std::io::Error),
    #[error("{0}")]
    UnknownDataType(UnknownDataType),
    #[error("{0}")]
    InvalidDimensions(InvalidDimensions),
    #[error("{0}")]
    UnsupportedValue(UnsupportedValue),
    #[error("{0}")]
    PayloadLength(PayloadLength),
}

#[derive(Debug, thiserror::Error, From)]
pub enum Vtk {
    #[error("failed to read the vtk file: {0}")]
    Io(std::io::Error),
    #[error("{0}")]
    UnexpectedLine(UnexpectedLine),
    #[error("{0}")]
    MalformedLine(MalformedLine),
    #[error("{0}")]
    UnsupportedValue(UnsupportedValue),
    #[error("{0}")]
    MissingSection(MissingSection),
    #[error("{0}")]
    PayloadLength(PayloadLength),
}

#[derive(From, Display, Debug, Constructor)]
#[display(fmt = "unexpected line. Expected `{expected}`, got `{actual}`")]
pub struct UnexpectedLine {
    expected: String,
    actual: String,
}

#[derive(From, Display, Debug, Constructor)]
#[display(fmt = "could not parse the line `{line}` as {what}")]
pub struct MalformedLine {
    line: String,
    what: &'static str,
}

#[derive(From, Display, Debug, Constructor)]
#[display(fmt = "unsupported {what}: `{value}`")]
pub struct UnsupportedValue {
    what: &'static str,
    value: String,
}

#[derive(From, Display, Debug, Constructor)]
#[display(fmt = "missing `{section}` section in vtk file")]
pub struct MissingSection {
    section: &'static str,
}

#[derive(From, Display, Debug, Constructor)]
#[display(fmt = "unknown data type code {code} for field `{field}`")]
pub struct UnknownDataType {
    field: String,
    code: i32,
}

#[derive(From, Display, Debug, Constructor)]
#[display(fmt = "invalid shape for field `{field}`: {reason}")]
pub struct InvalidDimensions {
    field: String,
    reason: String,
}

#[derive(From, Display, Debug, Constructor, PartialEq)]
#[display(fmt = "payload holds {actual} values but the shape requires {expected}")]
pub struct PayloadLength {
    pub(crate) expected: usize,
    pub(crate) actual: usize,
}
