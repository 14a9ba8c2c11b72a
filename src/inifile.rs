//! parsing the `.ini` parameter file of an Idefix run
//!
//! The file is a list of `[Section]` headers, each followed by lines of a key
//! and whitespace separated values. Everything after a `#` is a comment.
//!
//! ```text
//! [Grid]
//! X1-grid    1  0.0    64  u  1.0
//! X2-grid    2  0.0    32  u  0.5  32  l  1.0
//! X3-grid    1  0.0    1   u  1.0
//! ```
//!
//! The `[Grid]` section describes every direction as a number of blocks,
//! the starting coordinate, and then, for each block, the number of points,
//! the spacing (`u` for uniform) and the end coordinate.

use crate::prelude::*;

use nom::bytes::complete::{is_not, take_while1};
use nom::character::complete::{char, space1};
use nom::combinator::all_consuming;
use nom::multi::separated_list1;
use nom::sequence::delimited;
use nom::IResult;

use std::fmt;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum InifileError {
    #[error("failed to read the ini file: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Syntax(#[from] SyntaxError),
    #[error("the ini file has no [Grid] section")]
    MissingGridSection,
    #[error("{0}")]
    InvalidGridEntry(#[from] InvalidGridEntry),
}

#[derive(From, Display, Debug, Constructor)]
#[display(fmt = "could not parse line {line_number} of the ini file: `{line}`")]
pub struct SyntaxError {
    line_number: usize,
    line: String,
}

impl std::error::Error for SyntaxError {}

#[derive(From, Display, Debug, Constructor)]
#[display(fmt = "grid entry `{key}` must start with the number of blocks, got {values}")]
pub struct InvalidGridEntry {
    key: String,
    values: String,
}

impl std::error::Error for InvalidGridEntry {}

#[derive(Debug, Clone, PartialEq)]
/// A single value on a key line. Values are typed the first way they parse as:
/// integer, float, boolean (`true` / `false`), and string otherwise.
pub enum IniValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl IniValue {
    fn parse(token: &str) -> Self {
        if let Ok(int) = token.parse() {
            Self::Int(int)
        } else if let Ok(float) = token.parse() {
            Self::Float(float)
        } else if token.eq_ignore_ascii_case("true") {
            Self::Bool(true)
        } else if token.eq_ignore_ascii_case("false") {
            Self::Bool(false)
        } else {
            Self::Str(token.to_string())
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(x) => Some(*x as f64),
            Self::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(x) => Some(x.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for IniValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(x) => write!(f, "{x}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Bool(x) => write!(f, "{x}"),
            Self::Str(x) => write!(f, "'{x}'"),
        }
    }
}

struct ValueList<'a>(&'a [IniValue]);

impl fmt::Display for ValueList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (idx, value) in self.0.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, "]")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
/// The keys of one section, in file order
pub struct IniSection(Vec<(String, Vec<IniValue>)>);

impl IniSection {
    pub fn get(&self, key: &str) -> Option<&[IniValue]> {
        self.0
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, values)| values.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[IniValue])> {
        self.0
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Parsed contents of an Idefix `.ini` file
pub struct IdefixInifile {
    sections: Vec<(String, IniSection)>,
}

fn section_header(input: &str) -> IResult<&str, &str> {
    all_consuming(delimited(char('['), take_while1(|c| c != ']'), char(']')))(input)
}

fn key_values(input: &str) -> IResult<&str, Vec<&str>> {
    all_consuming(separated_list1(space1, is_not(" \t")))(input)
}

impl IdefixInifile {
    pub fn from_path(path: &Path) -> Result<Self, InifileError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, InifileError> {
        let mut sections: Vec<(String, IniSection)> = Vec::new();

        for (idx, raw_line) in contents.lines().enumerate() {
            let line = raw_line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }

            let syntax_error = || SyntaxError::new(idx + 1, raw_line.to_string());

            if line.starts_with('[') {
                let (_, name) = section_header(line).map_err(|_| syntax_error())?;
                sections.push((name.trim().to_string(), IniSection::default()));
                continue;
            }

            let (_, tokens) = key_values(line).map_err(|_| syntax_error())?;
            let (_, section) = sections.last_mut().ok_or_else(syntax_error)?;

            let values = tokens[1..].iter().map(|token| IniValue::parse(token)).collect();
            section.0.push((tokens[0].to_string(), values));
        }

        Ok(Self { sections })
    }

    pub fn section(&self, name: &str) -> Option<&IniSection> {
        self.sections
            .iter()
            .find(|(section, _)| section == name)
            .map(|(_, section)| section)
    }

    pub fn sections(&self) -> impl Iterator<Item = (&str, &IniSection)> {
        self.sections
            .iter()
            .map(|(name, section)| (name.as_str(), section))
    }

    /// check that every direction of the `[Grid]` section is a single block
    /// with uniform spacing. Every problem found is collected into the returned
    /// warning, `None` means the grid is fully supported.
    pub fn validate_grid(&self) -> Result<Option<GridWarning>, InifileError> {
        let grid = self
            .section("Grid")
            .ok_or(InifileError::MissingGridSection)?;

        let mut issues = Vec::new();

        for (axis, values) in grid.iter() {
            let blocks = values.first().and_then(IniValue::as_f64).ok_or_else(|| {
                InvalidGridEntry::new(axis.to_string(), ValueList(values).to_string())
            })?;

            if blocks > 1.0 {
                issues.push(format!(
                    "found multiple blocks in direction {axis}; got {}",
                    ValueList(values)
                ));
            }

            let uniform = values
                .iter()
                .skip(3)
                .step_by(3)
                .all(|spacing| spacing.as_str() == Some("u"));
            if !uniform {
                issues.push(format!("found non-uniform block(s) in direction {axis}"));
            }
        }

        if issues.is_empty() {
            Ok(None)
        } else {
            Ok(Some(GridWarning { issues }))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Every way in which a `[Grid]` section departs from a single uniform block
/// per direction
pub struct GridWarning {
    pub issues: Vec<String>,
}

impl fmt::Display for GridWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "idefix currently only supports a single block with uniform spacing in each direction. Got the following issue(s)"
        )?;
        for issue in &self.issues {
            writeln!(f, "- {issue}")?;
        }
        write!(
            f,
            "The grid will be treated as uniformly spaced in every direction. Only the domain edges are expected to be correctly parsed."
        )
    }
}
