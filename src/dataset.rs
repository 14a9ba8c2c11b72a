//! # Datasets
//!
//! An [`IdefixDataset`] is one Idefix output file, dmp or vtk, with everything
//! that can be known about it without reading the bulk field data: the header
//! and version, the shape of every record, the domain, the simulation time,
//! and the parameters of the companion ini file (if one was given).
//!
//! Problems that do not prevent reading the file (an unknown version, a grid
//! with several blocks, no ini file) are logged with `tracing` and kept in
//! [`IdefixDataset::warnings`].

use crate::config::{CodeUnits, DatasetConfig};
use crate::data::{FieldPropertiesMap, Metadata};
use crate::inifile::{IdefixInifile, IniSection};
use crate::mesh::{Domain, Geometry};
use crate::prelude::*;

use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// name every dataset and field type of this crate is registered under
pub const DATASET_TYPE: &str = "idefix";

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"v?\d+\.\d+(?:\.\d+)?(?:-[\w+.-]*)?").unwrap())
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Version of Idefix that wrote a file, as found in its header
pub enum IdefixVersion {
    Known(String),
    Unknown,
}

impl fmt::Display for IdefixVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(version) => write!(f, "{version}"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

impl IdefixVersion {
    /// find the first version-like token in a header, e.g. `v1.1.0` or `1.2.3-dev`
    ///
    /// The token is returned as written. Headers without one give
    /// [`IdefixVersion::Unknown`] and a warning message.
    pub fn from_header(header: &str) -> (Self, Option<String>) {
        match version_regex().find(header) {
            Some(token) => (Self::Known(token.as_str().to_string()), None),
            None => (
                Self::Unknown,
                Some(format!(
                    "Could not determine Idefix version from file header {header:?}"
                )),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// An entry of [`IdefixDataset::parameters`]
pub enum Parameter {
    Text(String),
    Section(IniSection),
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
/// Cosmological parameters. Idefix runs are never cosmological so these are
/// always zero.
pub struct Cosmology {
    pub cosmological_simulation: bool,
    pub current_redshift: f64,
    pub omega_lambda: f64,
    pub omega_matter: f64,
    pub hubble_constant: f64,
}

#[derive(Debug, Clone)]
pub struct IdefixDataset {
    path: PathBuf,
    format: FileFormat,
    config: DatasetConfig,
    units: CodeUnits,
    header: String,
    version: IdefixVersion,
    field_properties: FieldPropertiesMap,
    metadata: Metadata,
    detected_fields: Vec<String>,
    domain: Domain,
    current_time: f64,
    parameters: BTreeMap<String, Parameter>,
    cosmology: Cosmology,
    warnings: Vec<String>,
}

fn push_warning(warnings: &mut Vec<String>, message: String) {
    tracing::warn!("{message}");
    warnings.push(message);
}

/// cell centred fields must cover the domain exactly. Face centred (`Vs-`)
/// fields have one more value along their staggered axis and are not checked.
fn check_cell_fields(fprops: &FieldPropertiesMap, domain: &Domain) -> Result<(), Error> {
    for (name, props) in fprops.iter() {
        if !name.starts_with("Vc-") {
            continue;
        }

        let actual = props.dims3();
        if props.ndim > 3 || actual != domain.dimensions {
            return Err(Error::FieldShape {
                field: name.clone(),
                expected: domain.dimensions,
                actual,
            });
        }
    }
    Ok(())
}

impl IdefixDataset {
    /// whether `path` is an Idefix file of any supported format
    pub fn is_valid(path: impl AsRef<Path>) -> bool {
        FileFormat::detect(path.as_ref()).is_some()
    }

    /// detect the format of `path` and open it
    pub fn load(path: impl AsRef<Path>, config: DatasetConfig) -> Result<Self, Error> {
        let path = path.as_ref();
        let format =
            FileFormat::detect(path).ok_or_else(|| Error::UnknownFormat(path.to_path_buf()))?;
        Self::open(path, format, config)
    }

    /// open `path` as a file of the given format
    pub fn open(
        path: impl AsRef<Path>,
        format: FileFormat,
        config: DatasetConfig,
    ) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let mut warnings = Vec::new();

        let units = CodeUnits::from_config(&config)?;

        let header = format.read_header(&path)?;
        // everything except the large arrays
        let records = format.read_fields_metadata(&path, true)?;
        let (field_properties, metadata) = (records.fields, records.metadata);
        tracing::debug!(path = %path.display(), %format, records = field_properties.len(), "read metadata");

        for message in records.warnings {
            push_warning(&mut warnings, message);
        }

        let detected_fields = field_properties
            .names()
            .filter(|name| format.is_output_field(name))
            .map(str::to_string)
            .collect();

        let (version, version_warning) = IdefixVersion::from_header(&header);
        if let Some(message) = version_warning {
            push_warning(&mut warnings, message);
        }

        let mut parameters = BTreeMap::new();
        parameters.insert(
            "idefix version".to_string(),
            Parameter::Text(version.to_string()),
        );

        let domain = Domain::from_records(&field_properties, &metadata)?;
        check_cell_fields(&field_properties, &domain)?;
        let current_time = metadata.f64_scalar("time")?;

        match config.inifile() {
            Some(inifile) => {
                let ini = IdefixInifile::from_path(inifile)?;
                if let Some(warning) = ini.validate_grid()? {
                    push_warning(&mut warnings, warning.to_string());
                }
                for (name, section) in ini.sections() {
                    parameters.insert(name.to_string(), Parameter::Section(section.clone()));
                }
            }
            None => push_warning(
                &mut warnings,
                "Cannot validate grid structure. Please pass an ini file with `DatasetConfig::with_inifile`"
                    .to_string(),
            ),
        }

        Ok(Self {
            path,
            format,
            config,
            units,
            header,
            version,
            field_properties,
            metadata,
            detected_fields,
            domain,
            current_time,
            parameters,
            cosmology: Cosmology::default(),
            warnings,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    pub fn units(&self) -> &CodeUnits {
        &self.units
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn version(&self) -> &IdefixVersion {
        &self.version
    }

    pub fn field_properties(&self) -> &FieldPropertiesMap {
        &self.field_properties
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// names of the field arrays that can be read from the file
    pub fn detected_fields(&self) -> &[String] {
        &self.detected_fields
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn domain_left_edge(&self) -> [f64; 3] {
        self.domain.left_edge
    }

    pub fn domain_right_edge(&self) -> [f64; 3] {
        self.domain.right_edge
    }

    pub fn domain_dimensions(&self) -> [usize; 3] {
        self.domain.dimensions
    }

    pub fn dimensionality(&self) -> usize {
        self.domain.dimensionality
    }

    pub fn geometry(&self) -> Geometry {
        self.domain.geometry
    }

    pub fn periodicity(&self) -> [bool; 3] {
        self.domain.periodicity
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn parameters(&self) -> &BTreeMap<String, Parameter> {
        &self.parameters
    }

    pub fn cosmology(&self) -> &Cosmology {
        &self.cosmology
    }

    /// Idefix does not refine its grid
    pub fn refine_by(&self) -> usize {
        1
    }

    pub fn dataset_type(&self) -> &'static str {
        DATASET_TYPE
    }

    /// every advisory message emitted while loading
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// build the grid index of this dataset
    pub fn index(&self) -> Result<IdefixHierarchy<'_>, Error> {
        IdefixHierarchy::build(self)
    }
}
