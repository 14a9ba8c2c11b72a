//! Options for loading a dataset, and the code units derived from them.

use crate::prelude::*;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// How a dataset is loaded.
///
/// # Example
///
/// ```
/// use idefix::config::DatasetConfig;
///
/// let config = DatasetConfig::new()
///     .with_inifile("idefix.ini")
///     .with_unit_override("length_unit", 1.5e13, "cm");
///
/// assert_eq!(config.unit_system(), "cgs");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetConfig {
    /// Companion `.ini` file used to validate the grid structure.
    inifile: Option<PathBuf>,
    /// Name of the unit system results are expressed in.
    unit_system: String,
    /// Code units replacing the defaults, keyed by unit name.
    units_override: BTreeMap<String, (f64, String)>,
}

impl DatasetConfig {
    /// Defaults: no ini file, `cgs` units, no overrides.
    pub fn new() -> Self {
        Self {
            inifile: None,
            unit_system: "cgs".to_string(),
            units_override: BTreeMap::new(),
        }
    }

    pub fn with_inifile(mut self, path: impl Into<PathBuf>) -> Self {
        self.inifile = Some(path.into());
        self
    }

    pub fn with_unit_system(mut self, unit_system: impl Into<String>) -> Self {
        self.unit_system = unit_system.into();
        self
    }

    /// Replace the code unit `name` (for example `length_unit`) by `value` `unit`.
    pub fn with_unit_override(
        mut self,
        name: impl Into<String>,
        value: f64,
        unit: impl Into<String>,
    ) -> Self {
        self.units_override.insert(name.into(), (value, unit.into()));
        self
    }

    pub fn inifile(&self) -> Option<&Path> {
        self.inifile.as_deref()
    }

    pub fn unit_system(&self) -> &str {
        &self.unit_system
    }

    pub fn units_override(&self) -> &BTreeMap<String, (f64, String)> {
        &self.units_override
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Display, Constructor)]
#[display(fmt = "{value} {unit}")]
/// A value paired with the name of its unit
pub struct Quantity {
    pub value: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq)]
/// The on-disk units of an Idefix run. Idefix writes dimensionless code
/// values, so every unit defaults to 1 in cgs.
pub struct CodeUnits {
    pub length: Quantity,
    pub mass: Quantity,
    pub time: Quantity,
    pub velocity: Quantity,
    pub magnetic: Quantity,
}

impl Default for CodeUnits {
    fn default() -> Self {
        Self {
            length: Quantity::new(1.0, "cm".into()),
            mass: Quantity::new(1.0, "g".into()),
            time: Quantity::new(1.0, "s".into()),
            velocity: Quantity::new(1.0, "cm/s".into()),
            magnetic: Quantity::new(1.0, "gauss".into()),
        }
    }
}

impl CodeUnits {
    /// the default units with every override of `config` applied
    pub fn from_config(config: &DatasetConfig) -> Result<Self, Error> {
        let mut units = Self::default();
        for (name, (value, unit)) in config.units_override() {
            *units.get_mut(name)? = Quantity::new(*value, unit.clone());
        }
        Ok(units)
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Quantity, Error> {
        match name {
            "length_unit" => Ok(&mut self.length),
            "mass_unit" => Ok(&mut self.mass),
            "time_unit" => Ok(&mut self.time),
            "velocity_unit" => Ok(&mut self.velocity),
            "magnetic_unit" => Ok(&mut self.magnetic),
            other => Err(Error::UnknownUnit(other.to_string())),
        }
    }
}
