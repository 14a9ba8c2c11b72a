//! Known Idefix fields
//!
//! Cell centred arrays are named `Vc-XXX` and face centred arrays `Vs-XXXs`.
//! vtk cell data is read under the same `Vc-` names as dmp records.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    /// name of the array in the file
    pub name: String,
    /// physical quantity the array holds
    pub alias: String,
    /// units of the on-disk values
    pub units: &'static str,
}

const DENSITY_UNITS: &str = "code_mass/code_length**3";
const VELOCITY_UNITS: &str = "code_length/code_time";
const PRESSURE_UNITS: &str = "code_mass/(code_length*code_time**2)";
const MAGNETIC_UNITS: &str = "code_magnetic";

impl FieldInfo {
    /// units and alias of a field, or `None` for arrays Idefix does not document
    pub fn lookup(name: &str) -> Option<Self> {
        let (alias, units) = if let Some(face) = name.strip_prefix("Vs-") {
            let component = face.strip_prefix("BX")?.strip_suffix('s')?;
            (format!("magnetic_field_{}", axis_index(component)?), MAGNETIC_UNITS)
        } else {
            let base = name.strip_prefix("Vc-")?;
            match base {
                "RHO" => ("density".to_string(), DENSITY_UNITS),
                "PRS" => ("pressure".to_string(), PRESSURE_UNITS),
                _ => {
                    if let Some(component) = base.strip_prefix("VX") {
                        (format!("velocity_{}", axis_index(component)?), VELOCITY_UNITS)
                    } else if let Some(component) = base.strip_prefix("BX") {
                        (format!("magnetic_field_{}", axis_index(component)?), MAGNETIC_UNITS)
                    } else {
                        return None;
                    }
                }
            }
        };

        Some(Self {
            name: name.to_string(),
            alias,
            units,
        })
    }
}

fn axis_index(component: &str) -> Option<usize> {
    match component {
        "1" => Some(1),
        "2" => Some(2),
        "3" => Some(3),
        _ => None,
    }
}
