//! Fully-qualified variable names for zone variables.
//!
//! Every zone contributes the same fixed set of variables to the shared engine instance. The
//! engine-side name of such a variable is the zone name and the base name joined with a `.`, e.g.
//! `Room101.AFlo`. The variable-reference resolver relies on these names coming back in exactly
//! the order of the base name list.

use std::fmt;

use crate::Result;

/// Zone parameters: volume, floor area and the sensible heat-capacity multiplier.
pub const PARAMETER_NAMES: [&str; 3] = ["V", "AFlo", "mSenFac"];

/// Zone inputs: zone air temperature.
pub const INPUT_NAMES: [&str; 1] = ["T"];

/// Zone outputs: convective sensible heat flow rate.
pub const OUTPUT_NAMES: [&str; 1] = ["QConSen_flow"];

/// Separator between the zone name and the base name.
pub const SEPARATOR: char = '.';

/// The role a zone variable plays in the engine's variable-access protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    Parameter,
    Input,
    Output,
}

impl VariableKind {
    pub const ALL: [VariableKind; 3] = [Self::Parameter, Self::Input, Self::Output];

    /// The canonical base names for this kind of zone variable.
    pub fn base_names(self) -> &'static [&'static str] {
        match self {
            Self::Parameter => &PARAMETER_NAMES,
            Self::Input => &INPUT_NAMES,
            Self::Output => &OUTPUT_NAMES,
        }
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parameter => write!(f, "parameter"),
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// Build the fully-qualified names `"{zone_name}.{base}"` for each of `base_names`.
///
/// The result has the same length and order as `base_names`. Allocation failures are reported as
/// [`crate::Error::OutOfMemory`].
pub fn build_variable_names<S>(zone_name: &str, base_names: &[S]) -> Result<Vec<String>>
where
    S: AsRef<str>,
{
    let mut names = Vec::new();
    names.try_reserve_exact(base_names.len())?;
    for base in base_names {
        let base = base.as_ref();
        let mut name = String::new();
        name.try_reserve_exact(zone_name.len() + SEPARATOR.len_utf8() + base.len())?;
        name.push_str(zone_name);
        name.push(SEPARATOR);
        name.push_str(base);
        names.push(name);
    }
    log::trace!("Built {} variable names for zone '{zone_name}'", names.len());
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_names() {
        let names = build_variable_names("Room101", &PARAMETER_NAMES).unwrap();
        assert_eq!(names, ["Room101.V", "Room101.AFlo", "Room101.mSenFac"]);
    }

    #[test]
    fn test_preserves_order_and_length() {
        let bases = ["z", "a", "m", "a"];
        let names = build_variable_names("Zone", &bases).unwrap();
        assert_eq!(names.len(), bases.len());
        assert_eq!(names, ["Zone.z", "Zone.a", "Zone.m", "Zone.a"]);
    }

    #[test]
    fn test_empty_base_names() {
        let names = build_variable_names("Zone", &[] as &[&str]).unwrap();
        assert!(names.is_empty());
    }

    #[test]
    fn test_kind_base_names() {
        assert_eq!(VariableKind::Input.base_names(), ["T"]);
        assert_eq!(VariableKind::Output.base_names(), ["QConSen_flow"]);
        assert_eq!(VariableKind::Parameter.to_string(), "parameter");
    }
}
