//! Per-zone binding to the shared engine instance.

use std::{collections::HashMap, fmt, path::Path};

use crate::{
    allocator::BuildingAllocator,
    registry::{BuildingRegistry, ZoneRequest},
    variable::{build_variable_names, VariableKind},
    Error, Result,
};

/// Non-owning reference to a registered zone.
///
/// A building only records the keys of its zones. The zones themselves are owned by the host and
/// are looked up through a [`ZoneDirectory`] when they are needed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ZoneKey {
    /// Identity of the owning building (its model file)
    pub building: String,
    /// Distinguishes buildings of the same model file created at different times, e.g. before
    /// and after a registry shutdown
    pub generation: u64,
    /// 1-based registration position within the building
    pub index: usize,
}

impl fmt::Display for ZoneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.building, self.index)
    }
}

/// Resolves [`ZoneKey`]s to the zones owned by the caller.
pub trait ZoneDirectory {
    fn zone(&self, key: &ZoneKey) -> Option<&ZoneInstance>;
}

impl ZoneDirectory for [ZoneInstance] {
    fn zone(&self, key: &ZoneKey) -> Option<&ZoneInstance> {
        self.iter().find(|zone| zone.key() == Some(key))
    }
}

impl ZoneDirectory for Vec<ZoneInstance> {
    fn zone(&self, key: &ZoneKey) -> Option<&ZoneInstance> {
        self.as_slice().zone(key)
    }
}

impl ZoneDirectory for HashMap<ZoneKey, ZoneInstance> {
    fn zone(&self, key: &ZoneKey) -> Option<&ZoneInstance> {
        self.get(key)
    }
}

/// Names and value references of one group of zone variables.
#[derive(Debug, Clone, Default)]
struct VariableSet {
    names: Vec<String>,
    /// Unset until filled in by the variable-reference resolver
    value_references: Option<Vec<u32>>,
}

impl VariableSet {
    fn new(zone_name: &str, base_names: &[&str]) -> Result<Self> {
        Ok(Self {
            names: build_variable_names(zone_name, base_names)?,
            value_references: None,
        })
    }
}

/// A single thermal zone bound to the engine instance of its building.
#[derive(Debug)]
pub struct ZoneInstance {
    name: String,
    parameters: VariableSet,
    inputs: VariableSet,
    outputs: VariableSet,
    /// Assigned once, when the zone is registered with its building
    key: Option<ZoneKey>,
}

/// A clone is unregistered: only the original is known to the building under its key.
impl Clone for ZoneInstance {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            parameters: self.parameters.clone(),
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
            key: None,
        }
    }
}

impl ZoneInstance {
    /// Create an unregistered zone with the given base names for each variable group.
    pub fn new(
        zone_name: &str,
        parameter_names: &[&str],
        input_names: &[&str],
        output_names: &[&str],
    ) -> Result<Self> {
        let mut name = String::new();
        name.try_reserve_exact(zone_name.len())?;
        name.push_str(zone_name);

        Ok(Self {
            parameters: VariableSet::new(zone_name, parameter_names)?,
            inputs: VariableSet::new(zone_name, input_names)?,
            outputs: VariableSet::new(zone_name, output_names)?,
            name,
            key: None,
        })
    }

    /// Create an unregistered zone with the canonical zone variables.
    pub fn with_canonical_variables(zone_name: &str) -> Result<Self> {
        Self::new(
            zone_name,
            VariableKind::Parameter.base_names(),
            VariableKind::Input.base_names(),
            VariableKind::Output.base_names(),
        )
    }

    /// Register this zone with the building for `request.model_file`, allocating the building's
    /// engine if this is its first zone. Returns the zone's 1-based index.
    pub fn attach_to_building<A>(
        &mut self,
        registry: &mut BuildingRegistry,
        request: &ZoneRequest,
        library_path: &Path,
        allocator: &A,
    ) -> Result<usize>
    where
        A: BuildingAllocator + ?Sized,
    {
        request.validate()?;
        if let Some(key) = &self.key {
            return Err(Error::ZoneAlreadyAttached {
                zone: self.name.clone(),
                building: key.building.clone(),
            });
        }
        if request.zone_name != self.name {
            return Err(Error::InvalidArgument(format!(
                "zone '{}' cannot be registered as '{}'",
                self.name, request.zone_name
            )));
        }

        let key = registry.attach_zone(request, library_path, allocator)?;
        let index = key.index;
        self.key = Some(key);
        Ok(index)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The key under which the owning building refers to this zone, once registered.
    pub fn key(&self) -> Option<&ZoneKey> {
        self.key.as_ref()
    }

    /// Identity of the owning building, once registered.
    pub fn building(&self) -> Option<&str> {
        self.key.as_ref().map(|key| key.building.as_str())
    }

    /// 1-based registration position within the owning building, once registered.
    pub fn index(&self) -> Option<usize> {
        self.key.as_ref().map(|key| key.index)
    }

    fn variables(&self, kind: VariableKind) -> &VariableSet {
        match kind {
            VariableKind::Parameter => &self.parameters,
            VariableKind::Input => &self.inputs,
            VariableKind::Output => &self.outputs,
        }
    }

    fn variables_mut(&mut self, kind: VariableKind) -> &mut VariableSet {
        match kind {
            VariableKind::Parameter => &mut self.parameters,
            VariableKind::Input => &mut self.inputs,
            VariableKind::Output => &mut self.outputs,
        }
    }

    /// Fully-qualified engine variable names of the given kind.
    pub fn variable_names(&self, kind: VariableKind) -> &[String] {
        &self.variables(kind).names
    }

    /// Value references of the given kind, or `None` if not resolved yet.
    pub fn value_references(&self, kind: VariableKind) -> Option<&[u32]> {
        self.variables(kind).value_references.as_deref()
    }

    /// Store the value references resolved for [`Self::variable_names`] of the same kind.
    ///
    /// `refs` must be in name order and have the same length.
    pub fn set_value_references(&mut self, kind: VariableKind, refs: &[u32]) -> Result<()> {
        let set = self.variables_mut(kind);
        if refs.len() != set.names.len() {
            return Err(Error::ValueReferenceCount {
                kind,
                expected: set.names.len(),
                found: refs.len(),
            });
        }
        let mut value_references = Vec::new();
        value_references.try_reserve_exact(refs.len())?;
        value_references.extend_from_slice(refs);
        set.value_references = Some(value_references);
        Ok(())
    }

    /// True once every variable group has its value references.
    pub fn is_resolved(&self) -> bool {
        VariableKind::ALL
            .iter()
            .all(|kind| self.variables(*kind).value_references.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_variables() {
        let zone = ZoneInstance::with_canonical_variables("Room101").unwrap();
        assert_eq!(zone.name(), "Room101");
        assert_eq!(
            zone.variable_names(VariableKind::Parameter),
            ["Room101.V", "Room101.AFlo", "Room101.mSenFac"]
        );
        assert_eq!(zone.variable_names(VariableKind::Input), ["Room101.T"]);
        assert_eq!(
            zone.variable_names(VariableKind::Output),
            ["Room101.QConSen_flow"]
        );
        assert!(zone.key().is_none());
        assert!(zone.index().is_none());
    }

    #[test]
    fn test_value_references_start_unset() {
        let zone = ZoneInstance::with_canonical_variables("Zone1").unwrap();
        for kind in VariableKind::ALL {
            assert!(zone.value_references(kind).is_none());
        }
        assert!(!zone.is_resolved());
    }

    #[test]
    fn test_set_value_references() {
        let mut zone = ZoneInstance::with_canonical_variables("Zone1").unwrap();
        zone.set_value_references(VariableKind::Parameter, &[1, 2, 3])
            .unwrap();
        zone.set_value_references(VariableKind::Input, &[4]).unwrap();
        assert!(!zone.is_resolved());
        zone.set_value_references(VariableKind::Output, &[5]).unwrap();
        assert!(zone.is_resolved());
        assert_eq!(
            zone.value_references(VariableKind::Parameter),
            Some(&[1, 2, 3][..])
        );
    }

    #[test]
    fn test_set_value_references_wrong_count() {
        let mut zone = ZoneInstance::with_canonical_variables("Zone1").unwrap();
        let err = zone
            .set_value_references(VariableKind::Parameter, &[1, 2])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ValueReferenceCount {
                kind: VariableKind::Parameter,
                expected: 3,
                found: 2
            }
        ));
        assert!(zone.value_references(VariableKind::Parameter).is_none());
    }

    #[test]
    fn test_clone_is_unregistered() {
        let mut zone = ZoneInstance::with_canonical_variables("Zone1").unwrap();
        zone.set_value_references(VariableKind::Input, &[4]).unwrap();
        let key = ZoneKey {
            building: "B.idf".to_owned(),
            generation: 0,
            index: 1,
        };
        zone.key = Some(key.clone());

        let copy = zone.clone();
        assert!(copy.key().is_none());
        assert_eq!(copy.name(), "Zone1");
        assert_eq!(copy.value_references(VariableKind::Input), Some(&[4][..]));

        // Only the original resolves, wherever the copy sits in the directory
        let zones = vec![copy, zone];
        assert!(std::ptr::eq(zones.zone(&key).unwrap(), &zones[1]));
    }

    #[test]
    fn test_directory_lookup() {
        let mut zone = ZoneInstance::with_canonical_variables("Zone1").unwrap();
        let key = ZoneKey {
            building: "B.idf".to_owned(),
            generation: 0,
            index: 1,
        };
        zone.key = Some(key.clone());
        let zones = vec![zone];
        assert_eq!(zones.zone(&key).map(ZoneInstance::name), Some("Zone1"));

        let other = ZoneKey {
            building: "A.idf".to_owned(),
            generation: 0,
            index: 1,
        };
        assert!(zones.zone(&other).is_none());

        let map: HashMap<_, _> = zones.into_iter().map(|z| (key.clone(), z)).collect();
        assert!(map.zone(&key).is_some());
        assert_eq!(key.to_string(), "B.idf#1");
    }
}
