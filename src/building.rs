//! One building model and the engine instance shared by all of its zones.

use std::sync::atomic::{AtomicU64, Ordering};

use itertools::Itertools;

use crate::{
    allocator::EngineHandle,
    zone::{ZoneDirectory, ZoneInstance, ZoneKey},
    Error, Result,
};

/// Connection state of a building's engine.
#[derive(Debug, Clone, Default)]
pub enum EngineState {
    /// No engine has been allocated yet
    #[default]
    Unallocated,
    /// The engine is allocated but has not been connected, or must be connected again because the
    /// set of zones changed
    Allocated(EngineHandle),
    /// The engine is connected and ready to be stepped
    Connected(EngineHandle),
}

impl EngineState {
    /// The allocated handle, regardless of whether it is connected.
    pub fn handle(&self) -> Option<&EngineHandle> {
        match self {
            Self::Unallocated => None,
            Self::Allocated(handle) | Self::Connected(handle) => Some(handle),
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }
}

/// A registered zone: its name together with the key its owner resolves it by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneEntry {
    pub name: String,
    pub key: ZoneKey,
}

/// Source of [`ZoneKey::generation`], unique for every building created in this process.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// A building model shared by one or more zones.
#[derive(Debug)]
pub struct BuildingInstance {
    /// Model file, the building's identity in the registry
    name: String,
    generation: u64,
    /// Zones in registration order
    zones: Vec<ZoneEntry>,
    engine: EngineState,
}

impl BuildingInstance {
    /// Create a building without zones or engine.
    pub fn new(model_file: &str) -> Result<Self> {
        let mut name = String::new();
        name.try_reserve_exact(model_file.len())?;
        name.push_str(model_file);
        Ok(Self {
            name,
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
            zones: Vec::new(),
            engine: EngineState::Unallocated,
        })
    }

    /// The building identity (model file).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    pub fn zones(&self) -> &[ZoneEntry] {
        &self.zones
    }

    /// Zone names in registration order.
    pub fn zone_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.zones.iter().map(|entry| entry.name.as_str())
    }

    pub fn contains_zone(&self, zone_name: &str) -> bool {
        self.zones.iter().any(|entry| entry.name == zone_name)
    }

    /// The key of the next zone to be registered.
    pub(crate) fn next_key(&self) -> ZoneKey {
        ZoneKey {
            building: self.name.clone(),
            generation: self.generation,
            index: self.zones.len() + 1,
        }
    }

    /// Register a zone and return its key, whose `index` is the zone's 1-based position.
    ///
    /// Fails with [`Error::DuplicateZone`] if the name is already registered, leaving the
    /// building unchanged. A connected engine is moved back to [`EngineState::Allocated`], since
    /// the engine was connected with a different set of zones.
    pub fn add_zone(&mut self, zone_name: &str) -> Result<ZoneKey> {
        if self.contains_zone(zone_name) {
            return Err(Error::DuplicateZone {
                zone: zone_name.to_owned(),
                building: self.name.clone(),
            });
        }

        let mut name = String::new();
        name.try_reserve_exact(zone_name.len())?;
        name.push_str(zone_name);
        self.zones.try_reserve(1)?;

        let key = self.next_key();
        self.zones.push(ZoneEntry {
            name,
            key: key.clone(),
        });

        if self.engine.is_connected() {
            log::warn!(
                "Zone '{zone_name}' added to building '{}' after its engine was connected; \
                 the engine must be connected again",
                self.name
            );
            self.disconnect();
        }

        log::debug!(
            "Building '{}' has zones [{}]",
            self.name,
            self.zone_names().join(", ")
        );
        Ok(key)
    }

    /// Undo the most recent [`Self::add_zone`].
    pub(crate) fn pop_zone(&mut self) -> Option<ZoneEntry> {
        self.zones.pop()
    }

    /// Store the engine produced by the allocator. The engine starts out unconnected.
    pub fn set_engine(&mut self, handle: EngineHandle) -> Result<()> {
        if self.engine.handle().is_some() {
            return Err(Error::EngineAlreadyAllocated {
                building: self.name.clone(),
            });
        }
        self.engine = EngineState::Allocated(handle);
        Ok(())
    }

    pub fn engine_state(&self) -> &EngineState {
        &self.engine
    }

    /// The engine handle, available only once the engine is connected.
    pub fn engine(&self) -> Option<&EngineHandle> {
        match &self.engine {
            EngineState::Connected(handle) => Some(handle),
            _ => None,
        }
    }

    /// Mark the engine as connected once all zones are registered and return its handle.
    pub fn connect(&mut self) -> Result<&EngineHandle> {
        self.engine = match std::mem::take(&mut self.engine) {
            EngineState::Unallocated => {
                return Err(Error::EngineNotAllocated {
                    building: self.name.clone(),
                })
            }
            EngineState::Allocated(handle) | EngineState::Connected(handle) => {
                EngineState::Connected(handle)
            }
        };
        log::debug!(
            "Connected engine of building '{}' with {} zones",
            self.name,
            self.zones.len()
        );
        self.engine().ok_or_else(|| Error::EngineNotAllocated {
            building: self.name.clone(),
        })
    }

    /// Mark the engine as unconnected, keeping the allocation.
    pub fn disconnect(&mut self) {
        if let EngineState::Connected(handle) = std::mem::take(&mut self.engine) {
            self.engine = EngineState::Allocated(handle);
        }
    }

    /// The zones of this building that are still present in `directory`, in registration order.
    pub fn resolve_zones<'a, D>(
        &'a self,
        directory: &'a D,
    ) -> impl Iterator<Item = &'a ZoneInstance> + 'a
    where
        D: ZoneDirectory + ?Sized,
    {
        self.zones
            .iter()
            .filter_map(move |entry| directory.zone(&entry.key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_zones() {
        let mut building = BuildingInstance::new("B.idf").unwrap();
        let k1 = building.add_zone("Zone1").unwrap();
        let k2 = building.add_zone("Zone2").unwrap();
        assert_eq!(k1.index, 1);
        assert_eq!(k2.index, 2);
        assert_eq!(k2.building, "B.idf");
        assert_eq!(building.zone_count(), 2);
        assert_eq!(building.zone_names().collect::<Vec<_>>(), ["Zone1", "Zone2"]);
    }

    #[test]
    fn test_keys_differ_between_buildings_of_same_model() {
        let mut first = BuildingInstance::new("B.idf").unwrap();
        let mut second = BuildingInstance::new("B.idf").unwrap();
        let k1 = first.add_zone("Zone1").unwrap();
        let k2 = second.add_zone("Zone1").unwrap();
        assert_eq!(k1.index, k2.index);
        assert_eq!(k1.to_string(), k2.to_string());
        assert_ne!(k1, k2);
    }

    #[test]
    fn test_duplicate_zone() {
        let mut building = BuildingInstance::new("B.idf").unwrap();
        building.add_zone("Zone1").unwrap();
        let err = building.add_zone("Zone1").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Zone1"), "{msg}");
        assert!(msg.contains("B.idf"), "{msg}");
        assert_eq!(building.zone_count(), 1);

        // Exact comparison only
        building.add_zone("zone1").unwrap();
        building.add_zone("Zone1 ").unwrap();
        assert_eq!(building.zone_count(), 3);
    }

    #[test]
    fn test_engine_lifecycle() {
        let mut building = BuildingInstance::new("B.idf").unwrap();
        assert!(building.connect().is_err());

        building.add_zone("Zone1").unwrap();
        building.set_engine(EngineHandle::new(7_i32)).unwrap();
        assert!(building.engine().is_none());
        assert!(!building.engine_state().is_connected());

        let handle = building.connect().unwrap().clone();
        assert_eq!(handle.downcast_ref::<i32>(), Some(&7));
        assert!(building.engine().is_some());

        // A new zone re-arms the engine without discarding it
        building.add_zone("Zone2").unwrap();
        assert!(building.engine().is_none());
        assert!(building.engine_state().handle().unwrap().ptr_eq(&handle));

        building.connect().unwrap();
        building.disconnect();
        assert!(matches!(building.engine_state(), EngineState::Allocated(_)));
    }

    #[test]
    fn test_engine_allocated_once() {
        let mut building = BuildingInstance::new("B.idf").unwrap();
        building.set_engine(EngineHandle::new(1_i32)).unwrap();
        assert!(matches!(
            building.set_engine(EngineHandle::new(2_i32)),
            Err(Error::EngineAlreadyAllocated { .. })
        ));
    }

    #[test]
    fn test_resolve_zones_skips_dropped() {
        let mut building = BuildingInstance::new("B.idf").unwrap();
        building.add_zone("Zone1").unwrap();
        building.add_zone("Zone2").unwrap();
        let zones: Vec<ZoneInstance> = Vec::new();
        assert_eq!(building.resolve_zones(&zones).count(), 0);
    }
}
