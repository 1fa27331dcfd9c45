//! The collection of buildings, keyed by model file.

use std::path::Path;

use crate::{
    allocator::{AllocationRequest, BuildingAllocator, EngineHandle},
    building::BuildingInstance,
    zone::{ZoneInstance, ZoneKey},
    Error, Result,
};

/// Arguments of a zone initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneRequest {
    /// Building model file, used as the building identity
    pub model_file: String,
    pub weather_file: String,
    /// Engine input data dictionary
    pub schema_file: String,
    pub zone_name: String,
}

impl ZoneRequest {
    pub fn new(
        model_file: impl Into<String>,
        weather_file: impl Into<String>,
        schema_file: impl Into<String>,
        zone_name: impl Into<String>,
    ) -> Self {
        Self {
            model_file: model_file.into(),
            weather_file: weather_file.into(),
            schema_file: schema_file.into(),
            zone_name: zone_name.into(),
        }
    }

    /// All four arguments must be non-empty.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("model file", &self.model_file),
            ("weather file", &self.weather_file),
            ("schema file", &self.schema_file),
            ("zone name", &self.zone_name),
        ];
        match fields.iter().find(|(_, value)| value.is_empty()) {
            Some((field, _)) => Err(Error::InvalidArgument(format!("{field} must not be empty"))),
            None => Ok(()),
        }
    }
}

/// All buildings known to the simulation, at most one per model file.
#[derive(Debug, Default)]
pub struct BuildingRegistry {
    buildings: Vec<BuildingInstance>,
}

impl BuildingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered buildings.
    pub fn count(&self) -> usize {
        self.buildings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BuildingInstance> {
        self.buildings.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut BuildingInstance> {
        self.buildings.iter_mut()
    }

    /// Find the building for a model file.
    pub fn find(&self, model_file: &str) -> Option<&BuildingInstance> {
        self.buildings.iter().find(|b| b.name() == model_file)
    }

    pub fn find_mut(&mut self, model_file: &str) -> Option<&mut BuildingInstance> {
        self.buildings.iter_mut().find(|b| b.name() == model_file)
    }

    /// Number of zones registered for a model file, 0 if the building is unknown.
    pub fn zone_count(&self, model_file: &str) -> usize {
        self.find(model_file).map_or(0, BuildingInstance::zone_count)
    }

    /// Add a new building.
    pub fn register(&mut self, building: BuildingInstance) -> Result<()> {
        if self.find(building.name()).is_some() {
            return Err(Error::DuplicateBuilding(building.name().to_owned()));
        }
        self.buildings.try_reserve(1)?;
        self.buildings.push(building);
        Ok(())
    }

    /// Create a zone with the canonical variables and register it with its building, allocating
    /// the building's engine through `allocator` when the building is new.
    ///
    /// On error the registry is left as it was before the call.
    pub fn initialize_zone<A>(
        &mut self,
        request: &ZoneRequest,
        library_path: &Path,
        allocator: &A,
    ) -> Result<ZoneInstance>
    where
        A: BuildingAllocator + ?Sized,
    {
        request.validate()?;
        let mut zone = ZoneInstance::with_canonical_variables(&request.zone_name)?;
        zone.attach_to_building(self, request, library_path, allocator)?;
        Ok(zone)
    }

    /// Register `request.zone_name` with the building for `request.model_file`.
    pub(crate) fn attach_zone<A>(
        &mut self,
        request: &ZoneRequest,
        library_path: &Path,
        allocator: &A,
    ) -> Result<ZoneKey>
    where
        A: BuildingAllocator + ?Sized,
    {
        if let Some(building) = self.find_mut(&request.model_file) {
            log::debug!(
                "Adding zone '{}' to existing building '{}'",
                request.zone_name,
                request.model_file
            );
            let key = building.add_zone(&request.zone_name)?;
            if building.engine_state().handle().is_some() {
                return Ok(key);
            }

            // Registered without an engine, so this is the building's first zone
            let allocated = Self::allocate_engine(request, library_path, &key, allocator)
                .and_then(|engine| building.set_engine(engine));
            if let Err(err) = allocated {
                building.pop_zone();
                return Err(err);
            }
            return Ok(key);
        }

        log::debug!(
            "Creating building '{}' for zone '{}'",
            request.model_file,
            request.zone_name
        );
        self.buildings.try_reserve(1)?;
        let mut building = BuildingInstance::new(&request.model_file)?;
        let key = building.add_zone(&request.zone_name)?;

        let engine = Self::allocate_engine(request, library_path, &key, allocator)?;
        building.set_engine(engine)?;

        self.buildings.push(building);
        Ok(key)
    }

    fn allocate_engine<A>(
        request: &ZoneRequest,
        library_path: &Path,
        key: &ZoneKey,
        allocator: &A,
    ) -> Result<EngineHandle>
    where
        A: BuildingAllocator + ?Sized,
    {
        allocator
            .allocate(&AllocationRequest {
                model_file: &request.model_file,
                weather_file: &request.weather_file,
                schema_file: &request.schema_file,
                library_path,
                zone_name: &request.zone_name,
                zone_key: key,
            })
            .map_err(|source| Error::Allocation {
                building: request.model_file.clone(),
                source,
            })
    }
}
