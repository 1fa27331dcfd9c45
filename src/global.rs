//! Process-scoped building registry.
//!
//! The registry is created on the first zone initialization and lives until the host calls
//! [`shutdown`] at the end of the simulation. Access is serialized with a mutex, so zones may be
//! initialized from several threads; each initialization still completes as a whole before the
//! next one starts.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{
    allocator::BuildingAllocator,
    library::EngineLibrary,
    registry::{BuildingRegistry, ZoneRequest},
    zone::ZoneInstance,
    Result,
};

static REGISTRY: Mutex<Option<BuildingRegistry>> = Mutex::new(None);

fn lock() -> MutexGuard<'static, Option<BuildingRegistry>> {
    // Every mutation either completes or leaves the registry untouched, so a poisoned registry
    // is still consistent.
    REGISTRY.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Initialize a zone of the building described by `model_file`, allocating the building's engine
/// with the default [`crate::LibraryAllocator`] if this is the building's first zone.
#[cfg(feature = "dylib")]
pub fn initialize_zone(
    model_file: &str,
    weather_file: &str,
    schema_file: &str,
    zone_name: &str,
) -> Result<ZoneInstance> {
    initialize_zone_with(
        model_file,
        weather_file,
        schema_file,
        zone_name,
        &crate::allocator::LibraryAllocator,
    )
}

/// Initialize a zone like [`initialize_zone`], allocating new buildings through `allocator`.
pub fn initialize_zone_with<A>(
    model_file: &str,
    weather_file: &str,
    schema_file: &str,
    zone_name: &str,
    allocator: &A,
) -> Result<ZoneInstance>
where
    A: BuildingAllocator + ?Sized,
{
    let request = ZoneRequest::new(model_file, weather_file, schema_file, zone_name);
    request.validate()?;
    let library_path = EngineLibrary::default().resolve_current()?;
    lock()
        .get_or_insert_with(BuildingRegistry::new)
        .initialize_zone(&request, &library_path, allocator)
}

/// Run `f` with the process-scoped registry, creating it if needed.
pub fn with_registry<R>(f: impl FnOnce(&mut BuildingRegistry) -> R) -> R {
    f(lock().get_or_insert_with(BuildingRegistry::new))
}

/// Release the process-scoped registry and all buildings in it, returning how many buildings
/// were released. A later initialization starts with an empty registry.
pub fn shutdown() -> usize {
    let released = lock().take().map_or(0, |registry| registry.count());
    log::info!("Released {released} buildings");
    released
}
