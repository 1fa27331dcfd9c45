//! The `epfmi-registry` crate coordinates the thermal zones of one or more building models onto
//! shared EnergyPlus engine instances. Every zone of a Modelica model initializes itself
//! independently; the registry makes sure that all zones of the same building model end up bound
//! to exactly one engine instance, and that each zone is registered only once.
//!
//! ## Examples
//!
//! ```rust
//! use std::path::Path;
//! use epfmi_registry::{
//!     AllocationError, AllocationRequest, BuildingAllocator, BuildingRegistry, EngineHandle,
//!     VariableKind, ZoneRequest,
//! };
//!
//! struct Noop;
//!
//! impl BuildingAllocator for Noop {
//!     fn allocate(
//!         &self,
//!         request: &AllocationRequest<'_>,
//!     ) -> Result<EngineHandle, AllocationError> {
//!         Ok(EngineHandle::new(request.model_file.to_owned()))
//!     }
//! }
//!
//! let mut registry = BuildingRegistry::new();
//! let lib = Path::new("/opt/sim/libepfmi-9.0.1.so");
//! let office = ZoneRequest::new("Office.idf", "Chicago.epw", "Energy+.idd", "Core");
//! let zone = registry.initialize_zone(&office, lib, &Noop).unwrap();
//!
//! assert_eq!(zone.index(), Some(1));
//! assert_eq!(zone.variable_names(VariableKind::Input), ["Core.T"]);
//! assert_eq!(registry.zone_count("Office.idf"), 1);
//! ```
#![doc = document_features::document_features!()]
#![deny(clippy::all)]

pub mod allocator;
pub mod building;
mod global;
pub mod library;
pub mod registry;
pub mod variable;
pub mod zone;

pub use allocator::{AllocationError, AllocationRequest, BuildingAllocator, EngineHandle};
#[cfg(feature = "dylib")]
pub use allocator::{LibraryAllocator, LoadedEngine};
pub use building::{BuildingInstance, EngineState, ZoneEntry};
#[cfg(feature = "dylib")]
pub use global::initialize_zone;
pub use global::{initialize_zone_with, shutdown, with_registry};
pub use library::{current_library_path, resolve_library_path, EngineLibrary};
pub use registry::{BuildingRegistry, ZoneRequest};
pub use variable::{build_variable_names, VariableKind};
pub use zone::{ZoneDirectory, ZoneInstance, ZoneKey};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Out of memory: {0}")]
    OutOfMemory(#[from] std::collections::TryReserveError),

    #[error(
        "Zone '{zone}' is specified twice for building '{building}'. \
         Each zone must only be specified once."
    )]
    DuplicateZone { zone: String, building: String },

    #[error("Building '{0}' is already registered")]
    DuplicateBuilding(String),

    #[error("Zone '{zone}' is already attached to building '{building}'")]
    ZoneAlreadyAttached { zone: String, building: String },

    #[error("Unable to locate the engine library: {0}")]
    PathResolution(String),

    #[error("Engine allocation failed for building '{building}': {source}")]
    Allocation {
        building: String,
        #[source]
        source: AllocationError,
    },

    #[error("Engine of building '{building}' is already allocated")]
    EngineAlreadyAllocated { building: String },

    #[error("Engine of building '{building}' has not been allocated")]
    EngineNotAllocated { building: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Expected {expected} {kind} value references, found {found}")]
    ValueReferenceCount {
        kind: VariableKind,
        expected: usize,
        found: usize,
    },
}
