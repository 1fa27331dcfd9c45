//! Engine instantiation for a building.

use std::{any::Any, fmt, path::Path, sync::Arc};

use crate::zone::ZoneKey;

/// Error type returned by a [`BuildingAllocator`]. It is carried unchanged as the source of
/// [`crate::Error::Allocation`].
pub type AllocationError = Box<dyn std::error::Error + Send + Sync>;

/// Everything an allocator needs to instantiate the engine for a building.
#[derive(Debug, Clone, Copy)]
pub struct AllocationRequest<'a> {
    /// Building model file, also the building identity
    pub model_file: &'a str,
    /// Weather file
    pub weather_file: &'a str,
    /// Engine input data dictionary
    pub schema_file: &'a str,
    /// Path of the engine shared library
    pub library_path: &'a Path,
    /// Name of the zone that triggered the allocation
    pub zone_name: &'a str,
    /// Key of the zone that triggered the allocation
    pub zone_key: &'a ZoneKey,
}

/// Opaque connection to a running engine instance.
#[derive(Clone)]
pub struct EngineHandle(Arc<dyn Any + Send + Sync>);

impl EngineHandle {
    pub fn new<T: Any + Send + Sync>(engine: T) -> Self {
        Self(Arc::new(engine))
    }

    /// Access the concrete engine type produced by the allocator.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    /// True if both handles refer to the same engine instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EngineHandle")
            .field(&Arc::as_ptr(&self.0))
            .finish()
    }
}

/// Instantiates the engine for a building the first time one of its zones is registered.
pub trait BuildingAllocator {
    fn allocate(&self, request: &AllocationRequest<'_>) -> Result<EngineHandle, AllocationError>;
}

impl<A: BuildingAllocator + ?Sized> BuildingAllocator for &A {
    fn allocate(&self, request: &AllocationRequest<'_>) -> Result<EngineHandle, AllocationError> {
        (**self).allocate(request)
    }
}

#[cfg(feature = "dylib")]
pub use self::dylib::{LibraryAllocator, LoadedEngine};

#[cfg(feature = "dylib")]
mod dylib {
    use std::path::PathBuf;

    use super::{AllocationError, AllocationRequest, BuildingAllocator, EngineHandle};

    /// An engine library opened for one building.
    #[derive(Debug)]
    pub struct LoadedEngine {
        pub library: libloading::Library,
        pub library_path: PathBuf,
        pub model_file: PathBuf,
        pub weather_file: PathBuf,
        pub schema_file: PathBuf,
    }

    /// Allocator that opens the engine shared library with `libloading`.
    ///
    /// The library is only loaded here; instantiating and starting the engine is left to the
    /// connect phase that follows once all zones are registered.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct LibraryAllocator;

    impl BuildingAllocator for LibraryAllocator {
        fn allocate(
            &self,
            request: &AllocationRequest<'_>,
        ) -> Result<EngineHandle, AllocationError> {
            log::debug!(
                "Loading engine library {:?} for building '{}'",
                request.library_path,
                request.model_file
            );
            let library = unsafe { libloading::Library::new(request.library_path)? };
            Ok(EngineHandle::new(LoadedEngine {
                library,
                library_path: request.library_path.to_path_buf(),
                model_file: PathBuf::from(request.model_file),
                weather_file: PathBuf::from(request.weather_file),
                schema_file: PathBuf::from(request.schema_file),
            }))
        }
    }
}
