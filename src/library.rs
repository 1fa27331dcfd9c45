//! Location of the engine shared library.
//!
//! The engine library is shipped next to the simulator executable, so its path is derived from
//! the running process image: the file name is replaced by `{stem}-{version}.{extension}`.

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Naming convention of the engine shared library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineLibrary {
    /// File name stem, including any platform prefix
    pub stem: String,
    /// Engine version token appended to the stem
    pub version: String,
    /// Shared-library extension without the leading `.`
    pub extension: String,
}

impl Default for EngineLibrary {
    fn default() -> Self {
        Self {
            stem: "libepfmi".to_owned(),
            version: "9.0.1".to_owned(),
            extension: std::env::consts::DLL_EXTENSION.to_owned(),
        }
    }
}

impl EngineLibrary {
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// The library file name, e.g. `libepfmi-9.0.1.so`
    pub fn file_name(&self) -> String {
        format!("{}-{}.{}", self.stem, self.version, self.extension)
    }

    /// Resolve the library path next to the given process image.
    ///
    /// The path is not checked for existence; loading it is the allocator's job.
    pub fn resolve(&self, image_path: &Path) -> Result<PathBuf> {
        let dir = image_path
            .file_name()
            .and(image_path.parent())
            .ok_or_else(|| {
                Error::PathResolution(format!(
                    "process image path {image_path:?} has no parent directory"
                ))
            })?;
        let lib_path = dir.join(self.file_name());
        log::trace!("Resolved engine library {lib_path:?} from process image {image_path:?}");
        Ok(lib_path)
    }

    /// Resolve the library path next to the currently running executable.
    pub fn resolve_current(&self) -> Result<PathBuf> {
        let image_path = std::env::current_exe().map_err(|err| {
            Error::PathResolution(format!("unable to determine the process image: {err}"))
        })?;
        self.resolve(&image_path)
    }
}

/// Resolve the path of the default engine library next to `image_path`.
pub fn resolve_library_path(image_path: impl AsRef<Path>) -> Result<PathBuf> {
    EngineLibrary::default().resolve(image_path.as_ref())
}

/// Resolve the path of the default engine library next to the running executable.
pub fn current_library_path() -> Result<PathBuf> {
    EngineLibrary::default().resolve_current()
}
