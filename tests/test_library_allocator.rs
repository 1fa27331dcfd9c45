#![cfg(feature = "dylib")]

use std::path::Path;

use epfmi_registry::{BuildingRegistry, EngineLibrary, Error, LibraryAllocator, ZoneRequest};

#[test_log::test]
fn test_missing_engine_library() {
    let dir = tempfile::tempdir().unwrap();
    let lib_path = EngineLibrary::default()
        .resolve(&dir.path().join("simulator"))
        .unwrap();
    assert_eq!(lib_path.parent(), Some(dir.path()));

    let mut registry = BuildingRegistry::new();
    let request = ZoneRequest::new("B.idf", "W.epw", "E.idd", "Zone1");
    let err = registry
        .initialize_zone(&request, &lib_path, &LibraryAllocator)
        .unwrap_err();
    assert!(matches!(err, Error::Allocation { ref building, .. } if building == "B.idf"));
    assert!(registry.is_empty());
}

#[test_log::test]
fn test_invalid_engine_library() {
    let dir = tempfile::tempdir().unwrap();
    let lib_path = EngineLibrary::default()
        .resolve(&dir.path().join("simulator"))
        .unwrap();
    std::fs::write(&lib_path, b"not a shared library").unwrap();

    let mut registry = BuildingRegistry::new();
    let request = ZoneRequest::new("B.idf", "W.epw", "E.idd", "Zone1");
    let err = registry
        .initialize_zone(&request, Path::new(&lib_path), &LibraryAllocator)
        .unwrap_err();
    assert!(matches!(err, Error::Allocation { .. }));
    assert_eq!(registry.zone_count("B.idf"), 0);
}
