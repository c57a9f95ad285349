//! Tests for fleet manifest loading

use std::io::Write;

use encryption_migrator::client::memory::{FleetManifest, InMemoryControlService, ManifestError};
use encryption_migrator::ControlService;

#[test]
fn test_load_manifest_with_default_status() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"instances": [{{"id": "orders-db"}}, {{"id": "crm-db", "status": "modifying"}}]}}"#
    )
    .unwrap();

    let manifest = FleetManifest::load(file.path()).unwrap();
    assert_eq!(manifest.instances.len(), 2);
    assert_eq!(manifest.instances[0].id, "orders-db");
    assert_eq!(manifest.instances[0].status, "available");
    assert_eq!(manifest.instances[1].status, "modifying");
}

#[test]
fn test_load_rejects_malformed_manifest() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "not json").unwrap();
    assert!(matches!(
        FleetManifest::load(file.path()),
        Err(ManifestError::Parse(_))
    ));
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    assert!(matches!(
        FleetManifest::load(&path),
        Err(ManifestError::Io(_))
    ));
}

#[tokio::test]
async fn test_manifest_seeds_fleet() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"instances": [{{"id": "orders-db"}}]}}"#).unwrap();
    let manifest = FleetManifest::load(file.path()).unwrap();

    let client = InMemoryControlService::from_manifest(&manifest);
    let listing = client.list_instances().await.unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].id, "orders-db");
    assert_eq!(listing[0].status, "available");
}
