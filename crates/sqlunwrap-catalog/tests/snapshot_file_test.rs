//! Loading catalog snapshots from disk.

use std::path::Path;

use sqlunwrap_catalog::{load_snapshot, CatalogStore, SessionSource};
use sqlunwrap_core::UnwrapError;
use tempfile::TempDir;

fn write_snapshot(dir: &Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("snapshot.toml");
    std::fs::write(&path, content).expect("write snapshot");
    path
}

#[test]
fn load_multi_object_snapshot() {
    let tmp = TempDir::new().unwrap();
    let path = write_snapshot(
        tmp.path(),
        r#"
database = "Inventory"
family_guid = "6f9619ff-8b86-d011-b42d-00c04fc964ff"

[[objects]]
name = "dbo.usp_restock"
id = 1205579333

[[objects.fragments]]
subobjid = 0
imageval = "0x00112233"

[[objects]]
name = "reporting.v_levels"
id = 1221579390

[[objects.fragments]]
subobjid = 1
imageval = "AQID"

[[objects.fragments]]
subobjid = 0
imageval = "0x04"
"#,
    );

    let catalog = load_snapshot(&path).expect("snapshot should load");
    assert_eq!(catalog.database(), "Inventory");
    assert_eq!(catalog.object_count(), 2);

    let mut session = catalog.open_session().unwrap();
    assert_eq!(
        session.lookup_object_id("inventory.dbo.usp_restock").unwrap(),
        Some(1205579333)
    );
    assert_eq!(
        session.lookup_object_id("reporting.v_levels").unwrap(),
        Some(1221579390)
    );

    let family = session.lookup_family_id().unwrap().unwrap();
    assert_eq!(
        family,
        vec![
            0xff, 0x19, 0x96, 0x6f, 0x86, 0x8b, 0x11, 0xd0, 0xb4, 0x2d, 0x00, 0xc0, 0x4f, 0xc9,
            0x64, 0xff
        ]
    );

    let rows = session.lookup_encrypted_payloads(1221579390).unwrap();
    assert_eq!(rows, vec![(vec![1, 2, 3], 1), (vec![4], 0)]);
}

#[test]
fn missing_file_is_io_error() {
    let tmp = TempDir::new().unwrap();
    let err = load_snapshot(&tmp.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, UnwrapError::Io(_)));
}

#[test]
fn malformed_file_names_path() {
    let tmp = TempDir::new().unwrap();
    let path = write_snapshot(tmp.path(), "objects = 3");
    let err = load_snapshot(&path).unwrap_err();
    assert!(matches!(err, UnwrapError::Config(_)));
    assert!(err.to_string().contains("snapshot.toml"), "{err}");
}
