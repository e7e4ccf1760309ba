use pcb_ir::artifact::{Artifact, ArtifactKind, CreatedBy, SourceEngine};
use pcb_store::{ArtifactStore, StoreError};
use serial_test::serial;

fn temp_store() -> (tempfile::TempDir, ArtifactStore<String>) {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::open(dir.path());
    (dir, store)
}

#[test]
#[serial]
fn create_then_read_round_trips() {
    let (_dir, store) = temp_store();
    let artifact = Artifact::new(
        ArtifactKind::PcbBoard,
        "hello".to_string(),
        Some(SourceEngine::Altium),
        CreatedBy::Engine,
    );
    let created = store.create(artifact).unwrap();
    let read = store.read(created.id, None).unwrap();
    assert_eq!(read.data, "hello");
    assert_eq!(read.version, 1);
}

#[test]
#[serial]
fn update_requires_strictly_greater_version() {
    let (_dir, store) = temp_store();
    let artifact = Artifact::new(ArtifactKind::PcbBoard, "v1".to_string(), None, CreatedBy::Engine);
    let created = store.create(artifact).unwrap();

    let mut stale = created.clone();
    stale.data = "stale".to_string();
    let err = store.update(stale).unwrap_err();
    assert!(matches!(err, StoreError::VersionConflict { .. }));

    let next = created.with_next_version("v2".to_string());
    let updated = store.update(next).unwrap();
    assert_eq!(updated.version, 2);
    assert_eq!(store.read(created.id, None).unwrap().data, "v2");
}

#[test]
#[serial]
fn history_lists_ascending_versions() {
    let (_dir, store) = temp_store();
    let v1 = store
        .create(Artifact::new(ArtifactKind::Patch, "a".to_string(), None, CreatedBy::User))
        .unwrap();
    let v2 = store.update(v1.with_next_version("b".to_string())).unwrap();
    let _v3 = store.update(v2.with_next_version("c".to_string())).unwrap();

    assert_eq!(store.history(v1.id).unwrap(), vec![1, 2, 3]);
}

#[test]
#[serial]
fn read_missing_artifact_is_not_found() {
    let (_dir, store) = temp_store();
    let err = store.read(uuid::Uuid::new_v4(), None).unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[test]
#[serial]
fn list_filters_by_kind() {
    let (_dir, store) = temp_store();
    store
        .create(Artifact::new(ArtifactKind::PcbBoard, "board".to_string(), None, CreatedBy::Engine))
        .unwrap();
    store
        .create(Artifact::new(ArtifactKind::Patch, "patch".to_string(), None, CreatedBy::User))
        .unwrap();

    assert_eq!(store.list(Some(ArtifactKind::PcbBoard)).unwrap().len(), 1);
    assert_eq!(store.list(None).unwrap().len(), 2);
}

#[test]
#[serial]
fn delete_removes_all_versions() {
    let (_dir, store) = temp_store();
    let created = store
        .create(Artifact::new(ArtifactKind::Violations, "v".to_string(), None, CreatedBy::Engine))
        .unwrap();
    store.delete(created.id).unwrap();
    assert!(matches!(store.read(created.id, None).unwrap_err(), StoreError::NotFound { .. }));
}
