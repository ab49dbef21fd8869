use steward::adapters::file_store::JsonRegistryStore;
use steward::domain::ports::RegistryStore;
use steward::{StoreConfig, TaskPriority, TaskRecord, TaskRegistry, TaskState};

fn quick_config() -> StoreConfig {
    StoreConfig {
        lock_retry_attempts: 2,
        lock_retry_initial_ms: 1,
        lock_stale_secs: 300,
    }
}

#[tokio::test]
async fn test_round_trip_across_store_instances() {
    let dir = tempfile::tempdir().unwrap();

    let writer = JsonRegistryStore::new(dir.path(), quick_config());
    let mut registry = TaskRegistry::new();
    let mut record = TaskRecord::new("T1", "worker", "/tmp/t1.md", TaskPriority::High);
    record.transition_to(TaskState::Delegated).unwrap();
    record.delegation_attempts = 2;
    registry.insert(record);
    writer.save(&mut registry).await.unwrap();

    let reader = JsonRegistryStore::new(dir.path(), quick_config());
    let restored = reader.load().await.unwrap();
    assert_eq!(restored.session_id, registry.session_id);
    let record = restored.get("T1").unwrap();
    assert_eq!(record.state, TaskState::Delegated);
    assert_eq!(record.delegation_attempts, 2);
}

#[tokio::test]
async fn test_exclusive_lock_blocks_other_instance() {
    let dir = tempfile::tempdir().unwrap();
    let first = JsonRegistryStore::new(dir.path(), quick_config());
    let second = JsonRegistryStore::new(dir.path(), quick_config());

    let guard = first.lock_exclusive().await.unwrap();
    let err = second.lock_exclusive().await.unwrap_err();
    assert!(matches!(err, steward::StoreError::Busy { attempts: 2 }));

    drop(guard);
    second.lock_exclusive().await.unwrap();
}

#[tokio::test]
async fn test_backup_survives_torn_write() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonRegistryStore::new(dir.path(), quick_config());

    let mut registry = TaskRegistry::new();
    registry.insert(TaskRecord::new("T1", "worker", "/tmp/t1.md", TaskPriority::Medium));
    store.save(&mut registry).await.unwrap();
    registry.insert(TaskRecord::new("T2", "worker", "/tmp/t2.md", TaskPriority::Low));
    store.save(&mut registry).await.unwrap();

    // Simulate a torn write landing on disk after the backup was taken.
    std::fs::write(dir.path().join("registry.json"), "{\"session_id\": \"tru").unwrap();

    let recovered = store.load().await.unwrap();
    assert!(recovered.get("T1").is_some(), "backup must restore T1");

    // The damaged document was quarantined, not deleted.
    let quarantined = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .any(|e| e.file_name().to_string_lossy().contains("corrupt"));
    assert!(quarantined);
}

#[tokio::test]
async fn test_saves_are_atomic_under_interleaving() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonRegistryStore::new(dir.path(), quick_config());

    let mut registry = TaskRegistry::new();
    for i in 0..20 {
        registry.insert(TaskRecord::new(
            format!("T{i}"),
            "worker",
            "/tmp/t.md",
            TaskPriority::Medium,
        ));
        store.save(&mut registry).await.unwrap();

        // Every intermediate version on disk parses cleanly.
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.tasks.len(), i + 1);
    }
}
