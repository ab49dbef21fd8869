//! Shared test fixtures.

pub mod executor;

use std::path::Path;
use std::sync::Arc;

use steward::adapters::file_store::JsonRegistryStore;
use steward::{Orchestrator, OrchestratorConfig, StoreConfig};

use self::executor::MockExecutor;

pub struct Harness {
    pub orchestrator: Orchestrator,
    pub executor: Arc<MockExecutor>,
    pub dir: tempfile::TempDir,
}

/// Orchestrator over a fresh temp directory with a scripted executor.
pub fn harness_with(config: OrchestratorConfig) -> Harness {
    let dir = tempfile::tempdir().expect("tempdir");
    let executor = Arc::new(MockExecutor::new());
    let store = Arc::new(JsonRegistryStore::new(dir.path(), StoreConfig::default()));
    let orchestrator = Orchestrator::new(store, executor.clone(), config);
    Harness {
        orchestrator,
        executor,
        dir,
    }
}

pub fn harness() -> Harness {
    harness_with(test_config())
}

/// Defaults tuned so tests never sleep: no initial wait between checks
/// and a loop-guard ceiling high enough for multi-step scenarios.
pub fn test_config() -> OrchestratorConfig {
    OrchestratorConfig {
        initial_check_wait_secs: 0,
        max_operations_per_cycle: 50,
        ..OrchestratorConfig::default()
    }
}

/// A second orchestrator sharing the harness's data directory, as a
/// separate process would.
pub fn attach(dir: &Path, config: OrchestratorConfig) -> (Orchestrator, Arc<MockExecutor>) {
    let executor = Arc::new(MockExecutor::new());
    let store = Arc::new(JsonRegistryStore::new(dir, StoreConfig::default()));
    (
        Orchestrator::new(store, executor.clone(), config),
        executor,
    )
}

/// Write a task description file and return its path as a string.
pub fn write_task_file(dir: &Path, name: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, "# task\ndo the thing\n").expect("write task file");
    path.to_string_lossy().into_owned()
}
