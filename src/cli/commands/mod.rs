//! Command implementations.
//!
//! Each command module owns its clap `Args` struct, an output struct
//! implementing [`CommandOutput`](crate::cli::output::CommandOutput),
//! and an `execute` entry point.

pub mod check;
pub mod clear_violations;
pub mod define;
pub mod delegate;
pub mod force_complete;
pub mod init;
pub mod report;
pub mod reset;
pub mod status;

use std::sync::Arc;

use async_trait::async_trait;

use crate::adapters::executor::ProcessExecutor;
use crate::adapters::file_store::JsonRegistryStore;
use crate::domain::models::Config;
use crate::domain::ports::{
    DelegationReply, DelegationRequest, ExecutorError, ResponseReport, TaskExecutor,
};
use crate::services::Orchestrator;

/// Wire the orchestrator from configuration.
pub(crate) fn build_orchestrator(config: &Config) -> Orchestrator {
    let store = Arc::new(JsonRegistryStore::new(
        config.data_dir.clone(),
        config.store.clone(),
    ));
    let executor: Arc<dyn TaskExecutor> = match ProcessExecutor::from_config(&config.executor) {
        Some(executor) => Arc::new(executor),
        None => Arc::new(UnconfiguredExecutor),
    };
    Orchestrator::new(store, executor, config.orchestrator.clone())
}

const NO_EXECUTOR_MSG: &str =
    "no executor command configured; set executor.command in .steward/config.yaml";

/// Stand-in executor used when no command is configured. Commands that
/// do not reach the executor (define, status, report, overrides) still
/// work; delegate and check fail with a clear message.
struct UnconfiguredExecutor;

#[async_trait]
impl TaskExecutor for UnconfiguredExecutor {
    async fn delegate(
        &self,
        _request: DelegationRequest<'_>,
    ) -> Result<DelegationReply, ExecutorError> {
        Err(ExecutorError::Invocation(NO_EXECUTOR_MSG.to_string()))
    }

    async fn check_response(&self, _task_id: &str) -> Result<ResponseReport, ExecutorError> {
        Err(ExecutorError::Invocation(NO_EXECUTOR_MSG.to_string()))
    }
}
