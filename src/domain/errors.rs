//! Domain errors for the orchestrator core.

use thiserror::Error;

/// Errors surfaced by orchestrator operations.
///
/// Everything here except `ProtocolViolation` is a typed, recoverable
/// failure the caller is expected to handle; `ProtocolViolation` exists
/// to force a looping caller to stop.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("task reference does not resolve: {0}")]
    InvalidReference(String),

    #[error("task already defined: {0}")]
    DuplicateTask(String),

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("operation {operation} not permitted for task {task_id} in state {from}")]
    InvalidTransition {
        task_id: String,
        from: String,
        operation: String,
    },

    #[error("executor call timed out after {timeout_secs}s for task {task_id}")]
    ExecutorTimeout { task_id: String, timeout_secs: u64 },

    #[error("executor failed for task {task_id}: {detail}")]
    ExecutorFailure { task_id: String, detail: String },

    #[error(
        "protocol violation: {operation} invoked {count} times consecutively for task {task_id}"
    )]
    ProtocolViolation {
        operation: String,
        task_id: String,
        count: u32,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised by the durable registry store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store is busy: lock not acquired after {attempts} attempts")]
    Busy { attempts: u32 },

    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store write failed, backup restored: {detail}")]
    WriteFailed { detail: String },
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
