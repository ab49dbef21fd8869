//! Executor port.
//!
//! The orchestrator never performs work itself; it hands tasks to an
//! external executor and polls for status. Any implementation of this
//! two-method contract is valid: a subprocess, an RPC client, a message
//! queue, or an in-process mock.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Everything an executor needs to take ownership of a task.
#[derive(Debug, Clone, Serialize)]
pub struct DelegationRequest<'a> {
    pub task_id: &'a str,
    pub agent: &'a str,
    pub task_file: &'a str,
}

/// Executor's answer to a delegation attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegationReply {
    pub success: bool,
    #[serde(default)]
    pub detail: String,
}

/// Executor's answer to a status poll.
///
/// Flags are not mutually exclusive; the orchestrator advances to the
/// furthest state the current state permits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseReport {
    #[serde(default)]
    pub accepted: bool,
    #[serde(default)]
    pub in_progress: bool,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub raw_output: String,
}

impl ResponseReport {
    /// True when the executor reported anything at all.
    pub fn has_signal(&self) -> bool {
        self.accepted || self.in_progress || self.completed
    }
}

/// Failure modes of an executor call, as seen by the orchestrator.
///
/// These are always recoverable: a failed call is recorded against the
/// task and retried or escalated by the state machine, never propagated
/// as a crash.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("executor invocation failed: {0}")]
    Invocation(String),

    #[error("executor returned unparseable output: {0}")]
    BadReply(String),
}

/// External collaborator that performs delegated work.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Hand a task to the executor.
    async fn delegate(&self, request: DelegationRequest<'_>)
        -> Result<DelegationReply, ExecutorError>;

    /// Poll the executor for the task's current status.
    async fn check_response(&self, task_id: &str) -> Result<ResponseReport, ExecutorError>;
}
