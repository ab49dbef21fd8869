//! Subprocess-backed executor adapter.
//!
//! Shells out to a configured command, once per call:
//!
//! ```text
//! <command> [args..] delegate <task_id> --agent <agent> --task-file <file>
//! <command> [args..] check <task_id>
//! ```
//!
//! The command replies on stdout with a single JSON object matching
//! [`DelegationReply`] / [`ResponseReport`]. Non-zero exit or output
//! that fails to parse is an executor failure, which the orchestrator
//! records against the task and retries or escalates.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::domain::models::ExecutorConfig;
use crate::domain::ports::{
    DelegationReply, DelegationRequest, ExecutorError, ResponseReport, TaskExecutor,
};

/// `TaskExecutor` that spawns an external command per operation.
pub struct ProcessExecutor {
    command: String,
    base_args: Vec<String>,
}

impl ProcessExecutor {
    /// Build from configuration; `None` when no command is configured.
    pub fn from_config(config: &ExecutorConfig) -> Option<Self> {
        config.command.as_ref().map(|command| Self {
            command: command.clone(),
            base_args: config.args.clone(),
        })
    }

    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            base_args: Vec::new(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String, ExecutorError> {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.base_args)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(command = %self.command, ?args, "invoking executor");

        let output = cmd
            .output()
            .await
            .map_err(|e| ExecutorError::Invocation(format!("failed to spawn executor: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExecutorError::Invocation(format!(
                "executor exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl TaskExecutor for ProcessExecutor {
    async fn delegate(
        &self,
        request: DelegationRequest<'_>,
    ) -> Result<DelegationReply, ExecutorError> {
        let stdout = self
            .run(&[
                "delegate",
                request.task_id,
                "--agent",
                request.agent,
                "--task-file",
                request.task_file,
            ])
            .await?;

        serde_json::from_str(stdout.trim())
            .map_err(|e| ExecutorError::BadReply(format!("{e}: {}", stdout.trim())))
    }

    async fn check_response(&self, task_id: &str) -> Result<ResponseReport, ExecutorError> {
        let stdout = self.run(&["check", task_id]).await?;

        let mut report: ResponseReport = serde_json::from_str(stdout.trim())
            .map_err(|e| ExecutorError::BadReply(format!("{e}: {}", stdout.trim())))?;
        if report.raw_output.is_empty() {
            report.raw_output = stdout.trim().to_string();
        }
        Ok(report)
    }
}
