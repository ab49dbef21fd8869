//! Implementation of the `steward delegate` command.

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::TaskRecord;
use crate::infrastructure::ConfigLoader;
use crate::services::DelegationOutcome;

#[derive(Args, Debug)]
pub struct DelegateArgs {
    /// Task identifier
    pub task_id: String,
}

#[derive(Debug, serde::Serialize)]
pub struct DelegateOutput {
    pub success: bool,
    pub outcome: String,
    pub record: TaskRecord,
}

impl CommandOutput for DelegateOutput {
    fn to_human(&self) -> String {
        match self.outcome.as_str() {
            "delegated" => format!(
                "Task {} delegated to {} (attempt {}).",
                self.record.task_id, self.record.agent, self.record.delegation_attempts
            ),
            _ => format!(
                "Task {} escalated: {}",
                self.record.task_id,
                self.record
                    .escalation_reason
                    .as_deref()
                    .unwrap_or("unknown reason")
            ),
        }
    }
}

pub async fn execute(args: DelegateArgs, json_mode: bool) -> Result<()> {
    let config = ConfigLoader::load()?;
    let orchestrator = super::build_orchestrator(&config);

    let outcome = orchestrator
        .delegate_task(&args.task_id)
        .await
        .context("Failed to delegate task")?;

    let output_data = match outcome {
        DelegationOutcome::Delegated(record) => DelegateOutput {
            success: true,
            outcome: "delegated".to_string(),
            record,
        },
        DelegationOutcome::Escalated(record) => DelegateOutput {
            success: false,
            outcome: "escalated".to_string(),
            record,
        },
    };

    output(&output_data, json_mode);
    Ok(())
}
