//! Implementation of the `steward check` command.

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::TaskRecord;
use crate::infrastructure::ConfigLoader;
use crate::services::CheckOutcome;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Task identifier
    pub task_id: String,
}

#[derive(Debug, serde::Serialize)]
pub struct CheckOutput {
    pub success: bool,
    pub outcome: String,
    pub record: TaskRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_until: Option<String>,
}

impl CommandOutput for CheckOutput {
    fn to_human(&self) -> String {
        let id = &self.record.task_id;
        match self.outcome.as_str() {
            "waiting" => format!(
                "Task {id} is waiting; next check not before {}.",
                self.wait_until.as_deref().unwrap_or("?")
            ),
            "advanced" => format!(
                "Task {id} advanced to {} (check {}).",
                self.record.state.as_str(),
                self.record.check_attempts
            ),
            "suspended" => format!(
                "Task {id} polling suspended until {} (near its ETA).",
                self.wait_until.as_deref().unwrap_or("?")
            ),
            "still_waiting" => format!(
                "Task {id} has no new status (check {}); next check after {}.",
                self.record.check_attempts,
                self.wait_until.as_deref().unwrap_or("?")
            ),
            _ => format!(
                "Task {id} escalated: {}",
                self.record
                    .escalation_reason
                    .as_deref()
                    .unwrap_or("unknown reason")
            ),
        }
    }
}

pub async fn execute(args: CheckArgs, json_mode: bool) -> Result<()> {
    let config = ConfigLoader::load()?;
    let orchestrator = super::build_orchestrator(&config);

    let outcome = orchestrator
        .check_response(&args.task_id)
        .await
        .context("Failed to check task response")?;

    let output_data = match outcome {
        CheckOutcome::Waiting { record, until } => CheckOutput {
            success: true,
            outcome: "waiting".to_string(),
            record,
            wait_until: Some(until.to_rfc3339()),
        },
        CheckOutcome::Advanced { record, .. } => CheckOutput {
            success: true,
            outcome: "advanced".to_string(),
            record,
            wait_until: None,
        },
        CheckOutcome::Suspended { record, until } => CheckOutput {
            success: true,
            outcome: "suspended".to_string(),
            record,
            wait_until: Some(until.to_rfc3339()),
        },
        CheckOutcome::StillWaiting { record, until } => CheckOutput {
            success: true,
            outcome: "still_waiting".to_string(),
            record,
            wait_until: Some(until.to_rfc3339()),
        },
        CheckOutcome::Escalated(record) => CheckOutput {
            success: false,
            outcome: "escalated".to_string(),
            record,
            wait_until: None,
        },
    };

    output(&output_data, json_mode);
    Ok(())
}
