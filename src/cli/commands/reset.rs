//! Implementation of the `steward reset` command.

use anyhow::{bail, Context, Result};
use clap::Args;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{TaskRecord, TaskState};
use crate::infrastructure::ConfigLoader;

#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Task identifier
    pub task_id: String,

    /// Target state (undefined, defined, delegated, accepted,
    /// in_progress, completed, error, escalated)
    #[arg(short, long, default_value = "defined")]
    pub to_state: String,
}

#[derive(Debug, serde::Serialize)]
pub struct ResetOutput {
    pub success: bool,
    pub record: TaskRecord,
}

impl CommandOutput for ResetOutput {
    fn to_human(&self) -> String {
        format!(
            "Task {} reset to {}. Attempt counters cleared.",
            self.record.task_id,
            self.record.state.as_str()
        )
    }
}

pub async fn execute(args: ResetArgs, json_mode: bool) -> Result<()> {
    let Some(to_state) = TaskState::from_str(&args.to_state) else {
        bail!("Invalid state '{}'", args.to_state);
    };

    let config = ConfigLoader::load()?;
    let orchestrator = super::build_orchestrator(&config);

    let record = orchestrator
        .reset_task(&args.task_id, to_state)
        .await
        .context("Failed to reset task")?;

    output(
        &ResetOutput {
            success: true,
            record,
        },
        json_mode,
    );
    Ok(())
}
