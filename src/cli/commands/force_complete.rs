//! Implementation of the `steward force-complete` command.

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::TaskRecord;
use crate::infrastructure::ConfigLoader;

#[derive(Args, Debug)]
pub struct ForceCompleteArgs {
    /// Task identifier
    pub task_id: String,

    /// Why the task is being completed by hand
    #[arg(short, long, default_value = "operator override")]
    pub reason: String,
}

#[derive(Debug, serde::Serialize)]
pub struct ForceCompleteOutput {
    pub success: bool,
    pub record: TaskRecord,
}

impl CommandOutput for ForceCompleteOutput {
    fn to_human(&self) -> String {
        format!("Task {} marked completed.", self.record.task_id)
    }
}

pub async fn execute(args: ForceCompleteArgs, json_mode: bool) -> Result<()> {
    let config = ConfigLoader::load()?;
    let orchestrator = super::build_orchestrator(&config);

    let record = orchestrator
        .force_complete(&args.task_id, &args.reason)
        .await
        .context("Failed to force-complete task")?;

    output(
        &ForceCompleteOutput {
            success: true,
            record,
        },
        json_mode,
    );
    Ok(())
}
