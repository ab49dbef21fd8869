//! Implementation of the `steward define` command.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{TaskPriority, TaskRecord};
use crate::infrastructure::ConfigLoader;

#[derive(Args, Debug)]
pub struct DefineArgs {
    /// Task identifier
    pub task_id: String,

    /// Agent responsible for carrying out the task
    #[arg(short, long)]
    pub agent: String,

    /// Path to the task description file
    #[arg(short, long)]
    pub task_file: String,

    /// Task priority (low, medium, high)
    #[arg(short, long, default_value = "medium")]
    pub priority: String,

    /// Estimated completion time, RFC 3339 (e.g. 2026-08-24T18:00:00Z)
    #[arg(long)]
    pub eta: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct DefineOutput {
    pub success: bool,
    pub record: TaskRecord,
}

impl CommandOutput for DefineOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Task {} defined.", self.record.task_id),
            format!("  Agent: {}", self.record.agent),
            format!("  Task file: {}", self.record.task_file),
            format!("  Priority: {}", self.record.priority.as_str()),
        ];
        if let Some(eta) = self.record.estimated_completion {
            lines.push(format!("  Estimated completion: {}", eta.to_rfc3339()));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: DefineArgs, json_mode: bool) -> Result<()> {
    let Some(priority) = TaskPriority::from_str(&args.priority) else {
        bail!("Invalid priority '{}'; expected low, medium or high", args.priority);
    };

    let eta = match &args.eta {
        Some(raw) => Some(
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .with_context(|| format!("Invalid --eta value '{raw}'; expected RFC 3339"))?,
        ),
        None => None,
    };

    let config = ConfigLoader::load()?;
    let orchestrator = super::build_orchestrator(&config);

    let record = orchestrator
        .define_task(&args.task_id, &args.agent, &args.task_file, priority, eta)
        .await
        .context("Failed to define task")?;

    output(
        &DefineOutput {
            success: true,
            record,
        },
        json_mode,
    );
    Ok(())
}
