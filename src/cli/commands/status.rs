//! Implementation of the `steward status` command.

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::{format_event_log, format_task_table, output, CommandOutput};
use crate::domain::models::TaskRecord;
use crate::infrastructure::ConfigLoader;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Task identifier; omit to list every tracked task
    pub task_id: Option<String>,

    /// Include the task's lifecycle event log
    #[arg(short, long)]
    pub events: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct StatusOutput {
    pub tasks: Vec<TaskRecord>,
    #[serde(skip)]
    pub show_events: bool,
}

impl CommandOutput for StatusOutput {
    fn to_human(&self) -> String {
        if self.tasks.is_empty() {
            return "No tasks tracked.".to_string();
        }

        let mut sections = vec![format_task_table(&self.tasks)];
        if self.show_events {
            for record in &self.tasks {
                sections.push(format!("\nEvents for {}:", record.task_id));
                sections.push(format_event_log(record));
            }
        }
        sections.join("\n")
    }
}

pub async fn execute(args: StatusArgs, json_mode: bool) -> Result<()> {
    let config = ConfigLoader::load()?;
    let orchestrator = super::build_orchestrator(&config);

    let tasks = orchestrator
        .status(args.task_id.as_deref())
        .await
        .context("Failed to read task status")?;

    output(
        &StatusOutput {
            tasks,
            show_events: args.events,
        },
        json_mode,
    );
    Ok(())
}
