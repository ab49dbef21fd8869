//! Implementation of the `steward clear-violations` command.

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::ConfigLoader;

#[derive(Args, Debug)]
pub struct ClearViolationsArgs {}

#[derive(Debug, serde::Serialize)]
pub struct ClearViolationsOutput {
    pub success: bool,
    pub cleared: usize,
}

impl CommandOutput for ClearViolationsOutput {
    fn to_human(&self) -> String {
        if self.cleared == 0 {
            "No protocol violations recorded.".to_string()
        } else {
            format!("Cleared {} protocol violation(s).", self.cleared)
        }
    }
}

pub async fn execute(_args: ClearViolationsArgs, json_mode: bool) -> Result<()> {
    let config = ConfigLoader::load()?;
    let orchestrator = super::build_orchestrator(&config);

    let cleared = orchestrator
        .clear_violations()
        .await
        .context("Failed to clear protocol violations")?;

    output(
        &ClearViolationsOutput {
            success: true,
            cleared,
        },
        json_mode,
    );
    Ok(())
}
