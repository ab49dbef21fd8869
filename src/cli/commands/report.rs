//! Implementation of the `steward report` command.

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::{format_report, output, CommandOutput};
use crate::domain::models::RegistryReport;
use crate::infrastructure::ConfigLoader;

#[derive(Args, Debug)]
pub struct ReportArgs {}

#[derive(Debug, serde::Serialize)]
pub struct ReportOutput {
    #[serde(flatten)]
    pub report: RegistryReport,
}

impl CommandOutput for ReportOutput {
    fn to_human(&self) -> String {
        format_report(&self.report)
    }
}

pub async fn execute(_args: ReportArgs, json_mode: bool) -> Result<()> {
    let config = ConfigLoader::load()?;
    let orchestrator = super::build_orchestrator(&config);

    let report = orchestrator
        .report()
        .await
        .context("Failed to build registry report")?;

    output(&ReportOutput { report }, json_mode);
    Ok(())
}
