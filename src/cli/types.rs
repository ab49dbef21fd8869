//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};

use crate::cli::commands;

#[derive(Parser)]
#[command(name = "steward")]
#[command(about = "Steward - Persistent task delegation orchestrator", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the project-local data directory and configuration
    Init(commands::init::InitArgs),

    /// Register a task so it can be delegated
    Define(commands::define::DefineArgs),

    /// Hand a defined task to the configured executor
    Delegate(commands::delegate::DelegateArgs),

    /// Poll the executor for progress on a delegated task
    Check(commands::check::CheckArgs),

    /// Show one task or every tracked task
    Status(commands::status::StatusArgs),

    /// Operator override: force a task into a given state
    Reset(commands::reset::ResetArgs),

    /// Aggregate report over the whole registry
    Report(commands::report::ReportArgs),

    /// Operator override: mark a task completed regardless of state
    ForceComplete(commands::force_complete::ForceCompleteArgs),

    /// Drop all recorded protocol violations
    ClearViolations(commands::clear_violations::ClearViolationsArgs),
}
