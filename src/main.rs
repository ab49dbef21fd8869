//! Steward CLI entry point.

use clap::Parser;

use steward::cli::{Cli, Commands};
use steward::infrastructure::{ConfigLoader, Logger};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logging comes up before command dispatch; a broken config file
    // still gets stderr diagnostics at the defaults.
    let logging = ConfigLoader::load()
        .map(|config| config.logging)
        .unwrap_or_default();
    let _logger = Logger::init(&logging).ok();

    let result = match cli.command {
        Commands::Init(args) => steward::cli::commands::init::execute(args, cli.json).await,
        Commands::Define(args) => steward::cli::commands::define::execute(args, cli.json).await,
        Commands::Delegate(args) => steward::cli::commands::delegate::execute(args, cli.json).await,
        Commands::Check(args) => steward::cli::commands::check::execute(args, cli.json).await,
        Commands::Status(args) => steward::cli::commands::status::execute(args, cli.json).await,
        Commands::Reset(args) => steward::cli::commands::reset::execute(args, cli.json).await,
        Commands::Report(args) => steward::cli::commands::report::execute(args, cli.json).await,
        Commands::ForceComplete(args) => {
            steward::cli::commands::force_complete::execute(args, cli.json).await
        }
        Commands::ClearViolations(args) => {
            steward::cli::commands::clear_violations::execute(args, cli.json).await
        }
    };

    if let Err(err) = result {
        steward::cli::handle_error(err, cli.json);
    }
}
