//! indexcheck - Find drift between search clusters and expected tenant indices
//!
//! This CLI enables operators to:
//! - Check every cluster for missing, unexpected and doubly claimed indices
//! - Inspect the fleet layout the check runs against

use clap::{Parser, Subcommand};

use indexcheck_cli::commands;
use indexcheck_cli::config::Settings;
use indexcheck_cli::error::CliResult;
use indexcheck_cli::logging::init_logging;

/// indexcheck - Search cluster index drift checker
#[derive(Parser)]
#[command(name = "indexcheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log filter (overrides INDEXCHECK_LOG; RUST_LOG wins over both)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Write logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check every cluster against the expected tenant state
    Check(commands::check::CheckArgs),

    /// Show the effective fleet layout
    Layout(commands::layout::LayoutArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = run(cli).await;

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            e.print();
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let settings = Settings::from_env()?;
    let filter = cli.log_level.as_deref().unwrap_or(&settings.log_filter);
    init_logging(filter, cli.log_json)?;

    match cli.command {
        Commands::Check(args) => commands::check::execute(args, &settings).await,
        Commands::Layout(args) => commands::layout::execute(args),
    }
}
