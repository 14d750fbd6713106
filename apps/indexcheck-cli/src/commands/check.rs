//! Check every cluster of the fleet against the expected tenant state

use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use indexcheck_core::model::ExpectedTenantState;
use indexcheck_fleet::{
    run_fleet_check, CommandTenantSource, FileTenantSource, FleetRun, HttpStateFetcher,
    RunOptions, TenantStateSource,
};

use crate::cache::RunCache;
use crate::config::{load_layout, Settings};
use crate::error::{CliError, CliResult};
use crate::output::{print_failures, print_report, OutputFormat};

/// Check every cluster of the fleet against the expected tenant state
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Fleet layout file (YAML, or JSON with a .json extension)
    #[arg(long)]
    pub layout: Option<PathBuf>,

    /// Read tenant state from a JSON file instead of running commands
    #[arg(long)]
    pub tenants_file: Option<PathBuf>,

    /// Cache tenant state in this file and reuse it on later runs
    #[arg(long)]
    pub run_cache_path: Option<PathBuf>,

    /// Clusters fetched at once
    #[arg(long)]
    pub max_concurrent: Option<usize>,

    /// Per-request HTTP timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Exit with a non-zero status when problems are found
    #[arg(long)]
    pub fail_on_problems: bool,
}

/// Execute the check command
pub async fn execute(args: CheckArgs, settings: &Settings) -> CliResult<()> {
    let max_concurrent = args
        .max_concurrent
        .unwrap_or(settings.max_concurrent_fetches);
    if max_concurrent == 0 {
        return Err(CliError::Config(
            "--max-concurrent must be at least 1".to_string(),
        ));
    }
    let timeout_secs = args.timeout_secs.unwrap_or(settings.http_timeout_secs);

    let layout = load_layout(args.layout.as_deref())?;
    let tenants = load_tenants(&args).await?;

    let fetcher = Arc::new(HttpStateFetcher::new(Duration::from_secs(timeout_secs))?);
    let run = run_fleet_check(
        &layout,
        &tenants,
        fetcher,
        RunOptions {
            max_concurrent_fetches: max_concurrent,
        },
    )
    .await?;

    print_report(&run.report, args.format)?;
    print_failures(&run.failures);

    outcome(&run, args.fail_on_problems)
}

async fn load_tenants(args: &CheckArgs) -> CliResult<Vec<ExpectedTenantState>> {
    let source: Box<dyn TenantStateSource> = match &args.tenants_file {
        Some(path) => Box::new(FileTenantSource::new(path)),
        None => Box::new(CommandTenantSource::default()),
    };

    match &args.run_cache_path {
        Some(path) => RunCache::new(path).load_or_compute(source.as_ref()).await,
        None => Ok(source.load().await?),
    }
}

/// Map a finished run to the command's result. Unchecked clusters take
/// precedence over problems.
fn outcome(run: &FleetRun, fail_on_problems: bool) -> CliResult<()> {
    if run.all_failed() {
        return Err(CliError::AllClustersUnreachable(run.cluster_count));
    }
    if run.is_partial() {
        return Err(CliError::PartialRun {
            failed: run.failures.len(),
            total: run.cluster_count,
        });
    }
    if fail_on_problems && !run.report.is_clean() {
        return Err(CliError::ProblemsFound(run.report.total_problems()));
    }
    Ok(())
}
