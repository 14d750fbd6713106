//! Show the effective fleet layout

use clap::Args;
use std::path::PathBuf;

use indexcheck_core::model::ExpectedIndices;

use crate::config::load_layout;
use crate::error::CliResult;

/// Show the effective fleet layout
#[derive(Args, Debug)]
pub struct LayoutArgs {
    /// Fleet layout file (YAML, or JSON with a .json extension)
    #[arg(long)]
    pub layout: Option<PathBuf>,

    /// List the resulting clusters instead of printing the layout
    #[arg(long)]
    pub clusters: bool,
}

/// Execute the layout command
pub fn execute(args: LayoutArgs) -> CliResult<()> {
    let layout = load_layout(args.layout.as_deref())?;

    if !args.clusters {
        print!("{}", serde_yaml::to_string(&layout)?);
        return Ok(());
    }

    for cluster in layout.build_clusters(&ExpectedIndices::default())? {
        let acceptors: Vec<&str> = cluster.acceptors.iter().map(|a| a.name()).collect();
        println!(
            "{}\t{}\t{}\t{}",
            cluster.key,
            cluster.name,
            cluster.endpoint,
            acceptors.join(" ")
        );
    }
    Ok(())
}
