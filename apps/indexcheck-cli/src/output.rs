//! Report rendering for the terminal.

use clap::ValueEnum;
use std::fmt::Write as _;

use indexcheck_core::model::ProblemKind;
use indexcheck_core::report::ReconciliationReport;
use indexcheck_fleet::FetchFailure;

use crate::error::CliResult;

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// JSON list of clusters with problems
    #[default]
    Json,
    /// Human-readable summary
    Text,
}

/// Check if color output is enabled
fn use_color() -> bool {
    std::env::var("NO_COLOR").is_err()
}

/// Print a warning message (yellow)
pub fn print_warning(message: &str) {
    if use_color() {
        eprintln!("\x1b[33mWarning:\x1b[0m {}", message);
    } else {
        eprintln!("Warning: {}", message);
    }
}

/// Write the report to stdout.
pub fn print_report(report: &ReconciliationReport, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(report)?),
        OutputFormat::Text => print!("{}", render_text(report, use_color())),
    }
    Ok(())
}

/// Warn about every cluster missing from the report.
pub fn print_failures(failures: &[FetchFailure]) {
    for failure in failures {
        print_warning(&format!(
            "{} ({}) was not checked: {}",
            failure.cluster_name, failure.endpoint, failure.error
        ));
    }
}

fn kind_label(kind: ProblemKind, color: bool) -> String {
    let label = match kind {
        ProblemKind::Missing => "MISSING",
        ProblemKind::Extra => "EXTRA",
        ProblemKind::ConfigConflict => "CONFLICT",
    };
    if !color {
        return format!("{label:<8}");
    }
    let code = match kind {
        ProblemKind::Missing => 31,
        ProblemKind::Extra => 33,
        ProblemKind::ConfigConflict => 35,
    };
    format!("\x1b[{code}m{label:<8}\x1b[0m")
}

/// Human-readable rendering of a report.
pub fn render_text(report: &ReconciliationReport, color: bool) -> String {
    let mut out = String::new();

    if report.is_clean() {
        out.push_str("No problems found.\n");
        return out;
    }

    for cluster in &report.clusters {
        let _ = writeln!(out, "{} ({})", cluster.cluster_name, cluster.endpoint);
        for problem in &cluster.problems {
            let _ = writeln!(
                out,
                "  {} {}: {}",
                kind_label(problem.kind, color),
                problem.index,
                problem.reason
            );
        }
        out.push('\n');
    }

    let counts = report.count_by_kind();
    let summary: Vec<String> = counts
        .iter()
        .map(|(kind, count)| format!("{count} {kind}"))
        .collect();
    let _ = writeln!(
        out,
        "{} problems on {} clusters ({})",
        report.total_problems(),
        report.clusters.len(),
        summary.join(", ")
    );
    out
}
