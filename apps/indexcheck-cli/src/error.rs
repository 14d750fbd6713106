//! CLI error types and exit codes

use indexcheck_core::error::CoreError;
use indexcheck_fleet::FleetError;
use thiserror::Error;

/// Exit codes for the CLI
/// - 0: Success
/// - 1: Configuration or I/O error
/// - 3: Every cluster unreachable
/// - 6: Problems found (with `--fail-on-problems`)
/// - 7: Partial run, some clusters could not be checked
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Failed to load tenant state: {0}")]
    TenantState(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("All {0} clusters are unreachable")]
    AllClustersUnreachable(usize),

    #[error("{failed} of {total} clusters could not be checked")]
    PartialRun { failed: usize, total: usize },

    #[error("Found {0} problems")]
    ProblemsFound(usize),
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_)
            | CliError::Io(_)
            | CliError::Cache(_)
            | CliError::TenantState(_) => 1,
            CliError::Network(_) | CliError::AllClustersUnreachable(_) => 3,
            CliError::ProblemsFound(_) => 6,
            CliError::PartialRun { .. } => 7,
        }
    }

    /// Print the error to stderr with appropriate formatting
    pub fn print(&self) {
        let use_color = std::env::var("NO_COLOR").is_err();

        if use_color {
            eprintln!("\x1b[31mError:\x1b[0m {}", self);
        } else {
            eprintln!("Error: {}", self);
        }

        if let Some(suggestion) = self.suggestion() {
            if use_color {
                eprintln!("\n\x1b[33mSuggestion:\x1b[0m {}", suggestion);
            } else {
                eprintln!("\nSuggestion: {}", suggestion);
            }
        }
    }

    /// Get a suggested action for this error
    fn suggestion(&self) -> Option<&'static str> {
        match self {
            CliError::AllClustersUnreachable(_) | CliError::Network(_) => Some(
                "Check network access to the cluster endpoints or raise --timeout-secs.",
            ),
            CliError::TenantState(_) => {
                Some("Pass --tenants-file to load tenant state from a JSON file instead.")
            }
            CliError::Cache(_) => Some("Delete the run cache file and try again."),
            _ => None,
        }
    }
}

impl From<FleetError> for CliError {
    fn from(e: FleetError) -> Self {
        match e {
            FleetError::Core(e) => e.into(),
            FleetError::CommandFailed { .. } | FleetError::InvalidTenantState { .. } => {
                CliError::TenantState(e.to_string())
            }
            FleetError::Io(e) => e.into(),
            e if e.is_cluster_failure() => CliError::Network(e.to_string()),
            e => CliError::Config(e.to_string()),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(e: CoreError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Config(format!("JSON error: {}", e))
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(e: serde_yaml::Error) -> Self {
        CliError::Config(format!("YAML error: {}", e))
    }
}
