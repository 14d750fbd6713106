//! Runtime settings and fleet layout loading.

use std::path::Path;

use indexcheck_core::fleet::FleetLayout;
use indexcheck_fleet::{DEFAULT_MAX_CONCURRENT_FETCHES, DEFAULT_TIMEOUT_SECS};

use crate::error::{CliError, CliResult};

pub const ENV_MAX_CONCURRENT_FETCHES: &str = "INDEXCHECK_MAX_CONCURRENT_FETCHES";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "INDEXCHECK_HTTP_TIMEOUT_SECS";
pub const ENV_LOG: &str = "INDEXCHECK_LOG";

/// Settings read from the environment, overridable by flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Clusters fetched at once.
    pub max_concurrent_fetches: usize,
    /// Per-request HTTP timeout.
    pub http_timeout_secs: u64,
    /// Log filter directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
            http_timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_filter: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key| std::env::var(key))
    }

    /// Load settings from a custom variable reader.
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let defaults = Self::default();

        let max_concurrent_fetches = match reader(ENV_MAX_CONCURRENT_FETCHES) {
            Ok(raw) => match raw.trim().parse::<usize>() {
                Ok(0) => {
                    return Err(ConfigError::InvalidValue(
                        ENV_MAX_CONCURRENT_FETCHES.into(),
                        "must be at least 1".into(),
                    ))
                }
                Ok(n) => n,
                Err(e) => {
                    return Err(ConfigError::InvalidValue(
                        ENV_MAX_CONCURRENT_FETCHES.into(),
                        e.to_string(),
                    ))
                }
            },
            Err(_) => defaults.max_concurrent_fetches,
        };

        let http_timeout_secs = reader(ENV_HTTP_TIMEOUT_SECS)
            .unwrap_or_else(|_| defaults.http_timeout_secs.to_string())
            .trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidValue(ENV_HTTP_TIMEOUT_SECS.into(), e.to_string()))?;

        let log_filter = reader(ENV_LOG).unwrap_or(defaults.log_filter);

        Ok(Self {
            max_concurrent_fetches,
            http_timeout_secs,
            log_filter,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

/// Load a fleet layout, or the production layout when no file is given.
///
/// Files ending in `.json` are read as JSON, anything else as YAML.
pub fn load_layout(path: Option<&Path>) -> CliResult<FleetLayout> {
    let Some(path) = path else {
        return Ok(FleetLayout::default());
    };

    let raw = std::fs::read_to_string(path)
        .map_err(|e| CliError::Config(format!("Failed to read layout {}: {e}", path.display())))?;

    let layout: FleetLayout = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&raw)?
    } else {
        serde_yaml::from_str(&raw)?
    };
    layout.validate()?;

    tracing::debug!(
        path = %path.display(),
        groups = layout.groups.len(),
        replicas = layout.replicas.len(),
        "Loaded fleet layout"
    );
    Ok(layout)
}
