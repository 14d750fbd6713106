//! Run cache for expected tenant state.
//!
//! Loading every tenant's state can take minutes. A common workflow is to
//! change something on the clusters and check again with the same tenant
//! configuration, so the loaded state can be kept in a file between runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use indexcheck_core::model::ExpectedTenantState;
use indexcheck_fleet::TenantStateSource;

use crate::error::{CliError, CliResult};

/// Tenant state as stored in the cache file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedTenants {
    pub cached_at: DateTime<Utc>,
    pub tenants: Vec<ExpectedTenantState>,
}

/// File holding the cached tenant state of a previous run.
#[derive(Debug, Clone)]
pub struct RunCache {
    path: PathBuf,
}

impl RunCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cache. Unreadable or corrupt files are removed.
    pub fn load(&self) -> Option<CachedTenants> {
        if !self.path.exists() {
            return None;
        }

        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to read run cache, discarding"
                );
                self.discard();
                return None;
            }
        };

        match serde_json::from_str::<CachedTenants>(&contents) {
            Ok(cached) => Some(cached),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Run cache is corrupted, discarding"
                );
                self.discard();
                None
            }
        }
    }

    fn discard(&self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::debug!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove run cache"
            );
        }
    }

    /// Write the cache.
    pub fn store(&self, tenants: &[ExpectedTenantState]) -> CliResult<()> {
        let cached = CachedTenants {
            cached_at: Utc::now(),
            tenants: tenants.to_vec(),
        };
        let contents = serde_json::to_string(&cached)?;

        fs::write(&self.path, contents).map_err(|e| {
            CliError::Cache(format!(
                "Failed to write run cache {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Cached tenant state if present, otherwise load it from `source` and
    /// cache it.
    pub async fn load_or_compute(
        &self,
        source: &dyn TenantStateSource,
    ) -> CliResult<Vec<ExpectedTenantState>> {
        if let Some(cached) = self.load() {
            tracing::info!(
                path = %self.path.display(),
                cached_at = %cached.cached_at,
                tenants = cached.tenants.len(),
                "Using cached tenant state"
            );
            return Ok(cached.tenants);
        }

        let tenants = source.load().await?;
        self.store(&tenants)?;
        tracing::info!(
            path = %self.path.display(),
            tenants = tenants.len(),
            "Cached tenant state"
        );
        Ok(tenants)
    }
}
