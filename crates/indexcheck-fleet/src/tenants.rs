//! Expected tenant state
//!
//! Each tenant describes, per replica, the group it lives in and the aliases
//! it expects there:
//!
//! ```json
//! {"dbname": "enwiki", "clusters": {"eqiad": {"group": "chi", "aliases": ["enwiki_content"]}}}
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::Semaphore;

use indexcheck_core::model::{ExpectedTenantState, TenantCluster};

use crate::error::{FleetError, FleetResult};

/// Placeholder replaced by the tenant name in the per-tenant command.
pub const TENANT_PLACEHOLDER: &str = "{tenant}";

/// Default number of per-tenant commands run at once.
pub const DEFAULT_MAX_CONCURRENT_COMMANDS: usize = 8;

/// Source of the expected state of every tenant.
#[async_trait]
pub trait TenantStateSource: Send + Sync {
    async fn load(&self) -> FleetResult<Vec<ExpectedTenantState>>;
}

#[derive(Debug, Deserialize)]
struct TenantDocument {
    dbname: String,
    #[serde(default)]
    clusters: BTreeMap<String, ReplicaDocument>,
}

#[derive(Debug, Deserialize)]
struct ReplicaDocument {
    group: String,
    #[serde(default)]
    aliases: Vec<String>,
}

impl From<TenantDocument> for ExpectedTenantState {
    fn from(doc: TenantDocument) -> Self {
        Self {
            tenant: doc.dbname,
            clusters: doc
                .clusters
                .into_iter()
                .map(|(replica, cluster)| TenantCluster {
                    replica,
                    group: cluster.group,
                    aliases: cluster.aliases,
                })
                .collect(),
        }
    }
}

/// Parse one tenant's expected-state document.
pub fn parse_tenant_document(tenant: &str, raw: &str) -> FleetResult<ExpectedTenantState> {
    let doc: TenantDocument =
        serde_json::from_str(raw.trim()).map_err(|e| FleetError::InvalidTenantState {
            tenant: tenant.to_string(),
            message: e.to_string(),
        })?;
    Ok(doc.into())
}

/// Loads tenant state by running external commands: one listing every
/// tenant, then one per tenant printing its document.
#[derive(Debug, Clone)]
pub struct CommandTenantSource {
    list_command: Vec<String>,
    tenant_command: Vec<String>,
    max_concurrent: usize,
}

impl Default for CommandTenantSource {
    fn default() -> Self {
        Self {
            list_command: vec!["expanddblist".to_string(), "all".to_string()],
            tenant_command: vec![
                "mwscript".to_string(),
                "extensions/CirrusSearch/maintenance/ExpectedIndices.php".to_string(),
                "--wiki".to_string(),
                TENANT_PLACEHOLDER.to_string(),
                "--oneline".to_string(),
            ],
            max_concurrent: DEFAULT_MAX_CONCURRENT_COMMANDS,
        }
    }
}

impl CommandTenantSource {
    /// Use custom commands. `tenant_command` arguments equal to
    /// [`TENANT_PLACEHOLDER`] are replaced by the tenant name.
    #[must_use]
    pub fn new(list_command: Vec<String>, tenant_command: Vec<String>) -> Self {
        Self {
            list_command,
            tenant_command,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    async fn list_tenants(&self) -> FleetResult<Vec<String>> {
        let output = run_command(&self.list_command).await?;
        Ok(output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}

/// Run a command and return its stdout.
async fn run_command(argv: &[String]) -> FleetResult<String> {
    let display = argv.join(" ");
    let Some((program, args)) = argv.split_first() else {
        return Err(FleetError::CommandFailed {
            command: display,
            message: "empty command".to_string(),
        });
    };

    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|e| FleetError::CommandFailed {
            command: display.clone(),
            message: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(FleetError::CommandFailed {
            command: display,
            message: format!(
                "{}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    String::from_utf8(output.stdout).map_err(|e| FleetError::CommandFailed {
        command: display,
        message: format!("output is not UTF-8: {e}"),
    })
}

#[async_trait]
impl TenantStateSource for CommandTenantSource {
    async fn load(&self) -> FleetResult<Vec<ExpectedTenantState>> {
        let tenants = self.list_tenants().await?;
        tracing::info!(tenants = tenants.len(), "Loading expected tenant state");

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut join_set = tokio::task::JoinSet::new();

        for (position, tenant) in tenants.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let argv: Vec<String> = self
                .tenant_command
                .iter()
                .map(|arg| {
                    if arg == TENANT_PLACEHOLDER {
                        tenant.clone()
                    } else {
                        arg.clone()
                    }
                })
                .collect();
            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let result = match run_command(&argv).await {
                    Ok(raw) => parse_tenant_document(&tenant, &raw),
                    Err(e) => Err(e),
                };
                (position, result)
            });
        }

        let mut loaded = Vec::new();
        while let Some(join_result) = join_set.join_next().await {
            match join_result {
                Ok((position, Ok(state))) => loaded.push((position, state)),
                Ok((_, Err(e))) => {
                    join_set.abort_all();
                    return Err(e);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Tenant state task panicked");
                    return Err(FleetError::CommandFailed {
                        command: self.tenant_command.join(" "),
                        message: format!("Internal error: {e}"),
                    });
                }
            }
        }

        loaded.sort_by_key(|(position, _)| *position);
        Ok(loaded.into_iter().map(|(_, state)| state).collect())
    }
}

/// Loads tenant state from a JSON array of tenant documents.
#[derive(Debug, Clone)]
pub struct FileTenantSource {
    path: PathBuf,
}

impl FileTenantSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TenantStateSource for FileTenantSource {
    async fn load(&self) -> FleetResult<Vec<ExpectedTenantState>> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let docs: Vec<TenantDocument> = serde_json::from_str(&raw)?;
        tracing::info!(
            path = %self.path.display(),
            tenants = docs.len(),
            "Loaded expected tenant state from file"
        );
        Ok(docs.into_iter().map(Into::into).collect())
    }
}
