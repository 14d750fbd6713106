//! Live cluster state over HTTP.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use indexcheck_core::model::{ClusterConfig, ObservedState};

use crate::error::{FleetError, FleetResult};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Source of a cluster's live state.
#[async_trait]
pub trait ClusterStateFetcher: Send + Sync {
    /// Snapshot the open indices and aliases of a cluster.
    ///
    /// Fails when the cluster cannot be reached or when a cluster other than
    /// the configured one answers. The returned state must carry
    /// `cluster.key`; [`collect_states`](crate::collect_states) records any
    /// other key as an identity mismatch.
    async fn fetch(&self, cluster: &ClusterConfig) -> FleetResult<ObservedState>;
}

#[derive(Debug, Deserialize)]
struct ClusterInfo {
    cluster_name: String,
}

#[derive(Debug, Deserialize)]
struct CatIndex {
    index: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CatAlias {
    alias: String,
    index: String,
}

/// Fetches state from the cluster's REST API.
#[derive(Debug, Clone)]
pub struct HttpStateFetcher {
    client: Client,
}

impl HttpStateFetcher {
    /// Create a fetcher with the given request timeout.
    pub fn new(timeout: Duration) -> FleetResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FleetError::HttpClient(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Use an existing client.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        cluster: &ClusterConfig,
        path: &str,
    ) -> FleetResult<T> {
        let url = format!("{}{}", cluster.endpoint.trim_end_matches('/'), path);
        let unreachable = |message: String| FleetError::ClusterUnreachable {
            cluster: cluster.name.clone(),
            message,
        };

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| unreachable(format!("GET {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unreachable(format!("GET {url}: HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| unreachable(format!("GET {url}: {e}")))?;
        serde_json::from_str(&body).map_err(|e| FleetError::MalformedResponse {
            cluster: cluster.name.clone(),
            message: format!("GET {url}: {e}"),
        })
    }
}

#[async_trait]
impl ClusterStateFetcher for HttpStateFetcher {
    async fn fetch(&self, cluster: &ClusterConfig) -> FleetResult<ObservedState> {
        let info: ClusterInfo = self.get_json(cluster, "/").await?;
        if info.cluster_name != cluster.name {
            return Err(FleetError::ClusterIdentityMismatch {
                expected: cluster.name.clone(),
                actual: info.cluster_name,
            });
        }

        let indices: Vec<CatIndex> = self.get_json(cluster, "/_cat/indices").await?;
        let aliases: Vec<CatAlias> = self.get_json(cluster, "/_cat/aliases").await?;

        let mut state = ObservedState::new(info.cluster_name, cluster.key.clone());
        let mut closed = 0usize;
        for entry in indices {
            if entry.status.as_deref() == Some("open") {
                state.indices.insert(entry.index);
            } else {
                closed += 1;
            }
        }
        for entry in aliases {
            if let Some(previous) = state.aliases.insert(entry.alias.clone(), entry.index) {
                tracing::warn!(
                    cluster_name = %cluster.name,
                    alias = %entry.alias,
                    previous = %previous,
                    "Alias points at several indices, keeping the last"
                );
            }
        }

        tracing::debug!(
            cluster_name = %cluster.name,
            indices = state.indices.len(),
            skipped = closed,
            aliases = state.aliases.len(),
            "Fetched cluster state"
        );

        Ok(state)
    }
}
