//! Bounded-concurrency collection of cluster state.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;

use indexcheck_core::model::{ClusterConfig, ClusterKey, ObservedState, ObservedStates};

use crate::error::{FleetError, FleetResult};
use crate::fetch::ClusterStateFetcher;

/// Default number of clusters fetched at once.
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 4;

/// A cluster whose state could not be collected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub cluster_name: String,
    pub key: ClusterKey,
    #[serde(rename = "url")]
    pub endpoint: String,
    /// Classification code of the underlying error.
    pub code: String,
    pub error: String,
}

/// Outcome of collecting state from every cluster.
#[derive(Debug, Default)]
pub struct FleetCollection {
    pub states: ObservedStates,
    /// Failures, in configuration order.
    pub failures: Vec<FetchFailure>,
}

impl FleetCollection {
    /// Whether every cluster answered.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A state is only kept under the key of the cluster it was fetched for.
fn own_state(
    cluster: &ClusterConfig,
    result: FleetResult<ObservedState>,
) -> FleetResult<ObservedState> {
    let state = result?;
    if state.key != cluster.key {
        return Err(FleetError::ClusterIdentityMismatch {
            expected: cluster.key.to_string(),
            actual: state.key.to_string(),
        });
    }
    Ok(state)
}

/// Fetch every cluster's state, at most `max_concurrent` at a time.
///
/// A failing cluster is recorded and never stops the others.
pub async fn collect_states<F>(
    fetcher: Arc<F>,
    clusters: &[ClusterConfig],
    max_concurrent: usize,
) -> FleetCollection
where
    F: ClusterStateFetcher + ?Sized + 'static,
{
    let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));
    let mut join_set = tokio::task::JoinSet::new();

    for (position, cluster) in clusters.iter().enumerate() {
        let fetcher = Arc::clone(&fetcher);
        let semaphore = Arc::clone(&semaphore);
        let cluster = cluster.clone();
        join_set.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            let result = fetcher.fetch(&cluster).await;
            (position, result)
        });
    }

    let mut collection = FleetCollection::default();
    let mut failures = Vec::new();

    while let Some(join_result) = join_set.join_next().await {
        let join_result = join_result
            .map(|(position, result)| (position, own_state(&clusters[position], result)));
        match join_result {
            Ok((_, Ok(state))) => {
                collection.states.insert(state);
            }
            Ok((position, Err(e))) => {
                let cluster = &clusters[position];
                tracing::warn!(
                    cluster_name = %cluster.name,
                    endpoint = %cluster.endpoint,
                    error = %e,
                    "Failed to fetch cluster state"
                );
                failures.push((
                    position,
                    FetchFailure {
                        cluster_name: cluster.name.clone(),
                        key: cluster.key.clone(),
                        endpoint: cluster.endpoint.clone(),
                        code: e.error_code().to_string(),
                        error: e.to_string(),
                    },
                ));
            }
            Err(e) => {
                tracing::error!(error = %e, "Cluster fetch task panicked");
            }
        }
    }

    // A panicked task leaves its cluster with neither state nor failure.
    for (position, cluster) in clusters.iter().enumerate() {
        let recorded = failures.iter().any(|(p, _)| *p == position);
        if !recorded && collection.states.get(&cluster.key).is_none() {
            failures.push((
                position,
                FetchFailure {
                    cluster_name: cluster.name.clone(),
                    key: cluster.key.clone(),
                    endpoint: cluster.endpoint.clone(),
                    code: "INTERNAL".to_string(),
                    error: "fetch task did not complete".to_string(),
                },
            ));
        }
    }

    failures.sort_by_key(|(position, _)| *position);
    collection.failures = failures.into_iter().map(|(_, failure)| failure).collect();

    tracing::info!(
        clusters = clusters.len(),
        fetched = collection.states.len(),
        failed = collection.failures.len(),
        "Collected cluster state"
    );

    collection
}
