//! Fleet-wide reconciliation.
//!
//! Runs the per-cluster validation against every configured cluster, then
//! attaches explanations to unclaimed indices using the state of the whole
//! fleet.

use std::collections::BTreeSet;

use crate::engine::validate;
use crate::error::{CoreError, CoreResult};
use crate::explain::try_to_explain;
use crate::model::{ClusterConfig, ObservedStates, ProblemKind};
use crate::report::{ClusterReport, ProblemEntry, ReconciliationReport};

/// Reconciles a fixed set of clusters.
#[derive(Debug, Clone)]
pub struct Reconciler {
    clusters: Vec<ClusterConfig>,
}

impl Reconciler {
    /// Create a reconciler, rejecting configurations that share a key.
    pub fn new(clusters: Vec<ClusterConfig>) -> CoreResult<Self> {
        let mut seen = BTreeSet::new();
        for cluster in &clusters {
            if !seen.insert(&cluster.key) {
                return Err(CoreError::DuplicateClusterKey {
                    key: cluster.key.clone(),
                });
            }
        }
        Ok(Self { clusters })
    }

    /// Configured clusters, in configuration order.
    #[must_use]
    pub fn clusters(&self) -> &[ClusterConfig] {
        &self.clusters
    }

    /// Reconcile every cluster that has an observed state.
    ///
    /// Clusters without state are skipped. Each unclaimed index gets the
    /// first explanation any of the cluster's acceptors can offer; the
    /// generic reason stays otherwise.
    pub fn reconcile(&self, states: &ObservedStates) -> ReconciliationReport {
        let mut report = ReconciliationReport::new();

        for config in &self.clusters {
            let Some(state) = states.get(&config.key) else {
                tracing::warn!(
                    cluster = %config.key,
                    cluster_name = %config.name,
                    "No observed state for cluster, skipping"
                );
                continue;
            };

            let problems: Vec<ProblemEntry> = validate(config, state)
                .into_iter()
                .map(|problem| {
                    if problem.kind != ProblemKind::Extra {
                        return problem;
                    }
                    match try_to_explain(config, &problem, states) {
                        Some(reason) => problem.with_reason(reason),
                        None => problem,
                    }
                })
                .map(ProblemEntry::from)
                .collect();

            if !problems.is_empty() {
                tracing::info!(
                    cluster_name = %config.name,
                    problems = problems.len(),
                    "Problems found on cluster"
                );
            }

            report.push(ClusterReport {
                cluster_name: config.name.clone(),
                endpoint: config.endpoint.clone(),
                problems,
            });
        }

        tracing::info!(
            clusters = self.clusters.len(),
            observed = states.len(),
            with_problems = report.clusters.len(),
            total_problems = report.total_problems(),
            "Reconciliation complete"
        );

        report
    }
}
