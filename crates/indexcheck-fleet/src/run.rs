//! Full fleet check: tenants, clusters, state, reconciliation.

use std::sync::Arc;

use indexcheck_core::fleet::FleetLayout;
use indexcheck_core::model::{ExpectedIndices, ExpectedTenantState};
use indexcheck_core::orchestrator::Reconciler;
use indexcheck_core::report::ReconciliationReport;

use crate::collect::{collect_states, FetchFailure, DEFAULT_MAX_CONCURRENT_FETCHES};
use crate::error::FleetResult;
use crate::fetch::ClusterStateFetcher;

/// Tunables for a fleet check.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub max_concurrent_fetches: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }
}

/// Outcome of a fleet check.
#[derive(Debug)]
pub struct FleetRun {
    pub report: ReconciliationReport,
    /// Clusters left out of the report because their state was unavailable.
    pub failures: Vec<FetchFailure>,
    /// Number of clusters in the layout.
    pub cluster_count: usize,
}

impl FleetRun {
    /// Whether no cluster could be checked at all.
    #[must_use]
    pub fn all_failed(&self) -> bool {
        self.cluster_count > 0 && self.failures.len() == self.cluster_count
    }

    /// Whether some, but not all, clusters could not be checked.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty() && !self.all_failed()
    }
}

/// Check the whole fleet against already loaded tenant state.
pub async fn run_fleet_check<F>(
    layout: &FleetLayout,
    tenants: &[ExpectedTenantState],
    fetcher: Arc<F>,
    options: RunOptions,
) -> FleetResult<FleetRun>
where
    F: ClusterStateFetcher + ?Sized + 'static,
{
    let expected = ExpectedIndices::from_tenant_states(tenants);
    tracing::info!(
        tenants = tenants.len(),
        clusters = expected.cluster_count(),
        aliases = expected.alias_count(),
        "Aggregated expected indices"
    );

    let clusters = layout.build_clusters(&expected)?;
    let reconciler = Reconciler::new(clusters)?;

    let collection = collect_states(
        fetcher,
        reconciler.clusters(),
        options.max_concurrent_fetches,
    )
    .await;

    let report = reconciler.reconcile(&collection.states);

    Ok(FleetRun {
        report,
        failures: collection.failures,
        cluster_count: reconciler.clusters().len(),
    })
}
