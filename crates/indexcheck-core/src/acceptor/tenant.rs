//! Acceptor for per-tenant indices, built from the expected aliases of every
//! tenant in the fleet.

use std::collections::BTreeSet;

use super::{Acceptor, Explain};
use crate::explain::diagnose;
use crate::model::{ExpectedIndices, ExpectedTenantState, ObservedState, ObservedStates, Problem};

/// Alias of the shared metadata index every cluster must carry.
pub const METASTORE_ALIAS: &str = "mw_cirrus_metastore";

/// Cluster name prefix of the replica that never builds suggester indices.
pub const SUGGEST_EXEMPT_CLUSTER_PREFIX: &str = "cloudelastic-";

/// Alias suffix of suggester indices.
pub const SUGGEST_EXEMPT_ALIAS_SUFFIX: &str = "_titlesuggest";

/// Accept the indices every tenant expects on a cluster.
///
/// Each expected alias contributes the concrete index it resolves to, or the
/// alias name itself when it does not resolve, so an unresolved alias surfaces
/// as missing instead of being skipped.
///
/// One exception applies: the cloud replica is configured with suggester
/// aliases but those indices are never built there, so an unresolved
/// `_titlesuggest` alias on a `cloudelastic-` cluster is not reported.
#[derive(Debug, Clone, Default)]
pub struct TenantAliasAcceptor {
    expected: ExpectedIndices,
}

impl TenantAliasAcceptor {
    #[must_use]
    pub fn new(expected: ExpectedIndices) -> Self {
        Self { expected }
    }

    /// Aggregate every tenant's expectations.
    #[must_use]
    pub fn from_tenant_states(tenants: &[ExpectedTenantState]) -> Self {
        Self::new(ExpectedIndices::from_tenant_states(tenants))
    }

    #[must_use]
    pub fn expected(&self) -> &ExpectedIndices {
        &self.expected
    }

    fn is_exempt_unresolved(cluster_name: &str, alias: &str) -> bool {
        cluster_name.starts_with(SUGGEST_EXEMPT_CLUSTER_PREFIX)
            && alias.ends_with(SUGGEST_EXEMPT_ALIAS_SUFFIX)
    }
}

impl Acceptor for TenantAliasAcceptor {
    fn name(&self) -> &str {
        "tenant-aliases"
    }

    fn accept(&self, state: &ObservedState) -> BTreeSet<String> {
        let mut accepted = BTreeSet::new();

        accepted.insert(
            state
                .resolve(METASTORE_ALIAS)
                .unwrap_or(METASTORE_ALIAS)
                .to_string(),
        );

        for alias in self.expected.aliases_for(&state.key) {
            match state.resolve(alias) {
                Some(index) => {
                    accepted.insert(index.to_string());
                }
                None if Self::is_exempt_unresolved(&state.cluster_name, alias) => {}
                None => {
                    accepted.insert(alias.to_string());
                }
            }
        }

        accepted
    }

    fn explainer(&self) -> Option<&dyn Explain> {
        Some(self)
    }
}

impl Explain for TenantAliasAcceptor {
    fn explain(&self, problem: &Problem, states: &ObservedStates) -> Option<String> {
        diagnose(&self.expected, problem, states).map(|diagnosis| diagnosis.to_string())
    }
}
