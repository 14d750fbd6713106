//! Data model shared by the reconciliation engine and its collaborators.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::acceptor::Acceptor;

/// Identity of one cluster within the fleet: the datacenter replica and the
/// shard group it serves.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClusterKey {
    /// Datacenter partition holding a full copy of every group.
    pub replica: String,
    /// Shard group within the replica.
    pub group: String,
}

impl ClusterKey {
    /// Create a new cluster key.
    pub fn new(replica: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            replica: replica.into(),
            group: group.into(),
        }
    }

    /// Whether both keys live in the same replica.
    #[must_use]
    pub fn same_replica(&self, other: &ClusterKey) -> bool {
        self.replica == other.replica
    }
}

impl fmt::Display for ClusterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.replica, self.group)
    }
}

/// Configuration of the checker for one cluster.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Expected cluster name, as reported by the cluster itself.
    pub name: String,
    /// Replica and group served by the cluster.
    pub key: ClusterKey,
    /// Base URL the cluster answers on.
    pub endpoint: String,
    /// Acceptors consulted, in order, for this cluster.
    pub acceptors: Vec<Arc<dyn Acceptor>>,
}

impl ClusterConfig {
    /// Create a cluster configuration without acceptors.
    pub fn new(name: impl Into<String>, key: ClusterKey, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key,
            endpoint: endpoint.into(),
            acceptors: Vec::new(),
        }
    }

    /// Attach an acceptor.
    #[must_use]
    pub fn with_acceptor(mut self, acceptor: Arc<dyn Acceptor>) -> Self {
        self.acceptors.push(acceptor);
        self
    }

    /// Attach several acceptors, preserving their order.
    #[must_use]
    pub fn with_acceptors<I>(mut self, acceptors: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Acceptor>>,
    {
        self.acceptors.extend(acceptors);
        self
    }
}

/// Snapshot of one live cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedState {
    /// Cluster name reported by the cluster.
    pub cluster_name: String,
    /// Replica and group the snapshot was taken for.
    pub key: ClusterKey,
    /// Names of the currently open indices.
    pub indices: BTreeSet<String>,
    /// Alias name to the concrete index it resolves to.
    pub aliases: BTreeMap<String, String>,
}

impl ObservedState {
    /// Create an empty snapshot.
    pub fn new(cluster_name: impl Into<String>, key: ClusterKey) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            key,
            indices: BTreeSet::new(),
            aliases: BTreeMap::new(),
        }
    }

    /// Add an open index.
    #[must_use]
    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.indices.insert(index.into());
        self
    }

    /// Point an alias at a concrete index, replacing any previous target.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>, index: impl Into<String>) -> Self {
        self.aliases.insert(alias.into(), index.into());
        self
    }

    /// Concrete index behind an alias, if the alias exists.
    #[must_use]
    pub fn resolve(&self, alias: &str) -> Option<&str> {
        self.aliases.get(alias).map(String::as_str)
    }
}

/// Observed state of every reachable cluster, keyed by cluster.
#[derive(Debug, Clone, Default)]
pub struct ObservedStates {
    states: BTreeMap<ClusterKey, ObservedState>,
}

impl ObservedStates {
    /// Create an empty lookup.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a snapshot under its own key, returning any snapshot it replaced.
    pub fn insert(&mut self, state: ObservedState) -> Option<ObservedState> {
        self.states.insert(state.key.clone(), state)
    }

    /// Snapshot for a cluster.
    #[must_use]
    pub fn get(&self, key: &ClusterKey) -> Option<&ObservedState> {
        self.states.get(key)
    }

    /// Display name for a cluster: the reported name when its state is known,
    /// otherwise the key itself.
    #[must_use]
    pub fn cluster_name(&self, key: &ClusterKey) -> String {
        self.states
            .get(key)
            .map_or_else(|| key.to_string(), |s| s.cluster_name.clone())
    }

    /// Number of snapshots held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether no snapshot is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Iterate snapshots in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&ClusterKey, &ObservedState)> {
        self.states.iter()
    }
}

impl FromIterator<ObservedState> for ObservedStates {
    fn from_iter<T: IntoIterator<Item = ObservedState>>(iter: T) -> Self {
        let mut states = Self::new();
        for state in iter {
            states.insert(state);
        }
        states
    }
}

/// Expected state of one tenant on one cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantCluster {
    pub replica: String,
    pub group: String,
    /// Alias names the tenant expects on this cluster.
    pub aliases: Vec<String>,
}

impl TenantCluster {
    #[must_use]
    pub fn key(&self) -> ClusterKey {
        ClusterKey::new(self.replica.clone(), self.group.clone())
    }
}

/// Expected state of a single tenant across the fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedTenantState {
    /// Tenant identifier.
    pub tenant: String,
    /// Clusters the tenant expects indices on.
    pub clusters: Vec<TenantCluster>,
}

/// Alias names expected on each cluster, merged across all tenants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectedIndices {
    clusters: BTreeMap<ClusterKey, BTreeSet<String>>,
}

impl ExpectedIndices {
    /// Merge the per-tenant expectations into a per-cluster view.
    #[must_use]
    pub fn from_tenant_states(tenants: &[ExpectedTenantState]) -> Self {
        let mut clusters: BTreeMap<ClusterKey, BTreeSet<String>> = BTreeMap::new();
        for tenant in tenants {
            for cluster in &tenant.clusters {
                clusters
                    .entry(cluster.key())
                    .or_default()
                    .extend(cluster.aliases.iter().cloned());
            }
        }
        Self { clusters }
    }

    /// Build directly from a per-cluster map.
    #[must_use]
    pub fn from_map(clusters: BTreeMap<ClusterKey, BTreeSet<String>>) -> Self {
        Self { clusters }
    }

    /// Aliases expected on a cluster; empty when the cluster expects nothing.
    pub fn aliases_for(&self, key: &ClusterKey) -> impl Iterator<Item = &str> {
        self.clusters
            .get(key)
            .into_iter()
            .flat_map(|aliases| aliases.iter().map(String::as_str))
    }

    /// Whether an alias is expected on a cluster.
    #[must_use]
    pub fn expects(&self, key: &ClusterKey, alias: &str) -> bool {
        self.clusters
            .get(key)
            .is_some_and(|aliases| aliases.contains(alias))
    }

    /// Every cluster expecting an alias, in key order.
    pub fn clusters_expecting<'a>(
        &'a self,
        alias: &'a str,
    ) -> impl Iterator<Item = &'a ClusterKey> + 'a {
        self.clusters
            .iter()
            .filter(move |(_, aliases)| aliases.contains(alias))
            .map(|(key, _)| key)
    }

    /// Number of clusters with at least one expectation entry.
    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Total number of (cluster, alias) expectations.
    #[must_use]
    pub fn alias_count(&self) -> usize {
        self.clusters.values().map(BTreeSet::len).sum()
    }
}

/// Classification of a discrepancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProblemKind {
    /// Expected but absent.
    Missing,
    /// Present but claimed by no acceptor.
    Extra,
    /// Claimed by more than one acceptor.
    ConfigConflict,
}

impl fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::Extra => write!(f, "extra"),
            Self::ConfigConflict => write!(f, "config_conflict"),
        }
    }
}

impl std::str::FromStr for ProblemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "missing" => Ok(Self::Missing),
            "extra" => Ok(Self::Extra),
            "config_conflict" => Ok(Self::ConfigConflict),
            _ => Err(format!("Unknown problem kind: {s}")),
        }
    }
}

/// An index that does not match the expected state.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Problem {
    /// Cluster the problem was found on.
    pub cluster: ClusterKey,
    /// Index (or unresolved alias) name.
    pub index: String,
    pub kind: ProblemKind,
    /// Human-readable reason.
    pub reason: String,
}

impl Problem {
    pub fn new(
        cluster: ClusterKey,
        index: impl Into<String>,
        kind: ProblemKind,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            cluster,
            index: index.into(),
            kind,
            reason: reason.into(),
        }
    }

    /// Same problem with its reason replaced.
    #[must_use]
    pub fn with_reason(self, reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            ..self
        }
    }
}
