//! Fleet layout
//!
//! Describes which clusters exist, where they answer and which acceptors
//! apply to each. The default layout is the production fleet: three shard
//! groups in two datacenter replicas plus the cloud replica.
//!
//! Cluster names and endpoints are templates expanded per (replica, group)
//! with the `{replica}`, `{group}` and `{port}` placeholders.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::acceptor::{Acceptor, AliasSetAcceptor, PatternAcceptor, TenantAliasAcceptor};
use crate::error::{CoreError, CoreResult};
use crate::model::{ClusterConfig, ClusterKey, ExpectedIndices};

/// Serializable description of a non-tenant acceptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AcceptorSpec {
    /// Indices whose name matches a regex.
    Pattern { pattern: String },
    /// Concrete indices behind a fixed set of aliases.
    AliasSet { aliases: Vec<String> },
}

impl AcceptorSpec {
    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
        }
    }

    pub fn alias_set<I, S>(aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::AliasSet {
            aliases: aliases.into_iter().map(Into::into).collect(),
        }
    }

    /// Instantiate the acceptor.
    pub fn build(&self) -> CoreResult<Arc<dyn Acceptor>> {
        let acceptor: Arc<dyn Acceptor> = match self {
            Self::Pattern { pattern } => Arc::new(PatternAcceptor::new(pattern)?),
            Self::AliasSet { aliases } => Arc::new(AliasSetAcceptor::new(aliases.iter().cloned())),
        };
        Ok(acceptor)
    }
}

/// One shard group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupLayout {
    pub name: String,
    pub port: u16,
    /// Acceptors for shared services hosted only in this group.
    #[serde(default)]
    pub acceptors: Vec<AcceptorSpec>,
}

/// One replica of the whole set of groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaLayout {
    pub name: String,
    /// Cluster name template.
    pub cluster_name: String,
    /// Endpoint template.
    pub endpoint: String,
    /// Per-group cluster name templates replacing `cluster_name`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub cluster_name_overrides: BTreeMap<String, String>,
    /// Whether group-specific acceptors apply in this replica.
    #[serde(default = "default_group_acceptors")]
    pub group_acceptors: bool,
}

fn default_group_acceptors() -> bool {
    true
}

impl ReplicaLayout {
    fn expand(template: &str, replica: &str, group: &GroupLayout) -> String {
        template
            .replace("{replica}", replica)
            .replace("{group}", &group.name)
            .replace("{port}", &group.port.to_string())
    }

    /// Cluster name of a group in this replica.
    #[must_use]
    pub fn cluster_name_for(&self, group: &GroupLayout) -> String {
        let template = self
            .cluster_name_overrides
            .get(&group.name)
            .unwrap_or(&self.cluster_name);
        Self::expand(template, &self.name, group)
    }

    /// Endpoint of a group in this replica.
    #[must_use]
    pub fn endpoint_for(&self, group: &GroupLayout) -> String {
        Self::expand(&self.endpoint, &self.name, group)
    }
}

/// Complete description of the fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetLayout {
    /// Acceptors attached to every cluster after the tenant acceptor.
    #[serde(default)]
    pub common_acceptors: Vec<AcceptorSpec>,
    pub groups: Vec<GroupLayout>,
    pub replicas: Vec<ReplicaLayout>,
}

impl Default for FleetLayout {
    fn default() -> Self {
        let production = |name: &str| ReplicaLayout {
            name: name.to_string(),
            cluster_name: "production-search-{group}-{replica}".to_string(),
            endpoint: "https://search.svc.{replica}.wmnet:{port}".to_string(),
            // chi predates the other groups and kept the name without one.
            cluster_name_overrides: BTreeMap::from([(
                "chi".to_string(),
                "production-search-{replica}".to_string(),
            )]),
            group_acceptors: true,
        };

        Self {
            common_acceptors: vec![
                AcceptorSpec::pattern(r"^\.tasks$"),
                AcceptorSpec::pattern(r"^\.ltrstore$"),
            ],
            groups: vec![
                GroupLayout {
                    name: "chi".to_string(),
                    port: 9243,
                    acceptors: vec![
                        AcceptorSpec::alias_set(["glent_production", "glent_rollback"]),
                        AcceptorSpec::pattern(r"^apifeatureusage-\d\d\d\d\.\d\d\.\d\d$"),
                        AcceptorSpec::pattern(r"^ttmserver(-test)?$"),
                        AcceptorSpec::pattern(r"^phabricator$"),
                    ],
                },
                GroupLayout {
                    name: "omega".to_string(),
                    port: 9443,
                    acceptors: Vec::new(),
                },
                GroupLayout {
                    name: "psi".to_string(),
                    port: 9643,
                    acceptors: Vec::new(),
                },
            ],
            replicas: vec![
                production("eqiad"),
                production("codfw"),
                ReplicaLayout {
                    name: "cloudelastic".to_string(),
                    cluster_name: "cloudelastic-{group}-eqiad".to_string(),
                    endpoint: "https://cloudelastic.wikimedia.org:{port}".to_string(),
                    cluster_name_overrides: BTreeMap::new(),
                    group_acceptors: false,
                },
            ],
        }
    }
}

impl FleetLayout {
    /// Check names are unique and overrides refer to known groups.
    pub fn validate(&self) -> CoreResult<()> {
        let mut groups = BTreeSet::new();
        for group in &self.groups {
            if !groups.insert(group.name.as_str()) {
                return Err(CoreError::InvalidLayout(format!(
                    "group '{}' is declared more than once",
                    group.name
                )));
            }
        }

        let mut replicas = BTreeSet::new();
        for replica in &self.replicas {
            if !replicas.insert(replica.name.as_str()) {
                return Err(CoreError::InvalidLayout(format!(
                    "replica '{}' is declared more than once",
                    replica.name
                )));
            }
            if let Some(unknown) = replica
                .cluster_name_overrides
                .keys()
                .find(|group| !groups.contains(group.as_str()))
            {
                return Err(CoreError::InvalidLayout(format!(
                    "replica '{}' overrides unknown group '{unknown}'",
                    replica.name
                )));
            }
        }

        Ok(())
    }

    /// Number of clusters the layout describes.
    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.groups.len() * self.replicas.len()
    }

    /// Build one configuration per (replica, group).
    ///
    /// Every cluster gets the same tenant acceptor first, then the common
    /// acceptors, then the group's own acceptors where the replica allows
    /// them. Acceptor instances are shared between clusters.
    pub fn build_clusters(&self, expected: &ExpectedIndices) -> CoreResult<Vec<ClusterConfig>> {
        self.validate()?;

        let tenant: Arc<dyn Acceptor> = Arc::new(TenantAliasAcceptor::new(expected.clone()));
        let common = self
            .common_acceptors
            .iter()
            .map(AcceptorSpec::build)
            .collect::<CoreResult<Vec<_>>>()?;
        let per_group = self
            .groups
            .iter()
            .map(|group| {
                group
                    .acceptors
                    .iter()
                    .map(AcceptorSpec::build)
                    .collect::<CoreResult<Vec<_>>>()
            })
            .collect::<CoreResult<Vec<_>>>()?;

        let mut clusters = Vec::with_capacity(self.cluster_count());
        for replica in &self.replicas {
            for (group, group_acceptors) in self.groups.iter().zip(&per_group) {
                let mut config = ClusterConfig::new(
                    replica.cluster_name_for(group),
                    ClusterKey::new(replica.name.clone(), group.name.clone()),
                    replica.endpoint_for(group),
                )
                .with_acceptor(Arc::clone(&tenant))
                .with_acceptors(common.iter().cloned());
                if replica.group_acceptors {
                    config = config.with_acceptors(group_acceptors.iter().cloned());
                }
                clusters.push(config);
            }
        }

        tracing::debug!(
            clusters = clusters.len(),
            expected_aliases = expected.alias_count(),
            "Built cluster configurations"
        );

        Ok(clusters)
    }
}
