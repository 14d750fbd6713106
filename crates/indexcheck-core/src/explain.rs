//! Explanation of unexpected indices.
//!
//! Tenant indices follow the naming convention `<tenant>_<type>_<marker>`
//! and are reached through the alias `<tenant>_<type>`. The marker is either
//! the literal `first` or a decimal generation timestamp, which orders index
//! generations of the same alias. An unexpected index that follows the
//! convention is correlated against the expected aliases of every cluster
//! and against the live alias on its own cluster to guess how it came to be.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::model::{ClusterConfig, ExpectedIndices, ObservedStates, Problem, ProblemKind};

static INDEX_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\w+)_(\w+)_(first|\d+)$").expect("INDEX_NAME_RE is a valid regex pattern")
});

/// Generation marker at the end of a tenant index name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    /// The first generation ever built, ordered before every timestamp.
    First,
    /// A decimal generation timestamp.
    Generation(String),
}

impl Marker {
    /// Numeric value used to order generations.
    ///
    /// `None` when the digits do not fit in a `u64`.
    #[must_use]
    pub fn value(&self) -> Option<u64> {
        match self {
            Self::First => Some(0),
            Self::Generation(digits) => digits.parse().ok(),
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => write!(f, "first"),
            Self::Generation(digits) => write!(f, "{digits}"),
        }
    }
}

/// A concrete index name that follows the tenant naming convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexName {
    pub tenant: String,
    pub index_type: String,
    pub marker: Marker,
}

impl IndexName {
    /// Parse an index name; `None` for anything outside the convention.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let caps = INDEX_NAME_RE.captures(name)?;
        let marker = match &caps[3] {
            "first" => Marker::First,
            digits => Marker::Generation(digits.to_string()),
        };
        Some(Self {
            tenant: caps[1].to_string(),
            index_type: caps[2].to_string(),
            marker,
        })
    }

    /// Alias the index would be reached through when live.
    #[must_use]
    pub fn alias(&self) -> String {
        format!("{}_{}", self.tenant, self.index_type)
    }
}

/// Best guess at why an unexpected tenant index exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnosis {
    /// The alias is expected here but does not exist at all.
    AliasMissing { alias: String },
    /// The live index behind the alias does not follow the naming convention.
    LiveIndexMalformed { live: String },
    /// One of the two markers could not be turned into a number.
    MarkerUnrecognized { live: String },
    /// The live index is newer: this one is an older generation.
    ReindexInProgress { live: String },
    /// This index is newer than the live one but never went live.
    FailedReindex { live: String },
    /// The alias belongs on other groups of the same replica.
    WrongClusterOfReplica { expected_in: Vec<String> },
    /// The alias is expected somewhere, just not in this group.
    NotExpectedInGroup,
    /// No cluster expects the alias.
    UnknownTenant,
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AliasMissing { alias } => {
                write!(f, "Index alias for {alias} expected but does not exist")
            }
            Self::LiveIndexMalformed { live } => write!(
                f,
                "Duplicate of live index {live}. Live index doesn't have a valid name format?"
            ),
            Self::MarkerUnrecognized { live } => write!(
                f,
                "Duplicate of live index {live}. One of the index naming formats is unrecognized"
            ),
            Self::ReindexInProgress { live } => {
                write!(f, "Duplicate of live index {live}. Reindex in progress?")
            }
            Self::FailedReindex { live } => {
                write!(f, "Duplicate of live index {live}. Failed reindex?")
            }
            Self::WrongClusterOfReplica { expected_in } => write!(
                f,
                "Index on wrong cluster of replica, expected in {}",
                expected_in.join(", ")
            ),
            Self::NotExpectedInGroup => write!(
                f,
                "Index not expected in this group. Private index on non-private cluster?"
            ),
            Self::UnknownTenant => write!(
                f,
                "Looks like a tenant index but tenant is unknown. Deleted tenant?"
            ),
        }
    }
}

/// Diagnose an `EXTRA` problem against the expected aliases of the fleet.
///
/// Returns `None` for other problem kinds and for index names outside the
/// tenant naming convention.
#[must_use]
pub fn diagnose(
    expected: &ExpectedIndices,
    problem: &Problem,
    states: &ObservedStates,
) -> Option<Diagnosis> {
    if problem.kind != ProblemKind::Extra {
        return None;
    }
    let name = IndexName::parse(&problem.index)?;
    let alias = name.alias();

    if expected.expects(&problem.cluster, &alias) {
        return Some(compare_with_live(&name, &alias, problem, states));
    }

    let expected_in: Vec<String> = expected
        .clusters_expecting(&alias)
        .filter(|key| key.same_replica(&problem.cluster))
        .map(|key| states.cluster_name(key))
        .collect();
    if !expected_in.is_empty() {
        return Some(Diagnosis::WrongClusterOfReplica { expected_in });
    }

    if expected.clusters_expecting(&alias).next().is_some() {
        return Some(Diagnosis::NotExpectedInGroup);
    }

    Some(Diagnosis::UnknownTenant)
}

/// The alias is expected on this cluster, so some other index is (or should
/// be) live behind it. Guess from the generation markers.
fn compare_with_live(
    name: &IndexName,
    alias: &str,
    problem: &Problem,
    states: &ObservedStates,
) -> Diagnosis {
    let Some(live) = states
        .get(&problem.cluster)
        .and_then(|state| state.resolve(alias))
    else {
        return Diagnosis::AliasMissing {
            alias: alias.to_string(),
        };
    };
    let live = live.to_string();

    let Some(live_name) = IndexName::parse(&live) else {
        return Diagnosis::LiveIndexMalformed { live };
    };

    match (live_name.marker.value(), name.marker.value()) {
        (Some(live_ts), Some(extra_ts)) if live_ts > extra_ts => {
            Diagnosis::ReindexInProgress { live }
        }
        (Some(_), Some(_)) => Diagnosis::FailedReindex { live },
        _ => Diagnosis::MarkerUnrecognized { live },
    }
}

/// Ask each of the cluster's acceptors able to explain for a diagnosis; the
/// first answer wins.
#[must_use]
pub fn try_to_explain(
    config: &ClusterConfig,
    problem: &Problem,
    states: &ObservedStates,
) -> Option<String> {
    config
        .acceptors
        .iter()
        .filter_map(|acceptor| acceptor.explainer())
        .find_map(|explainer| {
            explainer
                .explain(problem, states)
                .filter(|reason| !reason.is_empty())
        })
}
