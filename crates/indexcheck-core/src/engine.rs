//! Per-cluster validation.
//!
//! Compares the union of every acceptor's claims against the indices that
//! actually exist on a cluster and classifies each difference.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{ClusterConfig, ObservedState, Problem, ProblemKind};

/// Reason attached to names claimed more than once.
fn conflict_reason(claims: usize) -> String {
    format!("Accepted by {claims} different acceptors")
}

/// Reason attached to present but unclaimed indices.
pub const EXTRA_REASON: &str = "Index not expected on cluster";

/// Reason attached to claimed but absent indices.
pub const MISSING_REASON: &str = "Expected index was missing";

/// Counts gathered while validating one cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationSummary {
    pub accepted: usize,
    pub observed: usize,
    pub conflicts: usize,
    pub extra: usize,
    pub missing: usize,
}

impl ValidationSummary {
    #[must_use]
    pub fn total_problems(&self) -> usize {
        self.conflicts + self.extra + self.missing
    }
}

/// Validate one cluster against its observed state.
///
/// Problems come out grouped as conflicts, extras, then missing, each group
/// sorted by index name. The function is pure: the same inputs always yield
/// the same list.
pub fn validate(config: &ClusterConfig, state: &ObservedState) -> Vec<Problem> {
    validate_with_summary(config, state).0
}

/// Same as [`validate`], also returning the counts.
pub fn validate_with_summary(
    config: &ClusterConfig,
    state: &ObservedState,
) -> (Vec<Problem>, ValidationSummary) {
    let mut claims: BTreeMap<String, usize> = BTreeMap::new();
    for acceptor in &config.acceptors {
        let accepted = acceptor.accept(state);
        tracing::trace!(
            cluster = %config.key,
            acceptor = acceptor.name(),
            accepted = accepted.len(),
            "Acceptor evaluated"
        );
        for name in accepted {
            *claims.entry(name).or_insert(0) += 1;
        }
    }

    let mut problems = Vec::new();

    for (name, count) in &claims {
        if *count > 1 {
            problems.push(Problem::new(
                config.key.clone(),
                name.clone(),
                ProblemKind::ConfigConflict,
                conflict_reason(*count),
            ));
        }
    }
    let conflicts = problems.len();

    let accepted: BTreeSet<&str> = claims.keys().map(String::as_str).collect();

    let extras: Vec<Problem> = state
        .indices
        .iter()
        .filter(|index| !accepted.contains(index.as_str()))
        .map(|index| {
            Problem::new(
                config.key.clone(),
                index.clone(),
                ProblemKind::Extra,
                EXTRA_REASON,
            )
        })
        .collect();
    let extra = extras.len();
    problems.extend(extras);

    let missing: Vec<Problem> = accepted
        .iter()
        .filter(|name| !state.indices.contains(**name))
        .map(|name| {
            Problem::new(
                config.key.clone(),
                *name,
                ProblemKind::Missing,
                MISSING_REASON,
            )
        })
        .collect();
    let missing_count = missing.len();
    problems.extend(missing);

    let summary = ValidationSummary {
        accepted: accepted.len(),
        observed: state.indices.len(),
        conflicts,
        extra,
        missing: missing_count,
    };

    tracing::debug!(
        cluster = %config.key,
        cluster_name = %config.name,
        accepted = summary.accepted,
        observed = summary.observed,
        conflicts = summary.conflicts,
        extra = summary.extra,
        missing = summary.missing,
        "Cluster validated"
    );

    (problems, summary)
}
