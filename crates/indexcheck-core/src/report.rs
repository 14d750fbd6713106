//! Reconciliation report.
//!
//! Serializes as a JSON list of clusters, each with its endpoint and the
//! problems found on it. Clean clusters are left out.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{Problem, ProblemKind};

/// One finalized problem, as reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemEntry {
    pub index: String,
    pub kind: ProblemKind,
    pub reason: String,
}

impl From<Problem> for ProblemEntry {
    fn from(problem: Problem) -> Self {
        Self {
            index: problem.index,
            kind: problem.kind,
            reason: problem.reason,
        }
    }
}

/// Problems found on one cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterReport {
    pub cluster_name: String,
    #[serde(rename = "url")]
    pub endpoint: String,
    pub problems: Vec<ProblemEntry>,
}

impl ClusterReport {
    /// Number of problems of a given kind.
    #[must_use]
    pub fn count(&self, kind: ProblemKind) -> usize {
        self.problems.iter().filter(|p| p.kind == kind).count()
    }
}

/// Result of reconciling the whole fleet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReconciliationReport {
    pub clusters: Vec<ClusterReport>,
}

impl ReconciliationReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a cluster's problems; clean clusters are dropped.
    pub fn push(&mut self, report: ClusterReport) {
        if !report.problems.is_empty() {
            self.clusters.push(report);
        }
    }

    /// Total number of problems across all clusters.
    #[must_use]
    pub fn total_problems(&self) -> usize {
        self.clusters.iter().map(|c| c.problems.len()).sum()
    }

    /// Problem counts grouped by kind.
    #[must_use]
    pub fn count_by_kind(&self) -> BTreeMap<ProblemKind, usize> {
        let mut counts = BTreeMap::new();
        for problem in self.clusters.iter().flat_map(|c| &c.problems) {
            *counts.entry(problem.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Whether no problem was found anywhere.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Report for a cluster by name.
    #[must_use]
    pub fn cluster(&self, cluster_name: &str) -> Option<&ClusterReport> {
        self.clusters.iter().find(|c| c.cluster_name == cluster_name)
    }
}
