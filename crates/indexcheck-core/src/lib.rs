//! # Index Reconciliation Core
//!
//! Decides, for every cluster of a search fleet, which indices are expected,
//! which exist without reason and which are claimed twice by the
//! configuration.
//!
//! ## Architecture
//!
//! Expected state is expressed through acceptors: pluggable claimants that
//! each yield the set of index names they take responsibility for on a
//! cluster.
//!
//! - [`Acceptor`] - Base trait every acceptor implements
//! - [`Explain`] - Optional capability for diagnosing unclaimed indices
//! - [`TenantAliasAcceptor`], [`PatternAcceptor`], [`AliasSetAcceptor`] - Built-in variants
//!
//! [`engine::validate`] compares one cluster's claims with its observed state;
//! [`Reconciler`] runs it across the fleet and attaches explanations.
//!
//! ## Example
//!
//! ```ignore
//! use indexcheck_core::prelude::*;
//!
//! let expected = ExpectedIndices::from_tenant_states(&tenants);
//! let clusters = FleetLayout::default().build_clusters(&expected)?;
//! let reconciler = Reconciler::new(clusters)?;
//!
//! let report = reconciler.reconcile(&observed_states);
//! println!("{}", serde_json::to_string(&report)?);
//! ```
//!
//! ## Crate Organization
//!
//! - [`model`] - Cluster keys, observed and expected state, problems
//! - [`acceptor`] - Acceptor protocol and built-in acceptors
//! - [`engine`] - Per-cluster validation
//! - [`explain`] - Heuristic diagnosis of unexpected tenant indices
//! - [`orchestrator`] - Fleet-wide reconciliation
//! - [`report`] - Serializable report
//! - [`fleet`] - Fleet layout and cluster configuration
//! - [`error`] - Error types

pub mod acceptor;
pub mod engine;
pub mod error;
pub mod explain;
pub mod fleet;
pub mod model;
pub mod orchestrator;
pub mod report;

pub use acceptor::{Acceptor, AliasSetAcceptor, Explain, PatternAcceptor, TenantAliasAcceptor};
pub use orchestrator::Reconciler;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::acceptor::{
        Acceptor, AliasSetAcceptor, Explain, PatternAcceptor, TenantAliasAcceptor,
        METASTORE_ALIAS,
    };
    pub use crate::engine::{validate, ValidationSummary};
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::explain::{diagnose, try_to_explain, Diagnosis, IndexName, Marker};
    pub use crate::fleet::{AcceptorSpec, FleetLayout, GroupLayout, ReplicaLayout};
    pub use crate::model::{
        ClusterConfig, ClusterKey, ExpectedIndices, ExpectedTenantState, ObservedState,
        ObservedStates, Problem, ProblemKind, TenantCluster,
    };
    pub use crate::orchestrator::Reconciler;
    pub use crate::report::{ClusterReport, ProblemEntry, ReconciliationReport};
}
