//! Acceptor protocol
//!
//! Capability-based definitions for the pluggable pieces that claim indices
//! on a cluster. Every acceptor yields the set of index names it takes
//! responsibility for; some can additionally explain why an unclaimed index
//! exists.

mod alias_set;
mod pattern;
mod tenant;

pub use alias_set::AliasSetAcceptor;
pub use pattern::PatternAcceptor;
pub use tenant::{
    TenantAliasAcceptor, METASTORE_ALIAS, SUGGEST_EXEMPT_ALIAS_SUFFIX,
    SUGGEST_EXEMPT_CLUSTER_PREFIX,
};

use std::collections::BTreeSet;
use std::fmt;

use crate::model::{ObservedState, ObservedStates, Problem};

/// Base trait for all acceptors.
///
/// `accept` must be a pure function of the given state and the acceptor's
/// own configuration. The returned names are the indices the acceptor
/// asserts should exist; they need not be present. Missing aliases are
/// signaled by omission or by yielding the alias name, never by failing.
pub trait Acceptor: Send + Sync + fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Index names this acceptor claims on the given cluster.
    fn accept(&self, state: &ObservedState) -> BTreeSet<String>;

    /// Explanation capability, when the acceptor has one.
    fn explainer(&self) -> Option<&dyn Explain> {
        None
    }
}

/// Capability for diagnosing why an unclaimed index exists.
///
/// Explanation is best effort: anything the implementation does not
/// recognize yields `None`.
pub trait Explain: Send + Sync {
    /// Diagnose a problem using every cluster's observed state.
    fn explain(&self, problem: &Problem, states: &ObservedStates) -> Option<String>;
}
