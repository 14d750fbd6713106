//! # Fleet Collaborators
//!
//! Everything the reconciliation core needs from the outside world:
//!
//! - [`ClusterStateFetcher`] - Live indices and aliases of a cluster ([`HttpStateFetcher`])
//! - [`TenantStateSource`] - Expected state of every tenant
//!   ([`CommandTenantSource`], [`FileTenantSource`])
//! - [`collect_states`] - Fetch every cluster with bounded concurrency
//! - [`run_fleet_check`] - Build clusters, collect state and reconcile
//!
//! A failure on one cluster is recorded as a [`FetchFailure`] and never stops
//! the rest of the run.

pub mod collect;
pub mod error;
pub mod fetch;
pub mod run;
pub mod tenants;

pub use collect::{collect_states, FetchFailure, FleetCollection, DEFAULT_MAX_CONCURRENT_FETCHES};
pub use error::{FleetError, FleetResult};
pub use fetch::{ClusterStateFetcher, HttpStateFetcher, DEFAULT_TIMEOUT_SECS};
pub use run::{run_fleet_check, FleetRun, RunOptions};
pub use tenants::{
    parse_tenant_document, CommandTenantSource, FileTenantSource, TenantStateSource,
};

// Re-export async_trait for fetcher and source implementors
pub use async_trait::async_trait;
