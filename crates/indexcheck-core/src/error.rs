//! Error types for reconciliation setup.
//!
//! Reconciliation itself never fails: every discrepancy is a [`Problem`],
//! not an error. Only building the configuration can go wrong.
//!
//! [`Problem`]: crate::model::Problem

use thiserror::Error;

use crate::model::ClusterKey;

/// Errors raised while assembling cluster configurations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An acceptor pattern failed to compile.
    #[error("Invalid acceptor pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Two cluster configurations share a key.
    #[error("Duplicate cluster configuration for {key}")]
    DuplicateClusterKey { key: ClusterKey },

    /// The fleet layout is internally inconsistent.
    #[error("Invalid fleet layout: {0}")]
    InvalidLayout(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
