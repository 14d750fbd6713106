//! Fleet collaborator error types
//!
//! Errors here are fatal to one cluster or to tenant loading, never to the
//! reconciliation of other clusters.

use indexcheck_core::error::CoreError;
use thiserror::Error;

/// Error raised while collecting state from the fleet.
#[derive(Debug, Error)]
pub enum FleetError {
    // Cluster errors
    /// Transport failure or non-success HTTP status.
    #[error("cluster {cluster} unreachable: {message}")]
    ClusterUnreachable { cluster: String, message: String },

    /// A different cluster answered at the configured endpoint.
    #[error("cluster identity mismatch: expected {expected}, got {actual}")]
    ClusterIdentityMismatch { expected: String, actual: String },

    /// The cluster answered with a body of the wrong shape.
    #[error("malformed response from {cluster}: {message}")]
    MalformedResponse { cluster: String, message: String },

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    // Tenant state errors
    /// An external command could not be run or exited unsuccessfully.
    #[error("command `{command}` failed: {message}")]
    CommandFailed { command: String, message: String },

    /// A tenant's expected-state document could not be parsed.
    #[error("invalid tenant state for {tenant}: {message}")]
    InvalidTenantState { tenant: String, message: String },

    /// Configuration could not be turned into clusters.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FleetError {
    /// Whether the error concerns a single cluster.
    pub fn is_cluster_failure(&self) -> bool {
        matches!(
            self,
            FleetError::ClusterUnreachable { .. }
                | FleetError::ClusterIdentityMismatch { .. }
                | FleetError::MalformedResponse { .. }
        )
    }

    /// Short classification code.
    pub fn error_code(&self) -> &'static str {
        match self {
            FleetError::ClusterUnreachable { .. } => "CLUSTER_UNREACHABLE",
            FleetError::ClusterIdentityMismatch { .. } => "CLUSTER_IDENTITY_MISMATCH",
            FleetError::MalformedResponse { .. } => "MALFORMED_RESPONSE",
            FleetError::HttpClient(_) => "HTTP_CLIENT",
            FleetError::CommandFailed { .. } => "COMMAND_FAILED",
            FleetError::InvalidTenantState { .. } => "INVALID_TENANT_STATE",
            FleetError::Core(_) => "INVALID_CONFIGURATION",
            FleetError::Io(_) => "IO_ERROR",
            FleetError::Json(_) => "JSON_ERROR",
        }
    }
}

/// Result type for fleet operations.
pub type FleetResult<T> = Result<T, FleetError>;
