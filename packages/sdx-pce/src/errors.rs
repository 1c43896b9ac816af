//! Error types for sdx-pce
//!
//! Provides unified error handling across the crate.

use thiserror::Error;

/// Main error type for sdx-pce operations
#[derive(Debug, Error)]
pub enum PceError {
    /// Malformed ingest data (label ranges, VLAN specs, request shapes)
    #[error("validation error: {0}")]
    Validation(String),

    /// A topology element could not be resolved. Expected during
    /// partial-topology states; callers should treat this as a failed
    /// computation, not a crash.
    #[error("not found: {0}")]
    NotFound(String),

    /// No VLAN tag could be reserved for a domain segment
    #[error("no VLAN tag available on domain {0}")]
    VlanUnavailable(String),

    /// Operation is deliberately unimplemented
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// Ingest payload failed to deserialize
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl PceError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        PceError::Validation(msg.into())
    }

    /// Create a not-found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        PceError::NotFound(msg.into())
    }
}

/// Result type alias for sdx-pce operations
pub type Result<T> = std::result::Result<T, PceError>;
