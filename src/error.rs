//! Gauntlet error types

use thiserror::Error;

/// Gauntlet error type
#[derive(Error, Debug)]
pub enum Error {
    /// Denied by the policy layer. Recoverable: callers render the reason
    /// as a denial message and continue.
    #[error("{reason}")]
    PermissionDenied {
        /// Bounded human-readable reason, as logged.
        reason: String,
    },

    /// The requested table does not exist in the data store. Distinct from
    /// a permission denial.
    #[error("Table not found: {table}")]
    NotFound {
        /// The missing table name.
        table: String,
    },

    /// A policy document or configuration file failed to load or parse.
    /// Fatal at startup: no decision can be made without a rule set.
    #[error("Policy error: {0}")]
    Policy(String),

    /// Audit log error
    #[error("Audit error: {0}")]
    Audit(String),

    /// Metrics export error
    #[error("Export error: {0}")]
    Export(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for Gauntlet operations
pub type Result<T> = std::result::Result<T, Error>;
