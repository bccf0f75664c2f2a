//! Error types for distnet.

use std::time::Duration;

use thiserror::Error;

/// Error type for distnet operations.
#[derive(Debug, Error)]
pub enum DistNetError {
    /// The parameter table is malformed: missing entry, unknown node,
    /// negative or non-finite value.
    #[error("Invalid parameters in `{table}` at `{key}`: {reason}")]
    InvalidParams {
        table: &'static str,
        key: String,
        reason: String,
    },

    /// The optimization model itself is malformed (conflicting bounds,
    /// unknown variable).
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    /// No assignment satisfies all constraints.
    #[error("Problem is infeasible")]
    Infeasible,

    /// The objective can be decreased without bound.
    #[error("Problem is unbounded")]
    Unbounded,

    /// The solver did not finish within the configured time limit.
    #[error("Solver time limit of {0:?} reached")]
    TimedOut(Duration),

    /// The solve was cancelled through its cancellation token.
    #[error("Solve was cancelled")]
    Cancelled,

    /// Solver error.
    #[error("Solver error: {0}")]
    SolverError(String),

    /// Numerical error.
    #[error("Numerical error: {0}")]
    NumericalError(String),

    /// Reading a parameter file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A parameter file is not valid JSON for the expected layout.
    #[error("Malformed parameter file: {0}")]
    Json(#[from] serde_json::Error),
}

impl DistNetError {
    pub(crate) fn invalid(table: &'static str, key: impl Into<String>, reason: impl Into<String>) -> Self {
        DistNetError::InvalidParams {
            table,
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for distnet operations.
pub type Result<T> = std::result::Result<T, DistNetError>;
