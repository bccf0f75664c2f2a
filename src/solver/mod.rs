//! Solver interface for distnet.
//!
//! This module provides:
//! - `milp`: the mixed-integer solve through the `microlp` native interface,
//!   bounded by a time limit and a cancellation token
//! - Matrix stuffing to convert a `Problem` to conic solver format
//! - Clarabel integration for the continuous relaxation

pub mod cancel;
pub mod clarabel;
pub mod milp;
pub mod stuffing;

use std::time::Duration;

pub use cancel::CancelToken;
pub use stuffing::{stuff_problem, ConeDims, StuffedProblem};

use crate::expr::VarId;

/// Solution status from the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// Optimal solution found.
    Optimal,
    /// Problem is infeasible.
    Infeasible,
    /// Problem is unbounded.
    Unbounded,
    /// Maximum iterations reached.
    MaxIterations,
    /// Numerical difficulties.
    NumericalError,
    /// The time limit expired before the solver finished.
    TimedOut,
    /// The cancellation token was triggered.
    Cancelled,
    /// Unknown status.
    Unknown,
}

/// Solver settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Print solver output (relaxation solver only).
    pub verbose: bool,
    /// Maximum interior-point iterations for the relaxation.
    pub max_iter: u32,
    /// Wall-clock limit on a solve; `None` waits indefinitely.
    pub time_limit: Option<Duration>,
    /// Absolute tolerance.
    pub tol_gap_abs: f64,
    /// Relative tolerance.
    pub tol_gap_rel: f64,
    /// Binary values within this distance of 0 or 1 are snapped to it.
    pub integrality_tol: f64,
    /// Checked while waiting for the solver; set it to abandon the solve.
    pub cancel: Option<CancelToken>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            verbose: false,
            max_iter: 200,
            time_limit: None,
            tol_gap_abs: 1e-8,
            tol_gap_rel: 1e-8,
            integrality_tol: 1e-6,
            cancel: None,
        }
    }
}

impl Settings {
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map_or(false, CancelToken::is_cancelled)
    }
}

/// Solution from the solver.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Solution status.
    pub status: SolveStatus,
    /// Optimal value (if solved).
    pub value: Option<f64>,
    /// Primal variable values indexed by `VarId` (if solved).
    pub primal: Option<Vec<f64>>,
    /// Solve time in seconds.
    pub solve_time: f64,
}

impl Solution {
    /// A solution carrying only a non-optimal status.
    pub(crate) fn failed(status: SolveStatus, solve_time: f64) -> Self {
        Solution {
            status,
            value: None,
            primal: None,
            solve_time,
        }
    }

    /// Get the value of a variable.
    pub fn get_value(&self, var: VarId) -> Option<f64> {
        self.primal.as_ref().and_then(|p| p.get(var.index()).copied())
    }

    /// All primal values, empty if the problem was not solved.
    pub fn values(&self) -> &[f64] {
        self.primal.as_deref().unwrap_or(&[])
    }
}

impl std::ops::Index<VarId> for Solution {
    type Output = f64;

    /// # Panics
    ///
    /// Panics if the problem was not solved or the variable is not part of
    /// it. Use `get_value()` for the fallible version.
    fn index(&self, var: VarId) -> &f64 {
        &self.values()[var.index()]
    }
}
