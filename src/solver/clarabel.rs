//! Clarabel solver integration.
//!
//! This module solves the continuous relaxation of a `Problem` with the
//! Clarabel interior-point solver.

use clarabel::algebra::CscMatrix as ClarabelCsc;
use clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};

use super::stuffing::{stuff_problem, ConeDims, StuffedProblem};
use super::{Settings, Solution, SolveStatus};
use crate::error::{DistNetError, Result};
use crate::problem::Problem;

impl From<SolverStatus> for SolveStatus {
    fn from(status: SolverStatus) -> Self {
        match status {
            SolverStatus::Solved => SolveStatus::Optimal,
            SolverStatus::PrimalInfeasible => SolveStatus::Infeasible,
            SolverStatus::DualInfeasible => SolveStatus::Unbounded,
            SolverStatus::MaxIterations => SolveStatus::MaxIterations,
            SolverStatus::MaxTime => SolveStatus::TimedOut,
            SolverStatus::NumericalError | SolverStatus::InsufficientProgress => {
                SolveStatus::NumericalError
            }
            _ => SolveStatus::Unknown,
        }
    }
}

/// Solve the relaxation of `problem` using Clarabel.
pub fn solve(problem: &Problem, settings: &Settings) -> Result<Solution> {
    if settings.is_cancelled() {
        return Ok(Solution::failed(SolveStatus::Cancelled, 0.0));
    }
    let stuffed = stuff_problem(problem);
    log::debug!(
        "relaxation: {} columns, {} equality rows, {} inequality rows",
        stuffed.q.len(),
        stuffed.cone_dims.zero,
        stuffed.cone_dims.nonneg
    );
    solve_stuffed(&stuffed, settings)
}

/// Solve a stuffed problem using Clarabel.
pub fn solve_stuffed(problem: &StuffedProblem, settings: &Settings) -> Result<Solution> {
    // Convert to Clarabel format
    let p = to_clarabel_csc(&problem.p);
    let a = to_clarabel_csc(&problem.a);
    let cones = to_clarabel_cones(&problem.cone_dims);

    // Build Clarabel settings
    let time_limit = settings
        .time_limit
        .map_or(f64::INFINITY, |limit| limit.as_secs_f64());
    let clarabel_settings = DefaultSettingsBuilder::default()
        .verbose(settings.verbose)
        .max_iter(settings.max_iter)
        .time_limit(time_limit)
        .tol_gap_abs(settings.tol_gap_abs)
        .tol_gap_rel(settings.tol_gap_rel)
        .build()
        .map_err(|err| DistNetError::SolverError(err.to_string()))?;

    // Create and run solver
    let mut solver = DefaultSolver::new(&p, &problem.q, &a, &problem.b, &cones, clarabel_settings);
    solver.solve();

    // Extract solution
    let status: SolveStatus = solver.solution.status.into();
    let solve_time = solver.solution.solve_time;

    if status != SolveStatus::Optimal {
        log::debug!("relaxation terminated with {:?}", status);
        return Ok(Solution::failed(status, solve_time));
    }

    let x = solver.solution.x.clone();
    log::debug!(
        "relaxation solved in {:.3}s, max infeasibility {:.2e}",
        solve_time,
        problem.max_infeasibility(&x)
    );
    // q' x, with q negated for maximization
    let linear: f64 = problem.q.iter().zip(&x).map(|(qi, xi)| qi * xi).sum();
    let value = (if problem.negate { -linear } else { linear }) + problem.objective_offset;

    Ok(Solution {
        status,
        value: Some(value),
        primal: Some(x),
        solve_time,
    })
}

/// Convert nalgebra CSC to Clarabel CSC.
fn to_clarabel_csc(m: &nalgebra_sparse::CscMatrix<f64>) -> ClarabelCsc<f64> {
    ClarabelCsc::new(
        m.nrows(),
        m.ncols(),
        m.col_offsets().to_vec(),
        m.row_indices().to_vec(),
        m.values().to_vec(),
    )
}

/// Convert cone dimensions to Clarabel cones.
fn to_clarabel_cones(dims: &ConeDims) -> Vec<SupportedConeT<f64>> {
    let mut cones = Vec::new();

    if dims.zero > 0 {
        cones.push(SupportedConeT::ZeroConeT(dims.zero));
    }

    if dims.nonneg > 0 {
        cones.push(SupportedConeT::NonnegativeConeT(dims.nonneg));
    }

    cones
}
