//! Mixed-integer solve through the `microlp` native interface.
//!
//! `microlp` has no time limit or interrupt of its own. The solve runs on a
//! worker thread while the calling thread waits on a channel, waking every
//! `POLL_INTERVAL` to check the deadline and the cancellation token. A
//! solve abandoned this way keeps running on its thread until it finishes;
//! its result is then dropped.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use microlp::{ComparisonOp, OptimizationDirection, Variable as LpVariable};

use super::{Settings, Solution, SolveStatus};
use crate::constraints::Sense;
use crate::expr::VarDomain;
use crate::problem::Problem;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

type Outcome = std::result::Result<(f64, Vec<f64>), microlp::Error>;

/// Solve `problem` to optimality, honouring the time limit and cancellation
/// token in `settings`.
pub fn solve(problem: &Problem, settings: &Settings) -> Solution {
    let start = Instant::now();
    let (lp, columns) = to_microlp(problem);

    let (tx, rx) = mpsc::channel::<Outcome>();
    let spawned = thread::Builder::new()
        .name("distnet-milp".into())
        .spawn(move || {
            let outcome = lp.solve().map(|sol| {
                let values = columns.iter().map(|&c| *sol.var_value(c)).collect();
                (sol.objective(), values)
            });
            // The receiver is gone if the caller gave up; nothing to report.
            let _ = tx.send(outcome);
        });
    if let Err(err) = spawned {
        log::error!("could not start solver thread: {}", err);
        return Solution::failed(SolveStatus::Unknown, start.elapsed().as_secs_f64());
    }

    let deadline = settings.time_limit.map(|limit| start + limit);
    let outcome = loop {
        if settings.is_cancelled() {
            log::info!("solve cancelled after {:.3}s", start.elapsed().as_secs_f64());
            return Solution::failed(SolveStatus::Cancelled, start.elapsed().as_secs_f64());
        }
        let wait = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    log::warn!("solver time limit reached after {:.3}s", start.elapsed().as_secs_f64());
                    return Solution::failed(SolveStatus::TimedOut, start.elapsed().as_secs_f64());
                }
                POLL_INTERVAL.min(deadline - now)
            }
            None => POLL_INTERVAL,
        };
        match rx.recv_timeout(wait) {
            Ok(outcome) => break outcome,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                log::error!("solver thread exited without a result");
                return Solution::failed(SolveStatus::Unknown, start.elapsed().as_secs_f64());
            }
        }
    };
    let solve_time = start.elapsed().as_secs_f64();

    match outcome {
        Ok((objective, mut values)) => {
            snap_binaries(problem, &mut values, settings.integrality_tol);
            log::debug!("MILP solved in {:.3}s, objective {}", solve_time, objective);
            Solution {
                status: SolveStatus::Optimal,
                value: Some(problem.objective_value(&values)),
                primal: Some(values),
                solve_time,
            }
        }
        Err(err) => {
            let status = SolveStatus::from(&err);
            log::debug!("MILP terminated with {:?}: {}", status, err);
            Solution::failed(status, solve_time)
        }
    }
}

impl From<&microlp::Error> for SolveStatus {
    fn from(err: &microlp::Error) -> Self {
        match err {
            microlp::Error::Infeasible => SolveStatus::Infeasible,
            microlp::Error::Unbounded => SolveStatus::Unbounded,
            microlp::Error::InternalError(msg) => {
                log::error!("microlp internal error: {}", msg);
                SolveStatus::Unknown
            }
        }
    }
}

/// Translate the problem into a `microlp::Problem`, returning the column
/// handle for every variable in `VarId` order.
fn to_microlp(problem: &Problem) -> (microlp::Problem, Vec<LpVariable>) {
    let direction = if problem.objective.is_minimize() {
        OptimizationDirection::Minimize
    } else {
        OptimizationDirection::Maximize
    };
    let objective = problem.objective.expr().compact();
    let mut obj_coeffs = vec![0.0; problem.num_variables()];
    for &(var, coeff) in &objective.terms {
        obj_coeffs[var.index()] = coeff;
    }

    let mut lp = microlp::Problem::new(direction);
    let columns: Vec<LpVariable> = problem
        .variables
        .iter()
        .zip(&obj_coeffs)
        .map(|(var, &coeff)| match var.domain {
            VarDomain::Binary => lp.add_binary_var(coeff),
            VarDomain::Continuous => {
                lp.add_var(coeff, (var.lower, var.upper.unwrap_or(f64::INFINITY)))
            }
        })
        .collect();

    for constraint in &problem.constraints {
        let row = constraint.normalized();
        let op = match row.sense {
            Sense::Le => ComparisonOp::Le,
            Sense::Ge => ComparisonOp::Ge,
            Sense::Eq => ComparisonOp::Eq,
        };
        let terms: Vec<(LpVariable, f64)> = row
            .expr
            .terms
            .iter()
            .map(|&(var, coeff)| (columns[var.index()], coeff))
            .collect();
        lp.add_constraint(terms, op, row.rhs);
    }

    (lp, columns)
}

/// Replace near-integral binary values with their exact 0 or 1.
fn snap_binaries(problem: &Problem, values: &mut [f64], tol: f64) {
    for (var, value) in problem.variables.iter().zip(values.iter_mut()) {
        if var.is_binary() {
            let rounded = value.round();
            if (rounded - *value).abs() <= tol {
                *value = rounded;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::ConstraintExt;
    use crate::expr::{LinExpr, VariableBuilder};
    use crate::problem::Objective;
    use crate::solver::CancelToken;

    fn facility_problem() -> Problem {
        // One facility with fixed cost 100 serving demand 10 at unit cost 2.
        let mut problem = Problem::new();
        let flow = problem
            .add_variable(VariableBuilder::continuous("flow").build())
            .unwrap();
        let open = problem.add_variable(VariableBuilder::binary("open").build()).unwrap();
        problem.set_objective(Objective::Minimize(
            [(flow, 2.0), (open, 100.0)].into_iter().collect(),
        ));
        problem.add_constraint(LinExpr::var(flow).geq(10.0)).unwrap();
        problem
            .add_constraint((LinExpr::var(open) * 10.0 - LinExpr::var(flow)).geq(0.0))
            .unwrap();
        problem
    }

    #[test]
    fn test_solve_facility() {
        let solution = solve(&facility_problem(), &Settings::default());
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert!((solution.value.unwrap() - 120.0).abs() < 1e-6);
        assert_eq!(solution.values()[1], 1.0);
    }

    #[test]
    fn test_objective_constant_included() {
        let mut problem = facility_problem();
        let expr = problem.objective.expr().clone() + LinExpr::constant(5.0);
        problem.set_objective(Objective::Minimize(expr));
        let solution = solve(&problem, &Settings::default());
        assert!((solution.value.unwrap() - 125.0).abs() < 1e-6);
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancelToken::new();
        token.cancel();
        let settings = Settings::default().with_cancel(token);
        let solution = solve(&facility_problem(), &settings);
        assert_eq!(solution.status, SolveStatus::Cancelled);
        assert!(solution.primal.is_none());
    }

    #[test]
    fn test_zero_time_limit() {
        let settings = Settings::default().with_time_limit(Duration::ZERO);
        let solution = solve(&facility_problem(), &settings);
        assert_eq!(solution.status, SolveStatus::TimedOut);
    }

    #[test]
    fn test_snap_binaries() {
        let problem = facility_problem();
        let mut values = vec![9.9999999, 0.9999999];
        snap_binaries(&problem, &mut values, 1e-6);
        assert_eq!(values, vec![9.9999999, 1.0]);
    }
}
