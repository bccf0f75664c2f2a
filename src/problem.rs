//! Problem definition and solving API.
//!
//! A `Problem` is an explicit mixed-integer linear program:
//! - An objective (minimize or maximize a `LinExpr`)
//! - Variable descriptors with bounds and domains
//! - A list of linear constraint records
//!
//! Variables are added first and referenced by the returned `VarId`:
//! ```ignore
//! let mut problem = Problem::new();
//! let x = problem.add_variable(VariableBuilder::continuous("x").build())?;
//! problem.set_objective(Objective::Minimize(LinExpr::var(x)));
//! problem.add_constraint(LinExpr::var(x).geq(1.0).named("lower"))?;
//! let solution = problem.solve()?;
//! ```

use crate::constraints::Constraint;
use crate::error::{DistNetError, Result};
use crate::expr::{LinExpr, VarId, Variable};
use crate::solver::{clarabel, milp, Settings, Solution, SolveStatus};

/// Objective type for optimization problems.
#[derive(Debug, Clone, PartialEq)]
pub enum Objective {
    /// Minimize the expression.
    Minimize(LinExpr),
    /// Maximize the expression.
    Maximize(LinExpr),
}

impl Objective {
    /// Get the expression being optimized.
    pub fn expr(&self) -> &LinExpr {
        match self {
            Objective::Minimize(e) | Objective::Maximize(e) => e,
        }
    }

    /// Check if this is a minimization.
    pub fn is_minimize(&self) -> bool {
        matches!(self, Objective::Minimize(_))
    }
}

impl Default for Objective {
    fn default() -> Self {
        Objective::Minimize(LinExpr::zero())
    }
}

/// An optimization problem.
#[derive(Debug, Clone, Default)]
pub struct Problem {
    /// The objective to optimize.
    pub objective: Objective,
    /// The decision variables, indexed by `VarId`.
    pub variables: Vec<Variable>,
    /// The constraints.
    pub constraints: Vec<Constraint>,
}

impl Problem {
    /// Create an empty minimization problem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable, rejecting conflicting or non-finite lower bounds.
    pub fn add_variable(&mut self, var: Variable) -> Result<VarId> {
        if !var.bounds_are_consistent() {
            return Err(DistNetError::InvalidProblem(format!(
                "variable `{}` has conflicting bounds [{}, {:?}]",
                var.name, var.lower, var.upper
            )));
        }
        let id = VarId(self.variables.len());
        self.variables.push(var);
        Ok(id)
    }

    /// Replace the objective.
    pub fn set_objective(&mut self, objective: Objective) {
        self.objective = objective;
    }

    /// Add a single constraint.
    pub fn add_constraint(&mut self, c: Constraint) -> Result<()> {
        self.check_expr(&c.expr, &c.name)?;
        if !c.rhs.is_finite() {
            return Err(DistNetError::InvalidProblem(format!(
                "constraint `{}` has non-finite right-hand side {}",
                c.name, c.rhs
            )));
        }
        self.constraints.push(c);
        Ok(())
    }

    /// Add constraints to the problem.
    pub fn subject_to(&mut self, constraints: impl IntoIterator<Item = Constraint>) -> Result<()> {
        for c in constraints {
            self.add_constraint(c)?;
        }
        Ok(())
    }

    fn check_expr(&self, expr: &LinExpr, name: &str) -> Result<()> {
        if let Some(var) = expr.max_var() {
            if var.index() >= self.variables.len() {
                return Err(DistNetError::InvalidProblem(format!(
                    "`{}` references unknown variable x{}",
                    name,
                    var.index()
                )));
            }
        }
        if expr.terms.iter().any(|(_, c)| !c.is_finite()) || !expr.constant.is_finite() {
            return Err(DistNetError::InvalidProblem(format!(
                "`{}` has a non-finite coefficient",
                name
            )));
        }
        Ok(())
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Number of binary variables.
    pub fn num_binaries(&self) -> usize {
        self.variables.iter().filter(|v| v.is_binary()).count()
    }

    pub fn variable(&self, id: VarId) -> &Variable {
        &self.variables[id.index()]
    }

    /// Look up a variable by name.
    pub fn find_variable(&self, name: &str) -> Option<VarId> {
        self.variables.iter().position(|v| v.name == name).map(VarId)
    }

    /// Constraints whose name belongs to `family`.
    pub fn constraints_in<'a>(&'a self, family: &'a str) -> impl Iterator<Item = &'a Constraint> + 'a {
        self.constraints.iter().filter(move |c| c.family() == family)
    }

    /// Objective value at `x`.
    pub fn objective_value(&self, x: &[f64]) -> f64 {
        self.objective.expr().eval(x)
    }

    /// Constraints violated at `x` by more than `tol`.
    pub fn violated_constraints(&self, x: &[f64], tol: f64) -> Vec<&Constraint> {
        self.constraints
            .iter()
            .filter(|c| !c.is_satisfied(x, tol))
            .collect()
    }

    /// Check bounds, integrality and every constraint at `x`.
    pub fn is_feasible(&self, x: &[f64], tol: f64) -> bool {
        x.len() == self.variables.len()
            && self
                .variables
                .iter()
                .zip(x)
                .all(|(v, &value)| v.bound_violation(value) <= tol)
            && self.violated_constraints(x, tol).is_empty()
    }

    /// Solve the problem with default settings.
    pub fn solve(&self) -> Result<Solution> {
        self.solve_with(&Settings::default())
    }

    /// Solve the mixed-integer problem with custom settings.
    pub fn solve_with(&self, settings: &Settings) -> Result<Solution> {
        log::debug!(
            "solving MILP: {} variables ({} binary), {} constraints",
            self.num_variables(),
            self.num_binaries(),
            self.num_constraints()
        );
        let solution = milp::solve(self, settings);
        check_status(solution, settings)
    }

    /// Solve the continuous relaxation: binaries relaxed to `[0, 1]`.
    ///
    /// For a minimization the optimal value is a lower bound on the
    /// mixed-integer optimum.
    pub fn solve_relaxation(&self, settings: &Settings) -> Result<Solution> {
        let solution = clarabel::solve(self, settings)?;
        check_status(solution, settings)
    }
}

/// Map a non-optimal status to its error; no partial results escape.
fn check_status(solution: Solution, settings: &Settings) -> Result<Solution> {
    match solution.status {
        SolveStatus::Optimal => Ok(solution),
        SolveStatus::Infeasible => Err(DistNetError::Infeasible),
        SolveStatus::Unbounded => Err(DistNetError::Unbounded),
        SolveStatus::TimedOut => Err(DistNetError::TimedOut(
            settings.time_limit.unwrap_or_default(),
        )),
        SolveStatus::Cancelled => Err(DistNetError::Cancelled),
        SolveStatus::MaxIterations => {
            Err(DistNetError::SolverError("Maximum iterations reached".into()))
        }
        SolveStatus::NumericalError => Err(DistNetError::NumericalError(
            "Solver encountered numerical difficulties".into(),
        )),
        SolveStatus::Unknown => Err(DistNetError::SolverError("Unknown solver status".into())),
    }
}
