//! Matrix stuffing: converts a `Problem` to conic solver format.
//!
//! This module builds the vector q, the matrix A and vector b, and the cone
//! layout required by Clarabel for the continuous relaxation:
//!
//! ```text
//! minimize    q'x
//! subject to  Ax + s = b,  s in K
//! ```
//!
//! K is a zero cone (equalities) followed by a nonnegative orthant
//! (inequalities and variable bounds). Binary variables are relaxed to the
//! box `[0, 1]`.

use nalgebra_sparse::CscMatrix;

use crate::constraints::Sense;
use crate::problem::Problem;
use crate::sparse::{csc_from_triplets, csc_mul_vec};

/// Cone dimensions for Clarabel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConeDims {
    /// Number of zero cone (equality) constraints.
    pub zero: usize,
    /// Number of nonnegative cone constraints.
    pub nonneg: usize,
}

impl ConeDims {
    /// Total number of constraint rows.
    pub fn total(&self) -> usize {
        self.zero + self.nonneg
    }
}

/// Stuffed problem ready for Clarabel.
#[derive(Debug)]
pub struct StuffedProblem {
    /// Quadratic cost matrix P (n x n); always zero for a linear program.
    pub p: CscMatrix<f64>,
    /// Linear cost vector q (n), negated for maximization.
    pub q: Vec<f64>,
    /// Constraint matrix A (m x n).
    pub a: CscMatrix<f64>,
    /// Constraint vector b (m).
    pub b: Vec<f64>,
    /// Cone dimensions.
    pub cone_dims: ConeDims,
    /// Constant offset in objective.
    pub objective_offset: f64,
    /// Whether the solver's optimum must be negated to recover a maximum.
    pub negate: bool,
}

impl StuffedProblem {
    /// Slack `s = b - Ax` of the point `x`.
    ///
    /// `x` is feasible for the relaxation when the first `cone_dims.zero`
    /// entries are zero and the rest are nonnegative.
    pub fn slack(&self, x: &[f64]) -> Vec<f64> {
        csc_mul_vec(&self.a, x)
            .into_iter()
            .zip(&self.b)
            .map(|(ax, b)| b - ax)
            .collect()
    }

    /// Largest cone violation of `x`: `|s|` on equality rows, `-s` on
    /// inequality rows, zero when `x` is feasible.
    pub fn max_infeasibility(&self, x: &[f64]) -> f64 {
        let s = self.slack(x);
        let (zero, nonneg) = s.split_at(self.cone_dims.zero.min(s.len()));
        zero.iter()
            .map(|v| v.abs())
            .chain(nonneg.iter().map(|v| (-v).max(0.0)))
            .fold(0.0, f64::max)
    }
}

/// Accumulates rows of A and b as triplets.
#[derive(Default)]
struct RowBuilder {
    rows: Vec<usize>,
    cols: Vec<usize>,
    vals: Vec<f64>,
    b: Vec<f64>,
}

impl RowBuilder {
    /// Append the row `sign * coeffs . x + s = sign * rhs`.
    fn push(&mut self, terms: impl IntoIterator<Item = (usize, f64)>, rhs: f64, sign: f64) {
        let row = self.b.len();
        for (col, val) in terms {
            self.rows.push(row);
            self.cols.push(col);
            self.vals.push(val * sign);
        }
        self.b.push(rhs * sign);
    }
}

/// Build the stuffed relaxation of `problem`.
pub fn stuff_problem(problem: &Problem) -> StuffedProblem {
    let n = problem.num_variables();

    // Objective: q vector (P stays zero)
    let objective = problem.objective.expr().compact();
    let negate = !problem.objective.is_minimize();
    let sign = if negate { -1.0 } else { 1.0 };
    let mut q = vec![0.0; n];
    for &(var, coeff) in &objective.terms {
        q[var.index()] = coeff * sign;
    }

    // Zero cone rows first, then nonnegative rows.
    let mut zeros = RowBuilder::default();
    let mut nonnegs = RowBuilder::default();

    for constraint in &problem.constraints {
        let row = constraint.normalized();
        let terms = row.expr.terms.iter().map(|&(v, c)| (v.index(), c));
        match row.sense {
            // Ax = b
            Sense::Eq => zeros.push(terms, row.rhs, 1.0),
            // Ax + s = b, s >= 0 gives Ax <= b
            Sense::Le => nonnegs.push(terms, row.rhs, 1.0),
            // -Ax + s = -b gives Ax >= b
            Sense::Ge => nonnegs.push(terms, row.rhs, -1.0),
        }
    }

    // Bounds: -x <= -lower, x <= upper. Binaries are already boxed in [0, 1].
    for (col, var) in problem.variables.iter().enumerate() {
        nonnegs.push([(col, 1.0)], var.lower, -1.0);
        if let Some(upper) = var.upper {
            nonnegs.push([(col, 1.0)], upper, 1.0);
        }
    }

    let cone_dims = ConeDims {
        zero: zeros.b.len(),
        nonneg: nonnegs.b.len(),
    };

    let offset = zeros.b.len();
    let mut a_rows = zeros.rows;
    let mut a_cols = zeros.cols;
    let mut a_vals = zeros.vals;
    let mut b = zeros.b;
    a_rows.extend(nonnegs.rows.into_iter().map(|r| r + offset));
    a_cols.extend(nonnegs.cols);
    a_vals.extend(nonnegs.vals);
    b.extend(nonnegs.b);

    let a = csc_from_triplets(cone_dims.total(), n, a_rows, a_cols, a_vals);

    StuffedProblem {
        p: CscMatrix::zeros(n, n),
        q,
        a,
        b,
        cone_dims,
        objective_offset: objective.constant,
        negate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::ConstraintExt;
    use crate::expr::{LinExpr, VariableBuilder};
    use crate::problem::Objective;

    fn sample() -> Problem {
        let mut problem = Problem::new();
        let x = problem
            .add_variable(VariableBuilder::continuous("x").upper(Some(4.0)).build())
            .unwrap();
        let y = problem.add_variable(VariableBuilder::binary("y").build()).unwrap();
        problem.set_objective(Objective::Maximize(
            LinExpr::var(x) + LinExpr::var(y) * 3.0 + LinExpr::constant(1.0),
        ));
        problem.add_constraint(LinExpr::sum([x, y]).geq(1.0)).unwrap();
        problem.add_constraint(LinExpr::sum([x, y]).equals(2.0)).unwrap();
        problem
    }

    #[test]
    fn test_cone_dims() {
        let stuffed = stuff_problem(&sample());
        // One equality; one inequality plus 2 lower and 2 upper bounds.
        assert_eq!(stuffed.cone_dims, ConeDims { zero: 1, nonneg: 5 });
        assert_eq!(stuffed.cone_dims.total(), 6);
        assert_eq!(stuffed.a.nrows(), 6);
        assert_eq!(stuffed.a.ncols(), 2);
    }

    #[test]
    fn test_equalities_first() {
        let stuffed = stuff_problem(&sample());
        assert_eq!(stuffed.b[0], 2.0);
        // x + y >= 1 becomes -x - y <= -1
        assert_eq!(stuffed.b[1], -1.0);
    }

    #[test]
    fn test_maximize_negates_cost() {
        let stuffed = stuff_problem(&sample());
        assert!(stuffed.negate);
        assert_eq!(stuffed.q, vec![-1.0, -3.0]);
        assert_eq!(stuffed.objective_offset, 1.0);
    }

    #[test]
    fn test_slack_of_feasible_point() {
        let stuffed = stuff_problem(&sample());
        // x = 1, y = 1 satisfies x + y = 2, x + y >= 1 and the bounds.
        let s = stuffed.slack(&[1.0, 1.0]);
        assert_eq!(s[0], 0.0);
        assert!(s[1..].iter().all(|v| *v >= 0.0), "{:?}", s);

        // x = 5 breaks x <= 4.
        let s = stuffed.slack(&[5.0, -3.0]);
        assert!(s[1..].iter().any(|v| *v < 0.0));

        assert_eq!(stuffed.max_infeasibility(&[1.0, 1.0]), 0.0);
        // x + y = 3 misses the equality by 1; x <= 4 holds.
        assert_eq!(stuffed.max_infeasibility(&[2.0, 1.0]), 1.0);
    }

    #[test]
    fn test_unbounded_variable_has_no_upper_row() {
        let mut problem = Problem::new();
        problem
            .add_variable(VariableBuilder::continuous("x").build())
            .unwrap();
        let stuffed = stuff_problem(&problem);
        assert_eq!(stuffed.cone_dims, ConeDims { zero: 0, nonneg: 1 });
    }
}
