//! Linear constraint records.
//!
//! A constraint is `expr (<=|>=|==) rhs`. Constraints map to cones in the
//! conic relaxation:
//! - Eq: zero cone
//! - Le / Ge: nonnegative orthant

use std::fmt;

use crate::expr::LinExpr;

/// Relation between the left-hand side and the right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    /// `expr <= rhs`
    Le,
    /// `expr >= rhs`
    Ge,
    /// `expr == rhs`
    Eq,
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Sense::Le => "<=",
            Sense::Ge => ">=",
            Sense::Eq => "==",
        };
        f.write_str(s)
    }
}

/// A linear constraint in an optimization problem.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Name such as `supply[BO]`; the part before `[` is the family.
    pub name: String,
    pub expr: LinExpr,
    pub sense: Sense,
    pub rhs: f64,
}

impl Constraint {
    /// Create an inequality constraint: lhs <= rhs.
    pub fn leq(expr: LinExpr, rhs: f64) -> Self {
        Self::new(expr, Sense::Le, rhs)
    }

    /// Create an inequality constraint: lhs >= rhs.
    pub fn geq(expr: LinExpr, rhs: f64) -> Self {
        Self::new(expr, Sense::Ge, rhs)
    }

    /// Create an equality constraint: lhs == rhs.
    pub fn eq(expr: LinExpr, rhs: f64) -> Self {
        Self::new(expr, Sense::Eq, rhs)
    }

    fn new(expr: LinExpr, sense: Sense, rhs: f64) -> Self {
        Constraint {
            name: String::new(),
            expr,
            sense,
            rhs,
        }
    }

    /// Attach a name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Constraint family, e.g. `supply` for `supply[BO]`.
    pub fn family(&self) -> &str {
        self.name.split('[').next().unwrap_or(&self.name)
    }

    /// Move the expression's constant to the right-hand side and merge
    /// repeated variables, giving `sum_i(c_i * x_i) sense rhs'`.
    pub fn normalized(&self) -> Constraint {
        let mut expr = self.expr.compact();
        let rhs = self.rhs - expr.constant;
        expr.constant = 0.0;
        Constraint {
            name: self.name.clone(),
            expr,
            sense: self.sense,
            rhs,
        }
    }

    /// Amount by which `x` violates the constraint; zero when satisfied.
    pub fn violation(&self, x: &[f64]) -> f64 {
        let lhs = self.expr.eval(x);
        match self.sense {
            Sense::Le => (lhs - self.rhs).max(0.0),
            Sense::Ge => (self.rhs - lhs).max(0.0),
            Sense::Eq => (lhs - self.rhs).abs(),
        }
    }

    pub fn is_satisfied(&self, x: &[f64], tol: f64) -> bool {
        self.violation(x) <= tol
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.name)?;
        for (i, (var, coeff)) in self.expr.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(" + ")?;
            }
            write!(f, "{}*x{}", coeff, var.index())?;
        }
        if self.expr.constant != 0.0 {
            write!(f, " + {}", self.expr.constant)?;
        }
        write!(f, " {} {}", self.sense, self.rhs)
    }
}

/// Extension trait for creating constraints from expressions.
pub trait ConstraintExt {
    /// Create equality constraint: self == rhs.
    fn equals(self, rhs: f64) -> Constraint;

    /// Create inequality constraint: self <= rhs.
    fn leq(self, rhs: f64) -> Constraint;

    /// Create inequality constraint: self >= rhs.
    fn geq(self, rhs: f64) -> Constraint;
}

impl ConstraintExt for LinExpr {
    fn equals(self, rhs: f64) -> Constraint {
        Constraint::eq(self, rhs)
    }

    fn leq(self, rhs: f64) -> Constraint {
        Constraint::leq(self, rhs)
    }

    fn geq(self, rhs: f64) -> Constraint {
        Constraint::geq(self, rhs)
    }
}
