//! Linear expressions over decision variables.
//!
//! An expression is stored in standard form: sum_i(c_i * x_i) + b, as a list
//! of `(variable, coefficient)` terms plus a constant. Terms may repeat a
//! variable while an expression is being assembled; `compact` merges them.

use std::collections::BTreeMap;
use std::ops::{Add, Mul, Neg, Sub};

use super::variable::VarId;

/// A linear expression: sum_i(c_i * x_i) + constant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinExpr {
    /// `(variable, coefficient)` terms.
    pub terms: Vec<(VarId, f64)>,
    /// Constant term (offset).
    pub constant: f64,
}

impl LinExpr {
    /// The zero expression.
    pub fn zero() -> Self {
        Self::default()
    }

    /// A single variable with coefficient 1.
    pub fn var(var: VarId) -> Self {
        LinExpr {
            terms: vec![(var, 1.0)],
            constant: 0.0,
        }
    }

    /// A constant expression.
    pub fn constant(value: f64) -> Self {
        LinExpr {
            terms: Vec::new(),
            constant: value,
        }
    }

    /// Sum of the given variables, each with coefficient 1.
    pub fn sum(vars: impl IntoIterator<Item = VarId>) -> Self {
        vars.into_iter().map(|v| (v, 1.0)).collect()
    }

    /// Check if this is a constant once repeated variables are merged.
    pub fn is_constant(&self) -> bool {
        self.compact().terms.is_empty()
    }

    /// Append `coeff * var`.
    pub fn add_term(&mut self, var: VarId, coeff: f64) {
        self.terms.push((var, coeff));
    }

    /// Append `scale * other`.
    pub fn add_scaled(&mut self, other: &LinExpr, scale: f64) {
        self.terms
            .extend(other.terms.iter().map(|&(v, c)| (v, c * scale)));
        self.constant += other.constant * scale;
    }

    /// Multiply every coefficient and the constant by `factor`.
    pub fn scale(&self, factor: f64) -> LinExpr {
        LinExpr {
            terms: self.terms.iter().map(|&(v, c)| (v, c * factor)).collect(),
            constant: self.constant * factor,
        }
    }

    /// Merge repeated variables and drop zero coefficients.
    ///
    /// The result lists each variable at most once, in index order.
    pub fn compact(&self) -> LinExpr {
        let mut merged: BTreeMap<VarId, f64> = BTreeMap::new();
        for &(var, coeff) in &self.terms {
            *merged.entry(var).or_insert(0.0) += coeff;
        }
        LinExpr {
            terms: merged.into_iter().filter(|(_, c)| *c != 0.0).collect(),
            constant: self.constant,
        }
    }

    /// Coefficient of `var`, summed over repeated terms.
    pub fn coefficient(&self, var: VarId) -> f64 {
        self.terms
            .iter()
            .filter(|(v, _)| *v == var)
            .map(|(_, c)| c)
            .sum()
    }

    /// Evaluate the expression at the point `x`, indexed by `VarId::index`.
    pub fn eval(&self, x: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(v, c)| c * x[v.index()])
            .sum::<f64>()
            + self.constant
    }

    /// Largest variable index referenced, if any.
    pub fn max_var(&self) -> Option<VarId> {
        self.terms.iter().map(|(v, _)| *v).max()
    }
}

impl FromIterator<(VarId, f64)> for LinExpr {
    fn from_iter<I: IntoIterator<Item = (VarId, f64)>>(iter: I) -> Self {
        LinExpr {
            terms: iter.into_iter().collect(),
            constant: 0.0,
        }
    }
}

impl From<VarId> for LinExpr {
    fn from(var: VarId) -> Self {
        LinExpr::var(var)
    }
}

impl Add for LinExpr {
    type Output = LinExpr;

    fn add(mut self, rhs: LinExpr) -> LinExpr {
        self.add_scaled(&rhs, 1.0);
        self
    }
}

impl Sub for LinExpr {
    type Output = LinExpr;

    fn sub(mut self, rhs: LinExpr) -> LinExpr {
        self.add_scaled(&rhs, -1.0);
        self
    }
}

impl Neg for LinExpr {
    type Output = LinExpr;

    fn neg(self) -> LinExpr {
        self.scale(-1.0)
    }
}

impl Mul<f64> for LinExpr {
    type Output = LinExpr;

    fn mul(self, rhs: f64) -> LinExpr {
        self.scale(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_and_eval() {
        let e = LinExpr::sum([VarId(0), VarId(2)]);
        assert_eq!(e.eval(&[1.0, 10.0, 100.0]), 101.0);
    }

    #[test]
    fn test_compact_merges_duplicates() {
        let mut e = LinExpr::zero();
        e.add_term(VarId(1), 2.0);
        e.add_term(VarId(0), 1.0);
        e.add_term(VarId(1), 3.0);
        e.add_term(VarId(2), 0.0);
        let c = e.compact();
        assert_eq!(c.terms, vec![(VarId(0), 1.0), (VarId(1), 5.0)]);
    }

    #[test]
    fn test_cancelling_terms_vanish() {
        let e = LinExpr::var(VarId(3)) - LinExpr::var(VarId(3));
        assert!(e.is_constant());
        assert!(e.compact().terms.is_empty());

        let mut partial = LinExpr::var(VarId(0)) * 2.0;
        partial.add_term(VarId(0), -1.0);
        assert!(!partial.is_constant());
    }

    #[test]
    fn test_operators() {
        let e = (LinExpr::var(VarId(0)) * 2.0 + LinExpr::constant(1.0)) - LinExpr::var(VarId(1));
        assert_eq!(e.eval(&[3.0, 4.0]), 3.0);
        assert_eq!((-e).eval(&[3.0, 4.0]), -3.0);
    }

    #[test]
    fn test_coefficient() {
        let e: LinExpr = vec![(VarId(0), 1.5), (VarId(0), 0.5), (VarId(1), 4.0)]
            .into_iter()
            .collect();
        assert_eq!(e.coefficient(VarId(0)), 2.0);
        assert_eq!(e.max_var(), Some(VarId(1)));
    }
}
