//! Decision-variable descriptors with builder pattern.

/// Index of a variable within its `Problem`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub(crate) usize);

impl VarId {
    /// Position of the variable in the problem's column order.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Domain of a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarDomain {
    /// Real-valued within its bounds.
    Continuous,
    /// Restricted to `{0, 1}`.
    Binary,
}

/// A decision variable: name, bounds and domain.
///
/// `upper == None` is an unconstrained upper bound. It is passed to the
/// solver as infinity, never as a large literal.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub domain: VarDomain,
    pub lower: f64,
    pub upper: Option<f64>,
}

impl Variable {
    pub fn is_binary(&self) -> bool {
        self.domain == VarDomain::Binary
    }

    /// Check that the bounds describe a non-empty interval.
    pub fn bounds_are_consistent(&self) -> bool {
        if !self.lower.is_finite() {
            return false;
        }
        match self.upper {
            Some(upper) => !upper.is_nan() && upper >= self.lower,
            None => true,
        }
    }

    /// Distance of `value` from the variable's bounds and domain.
    pub fn bound_violation(&self, value: f64) -> f64 {
        let below = (self.lower - value).max(0.0);
        let above = self.upper.map_or(0.0, |u| (value - u).max(0.0));
        let fractional = match self.domain {
            VarDomain::Binary => (value - value.round()).abs(),
            VarDomain::Continuous => 0.0,
        };
        below.max(above).max(fractional)
    }
}

/// Builder for creating variables with various attributes.
#[derive(Debug, Clone)]
pub struct VariableBuilder {
    name: String,
    domain: VarDomain,
    lower: f64,
    upper: Option<f64>,
}

impl VariableBuilder {
    /// A non-negative continuous variable with no upper bound.
    pub fn continuous(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain: VarDomain::Continuous,
            lower: 0.0,
            upper: None,
        }
    }

    /// A `{0, 1}` variable.
    pub fn binary(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain: VarDomain::Binary,
            lower: 0.0,
            upper: Some(1.0),
        }
    }

    pub fn lower(mut self, lower: f64) -> Self {
        self.lower = lower;
        self
    }

    /// Set the upper bound; `None` leaves the variable unbounded above.
    pub fn upper(mut self, upper: Option<f64>) -> Self {
        self.upper = upper;
        self
    }

    /// Build the variable descriptor.
    pub fn build(self) -> Variable {
        Variable {
            name: self.name,
            domain: self.domain,
            lower: self.lower,
            upper: self.upper,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_builder() {
        let x = VariableBuilder::continuous("x").upper(Some(5.0)).build();
        assert_eq!(x.name, "x");
        assert_eq!(x.domain, VarDomain::Continuous);
        assert_eq!(x.lower, 0.0);
        assert_eq!(x.upper, Some(5.0));
        assert!(x.bounds_are_consistent());
    }

    #[test]
    fn test_binary_bounds() {
        let y = VariableBuilder::binary("y").build();
        assert!(y.is_binary());
        assert_eq!(y.upper, Some(1.0));
    }

    #[test]
    fn test_conflicting_bounds() {
        let x = VariableBuilder::continuous("x").upper(Some(-1.0)).build();
        assert!(!x.bounds_are_consistent());

        let x = VariableBuilder::continuous("x").lower(f64::NEG_INFINITY).build();
        assert!(!x.bounds_are_consistent());
    }

    #[test]
    fn test_bound_violation() {
        let x = VariableBuilder::continuous("x").upper(Some(2.0)).build();
        assert_eq!(x.bound_violation(1.0), 0.0);
        assert_eq!(x.bound_violation(3.0), 1.0);
        assert_eq!(x.bound_violation(-0.5), 0.5);

        let y = VariableBuilder::binary("y").build();
        assert!((y.bound_violation(0.4) - 0.4).abs() < 1e-12);
        assert_eq!(y.bound_violation(1.0), 0.0);
    }
}
