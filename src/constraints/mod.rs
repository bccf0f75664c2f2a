//! Constraint types for optimization problems.

pub mod constraint;

pub use constraint::{Constraint, ConstraintExt, Sense};
