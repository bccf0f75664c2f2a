//! Expression types for building optimization problems.
//!
//! This module provides:
//! - `Variable` descriptors (name, bounds, domain) and `VariableBuilder`
//! - `VarId`, the handle a `Problem` returns for each added variable
//! - `LinExpr`, a sparse linear form over variables

pub mod lin_expr;
pub mod variable;

pub use lin_expr::LinExpr;
pub use variable::{VarDomain, VarId, Variable, VariableBuilder};
