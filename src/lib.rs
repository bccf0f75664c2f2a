//! # distnet
//!
//! Two-echelon distribution network design as a mixed-integer linear program.
//!
//! Product moves from manufacturing plants to central distribution centers
//! (CDCs) and from CDCs to regional demand centers (RDCs). distnet chooses
//! which CDCs to open and how much to ship on every arc so that total cost is
//! minimized, every region's demand is met, opened CDCs stay within supply
//! capacity and the capital budget, and a required share of demand is served
//! from CDCs within a service radius.
//!
//! ## Quick Start
//!
//! ```ignore
//! use distnet::prelude::*;
//!
//! let params = NetworkParams::from_path("network.json")?;
//! let network = NetworkProblem::build(&params)?;
//! let plan = network.solve_with(&Settings::default().with_time_limit(Duration::from_secs(60)))?;
//!
//! println!("{}", plan);
//! assert!(check_solution(&params, &plan, 1e-6)?.is_empty());
//! ```
//!
//! ## Architecture
//!
//! - **Parameter table** (`params`) loaded from JSON and validated up front
//! - **Explicit model** (`expr`, `constraints`, `problem`): variables with
//!   bounds and domains, linear expressions, named constraint rows
//! - **Network builder** (`network`) emitting the facility-location model
//! - **microlp** branch-and-bound for the MILP, run under a time limit and
//!   cancellation token
//! - **Clarabel** for the continuous relaxation bound
//! - **Reporting and audit** (`report`, `check`) over the named plan

pub mod check;
pub mod constraints;
pub mod error;
pub mod expr;
pub mod network;
pub mod params;
pub mod problem;
pub mod report;
pub mod solver;
pub mod sparse;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use distnet::prelude::*;
/// ```
pub mod prelude {
    // Parameters
    pub use crate::params::NetworkParams;

    // Model
    pub use crate::constraints::{Constraint, ConstraintExt, Sense};
    pub use crate::expr::{LinExpr, VarDomain, VarId, Variable, VariableBuilder};
    pub use crate::problem::{Objective, Problem};

    // Network
    pub use crate::network::{BigM, FormulationOptions, NetworkProblem};
    pub use crate::report::{ArcFlow, CostBreakdown, NetworkSolution};
    pub use crate::check::{check_solution, Violation};

    // Solver
    pub use crate::solver::{CancelToken, Settings, Solution, SolveStatus};

    // Errors
    pub use crate::error::{DistNetError, Result};

    pub use std::time::Duration;
}

// Re-export main types at crate root
pub use error::{DistNetError, Result};
pub use network::NetworkProblem;
pub use params::NetworkParams;
pub use report::NetworkSolution;
pub use solver::{Settings, SolveStatus};
