//! The parameter table of a distribution network.
//!
//! This module provides:
//! - `NetworkParams`, the node sets, per-arc and per-node tables and scalars
//! - JSON loading and the embedded NERD example instance
//! - Fail-fast validation of the table before a model is built

pub mod table;
pub mod validate;

pub use table::{ArcTable, NetworkParams, NodeTable};
