//! Parameter table definition and loading.
//!
//! Arc tables are nested maps keyed `from -> to`, which is also their JSON
//! layout:
//!
//! ```json
//! "distance": { "BO": { "BO": 8, "BR": 93 } }
//! ```
//!
//! Capacity tables hold `Option<f64>`. Both `null` and a missing entry mean
//! the arc is unbounded.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DistNetError, Result};

/// Per-node values keyed by node id.
pub type NodeTable = BTreeMap<String, f64>;

/// Per-arc values keyed by `from` then `to`.
pub type ArcTable<T> = BTreeMap<String, BTreeMap<String, T>>;

const NERD_JSON: &str = include_str!("../../data/nerd.json");

/// Parameter table for a plant -> CDC -> RDC network.
///
/// Node sets are ordered; that order is the order of variables in the built
/// model and of rows in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkParams {
    /// Manufacturing plants.
    pub manufacturing: Vec<String>,
    /// Candidate central distribution centers.
    pub cdc: Vec<String>,
    /// Regional demand points.
    pub rdc: Vec<String>,

    /// `d`: distance from each CDC to each RDC.
    pub distance: ArcTable<f64>,
    /// `T`: unit transport cost from each plant to each CDC.
    pub transport_cost: ArcTable<f64>,
    /// `K1`: flow capacity on plant -> CDC arcs.
    #[serde(default)]
    pub mfg_cdc_capacity: ArcTable<Option<f64>>,
    /// `K2`: flow capacity on CDC -> RDC arcs.
    #[serde(default)]
    pub cdc_rdc_capacity: ArcTable<Option<f64>>,

    /// `D`: demand of each RDC.
    pub demand: NodeTable,
    /// `S`: throughput capacity of each CDC.
    pub supply: NodeTable,
    /// `F`: fixed cost of opening each CDC.
    pub fixed_cost: NodeTable,
    /// `V`: unit throughput cost of each CDC.
    pub variable_cost: NodeTable,
    /// `M`: unit production cost of each plant.
    pub manufacturing_cost: NodeTable,

    /// Maximum CDC -> RDC distance that counts as in-service.
    pub service_mile: f64,
    /// Cost of moving one unit one mile on a CDC -> RDC arc.
    pub cost_per_mile: f64,
    /// Required fraction of total demand served within `service_mile`.
    pub service_level: f64,
    /// Budget ceiling on total fixed opening cost.
    pub capital: f64,
}

impl NetworkParams {
    /// Create an empty table over the given node sets.
    ///
    /// All tables start empty and all scalars start at zero. Fill them with
    /// the `with_*` methods.
    pub fn new(
        manufacturing: impl IntoIterator<Item = impl Into<String>>,
        cdc: impl IntoIterator<Item = impl Into<String>>,
        rdc: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        NetworkParams {
            manufacturing: manufacturing.into_iter().map(Into::into).collect(),
            cdc: cdc.into_iter().map(Into::into).collect(),
            rdc: rdc.into_iter().map(Into::into).collect(),
            distance: ArcTable::new(),
            transport_cost: ArcTable::new(),
            mfg_cdc_capacity: ArcTable::new(),
            cdc_rdc_capacity: ArcTable::new(),
            demand: NodeTable::new(),
            supply: NodeTable::new(),
            fixed_cost: NodeTable::new(),
            variable_cost: NodeTable::new(),
            manufacturing_cost: NodeTable::new(),
            service_mile: 0.0,
            cost_per_mile: 0.0,
            service_level: 0.0,
            capital: 0.0,
        }
    }

    /// The NERD example: two plants, five candidate CDCs, twelve regions.
    pub fn nerd() -> Result<Self> {
        Self::from_json_str(NERD_JSON)
    }

    /// Parse a parameter table from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a parameter table from a JSON reader.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Load a parameter table from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("loading network parameters from {}", path.display());
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Serialize the table as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_distance(mut self, cdc: &str, rdc: &str, miles: f64) -> Self {
        insert_arc(&mut self.distance, cdc, rdc, miles);
        self
    }

    pub fn with_transport_cost(mut self, plant: &str, cdc: &str, cost: f64) -> Self {
        insert_arc(&mut self.transport_cost, plant, cdc, cost);
        self
    }

    /// Set `K1` for one arc. `None` makes the arc explicitly unbounded.
    pub fn with_mfg_cdc_capacity(mut self, plant: &str, cdc: &str, cap: Option<f64>) -> Self {
        insert_arc(&mut self.mfg_cdc_capacity, plant, cdc, cap);
        self
    }

    /// Set `K2` for one arc. `None` makes the arc explicitly unbounded.
    pub fn with_cdc_rdc_capacity(mut self, cdc: &str, rdc: &str, cap: Option<f64>) -> Self {
        insert_arc(&mut self.cdc_rdc_capacity, cdc, rdc, cap);
        self
    }

    pub fn with_demand(mut self, rdc: &str, demand: f64) -> Self {
        self.demand.insert(rdc.to_string(), demand);
        self
    }

    pub fn with_supply(mut self, cdc: &str, supply: f64) -> Self {
        self.supply.insert(cdc.to_string(), supply);
        self
    }

    pub fn with_fixed_cost(mut self, cdc: &str, cost: f64) -> Self {
        self.fixed_cost.insert(cdc.to_string(), cost);
        self
    }

    pub fn with_variable_cost(mut self, cdc: &str, cost: f64) -> Self {
        self.variable_cost.insert(cdc.to_string(), cost);
        self
    }

    pub fn with_manufacturing_cost(mut self, plant: &str, cost: f64) -> Self {
        self.manufacturing_cost.insert(plant.to_string(), cost);
        self
    }

    pub fn with_service_mile(mut self, miles: f64) -> Self {
        self.service_mile = miles;
        self
    }

    pub fn with_cost_per_mile(mut self, cost: f64) -> Self {
        self.cost_per_mile = cost;
        self
    }

    pub fn with_service_level(mut self, level: f64) -> Self {
        self.service_level = level;
        self
    }

    pub fn with_capital(mut self, capital: f64) -> Self {
        self.capital = capital;
        self
    }

    /// `d[cdc, rdc]`.
    pub fn distance(&self, cdc: &str, rdc: &str) -> Result<f64> {
        arc_value("distance", &self.distance, cdc, rdc)
    }

    /// `T[plant, cdc]`.
    pub fn transport_cost(&self, plant: &str, cdc: &str) -> Result<f64> {
        arc_value("transport_cost", &self.transport_cost, plant, cdc)
    }

    /// `K1[plant, cdc]`, `None` when unbounded.
    pub fn mfg_cdc_capacity(&self, plant: &str, cdc: &str) -> Option<f64> {
        capacity(&self.mfg_cdc_capacity, plant, cdc)
    }

    /// `K2[cdc, rdc]`, `None` when unbounded.
    pub fn cdc_rdc_capacity(&self, cdc: &str, rdc: &str) -> Option<f64> {
        capacity(&self.cdc_rdc_capacity, cdc, rdc)
    }

    pub fn demand(&self, rdc: &str) -> Result<f64> {
        node_value("demand", &self.demand, rdc)
    }

    pub fn supply(&self, cdc: &str) -> Result<f64> {
        node_value("supply", &self.supply, cdc)
    }

    pub fn fixed_cost(&self, cdc: &str) -> Result<f64> {
        node_value("fixed_cost", &self.fixed_cost, cdc)
    }

    pub fn variable_cost(&self, cdc: &str) -> Result<f64> {
        node_value("variable_cost", &self.variable_cost, cdc)
    }

    pub fn manufacturing_cost(&self, plant: &str) -> Result<f64> {
        node_value("manufacturing_cost", &self.manufacturing_cost, plant)
    }

    /// `A[cdc, rdc]`: whether the region lies within the service radius.
    pub fn covers(&self, cdc: &str, rdc: &str) -> Result<bool> {
        Ok(self.distance(cdc, rdc)? <= self.service_mile)
    }

    /// `B`: total demand over all regions.
    pub fn total_demand(&self) -> f64 {
        self.demand.values().sum()
    }

    /// Total throughput capacity over all candidate CDCs.
    pub fn total_supply(&self) -> f64 {
        self.supply.values().sum()
    }
}

fn insert_arc<T>(table: &mut ArcTable<T>, from: &str, to: &str, value: T) {
    table
        .entry(from.to_string())
        .or_default()
        .insert(to.to_string(), value);
}

fn arc_value(table: &'static str, map: &ArcTable<f64>, from: &str, to: &str) -> Result<f64> {
    map.get(from)
        .and_then(|row| row.get(to))
        .copied()
        .ok_or_else(|| DistNetError::invalid(table, format!("({from}, {to})"), "missing entry"))
}

fn node_value(table: &'static str, map: &NodeTable, key: &str) -> Result<f64> {
    map.get(key)
        .copied()
        .ok_or_else(|| DistNetError::invalid(table, key, "missing entry"))
}

fn capacity(map: &ArcTable<Option<f64>>, from: &str, to: &str) -> Option<f64> {
    map.get(from).and_then(|row| row.get(to)).copied().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nerd_loads() {
        let params = NetworkParams::nerd().expect("embedded data parses");
        assert_eq!(params.manufacturing.len(), 2);
        assert_eq!(params.cdc.len(), 5);
        assert_eq!(params.rdc.len(), 12);
        assert_eq!(params.total_demand(), 2000.0);
        assert_eq!(params.distance("SP", "HA").unwrap(), 27.0);
        assert_eq!(params.transport_cost("SCP", "WO").unwrap(), 4.2);
    }

    #[test]
    fn test_nerd_arcs_unbounded() {
        let params = NetworkParams::nerd().unwrap();
        assert_eq!(params.mfg_cdc_capacity("BFP", "BO"), None);
        assert_eq!(params.cdc_rdc_capacity("BO", "BR"), None);
    }

    #[test]
    fn test_coverage() {
        let params = NetworkParams::nerd().unwrap();
        assert!(params.covers("BO", "BO").unwrap());
        assert!(params.covers("NA", "PO").unwrap());
        assert!(!params.covers("BO", "MN").unwrap());
        // Exactly at the radius counts as covered.
        let params = params.with_distance("BO", "MN", 50.0);
        assert!(params.covers("BO", "MN").unwrap());
    }

    #[test]
    fn test_missing_entry_names_key() {
        let params = NetworkParams::new(["P"], ["C"], ["R"]);
        let err = params.distance("C", "R").unwrap_err();
        assert!(err.to_string().contains("(C, R)"), "{}", err);
    }

    #[test]
    fn test_null_capacity_is_unbounded() {
        let json = r#"{
            "manufacturing": ["P"], "cdc": ["C"], "rdc": ["R"],
            "distance": {"C": {"R": 1}},
            "transport_cost": {"P": {"C": 1}},
            "mfg_cdc_capacity": {"P": {"C": null}},
            "cdc_rdc_capacity": {"C": {"R": 5}},
            "demand": {"R": 1}, "supply": {"C": 1}, "fixed_cost": {"C": 1},
            "variable_cost": {"C": 1}, "manufacturing_cost": {"P": 1},
            "service_mile": 10, "cost_per_mile": 1, "service_level": 0.5, "capital": 10
        }"#;
        let params = NetworkParams::from_json_str(json).unwrap();
        assert_eq!(params.mfg_cdc_capacity("P", "C"), None);
        assert_eq!(params.cdc_rdc_capacity("C", "R"), Some(5.0));
    }

    #[test]
    fn test_json_roundtrip_preserves_table() {
        let params = NetworkParams::nerd().unwrap();
        let json = params.to_json_string().unwrap();
        assert_eq!(NetworkParams::from_json_str(&json).unwrap(), params);
    }
}
