//! Fail-fast validation of a parameter table.
//!
//! Every check names the table and key it rejects, so a malformed input is
//! reported before any model is built or handed to a solver.

use std::collections::HashSet;

use super::table::{ArcTable, NetworkParams, NodeTable};
use crate::error::{DistNetError, Result};

impl NetworkParams {
    /// Check the table for completeness and sign constraints.
    ///
    /// Rejects:
    /// - empty or duplicated node sets
    /// - a missing `d`, `T`, `D`, `S`, `F`, `V` or `M` entry
    /// - any entry keyed by a node outside its set
    /// - negative or non-finite costs, distances, demands and capacities
    /// - `service_level` outside `[0, 1]`
    pub fn validate(&self) -> Result<()> {
        let mfg = node_set("manufacturing", &self.manufacturing)?;
        let cdc = node_set("cdc", &self.cdc)?;
        let rdc = node_set("rdc", &self.rdc)?;

        check_arcs("distance", &self.distance, &self.cdc, &cdc, &self.rdc, &rdc)?;
        check_arcs("transport_cost", &self.transport_cost, &self.manufacturing, &mfg, &self.cdc, &cdc)?;
        check_capacities("mfg_cdc_capacity", &self.mfg_cdc_capacity, &mfg, &cdc)?;
        check_capacities("cdc_rdc_capacity", &self.cdc_rdc_capacity, &cdc, &rdc)?;

        check_nodes("demand", &self.demand, &self.rdc, &rdc)?;
        check_nodes("supply", &self.supply, &self.cdc, &cdc)?;
        check_nodes("fixed_cost", &self.fixed_cost, &self.cdc, &cdc)?;
        check_nodes("variable_cost", &self.variable_cost, &self.cdc, &cdc)?;
        check_nodes("manufacturing_cost", &self.manufacturing_cost, &self.manufacturing, &mfg)?;

        non_negative("service_mile", "service_mile", self.service_mile)?;
        non_negative("cost_per_mile", "cost_per_mile", self.cost_per_mile)?;
        non_negative("capital", "capital", self.capital)?;
        if !(0.0..=1.0).contains(&self.service_level) {
            return Err(DistNetError::invalid(
                "service_level",
                "service_level",
                format!("{} is outside [0, 1]", self.service_level),
            ));
        }

        Ok(())
    }
}

fn node_set<'a>(table: &'static str, nodes: &'a [String]) -> Result<HashSet<&'a str>> {
    if nodes.is_empty() {
        return Err(DistNetError::invalid(table, "", "node set is empty"));
    }
    let mut seen = HashSet::with_capacity(nodes.len());
    for node in nodes {
        if !seen.insert(node.as_str()) {
            return Err(DistNetError::invalid(table, node.clone(), "duplicate node id"));
        }
    }
    Ok(seen)
}

fn non_negative(table: &'static str, key: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(DistNetError::invalid(table, key, format!("{value} is not finite")));
    }
    if value < 0.0 {
        return Err(DistNetError::invalid(table, key, format!("{value} is negative")));
    }
    Ok(())
}

fn check_nodes(
    table: &'static str,
    map: &NodeTable,
    nodes: &[String],
    known: &HashSet<&str>,
) -> Result<()> {
    if let Some(key) = map.keys().find(|k| !known.contains(k.as_str())) {
        return Err(DistNetError::invalid(table, key.clone(), "unknown node"));
    }
    for node in nodes {
        let value = map
            .get(node)
            .ok_or_else(|| DistNetError::invalid(table, node.clone(), "missing entry"))?;
        non_negative(table, node, *value)?;
    }
    Ok(())
}

fn check_arcs(
    table: &'static str,
    map: &ArcTable<f64>,
    from: &[String],
    known_from: &HashSet<&str>,
    to: &[String],
    known_to: &HashSet<&str>,
) -> Result<()> {
    check_arc_keys(table, map, known_from, known_to)?;
    for a in from {
        for b in to {
            let key = format!("({a}, {b})");
            let value = map
                .get(a)
                .and_then(|row| row.get(b))
                .ok_or_else(|| DistNetError::invalid(table, key.clone(), "missing entry"))?;
            non_negative(table, &key, *value)?;
        }
    }
    Ok(())
}

fn check_capacities(
    table: &'static str,
    map: &ArcTable<Option<f64>>,
    known_from: &HashSet<&str>,
    known_to: &HashSet<&str>,
) -> Result<()> {
    check_arc_keys(table, map, known_from, known_to)?;
    for (a, row) in map {
        for (b, cap) in row {
            if let Some(cap) = cap {
                non_negative(table, &format!("({a}, {b})"), *cap)?;
            }
        }
    }
    Ok(())
}

fn check_arc_keys<T>(
    table: &'static str,
    map: &ArcTable<T>,
    known_from: &HashSet<&str>,
    known_to: &HashSet<&str>,
) -> Result<()> {
    for (a, row) in map {
        if !known_from.contains(a.as_str()) {
            return Err(DistNetError::invalid(table, a.clone(), "unknown node"));
        }
        if let Some(b) = row.keys().find(|b| !known_to.contains(b.as_str())) {
            return Err(DistNetError::invalid(table, format!("({a}, {b})"), "unknown node"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> NetworkParams {
        NetworkParams::new(["P1"], ["C1"], ["R1"])
            .with_distance("C1", "R1", 10.0)
            .with_transport_cost("P1", "C1", 2.0)
            .with_demand("R1", 10.0)
            .with_supply("C1", 20.0)
            .with_fixed_cost("C1", 100.0)
            .with_variable_cost("C1", 3.0)
            .with_manufacturing_cost("P1", 1.0)
            .with_service_mile(50.0)
            .with_cost_per_mile(0.5)
            .with_service_level(0.9)
            .with_capital(200.0)
    }

    fn rejected_table(params: &NetworkParams) -> (&'static str, String) {
        match params.validate() {
            Err(DistNetError::InvalidParams { table, key, .. }) => (table, key),
            other => panic!("expected InvalidParams, got {:?}", other),
        }
    }

    #[test]
    fn test_minimal_is_valid() {
        minimal().validate().expect("minimal table is valid");
    }

    #[test]
    fn test_nerd_is_valid() {
        NetworkParams::nerd().unwrap().validate().expect("NERD table is valid");
    }

    #[test]
    fn test_missing_distance() {
        let mut params = minimal();
        params.distance.clear();
        assert_eq!(rejected_table(&params), ("distance", "(C1, R1)".to_string()));
    }

    #[test]
    fn test_missing_demand() {
        let mut params = minimal();
        params.demand.clear();
        assert_eq!(rejected_table(&params), ("demand", "R1".to_string()));
    }

    #[test]
    fn test_negative_cost() {
        let params = minimal().with_fixed_cost("C1", -1.0);
        assert_eq!(rejected_table(&params), ("fixed_cost", "C1".to_string()));
    }

    #[test]
    fn test_negative_capacity() {
        let params = minimal().with_cdc_rdc_capacity("C1", "R1", Some(-5.0));
        assert_eq!(rejected_table(&params), ("cdc_rdc_capacity", "(C1, R1)".to_string()));
    }

    #[test]
    fn test_unknown_node() {
        let params = minimal().with_supply("C9", 1.0);
        assert_eq!(rejected_table(&params), ("supply", "C9".to_string()));

        let params = minimal().with_mfg_cdc_capacity("P1", "C9", Some(1.0));
        assert_eq!(rejected_table(&params), ("mfg_cdc_capacity", "(P1, C9)".to_string()));
    }

    #[test]
    fn test_duplicate_node() {
        let mut params = minimal();
        params.rdc.push("R1".into());
        assert_eq!(rejected_table(&params), ("rdc", "R1".to_string()));
    }

    #[test]
    fn test_empty_node_set() {
        let mut params = minimal();
        params.manufacturing.clear();
        assert_eq!(rejected_table(&params).0, "manufacturing");
    }

    #[test]
    fn test_service_level_range() {
        let params = minimal().with_service_level(1.5);
        assert_eq!(rejected_table(&params).0, "service_level");
    }

    #[test]
    fn test_non_finite_value() {
        let params = minimal().with_distance("C1", "R1", f64::NAN);
        assert_eq!(rejected_table(&params), ("distance", "(C1, R1)".to_string()));
    }
}
