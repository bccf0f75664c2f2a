//! Independent audit of a network plan against its parameter table.
//!
//! Nothing here consults the model or the solver: each rule is re-derived
//! from the parameters, so a plan that passes is feasible for the
//! formulation regardless of how it was produced.

use std::fmt;

use crate::error::Result;
use crate::params::NetworkParams;
use crate::report::NetworkSolution;

/// A broken rule in a network plan.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    /// Inbound and outbound quantities of a CDC differ.
    Conservation { cdc: String, inbound: f64, outbound: f64 },
    /// A region receives less than its demand.
    Demand { rdc: String, delivered: f64, demand: f64 },
    /// A CDC ships more than its supply capacity.
    Capacity { cdc: String, outbound: f64, supply: f64 },
    /// A closed CDC ships product.
    ClosedShipping { cdc: String, outbound: f64 },
    /// Fixed costs of opened CDCs exceed the capital budget.
    Budget { spent: f64, capital: f64 },
    /// Too little demand is served within the service radius.
    ServiceLevel { fraction: f64, required: f64 },
    /// A flow is negative or exceeds its arc capacity.
    ArcBound { from: String, to: String, quantity: f64, limit: f64 },
    /// A flow references a node outside the parameter table.
    UnknownArc { from: String, to: String },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Conservation { cdc, inbound, outbound } => {
                write!(f, "CDC {cdc} receives {inbound} but ships {outbound}")
            }
            Violation::Demand { rdc, delivered, demand } => {
                write!(f, "region {rdc} receives {delivered} of demand {demand}")
            }
            Violation::Capacity { cdc, outbound, supply } => {
                write!(f, "CDC {cdc} ships {outbound} over capacity {supply}")
            }
            Violation::ClosedShipping { cdc, outbound } => {
                write!(f, "closed CDC {cdc} ships {outbound}")
            }
            Violation::Budget { spent, capital } => {
                write!(f, "fixed cost {spent} exceeds capital {capital}")
            }
            Violation::ServiceLevel { fraction, required } => {
                write!(f, "service fraction {fraction} below required {required}")
            }
            Violation::ArcBound { from, to, quantity, limit } => {
                write!(f, "flow {from} -> {to} of {quantity} outside [0, {limit}]")
            }
            Violation::UnknownArc { from, to } => write!(f, "flow {from} -> {to} is not an arc"),
        }
    }
}

/// Check `solution` against every rule of the network model.
///
/// Comparisons allow an absolute slack of `tol`. Returns all violations
/// found; an empty vector means the plan is feasible.
pub fn check_solution(
    params: &NetworkParams,
    solution: &NetworkSolution,
    tol: f64,
) -> Result<Vec<Violation>> {
    let mut out = Vec::new();

    for flow in &solution.mfg_cdc {
        if !params.manufacturing.contains(&flow.from) || !params.cdc.contains(&flow.to) {
            out.push(Violation::UnknownArc { from: flow.from.clone(), to: flow.to.clone() });
            continue;
        }
        let limit = params.mfg_cdc_capacity(&flow.from, &flow.to);
        check_arc(&mut out, &flow.from, &flow.to, flow.quantity, limit, tol);
    }
    for flow in &solution.cdc_rdc {
        if !params.cdc.contains(&flow.from) || !params.rdc.contains(&flow.to) {
            out.push(Violation::UnknownArc { from: flow.from.clone(), to: flow.to.clone() });
            continue;
        }
        let limit = params.cdc_rdc_capacity(&flow.from, &flow.to);
        check_arc(&mut out, &flow.from, &flow.to, flow.quantity, limit, tol);
    }

    let mut spent = 0.0;
    for cdc in &params.cdc {
        let inbound = solution.inbound(cdc);
        let outbound = solution.outbound(cdc);
        if (inbound - outbound).abs() > tol {
            out.push(Violation::Conservation { cdc: cdc.clone(), inbound, outbound });
        }
        let supply = params.supply(cdc)?;
        if outbound > supply + tol {
            out.push(Violation::Capacity { cdc: cdc.clone(), outbound, supply });
        }
        if solution.is_open(cdc) {
            spent += params.fixed_cost(cdc)?;
        } else if outbound > tol {
            out.push(Violation::ClosedShipping { cdc: cdc.clone(), outbound });
        }
    }
    if spent > params.capital + tol {
        out.push(Violation::Budget { spent, capital: params.capital });
    }

    for rdc in &params.rdc {
        let delivered = solution.delivered(rdc);
        let demand = params.demand(rdc)?;
        if delivered < demand - tol {
            out.push(Violation::Demand { rdc: rdc.clone(), delivered, demand });
        }
    }

    let total_demand = params.total_demand();
    if total_demand > 0.0 {
        let mut served = 0.0;
        for flow in &solution.cdc_rdc {
            if params.cdc.contains(&flow.from) && params.covers(&flow.from, &flow.to)? {
                served += flow.quantity;
            }
        }
        let fraction = served / total_demand;
        if fraction < params.service_level - tol / total_demand {
            out.push(Violation::ServiceLevel { fraction, required: params.service_level });
        }
    }

    for v in &out {
        log::debug!("violation: {}", v);
    }
    Ok(out)
}

fn check_arc(out: &mut Vec<Violation>, from: &str, to: &str, quantity: f64, limit: Option<f64>, tol: f64) {
    let above = limit.map_or(false, |k| quantity > k + tol);
    if quantity < -tol || above {
        out.push(Violation::ArcBound {
            from: from.to_string(),
            to: to.to_string(),
            quantity,
            limit: limit.unwrap_or(f64::INFINITY),
        });
    }
}
