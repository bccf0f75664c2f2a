//! Reading a solved network model back into named quantities.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::Result;
use crate::network::NetworkProblem;
use crate::solver::Solution;

/// Quantities at or below this are reported as zero.
pub const FLOW_EPSILON: f64 = 1e-6;

/// A non-zero flow on one arc.
#[derive(Debug, Clone, PartialEq)]
pub struct ArcFlow {
    pub from: String,
    pub to: String,
    pub quantity: f64,
}

/// The objective split into its five parts.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CostBreakdown {
    /// `sum M[a] * flow_mfg_cdc[a, b]`
    pub manufacturing: f64,
    /// `sum T[a, b] * flow_mfg_cdc[a, b]`
    pub inbound_transport: f64,
    /// `sum d[a, b] * cost_per_mile * flow_cdc_rdc[a, b]`
    pub outbound_transport: f64,
    /// `sum F[a] * open[a]`
    pub fixed: f64,
    /// `sum V[a] * flow_cdc_rdc[a, b]`
    pub variable: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.manufacturing + self.inbound_transport + self.outbound_transport + self.fixed + self.variable
    }
}

/// An optimal plan for the network.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkSolution {
    /// Optimal objective reported by the solver.
    pub objective: f64,
    pub costs: CostBreakdown,
    /// Opened CDCs, in parameter-table order.
    pub open: Vec<String>,
    /// Non-zero plant to CDC flows.
    pub mfg_cdc: Vec<ArcFlow>,
    /// Non-zero CDC to region flows.
    pub cdc_rdc: Vec<ArcFlow>,
    /// Total outbound quantity of each opened CDC.
    pub throughput: BTreeMap<String, f64>,
    /// Share of total demand shipped over arcs within the service radius.
    /// `1.0` when total demand is zero.
    pub service_fraction: f64,
    /// Solve time in seconds.
    pub solve_time: f64,
}

impl NetworkSolution {
    /// Extract the plan from an optimal `solution` of `network`.
    pub fn from_solution(network: &NetworkProblem, solution: &Solution) -> Result<Self> {
        let p = network.params();
        let x = network.mfg_cdc_values(solution)?;
        let y = network.cdc_rdc_values(solution)?;
        let z = network.open_values(solution)?;

        let mut costs = CostBreakdown::default();
        let mut mfg_cdc = Vec::new();
        for (i, a) in p.manufacturing.iter().enumerate() {
            let unit = p.manufacturing_cost(a)?;
            for (j, b) in p.cdc.iter().enumerate() {
                costs.manufacturing += unit * x[i][j];
                costs.inbound_transport += p.transport_cost(a, b)? * x[i][j];
                if x[i][j] > FLOW_EPSILON {
                    mfg_cdc.push(ArcFlow {
                        from: a.clone(),
                        to: b.clone(),
                        quantity: x[i][j],
                    });
                }
            }
        }

        let mut cdc_rdc = Vec::new();
        let mut open = Vec::new();
        let mut throughput = BTreeMap::new();
        let mut served = 0.0;
        for (i, a) in p.cdc.iter().enumerate() {
            let unit = p.variable_cost(a)?;
            for (j, b) in p.rdc.iter().enumerate() {
                costs.outbound_transport += p.distance(a, b)? * p.cost_per_mile * y[i][j];
                costs.variable += unit * y[i][j];
                if p.covers(a, b)? {
                    served += y[i][j];
                }
                if y[i][j] > FLOW_EPSILON {
                    cdc_rdc.push(ArcFlow {
                        from: a.clone(),
                        to: b.clone(),
                        quantity: y[i][j],
                    });
                }
            }
            costs.fixed += p.fixed_cost(a)? * z[i];
            if z[i] > 0.5 {
                open.push(a.clone());
                throughput.insert(a.clone(), y[i].iter().sum::<f64>());
            }
        }

        let total_demand = network.total_demand();
        let service_fraction = if total_demand > 0.0 {
            served / total_demand
        } else {
            1.0
        };

        let objective = solution.value.unwrap_or_else(|| costs.total());
        log::info!(
            "optimal cost {:.2}: {} of {} CDCs open, {:.1}% served within {} miles",
            objective,
            open.len(),
            p.cdc.len(),
            service_fraction * 100.0,
            p.service_mile
        );

        Ok(NetworkSolution {
            objective,
            costs,
            open,
            mfg_cdc,
            cdc_rdc,
            throughput,
            service_fraction,
            solve_time: solution.solve_time,
        })
    }

    pub fn is_open(&self, cdc: &str) -> bool {
        self.open.iter().any(|c| c == cdc)
    }

    /// Flow from `plant` to `cdc`, zero if not shipped.
    pub fn mfg_cdc(&self, plant: &str, cdc: &str) -> f64 {
        arc_quantity(&self.mfg_cdc, plant, cdc)
    }

    /// Flow from `cdc` to `rdc`, zero if not shipped.
    pub fn cdc_rdc(&self, cdc: &str, rdc: &str) -> f64 {
        arc_quantity(&self.cdc_rdc, cdc, rdc)
    }

    /// Total quantity received by `cdc` from plants.
    pub fn inbound(&self, cdc: &str) -> f64 {
        self.mfg_cdc.iter().filter(|f| f.to == cdc).map(|f| f.quantity).sum()
    }

    /// Total quantity shipped out of `cdc`.
    pub fn outbound(&self, cdc: &str) -> f64 {
        self.cdc_rdc.iter().filter(|f| f.from == cdc).map(|f| f.quantity).sum()
    }

    /// Total quantity delivered to `rdc`.
    pub fn delivered(&self, rdc: &str) -> f64 {
        self.cdc_rdc.iter().filter(|f| f.to == rdc).map(|f| f.quantity).sum()
    }
}

fn arc_quantity(flows: &[ArcFlow], from: &str, to: &str) -> f64 {
    flows
        .iter()
        .find(|f| f.from == from && f.to == to)
        .map_or(0.0, |f| f.quantity)
}

const RULE: &str = "--------------------------------------------------";

impl fmt::Display for NetworkSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.costs;
        writeln!(f, "************Total Cost*************")?;
        for (label, value) in [
            ("Manufacturing Cost:", c.manufacturing),
            ("Plant to CDC Transport:", c.inbound_transport),
            ("Fixed Cost for CDCs:", c.fixed),
            ("Variable Cost for CDCs:", c.variable),
            ("Transportation Cost:", c.outbound_transport),
        ] {
            writeln!(f, "{:<24} $ {:>8.0}", label, value)?;
        }
        writeln!(f, "{RULE}")?;
        writeln!(f, "{:<24} $ {:>8.0}", "Total Cost:", self.objective)?;
        writeln!(f)?;

        writeln!(f, "************Product Flow***********")?;
        writeln!(f, "{:<10} {:<10} {:>13}", "CDC", "RDC", "Flow Quantity")?;
        writeln!(f, "{RULE}")?;
        for flow in &self.cdc_rdc {
            writeln!(f, "{:<10} {:<10} {:>13.0}", flow.from, flow.to, flow.quantity)?;
        }
        writeln!(f)?;

        writeln!(f, "********Which CDCs to Open*********")?;
        writeln!(f, "{:<15} {:>17}", "CDC", "Quantity Supplied")?;
        writeln!(f, "{RULE}")?;
        for cdc in &self.open {
            let quantity = self.throughput.get(cdc).copied().unwrap_or_default();
            writeln!(f, "{:<15} {:>17.0}", cdc, quantity)?;
        }
        writeln!(f)?;
        write!(
            f,
            "Served within radius: {:.1}%   (solved in {:.3}s)",
            self.service_fraction * 100.0,
            self.solve_time
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NetworkSolution {
        NetworkSolution {
            objective: 210.0,
            costs: CostBreakdown {
                manufacturing: 10.0,
                inbound_transport: 20.0,
                outbound_transport: 50.0,
                fixed: 100.0,
                variable: 30.0,
            },
            open: vec!["C1".into()],
            mfg_cdc: vec![ArcFlow {
                from: "P1".into(),
                to: "C1".into(),
                quantity: 10.0,
            }],
            cdc_rdc: vec![ArcFlow {
                from: "C1".into(),
                to: "R1".into(),
                quantity: 10.0,
            }],
            throughput: [("C1".to_string(), 10.0)].into_iter().collect(),
            service_fraction: 1.0,
            solve_time: 0.01,
        }
    }

    #[test]
    fn test_cost_total() {
        assert_eq!(sample().costs.total(), 210.0);
    }

    #[test]
    fn test_lookups() {
        let s = sample();
        assert!(s.is_open("C1"));
        assert!(!s.is_open("C2"));
        assert_eq!(s.mfg_cdc("P1", "C1"), 10.0);
        assert_eq!(s.cdc_rdc("C1", "R2"), 0.0);
        assert_eq!(s.inbound("C1"), 10.0);
        assert_eq!(s.outbound("C1"), 10.0);
        assert_eq!(s.delivered("R1"), 10.0);
    }

    #[test]
    fn test_display() {
        let text = sample().to_string();
        assert!(text.contains("Total Cost:"));
        assert!(text.contains("C1         R1"));
        assert!(text.contains("Served within radius: 100.0%"));
    }
}
