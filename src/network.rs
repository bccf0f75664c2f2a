//! The facility-location / minimum-cost-flow formulation.
//!
//! Given a validated `NetworkParams`, `NetworkProblem::build` emits:
//!
//! Variables
//! - `flow_mfg_cdc[a, b] >= 0` for each plant `a` and CDC `b`, at most `K1[a, b]`
//! - `flow_cdc_rdc[a, b] >= 0` for each CDC `a` and region `b`, at most `K2[a, b]`
//! - `open[c]` in `{0, 1}` for each CDC `c`
//!
//! Objective (minimize)
//! - manufacturing: `sum_a M[a] * sum_b flow_mfg_cdc[a, b]`
//! - plant transport: `sum_a sum_b T[a, b] * flow_mfg_cdc[a, b]`
//! - CDC transport: `sum_a sum_b d[a, b] * cost_per_mile * flow_cdc_rdc[a, b]`
//! - fixed: `sum_a F[a] * open[a]`
//! - variable: `sum_a V[a] * sum_b flow_cdc_rdc[a, b]`
//!
//! Constraints
//! - `supply[n]`: `sum_b flow_cdc_rdc[n, b] <= S[n]`
//! - `demand[n]`: `sum_a flow_cdc_rdc[a, n] >= D[n]`
//! - `link[n]`: `big_m[n] * open[n] - sum_b flow_cdc_rdc[n, b] >= 0`
//! - `capital`: `sum_a F[a] * open[a] <= capital`
//! - `flow[n]`: `sum_a flow_mfg_cdc[a, n] - sum_b flow_cdc_rdc[n, b] == 0`
//! - `service`: `sum_a sum_b A[a, b] * flow_cdc_rdc[a, b] >= service_level * B`
//!
//! `B` is total demand and `A[a, b]` is 1 iff `d[a, b] <= service_mile`.
//! The service constraint is the ratio form multiplied through by `B`; it is
//! omitted when `B == 0`, where it holds for every flow.

use crate::constraints::{Constraint, ConstraintExt};
use crate::error::{DistNetError, Result};
use crate::expr::{LinExpr, VarId, VariableBuilder};
use crate::params::NetworkParams;
use crate::problem::{Objective, Problem};
use crate::report::NetworkSolution;
use crate::solver::{Settings, Solution};

/// Big-M used in the linking constraint `big_m * open[n] >= outflow[n]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BigM {
    /// Total demand `B` for every CDC.
    #[default]
    TotalDemand,
    /// `min(S[n], B)` per CDC. Tighter relaxation, same integer optimum.
    Capacity,
}

/// Choices that change the formulation but not its integer optimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormulationOptions {
    pub big_m: BigM,
}

/// A built network model: the MILP plus the variable layout over the
/// parameter table's node sets.
#[derive(Debug, Clone)]
pub struct NetworkProblem {
    params: NetworkParams,
    options: FormulationOptions,
    problem: Problem,
    /// `[plant][cdc]`
    flow_mfg_cdc: Vec<Vec<VarId>>,
    /// `[cdc][rdc]`
    flow_cdc_rdc: Vec<Vec<VarId>>,
    /// `[cdc]`
    open: Vec<VarId>,
    /// `A`, `[cdc][rdc]`
    coverage: Vec<Vec<bool>>,
    /// `B`
    total_demand: f64,
    /// Linking constant per CDC.
    big_m: Vec<f64>,
}

impl NetworkProblem {
    /// Validate `params` and build the model with default options.
    pub fn build(params: &NetworkParams) -> Result<Self> {
        Self::build_with(params, FormulationOptions::default())
    }

    /// Validate `params` and build the model.
    pub fn build_with(params: &NetworkParams, options: FormulationOptions) -> Result<Self> {
        params.validate()?;

        let total_demand = params.total_demand();
        let coverage = params
            .cdc
            .iter()
            .map(|a| params.rdc.iter().map(|b| params.covers(a, b)).collect())
            .collect::<Result<Vec<Vec<bool>>>>()?;
        let mut big_m = Vec::with_capacity(params.cdc.len());
        for n in &params.cdc {
            big_m.push(match options.big_m {
                BigM::TotalDemand => total_demand,
                BigM::Capacity => params.supply(n)?.min(total_demand),
            });
        }

        let mut problem = Problem::new();

        let mut flow_mfg_cdc = Vec::with_capacity(params.manufacturing.len());
        for a in &params.manufacturing {
            let mut row = Vec::with_capacity(params.cdc.len());
            for b in &params.cdc {
                let var = VariableBuilder::continuous(format!("flow_mfg_cdc[{a},{b}]"))
                    .upper(params.mfg_cdc_capacity(a, b))
                    .build();
                row.push(problem.add_variable(var)?);
            }
            flow_mfg_cdc.push(row);
        }

        let mut flow_cdc_rdc = Vec::with_capacity(params.cdc.len());
        for a in &params.cdc {
            let mut row = Vec::with_capacity(params.rdc.len());
            for b in &params.rdc {
                let var = VariableBuilder::continuous(format!("flow_cdc_rdc[{a},{b}]"))
                    .upper(params.cdc_rdc_capacity(a, b))
                    .build();
                row.push(problem.add_variable(var)?);
            }
            flow_cdc_rdc.push(row);
        }

        let open = params
            .cdc
            .iter()
            .map(|c| problem.add_variable(VariableBuilder::binary(format!("open[{c}]")).build()))
            .collect::<Result<Vec<VarId>>>()?;

        let mut network = NetworkProblem {
            params: params.clone(),
            options,
            problem,
            flow_mfg_cdc,
            flow_cdc_rdc,
            open,
            coverage,
            total_demand,
            big_m,
        };

        let objective = network.objective()?;
        network.problem.set_objective(Objective::Minimize(objective));
        let constraints = network.constraints()?;
        network.problem.subject_to(constraints)?;

        log::info!(
            "built network model: {} variables ({} binary), {} constraints, B = {}",
            network.problem.num_variables(),
            network.problem.num_binaries(),
            network.problem.num_constraints(),
            network.total_demand
        );
        Ok(network)
    }

    fn objective(&self) -> Result<LinExpr> {
        let p = &self.params;
        let mut cost = LinExpr::zero();

        for (i, a) in p.manufacturing.iter().enumerate() {
            let unit = p.manufacturing_cost(a)?;
            for (j, b) in p.cdc.iter().enumerate() {
                cost.add_term(self.flow_mfg_cdc[i][j], unit);
                cost.add_term(self.flow_mfg_cdc[i][j], p.transport_cost(a, b)?);
            }
        }

        for (i, a) in p.cdc.iter().enumerate() {
            let throughput = p.variable_cost(a)?;
            for (j, b) in p.rdc.iter().enumerate() {
                cost.add_term(self.flow_cdc_rdc[i][j], p.distance(a, b)? * p.cost_per_mile);
                cost.add_term(self.flow_cdc_rdc[i][j], throughput);
            }
            cost.add_term(self.open[i], p.fixed_cost(a)?);
        }

        Ok(cost.compact())
    }

    fn constraints(&self) -> Result<Vec<Constraint>> {
        let p = &self.params;
        let mut out = Vec::new();

        for (n, name) in p.cdc.iter().enumerate() {
            out.push(
                self.outflow(n)
                    .leq(p.supply(name)?)
                    .named(format!("supply[{name}]")),
            );
        }

        for (n, name) in p.rdc.iter().enumerate() {
            let inflow = LinExpr::sum(self.flow_cdc_rdc.iter().map(|row| row[n]));
            out.push(inflow.geq(p.demand(name)?).named(format!("demand[{name}]")));
        }

        for (n, name) in p.cdc.iter().enumerate() {
            let link = LinExpr::var(self.open[n]) * self.big_m[n] - self.outflow(n);
            out.push(link.geq(0.0).named(format!("link[{name}]")));
        }

        let mut spend = LinExpr::zero();
        for (name, &open) in p.cdc.iter().zip(&self.open) {
            spend.add_term(open, p.fixed_cost(name)?);
        }
        out.push(spend.leq(p.capital).named("capital"));

        for (n, name) in p.cdc.iter().enumerate() {
            let inflow = LinExpr::sum(self.flow_mfg_cdc.iter().map(|row| row[n]));
            out.push((inflow - self.outflow(n)).equals(0.0).named(format!("flow[{name}]")));
        }

        if self.total_demand > 0.0 {
            let mut served = LinExpr::zero();
            for (i, row) in self.flow_cdc_rdc.iter().enumerate() {
                for (j, &var) in row.iter().enumerate() {
                    if self.coverage[i][j] {
                        served.add_term(var, 1.0);
                    }
                }
            }
            out.push(
                served
                    .geq(p.service_level * self.total_demand)
                    .named("service"),
            );
        } else {
            log::warn!("total demand is zero; service-level constraint is trivially satisfied");
        }

        Ok(out)
    }

    /// `sum_b flow_cdc_rdc[n, b]`
    fn outflow(&self, n: usize) -> LinExpr {
        LinExpr::sum(self.flow_cdc_rdc[n].iter().copied())
    }

    /// The underlying MILP.
    pub fn model(&self) -> &Problem {
        &self.problem
    }

    pub fn params(&self) -> &NetworkParams {
        &self.params
    }

    pub fn options(&self) -> FormulationOptions {
        self.options
    }

    /// `B`: total demand used as the service-level denominator.
    pub fn total_demand(&self) -> f64 {
        self.total_demand
    }

    /// Linking constant of CDC `cdc`.
    pub fn big_m(&self, cdc: &str) -> Option<f64> {
        position(&self.params.cdc, cdc).map(|n| self.big_m[n])
    }

    /// `A[cdc, rdc]`.
    pub fn coverage(&self, cdc: &str, rdc: &str) -> Option<bool> {
        let i = position(&self.params.cdc, cdc)?;
        let j = position(&self.params.rdc, rdc)?;
        Some(self.coverage[i][j])
    }

    pub fn flow_mfg_cdc(&self, plant: &str, cdc: &str) -> Option<VarId> {
        let i = position(&self.params.manufacturing, plant)?;
        let j = position(&self.params.cdc, cdc)?;
        Some(self.flow_mfg_cdc[i][j])
    }

    pub fn flow_cdc_rdc(&self, cdc: &str, rdc: &str) -> Option<VarId> {
        let i = position(&self.params.cdc, cdc)?;
        let j = position(&self.params.rdc, rdc)?;
        Some(self.flow_cdc_rdc[i][j])
    }

    pub fn open(&self, cdc: &str) -> Option<VarId> {
        position(&self.params.cdc, cdc).map(|n| self.open[n])
    }

    /// Solve with default settings.
    pub fn solve(&self) -> Result<NetworkSolution> {
        self.solve_with(&Settings::default())
    }

    /// Solve the MILP and read the result back over the node sets.
    pub fn solve_with(&self, settings: &Settings) -> Result<NetworkSolution> {
        let solution = self.problem.solve_with(settings)?;
        NetworkSolution::from_solution(self, &solution)
    }

    /// Solve the continuous relaxation (each `open[c]` in `[0, 1]`).
    ///
    /// Its value is a lower bound on the network cost; the distance to the
    /// MILP optimum shows how loose the big-M linking is.
    pub fn solve_relaxation(&self, settings: &Settings) -> Result<Solution> {
        self.problem.solve_relaxation(settings)
    }

    /// Values of `flow_mfg_cdc`, `[plant][cdc]`.
    pub(crate) fn mfg_cdc_values(&self, solution: &Solution) -> Result<Vec<Vec<f64>>> {
        read_grid(&self.flow_mfg_cdc, solution)
    }

    /// Values of `flow_cdc_rdc`, `[cdc][rdc]`.
    pub(crate) fn cdc_rdc_values(&self, solution: &Solution) -> Result<Vec<Vec<f64>>> {
        read_grid(&self.flow_cdc_rdc, solution)
    }

    /// Values of `open`, `[cdc]`.
    pub(crate) fn open_values(&self, solution: &Solution) -> Result<Vec<f64>> {
        self.open.iter().map(|&v| read(solution, v)).collect()
    }
}

fn position(nodes: &[String], id: &str) -> Option<usize> {
    nodes.iter().position(|n| n == id)
}

fn read(solution: &Solution, var: VarId) -> Result<f64> {
    solution.get_value(var).ok_or_else(|| {
        DistNetError::InvalidProblem(format!("solution has no value for x{}", var.index()))
    })
}

fn read_grid(vars: &[Vec<VarId>], solution: &Solution) -> Result<Vec<Vec<f64>>> {
    vars.iter()
        .map(|row| row.iter().map(|&v| read(solution, v)).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::Sense;

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

    #[test]
    fn test_variable_layout() {
        let params = NetworkParams::nerd().unwrap();
        let network = NetworkProblem::build(&params).unwrap();
        let model = network.model();
        // 2*5 + 5*12 continuous, 5 binary
        assert_eq!(model.num_variables(), 75);
        assert_eq!(model.num_binaries(), 5);
        let x = network.flow_mfg_cdc("SCP", "WO").unwrap();
        assert_eq!(model.variable(x).name, "flow_mfg_cdc[SCP,WO]");
        assert_eq!(model.variable(x).upper, None);
        assert!(network.flow_cdc_rdc("BO", "XX").is_none());
    }

    #[test]
    fn test_constraint_families() {
        let params = NetworkParams::nerd().unwrap();
        let network = NetworkProblem::build(&params).unwrap();
        let model = network.model();
        assert_eq!(model.constraints_in("supply").count(), 5);
        assert_eq!(model.constraints_in("demand").count(), 12);
        assert_eq!(model.constraints_in("link").count(), 5);
        assert_eq!(model.constraints_in("capital").count(), 1);
        assert_eq!(model.constraints_in("flow").count(), 5);
        assert_eq!(model.constraints_in("service").count(), 1);
        assert_eq!(model.num_constraints(), 29);
    }

    #[test]
    fn test_derived_coefficients() {
        let params = NetworkParams::nerd().unwrap();
        let network = NetworkProblem::build(&params).unwrap();
        assert_eq!(network.total_demand(), 2000.0);
        assert_eq!(network.big_m("NA"), Some(2000.0));
        assert_eq!(network.coverage("SP", "HA"), Some(true));
        assert_eq!(network.coverage("SP", "PO"), Some(false));

        let service = network.model().constraints_in("service").next().unwrap();
        assert_eq!(service.sense, Sense::Ge);
        assert!((service.rhs - 0.97 * 2000.0).abs() < 1e-9);
        let covered = network.flow_cdc_rdc("BO", "WO").unwrap();
        let uncovered = network.flow_cdc_rdc("BO", "NH").unwrap();
        assert_eq!(service.expr.coefficient(covered), 1.0);
        assert_eq!(service.expr.coefficient(uncovered), 0.0);
    }

    #[test]
    fn test_capacity_big_m() {
        let params = NetworkParams::nerd().unwrap();
        let options = FormulationOptions { big_m: BigM::Capacity };
        let network = NetworkProblem::build_with(&params, options).unwrap();
        assert_eq!(network.big_m("NA"), Some(500.0));
        let link = network
            .model()
            .constraints_in("link")
            .find(|c| c.name == "link[NA]")
            .unwrap();
        assert_eq!(link.expr.coefficient(network.open("NA").unwrap()), 500.0);
    }

    #[test]
    fn test_objective_coefficients() {
        let params = minimal();
        let network = NetworkProblem::build(&params).unwrap();
        let objective = network.model().objective.expr();
        let x = network.flow_mfg_cdc("P1", "C1").unwrap();
        let y = network.flow_cdc_rdc("C1", "R1").unwrap();
        let open = network.open("C1").unwrap();
        // M + T
        assert_eq!(objective.coefficient(x), 3.0);
        // d * cost_per_mile + V
        assert_eq!(objective.coefficient(y), 8.0);
        assert_eq!(objective.coefficient(open), 100.0);
    }

    #[test]
    fn test_arc_capacity_bounds() {
        let params = minimal()
            .with_mfg_cdc_capacity("P1", "C1", Some(7.5))
            .with_cdc_rdc_capacity("C1", "R1", None);
        let network = NetworkProblem::build(&params).unwrap();
        let x = network.flow_mfg_cdc("P1", "C1").unwrap();
        let y = network.flow_cdc_rdc("C1", "R1").unwrap();
        assert_eq!(network.model().variable(x).upper, Some(7.5));
        assert_eq!(network.model().variable(y).upper, None);
    }

    #[test]
    fn test_zero_demand_drops_service() {
        let params = minimal().with_demand("R1", 0.0);
        let network = NetworkProblem::build(&params).unwrap();
        assert_eq!(network.model().constraints_in("service").count(), 0);
    }

    #[test]
    fn test_invalid_params_fail_fast() {
        let params = minimal().with_supply("C1", -1.0);
        assert!(matches!(
            NetworkProblem::build(&params),
            Err(DistNetError::InvalidParams { table: "supply", .. })
        ));
    }

    #[test]
    fn test_minimal_solution() {
        let network = NetworkProblem::build(&minimal()).unwrap();
        let solution = network.solve().unwrap();
        assert_eq!(solution.open, vec!["C1".to_string()]);
        assert!((solution.cdc_rdc("C1", "R1") - 10.0).abs() < 1e-6);
        // 10 * (1 + 2) + 10 * (10 * 0.5 + 3) + 100
        assert!((solution.objective - 210.0).abs() < 1e-6);
    }

    #[test]
    fn test_relaxation_bounds_milp() {
        let network = NetworkProblem::build(&minimal()).unwrap();
        let milp = network.solve().unwrap().objective;
        let relaxed = network
            .solve_relaxation(&Settings::default())
            .unwrap()
            .value
            .unwrap();
        assert!(relaxed <= milp + 1e-4, "relaxation {} above MILP {}", relaxed, milp);
    }
}
