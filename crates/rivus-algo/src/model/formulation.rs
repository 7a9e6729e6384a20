//! MILP formulation of a [`Problem`] as `good_lp` variables and constraints.

use super::problem::Problem;
use super::solution::{CostType, EntityValues};
use good_lp::{
    constraint, variable, variables, Constraint, Expression, ProblemVariables, Variable,
};
use rivus_core::{EdgeKey, VertexId};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Size of a formulated model.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModelStats {
    pub variables: usize,
    pub binaries: usize,
    /// Constraint count per family
    pub constraints: BTreeMap<&'static str, usize>,
}

impl ModelStats {
    pub fn constraint_count(&self) -> usize {
        self.constraints.values().sum()
    }
}

pub(crate) struct Formulation {
    pub vars: ProblemVariables,
    pub handles: EntityValues<Variable>,
    pub objective: Expression,
    pub constraints: Vec<Constraint>,
    pub stats: ModelStats,
}

struct Builder<'a> {
    problem: &'a Problem,
    relax_integers: bool,
    vars: ProblemVariables,
    handles: EntityValues<Variable>,
    constraints: Vec<Constraint>,
    stats: ModelStats,
}

/// Builds the model. With `relax_integers` every binary becomes a
/// continuous variable in `[0, 1]`.
pub(crate) fn formulate(problem: &Problem, relax_integers: bool) -> Formulation {
    let mut builder = Builder {
        problem,
        relax_integers,
        vars: variables!(),
        handles: EntityValues::default(),
        constraints: Vec::new(),
        stats: ModelStats::default(),
    };
    builder.add_variables();
    builder.add_edge_constraints();
    builder.add_hub_constraints();
    builder.add_vertex_constraints();
    builder.add_process_constraints();
    let objective = builder.add_cost_definitions();

    debug!(
        variables = builder.stats.variables,
        binaries = builder.stats.binaries,
        constraints = builder.stats.constraint_count(),
        relaxed = relax_integers,
        "formulated model"
    );
    Formulation {
        vars: builder.vars,
        handles: builder.handles,
        objective,
        constraints: builder.constraints,
        stats: builder.stats,
    }
}

impl<'a> Builder<'a> {
    fn continuous(&mut self) -> Variable {
        self.stats.variables += 1;
        self.vars.add(variable().min(0.0))
    }

    fn binary(&mut self) -> Variable {
        self.stats.variables += 1;
        self.stats.binaries += 1;
        if self.relax_integers {
            self.vars.add(variable().min(0.0).max(1.0))
        } else {
            self.vars.add(variable().binary())
        }
    }

    fn push(&mut self, family: &'static str, constraint: Constraint) {
        *self.stats.constraints.entry(family).or_insert(0) += 1;
        self.constraints.push(constraint);
    }

    fn times(&self) -> Vec<String> {
        self.problem.data.time.iter().map(|t| t.name.clone()).collect()
    }

    fn add_variables(&mut self) {
        let p = self.problem;
        let times = self.times();
        let commodities = p.data.commodity_names();
        let processes: Vec<String> = p.data.processes.iter().map(|x| x.name.clone()).collect();
        let edges: Vec<EdgeKey> = p.edges().collect();
        let vertices: Vec<VertexId> = p.vertices().collect();

        for &(v1, v2) in &edges {
            for co in &commodities {
                for t in &times {
                    let var = self.continuous();
                    self.handles.supply.insert((v1, v2, co.clone(), t.clone()), var);
                }
            }
            for co in &p.co_transportable {
                let capacity = self.continuous();
                let built = self.binary();
                self.handles.edge_capacity.insert((v1, v2, co.clone()), capacity);
                self.handles.edge_built.insert((v1, v2, co.clone()), built);
            }
            for h in &p.hubs {
                let capacity = self.continuous();
                self.handles.hub_capacity.insert((v1, v2, h.clone()), capacity);
                for t in &times {
                    let activity = self.continuous();
                    self.handles
                        .hub_activity
                        .insert((v1, v2, h.clone(), t.clone()), activity);
                }
            }
        }

        for &(i, j) in &p.arcs {
            for co in &p.co_transportable {
                for t in &times {
                    let key = (i, j, co.clone(), t.clone());
                    let flow_in = self.continuous();
                    let flow_out = self.continuous();
                    let arc_use = self.binary();
                    self.handles.flow_in.insert(key.clone(), flow_in);
                    self.handles.flow_out.insert(key.clone(), flow_out);
                    self.handles.arc_use.insert(key, arc_use);
                }
            }
        }

        for &v in &vertices {
            for co in &p.co_source {
                for t in &times {
                    let var = self.continuous();
                    self.handles.source.insert((v, co.clone(), t.clone()), var);
                }
            }
            for process in &processes {
                let capacity = self.continuous();
                let built = self.binary();
                self.handles.process_capacity.insert((v, process.clone()), capacity);
                self.handles.process_built.insert((v, process.clone()), built);
                for t in &times {
                    let var = self.continuous();
                    self.handles
                        .throughput
                        .insert((v, process.clone(), t.clone()), var);
                }
            }
            for (process, co) in p.r_in.keys() {
                for t in &times {
                    let var = self.continuous();
                    self.handles
                        .process_input
                        .insert((v, process.clone(), co.clone(), t.clone()), var);
                }
            }
            for (process, co) in p.r_out.keys() {
                for t in &times {
                    let var = self.continuous();
                    self.handles
                        .process_output
                        .insert((v, process.clone(), co.clone(), t.clone()), var);
                }
            }
        }

        for cost_type in CostType::ALL {
            let var = self.continuous();
            self.handles.costs.insert(cost_type, var);
        }
    }

    /// Net hub output of `co` in an edge: outputs minus inputs.
    fn hub_balance(&self, (v1, v2): EdgeKey, co: &str, t: &str) -> Expression {
        let p = self.problem;
        let mut balance = Expression::from(0.0);
        for h in &p.hubs {
            let activity = self.handles.hub_activity[&(v1, v2, h.clone(), t.to_string())];
            if let Some(r) = p.r_in.get(&(h.clone(), co.to_string())) {
                balance -= *r * activity;
            }
            if let Some(r) = p.r_out.get(&(h.clone(), co.to_string())) {
                balance += *r * activity;
            }
        }
        balance
    }

    /// Arc inflow minus outflow of `co` at vertex `v`.
    fn flow_balance(&self, v: VertexId, co: &str, t: &str) -> Expression {
        let mut balance = Expression::from(0.0);
        for &w in self.problem.neighbours.get(&v).into_iter().flatten() {
            balance += self.handles.flow_out[&(w, v, co.to_string(), t.to_string())];
            balance -= self.handles.flow_in[&(v, w, co.to_string(), t.to_string())];
        }
        balance
    }

    /// Process output minus input of `co` at vertex `v`; `None` if no process touches `co`.
    fn process_balance(&self, v: VertexId, co: &str, t: &str) -> Option<Expression> {
        let p = self.problem;
        let mut balance = Expression::from(0.0);
        let mut touched = false;
        for process in &p.data.processes {
            let key = (v, process.name.clone(), co.to_string(), t.to_string());
            if let Some(&input) = self.handles.process_input.get(&key) {
                balance -= input;
                touched = true;
            }
            if let Some(&output) = self.handles.process_output.get(&key) {
                balance += output;
                touched = true;
            }
        }
        touched.then_some(balance)
    }

    fn add_edge_constraints(&mut self) {
        let p = self.problem;
        let times = self.times();
        let commodities = p.data.commodity_names();
        let scale: BTreeMap<&str, f64> = p
            .data
            .time
            .iter()
            .map(|t| (t.name.as_str(), t.scale))
            .collect();

        for edge in p.edges() {
            let (v1, v2) = edge;
            let length = p.length(edge);
            for co in &commodities {
                let commodity = p.data.commodity(co);
                for t in &times {
                    let supply = self.handles.supply[&(v1, v2, co.clone(), t.clone())];

                    if p.co_demand.contains(co) {
                        let scale = scale.get(t.as_str()).copied().unwrap_or(1.0);
                        let demand = p.peak(edge, co) * scale;
                        let provided = self.hub_balance(edge, co, t) + supply;
                        self.push("peak_satisfaction", constraint!(provided >= demand));
                    }

                    let available = match commodity.filter(|c| c.is_transportable()) {
                        Some(c) => {
                            let fwd = (v1, v2, co.clone(), t.clone());
                            let bwd = (v2, v1, co.clone(), t.clone());
                            let efficiency = 1.0 - length * c.loss_var;
                            let fixed_loss = length * c.loss_fix;
                            efficiency * (self.handles.flow_in[&fwd] + self.handles.flow_in[&bwd])
                                - (self.handles.flow_out[&fwd] + self.handles.flow_out[&bwd])
                                - fixed_loss
                                    * (self.handles.arc_use[&fwd] + self.handles.arc_use[&bwd])
                        }
                        None => Expression::from(0.0),
                    };
                    self.push("edge_equation", constraint!(supply <= available));
                }
            }

            for co in &p.co_transportable {
                let cap_max = p.data.commodity(co).map_or(0.0, |c| c.cap_max);
                let capacity = self.handles.edge_capacity[&(v1, v2, co.clone())];
                let built = self.handles.edge_built[&(v1, v2, co.clone())];
                self.push("edge_build_limit", constraint!(capacity <= cap_max * built));
            }
        }

        for &(i, j) in &p.arcs {
            let (v1, v2) = p.edge_of_arc((i, j));
            for co in &p.co_transportable {
                let cap_max = p.data.commodity(co).map_or(0.0, |c| c.cap_max);
                let capacity = self.handles.edge_capacity[&(v1, v2, co.clone())];
                for t in &times {
                    let fwd = (i, j, co.clone(), t.clone());
                    let bwd = (j, i, co.clone(), t.clone());
                    let flow_in = self.handles.flow_in[&fwd];
                    let used = self.handles.arc_use[&fwd];
                    let used_back = self.handles.arc_use[&bwd];
                    self.push("arc_flow_by_capacity", constraint!(flow_in <= capacity));
                    self.push(
                        "arc_flow_unidirectionality",
                        constraint!(flow_in <= cap_max * used),
                    );
                    self.push("arc_unidirectionality", constraint!(used + used_back <= 1.0));
                }
            }
        }
    }

    fn add_hub_constraints(&mut self) {
        let p = self.problem;
        let times = self.times();
        let commodities = p.data.commodity_names();

        for edge in p.edges() {
            let (v1, v2) = edge;
            for co in &commodities {
                for t in &times {
                    let supply = self.handles.supply[&(v1, v2, co.clone(), t.clone())];
                    let hub_input = Expression::from(0.0) - self.hub_balance(edge, co, t);
                    self.push("hub_supply", constraint!(hub_input <= supply));
                }
            }
            for h in &p.hubs {
                let cap_max = p.data.process(h).map_or(0.0, |x| x.cap_max);
                let capacity = self.handles.hub_capacity[&(v1, v2, h.clone())];
                for t in &times {
                    let activity = self.handles.hub_activity[&(v1, v2, h.clone(), t.clone())];
                    self.push("hub_output_by_capacity", constraint!(activity <= capacity));
                }
                self.push("hub_capacity_limit", constraint!(capacity <= cap_max));
            }
        }
    }

    fn add_vertex_constraints(&mut self) {
        let p = self.problem;
        let times = self.times();
        let commodities = p.data.commodity_names();
        let vertices: Vec<(VertexId, BTreeMap<String, f64>)> = p
            .network
            .vertices()
            .map(|v| (v.id, v.sources.clone()))
            .collect();

        for (v, sources) in &vertices {
            for co in &commodities {
                let transportable = p.is_transportable(co);
                let source = p.is_source(co);
                for t in &times {
                    let process_balance = self.process_balance(*v, co, t);
                    if !transportable && process_balance.is_none() && !source {
                        continue;
                    }
                    let mut required = Expression::from(0.0);
                    if transportable {
                        required -= self.flow_balance(*v, co, t);
                    }
                    if let Some(balance) = process_balance {
                        required -= balance;
                    }
                    if source {
                        let rho = self.handles.source[&(*v, co.clone(), t.clone())];
                        let capacity = sources.get(co).copied().unwrap_or(0.0);
                        self.push("vertex_equation", constraint!(rho >= required));
                        self.push("source_limit", constraint!(rho <= capacity));
                    } else {
                        self.push("vertex_equation", constraint!(required <= 0.0));
                    }
                }
            }
        }
    }

    fn add_process_constraints(&mut self) {
        let p = self.problem;
        let times = self.times();
        let vertices: Vec<VertexId> = p.vertices().collect();

        for &v in &vertices {
            for process in &p.data.processes {
                let name = &process.name;
                let capacity = self.handles.process_capacity[&(v, name.clone())];
                let built = self.handles.process_built[&(v, name.clone())];
                for t in &times {
                    let throughput = self.handles.throughput[&(v, name.clone(), t.clone())];
                    self.push(
                        "process_throughput_by_capacity",
                        constraint!(throughput <= capacity),
                    );
                }
                self.push(
                    "process_capacity_min",
                    constraint!(capacity >= process.cap_min * built),
                );
                self.push(
                    "process_capacity_max",
                    constraint!(capacity <= process.cap_max * built),
                );
            }
            for ((name, co), ratio) in &p.r_in {
                for t in &times {
                    let throughput = self.handles.throughput[&(v, name.clone(), t.clone())];
                    let input = self.handles.process_input[&(v, name.clone(), co.clone(), t.clone())];
                    self.push("process_input_ratio", constraint!(input == *ratio * throughput));
                }
            }
            for ((name, co), ratio) in &p.r_out {
                for t in &times {
                    let throughput = self.handles.throughput[&(v, name.clone(), t.clone())];
                    let output =
                        self.handles.process_output[&(v, name.clone(), co.clone(), t.clone())];
                    self.push("process_output_ratio", constraint!(output == *ratio * throughput));
                }
            }
        }
    }

    /// Adds the three cost definitions and returns their sum as objective.
    fn add_cost_definitions(&mut self) -> Expression {
        let p = self.problem;
        let weight: BTreeMap<&str, f64> = p
            .data
            .time
            .iter()
            .map(|t| (t.name.as_str(), t.weight))
            .collect();

        let mut investment = Expression::from(0.0);
        let mut variable_costs = Expression::from(0.0);

        for ((_, _, h), &capacity) in &self.handles.hub_capacity {
            if let Some(hub) = p.data.process(h) {
                investment += hub.cost_inv_var * capacity;
            }
        }
        for (key, &capacity) in &self.handles.process_capacity {
            if let Some(process) = p.data.process(&key.1) {
                investment += process.cost_inv_var * capacity;
                investment += process.cost_inv_fix * self.handles.process_built[key];
            }
        }
        for (key, &capacity) in &self.handles.edge_capacity {
            if let Some(commodity) = p.data.commodity(&key.2) {
                investment += commodity.cost_inv_var * capacity;
                investment += commodity.cost_inv_fix * self.handles.edge_built[key];
            }
        }

        for ((_, _, h, t), &activity) in &self.handles.hub_activity {
            if let Some(hub) = p.data.process(h) {
                let w = weight.get(t.as_str()).copied().unwrap_or(0.0);
                variable_costs += hub.cost_var * w * activity;
            }
        }
        for ((_, name, t), &throughput) in &self.handles.throughput {
            if let Some(process) = p.data.process(name) {
                let w = weight.get(t.as_str()).copied().unwrap_or(0.0);
                variable_costs += process.cost_var * w * throughput;
            }
        }
        for ((_, co, t), &source) in &self.handles.source {
            if let Some(commodity) = p.data.commodity(co) {
                let w = weight.get(t.as_str()).copied().unwrap_or(0.0);
                variable_costs += commodity.cost_var * w * source;
            }
        }

        let inv = self.handles.costs[&CostType::Inv];
        let fix = self.handles.costs[&CostType::Fix];
        let var = self.handles.costs[&CostType::Var];
        let share = p.options.fix_cost_share;
        self.push("cost_definition", constraint!(inv == investment));
        self.push("cost_definition", constraint!(fix == share * inv));
        self.push("cost_definition", constraint!(var == variable_costs));
        inv + fix + var
    }
}
