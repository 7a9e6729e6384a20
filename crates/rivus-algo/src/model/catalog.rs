//! Names, descriptions and domains of every set, parameter, variable and
//! constraint family of the formulation.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Set,
    Parameter,
    Variable,
    Constraint,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Set => "set",
            EntityKind::Parameter => "parameter",
            EntityKind::Variable => "variable",
            EntityKind::Constraint => "constraint",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "set" | "sets" => Ok(EntityKind::Set),
            "parameter" | "parameters" | "par" => Ok(EntityKind::Parameter),
            "variable" | "variables" | "var" => Ok(EntityKind::Variable),
            "constraint" | "constraints" | "con" | "equation" => Ok(EntityKind::Constraint),
            other => Err(format!(
                "unknown entity kind '{other}'; supported values: set, parameter, variable, constraint"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EntityInfo {
    pub name: &'static str,
    pub kind: EntityKind,
    pub description: &'static str,
    pub domain: &'static [&'static str],
}

const fn entity(
    name: &'static str,
    kind: EntityKind,
    domain: &'static [&'static str],
    description: &'static str,
) -> EntityInfo {
    EntityInfo {
        name,
        kind,
        description,
        domain,
    }
}

use EntityKind::{Constraint, Parameter, Set, Variable};

const EDGE_T: &[&str] = &["Vertex1", "Vertex2", "commodity", "time"];
const ARC_T: &[&str] = &["from", "to", "commodity", "time"];
const EDGE_CO: &[&str] = &["Vertex1", "Vertex2", "commodity"];
const EDGE_HUB: &[&str] = &["Vertex1", "Vertex2", "hub"];
const EDGE_HUB_T: &[&str] = &["Vertex1", "Vertex2", "hub", "time"];
const VERTEX_CO_T: &[&str] = &["vertex", "commodity", "time"];
const VERTEX_PRO: &[&str] = &["vertex", "process"];
const VERTEX_PRO_T: &[&str] = &["vertex", "process", "time"];
const VERTEX_PRO_CO_T: &[&str] = &["vertex", "process", "commodity", "time"];

pub static ENTITIES: &[EntityInfo] = &[
    entity("commodity", Set, &[], "Commodities"),
    entity("co_demand", Set, &["commodity"], "Commodities with demand in edges"),
    entity("co_source", Set, &["commodity"], "Commodities that may have a source at some vertex"),
    entity("co_transportable", Set, &["commodity"], "Commodities that may be transported through edges"),
    entity("process", Set, &[], "Processes converting commodities in vertices"),
    entity("process_input_tuples", Set, &["process", "commodity"], "Commodities consumed by processes"),
    entity("process_output_tuples", Set, &["process", "commodity"], "Commodities emitted by processes"),
    entity("hub", Set, &["process"], "Hub processes converting commodities in edges"),
    entity("time", Set, &[], "Time steps"),
    entity("vertex", Set, &[], "Connection points between edges, for sources and processes"),
    entity("edge", Set, &["vertex", "vertex"], "Undirected street segments, for demand and hubs"),
    entity("arc", Set, &["vertex", "vertex"], "Directed street segments, for power flows"),
    entity("cost_type", Set, &[], "Inv, Fix and Var"),
    entity("peak", Parameter, EDGE_CO, "Peak demand (kW) of commodity in edge"),
    entity("r_in", Parameter, &["process", "commodity"], "Input ratio of commodity per unit throughput"),
    entity("r_out", Parameter, &["process", "commodity"], "Output ratio of commodity per unit throughput"),
    entity("length", Parameter, &["Vertex1", "Vertex2"], "Edge length (m)"),
    entity("supply", Variable, EDGE_T, "Supply (kW) of commodity in edge at time"),
    entity("flow_in", Variable, ARC_T, "Power flow (kW) of commodity into arc at time"),
    entity("flow_out", Variable, ARC_T, "Power flow (kW) of commodity out of arc at time"),
    entity("arc_use", Variable, ARC_T, "1 if the directed arc carries commodity at time"),
    entity("edge_capacity", Variable, EDGE_CO, "Power flow capacity (kW) for commodity in edge"),
    entity("edge_built", Variable, EDGE_CO, "1 if the undirected edge is used for commodity at all"),
    entity("source", Variable, VERTEX_CO_T, "Source stream (kW) of commodity from vertex"),
    entity("hub_capacity", Variable, EDGE_HUB, "Capacity (kW) of hub process in edge"),
    entity("hub_activity", Variable, EDGE_HUB_T, "Activity (kW) of hub process in edge at time"),
    entity("process_capacity", Variable, VERTEX_PRO, "Capacity (kW) of process in vertex"),
    entity("process_built", Variable, VERTEX_PRO, "1 if process in vertex has positive capacity"),
    entity("throughput", Variable, VERTEX_PRO_T, "Power flow (kW) through process"),
    entity("process_input", Variable, VERTEX_PRO_CO_T, "Power flow (kW) of commodity into process"),
    entity("process_output", Variable, VERTEX_PRO_CO_T, "Power flow (kW) of commodity out of process"),
    entity("costs", Variable, &["cost_type"], "Costs (EUR) by cost type"),
    entity("peak_satisfaction", Constraint, EDGE_T, "supply + hub balance >= peak * scale"),
    entity("edge_equation", Constraint, EDGE_T, "supply <= flow in - flow out - losses in either direction"),
    entity("arc_flow_by_capacity", Constraint, ARC_T, "flow in <= edge capacity"),
    entity("arc_flow_unidirectionality", Constraint, ARC_T, "flow in <= cap_max * arc use"),
    entity("arc_unidirectionality", Constraint, ARC_T, "arc use (i,j) + arc use (j,i) <= 1"),
    entity("edge_build_limit", Constraint, EDGE_CO, "edge capacity <= cap_max * edge built"),
    entity("hub_supply", Constraint, EDGE_T, "hub inputs <= supply"),
    entity("hub_output_by_capacity", Constraint, EDGE_HUB_T, "hub activity <= hub capacity"),
    entity("hub_capacity_limit", Constraint, EDGE_HUB, "hub capacity <= cap_max"),
    entity("vertex_equation", Constraint, VERTEX_CO_T, "source >= process balance + arc flow balance"),
    entity("source_limit", Constraint, VERTEX_CO_T, "source <= vertex source capacity"),
    entity("process_throughput_by_capacity", Constraint, VERTEX_PRO_T, "throughput <= process capacity"),
    entity("process_capacity_min", Constraint, VERTEX_PRO, "process capacity >= cap_min * process built"),
    entity("process_capacity_max", Constraint, VERTEX_PRO, "process capacity <= cap_max * process built"),
    entity("process_input_ratio", Constraint, VERTEX_PRO_CO_T, "process input = throughput * r_in"),
    entity("process_output_ratio", Constraint, VERTEX_PRO_CO_T, "process output = throughput * r_out"),
    entity("cost_definition", Constraint, &["cost_type"], "costs = sum of activities"),
];

pub fn entity_info(name: &str) -> Option<&'static EntityInfo> {
    ENTITIES.iter().find(|e| e.name == name)
}

/// Entities of one kind, or all of them, in declaration order.
pub fn list_entities(kind: Option<EntityKind>) -> Vec<&'static EntityInfo> {
    ENTITIES
        .iter()
        .filter(|e| kind.map_or(true, |k| e.kind == k))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_by_kind() {
        let variables = list_entities(Some(EntityKind::Variable));
        assert_eq!(variables.len(), 15);
        assert!(variables.iter().all(|e| e.kind == EntityKind::Variable));
        assert_eq!(list_entities(None).len(), ENTITIES.len());
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<&str> = ENTITIES.iter().map(|e| e.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ENTITIES.len());
    }

    #[test]
    fn kinds_parse_from_cli_words() {
        assert_eq!("vars".parse::<EntityKind>().ok(), None);
        assert_eq!("Variables".parse::<EntityKind>().unwrap(), EntityKind::Variable);
        assert_eq!("con".parse::<EntityKind>().unwrap(), EntityKind::Constraint);
    }
}
