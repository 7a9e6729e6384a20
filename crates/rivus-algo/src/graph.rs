//! Per-commodity graphs of the built network and their topology analysis.

use crate::model::Problem;
use crate::results::Constants;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;
use rivus_core::VertexId;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt::Write as _;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommodityNode {
    pub vertex: VertexId,
    /// Source capacity (kW) of the commodity at this vertex
    pub source_capacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommodityEdge {
    pub vertex1: VertexId,
    pub vertex2: VertexId,
    /// Built transport capacity (kW)
    pub capacity: f64,
    /// Peak demand (kW) when the commodity has demand
    pub peak: Option<f64>,
}

/// Network of one commodity: every vertex, and the edges built for it.
#[derive(Debug, Clone)]
pub struct CommodityGraph {
    pub commodity: String,
    pub graph: UnGraph<CommodityNode, CommodityEdge>,
}

/// One graph per commodity that has transport capacity in the optimum.
pub fn to_graphs(problem: &Problem, constants: &Constants) -> Vec<CommodityGraph> {
    let table = &constants.edge_capacity;
    let graphs: Vec<CommodityGraph> = table
        .columns
        .iter()
        .map(|commodity| {
            let mut graph = UnGraph::new_undirected();
            let mut index: HashMap<VertexId, NodeIndex> = HashMap::new();
            for vertex in problem.network.vertices() {
                let node = graph.add_node(CommodityNode {
                    vertex: vertex.id,
                    source_capacity: vertex.source_capacity(commodity),
                });
                index.insert(vertex.id, node);
            }
            let has_demand = problem.co_demand.contains(commodity);
            for (&(v1, v2), capacity) in table.column(commodity) {
                let (Some(&a), Some(&b)) = (index.get(&v1), index.get(&v2)) else {
                    continue;
                };
                graph.add_edge(
                    a,
                    b,
                    CommodityEdge {
                        vertex1: v1,
                        vertex2: v2,
                        capacity,
                        peak: has_demand.then(|| problem.peak((v1, v2), commodity)),
                    },
                );
            }
            debug!(
                commodity = %commodity,
                nodes = graph.node_count(),
                edges = graph.edge_count(),
                "built commodity graph"
            );
            CommodityGraph {
                commodity: commodity.clone(),
                graph,
            }
        })
        .collect();
    graphs
}

/// networkx-compatible node-link JSON.
pub fn to_node_link_json(graph: &CommodityGraph) -> Value {
    let g = &graph.graph;
    let nodes: Vec<Value> = g
        .node_weights()
        .map(|n| json!({ "id": n.vertex.value(), "source": n.source_capacity }))
        .collect();
    let links: Vec<Value> = g
        .edge_weights()
        .map(|e| {
            let mut link = json!({
                "source": e.vertex1.value(),
                "target": e.vertex2.value(),
                "capacity": e.capacity,
            });
            if let Some(peak) = e.peak {
                link["peak"] = json!(peak);
            }
            link
        })
        .collect();
    json!({
        "directed": false,
        "multigraph": false,
        "graph": { "commodity": graph.commodity },
        "nodes": nodes,
        "links": links,
    })
}

pub fn to_dot(graph: &CommodityGraph) -> String {
    let g = &graph.graph;
    let mut buffer = String::new();
    let name = graph.commodity.replace('\\', "\\\\").replace('"', "\\\"");
    let _ = writeln!(buffer, "graph \"{name}\" {{");
    for node in g.node_weights() {
        if node.source_capacity > 0.0 {
            let _ = writeln!(
                buffer,
                "  v{} [label=\"{} ({})\", shape=box];",
                node.vertex, node.vertex, node.source_capacity
            );
        } else {
            let _ = writeln!(buffer, "  v{} [label=\"{}\"];", node.vertex, node.vertex);
        }
    }
    for edge in g.edge_references() {
        let weight = edge.weight();
        let _ = writeln!(
            buffer,
            "  v{} -- v{} [label=\"{}\"];",
            weight.vertex1, weight.vertex2, weight.capacity
        );
    }
    buffer.push('}');
    buffer
}

/// Topology of one commodity graph.
///
/// Only vertices touched by a built edge or offering the commodity as a
/// source take part; unused street vertices are not counted as components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphAnalysis {
    pub commodity: String,
    pub is_connected: bool,
    pub connected_components: usize,
    /// Whether the graph equals its spanning tree, i.e. has no cycle
    pub is_minimal: Option<bool>,
}

pub fn minimal_graph_analysis(graphs: &[CommodityGraph], calc_spanning: bool) -> Vec<GraphAnalysis> {
    if graphs.is_empty() {
        warn!("no commodity graphs to analyse");
    }
    graphs
        .iter()
        .map(|cg| {
            let g = &cg.graph;
            let active: Vec<NodeIndex> = g
                .node_indices()
                .filter(|&n| g.edges(n).next().is_some() || g[n].source_capacity > 0.0)
                .collect();
            let mut sets = UnionFind::new(g.node_count());
            for edge in g.edge_references() {
                sets.union(edge.source().index(), edge.target().index());
            }
            let mut roots: Vec<usize> = active.iter().map(|n| sets.find(n.index())).collect();
            roots.sort_unstable();
            roots.dedup();
            let components = roots.len();
            GraphAnalysis {
                commodity: cg.commodity.clone(),
                is_connected: components == 1,
                connected_components: components,
                is_minimal: calc_spanning.then(|| g.edge_count() + components == active.len()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CostType, EntityValues, Solution};
    use crate::results::constants;
    use crate::test_utils::{chain_network, heat_dataset};

    fn v(id: usize) -> VertexId {
        VertexId::new(id)
    }

    fn graphs() -> Vec<CommodityGraph> {
        let problem = Problem::new(heat_dataset(), chain_network()).unwrap();
        let mut values = EntityValues::default();
        values.edge_capacity.insert((v(0), v(1), "Gas".into()), 63.0);
        values.edge_capacity.insert((v(1), v(2), "Gas".into()), 63.0);
        values.edge_capacity.insert((v(0), v(1), "Heat".into()), 50.0);
        values.costs.insert(CostType::Inv, 1.0);
        let solution = Solution {
            objective: 1.0,
            values,
        };
        to_graphs(&problem, &constants(&solution))
    }

    #[test]
    fn one_graph_per_built_commodity() {
        let graphs = graphs();
        let names: Vec<&str> = graphs.iter().map(|g| g.commodity.as_str()).collect();
        assert_eq!(names, vec!["Gas", "Heat"]);
        assert_eq!(graphs[0].graph.node_count(), 3);
        assert_eq!(graphs[0].graph.edge_count(), 2);
        let heat_edge = graphs[1].graph.edge_weights().next().unwrap();
        assert_eq!(heat_edge.peak, Some(50.0));
        assert_eq!(graphs[0].graph.edge_weights().next().unwrap().peak, None);
    }

    #[test]
    fn analysis_of_chain() {
        let analysis = minimal_graph_analysis(&graphs(), true);
        assert!(analysis[0].is_connected);
        assert_eq!(analysis[0].is_minimal, Some(true));
        assert_eq!(analysis[1].connected_components, 1);
        let without = minimal_graph_analysis(&graphs(), false);
        assert_eq!(without[0].is_minimal, None);
    }

    #[test]
    fn detached_source_is_its_own_component() {
        let mut graphs = graphs();
        // heat graph: vertex 2 offers no heat, give it some to detach it
        let node = graphs[1].graph.node_indices().nth(2).unwrap();
        graphs[1].graph[node].source_capacity = 10.0;
        let analysis = minimal_graph_analysis(&graphs[1..], true);
        assert!(!analysis[0].is_connected);
        assert_eq!(analysis[0].connected_components, 2);
    }

    #[test]
    fn exports() {
        let graphs = graphs();
        let json = to_node_link_json(&graphs[0]);
        assert_eq!(json["nodes"].as_array().unwrap().len(), 3);
        assert_eq!(json["links"][0]["capacity"], 63.0);
        assert_eq!(json["graph"]["commodity"], "Gas");
        let dot = to_dot(&graphs[0]);
        assert!(dot.starts_with("graph \"Gas\" {"));
        assert!(dot.contains("v2 [label=\"2 (1000)\", shape=box];"));
        assert!(dot.contains("v0 -- v1 [label=\"63\"];"));
    }

    #[test]
    fn dot_quotes_commodity_names() {
        let mut graph = graphs().remove(0);
        graph.commodity = "2nd \"grid\" Gas".into();
        let dot = to_dot(&graph);
        assert!(dot.starts_with("graph \"2nd \\\"grid\\\" Gas\" {"), "{dot}");
    }
}
