use crate::error::{RivusError, RivusResult};
use crate::geometry::{BoundingBox, LineString, Point};
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(usize);

impl VertexId {
    #[inline]
    pub fn new(value: usize) -> Self {
        VertexId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

impl EdgeId {
    #[inline]
    pub fn new(value: usize) -> Self {
        EdgeId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Undirected edge key `(Vertex1, Vertex2)` as stored in the edge layer.
pub type EdgeKey = (VertexId, VertexId);

/// Connection point of the street network; may host sources and processes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub id: VertexId,
    pub geometry: Point,
    /// Source capacity (kW) per commodity
    #[serde(default)]
    pub sources: BTreeMap<String, f64>,
}

impl Vertex {
    pub fn new(id: usize, geometry: Point) -> Self {
        Self {
            id: VertexId::new(id),
            geometry,
            sources: BTreeMap::new(),
        }
    }

    /// Source capacity for `commodity`; missing entries disable the source.
    pub fn source_capacity(&self, commodity: &str) -> f64 {
        self.sources.get(commodity).copied().unwrap_or(0.0)
    }
}

/// Street segment carrying demand (building areas) and hubs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub vertex1: VertexId,
    pub vertex2: VertexId,
    pub geometry: LineString,
    /// Building area (m²) per area type
    #[serde(default)]
    pub areas: BTreeMap<String, f64>,
}

impl Edge {
    pub fn key(&self) -> EdgeKey {
        (self.vertex1, self.vertex2)
    }

    pub fn area(&self, area_type: &str) -> f64 {
        self.areas.get(area_type).copied().unwrap_or(0.0)
    }

    /// Length in metres, assuming WGS84 coordinates.
    pub fn length_m(&self) -> f64 {
        self.geometry.geodesic_length()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct NetworkParts {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
}

/// Vertices and edges of a street layer as an undirected petgraph graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "NetworkParts", into = "NetworkParts")]
pub struct StreetNetwork {
    pub graph: UnGraph<Vertex, Edge>,
    index: HashMap<VertexId, NodeIndex>,
    edge_index: HashMap<EdgeKey, EdgeIndex>,
}

impl TryFrom<NetworkParts> for StreetNetwork {
    type Error = RivusError;

    fn try_from(parts: NetworkParts) -> Result<Self, Self::Error> {
        StreetNetwork::from_parts(parts.vertices, parts.edges)
    }
}

impl From<StreetNetwork> for NetworkParts {
    fn from(network: StreetNetwork) -> Self {
        NetworkParts {
            vertices: network.vertices().cloned().collect(),
            edges: network.edges().cloned().collect(),
        }
    }
}

impl StreetNetwork {
    /// Builds the graph, checking that every edge references known, distinct vertices.
    pub fn from_parts(vertices: Vec<Vertex>, edges: Vec<Edge>) -> RivusResult<Self> {
        let mut graph = UnGraph::with_capacity(vertices.len(), edges.len());
        let mut index = HashMap::with_capacity(vertices.len());
        let mut sorted = vertices;
        sorted.sort_by_key(|v| v.id);
        for vertex in sorted {
            let id = vertex.id;
            if index.contains_key(&id) {
                return Err(RivusError::Network(format!("duplicate vertex id {id}")));
            }
            let node = graph.add_node(vertex);
            index.insert(id, node);
        }
        let mut edge_index = HashMap::with_capacity(edges.len());
        for edge in edges {
            if edge.vertex1 == edge.vertex2 {
                return Err(RivusError::Network(format!(
                    "edge {} connects vertex {} to itself",
                    edge.id, edge.vertex1
                )));
            }
            let a = *index.get(&edge.vertex1).ok_or_else(|| {
                RivusError::Network(format!(
                    "edge {} references unknown vertex {}",
                    edge.id, edge.vertex1
                ))
            })?;
            let b = *index.get(&edge.vertex2).ok_or_else(|| {
                RivusError::Network(format!(
                    "edge {} references unknown vertex {}",
                    edge.id, edge.vertex2
                ))
            })?;
            let key = edge.key();
            if edge_index.contains_key(&key) || edge_index.contains_key(&(key.1, key.0)) {
                return Err(RivusError::Network(format!(
                    "duplicate edge between vertices {} and {}",
                    key.0, key.1
                )));
            }
            let idx = graph.add_edge(a, b, edge);
            edge_index.insert(key, idx);
        }
        Ok(Self {
            graph,
            index,
            edge_index,
        })
    }

    /// Vertices in ascending id order.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.graph.node_weights()
    }

    /// Edges in input order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.graph.edge_weights()
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.index.get(&id).map(|&n| &self.graph[n])
    }

    pub fn vertex_mut(&mut self, id: VertexId) -> Option<&mut Vertex> {
        let node = *self.index.get(&id)?;
        self.graph.node_weight_mut(node)
    }

    pub fn node_index(&self, id: VertexId) -> Option<NodeIndex> {
        self.index.get(&id).copied()
    }

    /// Edge for an undirected key in either orientation.
    pub fn edge(&self, key: EdgeKey) -> Option<&Edge> {
        self.edge_index
            .get(&key)
            .or_else(|| self.edge_index.get(&(key.1, key.0)))
            .map(|&e| &self.graph[e])
    }

    /// Neighbour vertex ids of `id`, sorted.
    pub fn neighbours(&self, id: VertexId) -> Vec<VertexId> {
        let Some(node) = self.node_index(id) else {
            return Vec::new();
        };
        let mut out: Vec<VertexId> = self
            .graph
            .edges(node)
            .map(|e| {
                let other = if e.source() == node { e.target() } else { e.source() };
                self.graph[other].id
            })
            .collect();
        out.sort();
        out
    }

    /// Bounding box of all vertex and edge coordinates.
    pub fn bounds(&self) -> Option<BoundingBox> {
        let points = self
            .vertices()
            .map(|v| &v.geometry)
            .chain(self.edges().flat_map(|e| e.geometry.coords.iter()));
        BoundingBox::from_points(points)
    }

    /// Commodity names appearing as source columns on any vertex.
    pub fn source_commodities(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .vertices()
            .flat_map(|v| v.sources.keys().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Two vertical edges joined at vertex 1: 0 -- 1 -- 2.
    pub(crate) fn path_network() -> StreetNetwork {
        let vertices = vec![
            Vertex::new(0, Point::new(11.0, 48.0)),
            Vertex::new(1, Point::new(11.0, 48.001)),
            Vertex::new(2, Point::new(11.0, 48.002)),
        ];
        let edges = vec![
            Edge {
                id: EdgeId::new(0),
                vertex1: VertexId::new(0),
                vertex2: VertexId::new(1),
                geometry: LineString::from_xy(&[(11.0, 48.0), (11.0, 48.001)]),
                areas: BTreeMap::from([("residential".to_string(), 1000.0)]),
            },
            Edge {
                id: EdgeId::new(1),
                vertex1: VertexId::new(1),
                vertex2: VertexId::new(2),
                geometry: LineString::from_xy(&[(11.0, 48.001), (11.0, 48.002)]),
                areas: BTreeMap::new(),
            },
        ];
        StreetNetwork::from_parts(vertices, edges).unwrap()
    }

    #[test]
    fn lookup_by_key_in_both_orientations() {
        let network = path_network();
        let key = (VertexId::new(1), VertexId::new(0));
        assert_eq!(network.edge(key).unwrap().id, EdgeId::new(0));
        assert_eq!(network.neighbours(VertexId::new(1)), vec![VertexId::new(0), VertexId::new(2)]);
    }

    #[test]
    fn unknown_vertex_is_rejected() {
        let vertices = vec![Vertex::new(0, Point::new(0.0, 0.0))];
        let edges = vec![Edge {
            id: EdgeId::new(0),
            vertex1: VertexId::new(0),
            vertex2: VertexId::new(7),
            geometry: LineString::from_xy(&[(0.0, 0.0), (1.0, 0.0)]),
            areas: BTreeMap::new(),
        }];
        let err = StreetNetwork::from_parts(vertices, edges).unwrap_err();
        assert!(err.to_string().contains("unknown vertex 7"));
    }

    #[test]
    fn edge_length_is_in_metres() {
        let network = path_network();
        let length = network.edges().next().unwrap().length_m();
        assert!((length - 111.2).abs() < 0.5, "got {length}");
    }

    #[test]
    fn serde_rebuilds_the_graph() {
        let network = path_network();
        let json = serde_json::to_string(&network).unwrap();
        let back: StreetNetwork = serde_json::from_str(&json).unwrap();
        assert_eq!(back.edge_count(), 2);
        assert!(back.edge((VertexId::new(2), VertexId::new(1))).is_some());
    }
}
