//! # rivus-core: data model for multi-commodity street networks
//!
//! A rivus problem combines two kinds of input:
//! - **Tables** ([`DataSet`]): commodities, conversion processes with their
//!   input/output ratios, time steps and peak demand per building area.
//! - **Geometry** ([`StreetNetwork`]): vertices (connection points that may
//!   host sources and processes) and edges (street segments that carry
//!   building demand, transport capacity and hubs).
//!
//! The street network is an undirected petgraph graph; edges are addressed by
//! their `(Vertex1, Vertex2)` key throughout the model.
//!
//! ## Modules
//!
//! - [`data`] - input tables and parameter addressing
//! - [`geometry`] - points, lines, polygons, bounding boxes
//! - [`network`] - vertices, edges and the street graph
//! - [`error`] - [`RivusError`] and [`RivusResult`]

pub mod data;
pub mod error;
pub mod geometry;
pub mod network;

pub use data::{
    AreaDemand, Commodity, DataSet, Direction, ParameterTarget, Process, ProcessCommodity,
    TimeStep,
};
pub use error::{RivusError, RivusResult};
pub use geometry::{BoundingBox, Geometry, LineString, Point, PointDistance, Polygon};
pub use network::{Edge, EdgeId, EdgeKey, StreetNetwork, Vertex, VertexId};
pub use petgraph::graph::NodeIndex;
