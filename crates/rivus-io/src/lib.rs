//! # rivus-io: reading and writing model inputs
//!
//! - [`dataset`] - the five CSV tables of a [`rivus_core::DataSet`]
//! - [`layers`] - GeoJSON vertex, edge, line and building layers
//! - [`buildings`] - building areas aggregated onto their nearest street

pub mod buildings;
pub mod dataset;
pub mod layers;

pub use buildings::aggregate_building_areas;
pub use dataset::{read_dataset, read_table, write_dataset, write_table};
pub use layers::{
    from_geometry, read_buildings, read_edges, read_lines, read_network, read_vertices,
    to_geometry, write_edges, write_lines, write_vertices, Building,
};
