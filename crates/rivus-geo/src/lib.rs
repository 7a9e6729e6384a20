//! # rivus-geo: preparing street layers
//!
//! - [`snapping`] - cleaning hand-drawn or imported line layers
//! - [`grid`] - synthetic square grids and source candidates
//! - [`extend`] - source capacities and building areas for grids
//! - [`matching`] - vertex/edge matching and building-to-street assignment
//! - [`projection`] - WGS84 to transverse Mercator and back

pub mod extend;
pub mod grid;
pub mod matching;
pub mod projection;
pub mod snapping;

pub use extend::{
    extend_edge_data, vert_init_commodities, DistributionStrategy, SourceSetting,
    DEFAULT_AREA_INIT, DEFAULT_AREA_SORT,
};
pub use grid::{
    create_square_grid, get_source_candidates, opposite_pairs, GridSpec, Matching, SourceLogic,
    SquareGrid, DEFAULT_ORIGIN_LATLON, MAX_NOISE,
};
pub use matching::{
    find_closest_edge, match_vertices_and_edges, total_bounds, ClosestEdges,
    DEFAULT_MATCH_TOLERANCE,
};
pub use projection::{destination, TransverseMercator};
pub use snapping::{
    bend_towards, closest_object, endpoints_from_lines, find_isolated_endpoints, linemerge,
    nearest_neighbor_within, neighbors, one_linestring_per_intersection, pairs,
    project_point_to_line, project_point_to_object, prune_short_lines, snappy_endings,
    snapping_vertices_from_lines, vertices_from_lines,
};
