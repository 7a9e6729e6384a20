//! Square street grids for synthetic studies.
//!
//! ```text
//! (6)══04══(7)══05══(8)
//!  ║        ║        ║
//!  7        9        11
//!  ║        ║        ║
//! (3)══02══(4)══03══(5)
//!  ║        ║        ║
//!  6        8        10
//!  ║        ║        ║
//! (0)══00══(1)══01══(2)
//! ```
//!
//! Vertices are numbered row by row from the bottom left; horizontal edges
//! come first (row by row), then vertical edges (column by column).

use crate::matching::match_vertices_and_edges;
use crate::projection::{destination, TransverseMercator};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rivus_core::{
    Edge, EdgeId, LineString, Point, RivusError, RivusResult, StreetNetwork, Vertex, VertexId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Bottom-left corner used when no origin is given, `(lat, lon)`.
pub const DEFAULT_ORIGIN_LATLON: (f64, f64) = (48.26739, 11.66842);

/// Upper bound of the noise radius relative to `dx`/`dy`.
pub const MAX_NOISE: f64 = 0.45;

/// Vertex tolerance (degrees) when matching generated edges geographically.
const GRID_MATCH_TOLERANCE: f64 = 1e-7;

/// How edge end points are assigned to vertex ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Matching {
    /// From the generation order (no geometry lookups).
    #[default]
    Generated,
    /// By locating vertices on the edge geometry.
    Geographic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSpec {
    /// WGS84 `(lat, lon)` of the bottom-left vertex
    pub origin_latlon: (f64, f64),
    pub num_edge_x: usize,
    /// Defaults to `num_edge_x` when unset or zero
    pub num_edge_y: Option<usize>,
    /// Horizontal edge length (m)
    pub dx: f64,
    /// Vertical edge length (m); defaults to `dx` when unset or zero
    pub dy: Option<f64>,
    /// Relative misplacement radius of every vertex, capped at [`MAX_NOISE`]
    pub noise_prop: f64,
    /// UTM zone to build the grid in; `None` walks great circles in WGS84
    pub epsg: Option<u32>,
    pub matching: Matching,
    /// Seed for the noise; `None` draws from entropy
    pub seed: Option<u64>,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            origin_latlon: DEFAULT_ORIGIN_LATLON,
            num_edge_x: 1,
            num_edge_y: None,
            dx: 100.0,
            dy: None,
            noise_prop: 0.0,
            epsg: None,
            matching: Matching::Generated,
            seed: None,
        }
    }
}

impl GridSpec {
    pub fn num_edges_y(&self) -> usize {
        match self.num_edge_y {
            Some(n) if n > 0 => n,
            _ => self.num_edge_x,
        }
    }

    pub fn dy_m(&self) -> f64 {
        match self.dy {
            Some(dy) if dy != 0.0 => dy,
            _ => self.dx,
        }
    }

    fn check(&self) -> RivusResult<()> {
        let (lat, lon) = self.origin_latlon;
        if !lat.is_finite() || !lon.is_finite() {
            return Err(RivusError::Validation(
                "origin_latlon has non-finite element(s)".into(),
            ));
        }
        if self.num_edge_x < 1 && self.num_edges_y() < 1 {
            return Err(RivusError::Validation(
                "both of the edge dimensions cannot be < 1".into(),
            ));
        }
        let dy = self.dy_m();
        if !(self.dx > 0.0 && dy > 0.0 && self.noise_prop >= 0.0)
            || !self.dx.is_finite()
            || !dy.is_finite()
            || !self.noise_prop.is_finite()
        {
            return Err(RivusError::Validation(format!(
                "dx ({}), dy ({}) must be positive and noise_prop ({}) non-negative",
                self.dx, dy, self.noise_prop
            )));
        }
        Ok(())
    }
}

/// Vertices and edges of a generated grid, in WGS84.
#[derive(Debug, Clone)]
pub struct SquareGrid {
    pub vertices: Vec<Vertex>,
    pub edges: Vec<Edge>,
    pub num_vert_x: usize,
    pub num_vert_y: usize,
}

impl SquareGrid {
    pub fn into_network(self) -> RivusResult<StreetNetwork> {
        StreetNetwork::from_parts(self.vertices, self.edges)
    }
}

pub fn create_square_grid(spec: &GridSpec) -> RivusResult<SquareGrid> {
    spec.check()?;
    let num_edge_y = spec.num_edges_y();
    let dy = spec.dy_m();
    let num_vert_x = spec.num_edge_x + 1;
    let num_vert_y = num_edge_y + 1;
    let noise = spec.noise_prop.min(MAX_NOISE);
    let (fuzz_x, fuzz_y) = (spec.dx * noise, dy * noise);
    let mut rng = match spec.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let offset = |rng: &mut StdRng| -> (f64, f64) {
        if noise > 0.0 {
            (
                fuzz_x * rng.gen_range(-1.0..=1.0),
                fuzz_y * rng.gen_range(-1.0..=1.0),
            )
        } else {
            (0.0, 0.0)
        }
    };

    let (lat, lon) = spec.origin_latlon;
    let mut points = Vec::with_capacity(num_vert_x * num_vert_y);
    match spec.epsg {
        None => {
            let mut row_start = Point::new(lon, lat);
            for _ in 0..num_vert_y {
                let mut p = row_start;
                for col in 0..num_vert_x {
                    if col > 0 {
                        p = destination(p, spec.dx, 90.0);
                    }
                    let (ox, oy) = offset(&mut rng);
                    points.push(destination(destination(p, ox, 90.0), oy, 0.0));
                }
                row_start = destination(row_start, dy, 0.0);
            }
        }
        Some(epsg) => {
            let utm = TransverseMercator::utm_from_epsg(epsg)?;
            let origin = utm.forward(Point::new(lon, lat));
            for row in 0..num_vert_y {
                for col in 0..num_vert_x {
                    let (ox, oy) = offset(&mut rng);
                    let xy = Point::new(
                        origin.x + col as f64 * spec.dx + ox,
                        origin.y + row as f64 * dy + oy,
                    );
                    points.push(utm.inverse(xy));
                }
            }
        }
    }

    let vertices: Vec<Vertex> = points
        .iter()
        .enumerate()
        .map(|(id, p)| Vertex::new(id, *p))
        .collect();

    let at = |row: usize, col: usize| row * num_vert_x + col;
    let mut pairs = Vec::new();
    for row in 0..num_vert_y {
        for col in 0..spec.num_edge_x {
            pairs.push((at(row, col), at(row, col + 1)));
        }
    }
    for col in 0..num_vert_x {
        for row in 0..num_edge_y {
            pairs.push((at(row, col), at(row + 1, col)));
        }
    }
    let mut edges: Vec<Edge> = pairs
        .into_iter()
        .enumerate()
        .map(|(id, (a, b))| Edge {
            id: EdgeId::new(id),
            vertex1: VertexId::new(a),
            vertex2: VertexId::new(b),
            geometry: LineString::new(vec![points[a], points[b]]),
            areas: BTreeMap::new(),
        })
        .collect();

    if spec.matching == Matching::Geographic {
        match_vertices_and_edges(&vertices, &mut edges, GRID_MATCH_TOLERANCE);
    }
    debug!(
        vertices = vertices.len(),
        edges = edges.len(),
        epsg = ?spec.epsg,
        "created square grid"
    );
    Ok(SquareGrid {
        vertices,
        edges,
        num_vert_x,
        num_vert_y,
    })
}

/// How candidate source vertices are chosen on a square grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceLogic {
    /// Lower-left quadrant; covers all symmetric positions.
    #[default]
    Symmetric,
    /// The four corners.
    Extrema,
}

/// Vertex ids worth testing as source positions on a `dim_x` x `dim_y`
/// vertex grid.
pub fn get_source_candidates(dim_x: usize, dim_y: usize, logic: SourceLogic) -> Vec<usize> {
    if dim_x == 0 || dim_y == 0 {
        return Vec::new();
    }
    match logic {
        SourceLogic::Symmetric => {
            let lim_x = dim_x.div_ceil(2);
            let lim_y = dim_y.div_ceil(2);
            (0..lim_y)
                .flat_map(|row| (0..lim_x).map(move |col| row * dim_x + col))
                .collect()
        }
        SourceLogic::Extrema => {
            let mut corners = vec![0, dim_x - 1, (dim_y - 1) * dim_x, dim_y * dim_x - 1];
            let mut seen = Vec::new();
            corners.retain(|c| {
                let fresh = !seen.contains(c);
                seen.push(*c);
                fresh
            });
            corners
        }
    }
}

/// Pairs every candidate with its mirror from the other end of the list.
pub fn opposite_pairs(candidates: &[usize]) -> Vec<(usize, usize)> {
    candidates
        .iter()
        .copied()
        .zip(candidates.iter().rev().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_grid_is_one_square() {
        let grid = create_square_grid(&GridSpec::default()).unwrap();
        assert_eq!(grid.vertices.len(), 4);
        assert_eq!(grid.edges.len(), 4);
        let keys: Vec<(usize, usize)> = grid
            .edges
            .iter()
            .map(|e| (e.vertex1.value(), e.vertex2.value()))
            .collect();
        assert_eq!(keys, vec![(0, 1), (2, 3), (0, 2), (1, 3)]);
        for edge in &grid.edges {
            assert!((edge.length_m() - 100.0).abs() < 0.5, "{}", edge.length_m());
        }
    }

    #[test]
    fn rectangular_grid_counts_and_order() {
        let spec = GridSpec {
            num_edge_x: 3,
            num_edge_y: Some(2),
            dx: 50.0,
            dy: Some(25.0),
            ..GridSpec::default()
        };
        let grid = create_square_grid(&spec).unwrap();
        assert_eq!(grid.vertices.len(), 12);
        assert_eq!(grid.edges.len(), 3 * 3 + 4 * 2);
        assert_eq!(grid.edges[6].key(), (VertexId::new(8), VertexId::new(9)));
        assert_eq!(grid.edges[9].key(), (VertexId::new(0), VertexId::new(4)));
        assert!((grid.edges[9].length_m() - 25.0).abs() < 0.5);
        grid.into_network().unwrap();
    }

    #[test]
    fn utm_grid_matches_latlon_grid() {
        let latlon = create_square_grid(&GridSpec::default()).unwrap();
        let utm = create_square_grid(&GridSpec {
            epsg: Some(32632),
            ..GridSpec::default()
        })
        .unwrap();
        assert!(utm.vertices[0]
            .geometry
            .almost_equals(&latlon.vertices[0].geometry, 6));
        let d = utm.vertices[3]
            .geometry
            .haversine_distance(&latlon.vertices[3].geometry);
        assert!(d < 10.0, "corner drift {d} m");
    }

    #[test]
    fn geographic_matching_agrees_with_generation() {
        let spec = GridSpec {
            num_edge_x: 2,
            ..GridSpec::default()
        };
        let generated = create_square_grid(&spec).unwrap();
        let matched = create_square_grid(&GridSpec {
            matching: Matching::Geographic,
            ..spec
        })
        .unwrap();
        let keys = |g: &SquareGrid| g.edges.iter().map(Edge::key).collect::<Vec<_>>();
        assert_eq!(keys(&generated), keys(&matched));
    }

    #[test]
    fn seeded_noise_is_reproducible_and_bounded() {
        let spec = GridSpec {
            num_edge_x: 2,
            noise_prop: 0.9,
            seed: Some(7),
            ..GridSpec::default()
        };
        let a = create_square_grid(&spec).unwrap();
        let b = create_square_grid(&spec).unwrap();
        assert_eq!(a.vertices, b.vertices);
        let exact = create_square_grid(&GridSpec {
            noise_prop: 0.0,
            ..spec
        })
        .unwrap();
        for (noisy, clean) in a.vertices.iter().zip(&exact.vertices) {
            let d = noisy.geometry.haversine_distance(&clean.geometry);
            assert!(d <= MAX_NOISE * 100.0 * 2f64.sqrt() + 0.5, "moved {d} m");
        }
    }

    #[test]
    fn invalid_specs_are_rejected() {
        let bad = [
            GridSpec {
                num_edge_x: 0,
                ..GridSpec::default()
            },
            GridSpec {
                dx: -1.0,
                ..GridSpec::default()
            },
            GridSpec {
                noise_prop: -0.1,
                ..GridSpec::default()
            },
            GridSpec {
                origin_latlon: (f64::NAN, 11.0),
                ..GridSpec::default()
            },
            GridSpec {
                epsg: Some(4326),
                ..GridSpec::default()
            },
        ];
        for spec in bad {
            assert!(create_square_grid(&spec).is_err(), "{spec:?}");
        }
    }

    #[test]
    fn source_candidates() {
        assert_eq!(
            get_source_candidates(6, 6, SourceLogic::Symmetric),
            vec![0, 1, 2, 6, 7, 8, 12, 13, 14]
        );
        assert_eq!(get_source_candidates(5, 5, SourceLogic::Symmetric).len(), 9);
        assert_eq!(get_source_candidates(3, 2, SourceLogic::Extrema), vec![0, 2, 3, 5]);
        assert_eq!(
            opposite_pairs(&[0, 2, 3, 5]),
            vec![(0, 5), (2, 3), (3, 2), (5, 0)]
        );
    }
}
