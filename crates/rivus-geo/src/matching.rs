//! Topology from geometry: which vertex sits on which edge, and which edge
//! serves which building.

use crate::snapping::{closest_object, project_point_to_object};
use rivus_core::{
    BoundingBox, Edge, EdgeId, Geometry, LineString, Point, RivusError, RivusResult, Vertex,
};
use tracing::warn;

/// Distance (coordinate units) within which a vertex counts as lying on an
/// imperfectly drawn edge.
pub const DEFAULT_MATCH_TOLERANCE: f64 = 0.001;

/// Sets `vertex1`/`vertex2` of every edge to the smallest and largest id of
/// the vertices lying within `tolerance` of its geometry.
///
/// Edges with fewer than two matching vertices are reported; an edge with no
/// match keeps its ids.
pub fn match_vertices_and_edges(vertices: &[Vertex], edges: &mut [Edge], tolerance: f64) {
    for edge in edges.iter_mut() {
        let mut ids: Vec<_> = vertices
            .iter()
            .filter(|v| edge.geometry.distance_to_point(&v.geometry) <= tolerance)
            .map(|v| v.id)
            .collect();
        ids.sort();
        ids.dedup();
        match (ids.first(), ids.last()) {
            (Some(&lo), Some(&hi)) => {
                if ids.len() == 1 {
                    warn!(edge = %edge.id, vertex = %lo, "edge has only 1 endpoint");
                }
                edge.vertex1 = lo;
                edge.vertex2 = hi;
            }
            _ => warn!(edge = %edge.id, "edge has no endpoints"),
        }
    }
}

/// Connector lines from building centroids to their nearest edge.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosestEdges {
    /// Centroid to nearest point on the nearest edge, one per polygon
    pub connectors: Vec<LineString>,
    /// Id of the nearest edge, one per polygon
    pub nearest: Vec<EdgeId>,
}

pub fn find_closest_edge(polygons: &[Geometry], edges: &[Edge]) -> RivusResult<ClosestEdges> {
    let lines: Vec<Geometry> = edges
        .iter()
        .map(|e| Geometry::LineString(e.geometry.clone()))
        .collect();
    let mut connectors = Vec::with_capacity(polygons.len());
    let mut nearest = Vec::with_capacity(polygons.len());
    for polygon in polygons {
        let centroid = polygon
            .centroid()
            .ok_or_else(|| RivusError::Geometry("polygon without coordinates".into()))?;
        let (line, _, index) = closest_object(&lines, &centroid)
            .ok_or_else(|| RivusError::Geometry("no edges to match buildings to".into()))?;
        let foot = project_point_to_object(&centroid, line)?;
        connectors.push(LineString::new(vec![centroid, foot]));
        nearest.push(edges[index].id);
    }
    Ok(ClosestEdges {
        connectors,
        nearest,
    })
}

/// Bounding box of a collection of geometries.
pub fn total_bounds<'a>(geometries: impl IntoIterator<Item = &'a Geometry>) -> Option<BoundingBox> {
    let mut points: Vec<Point> = Vec::new();
    for geometry in geometries {
        match geometry {
            Geometry::Point(p) => points.push(*p),
            Geometry::LineString(l) => points.extend(l.coords.iter().copied()),
            Geometry::Polygon(p) => points.extend(p.exterior.iter().copied()),
        }
    }
    BoundingBox::from_points(points.iter())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rivus_core::{Polygon, VertexId};
    use std::collections::BTreeMap;

    fn edge(id: usize, coords: &[(f64, f64)]) -> Edge {
        Edge {
            id: EdgeId::new(id),
            vertex1: VertexId::new(0),
            vertex2: VertexId::new(0),
            geometry: LineString::from_xy(coords),
            areas: BTreeMap::new(),
        }
    }

    #[test]
    fn ends_are_matched_with_min_max_ids() {
        let vertices = vec![
            Vertex::new(4, Point::new(1.0, 0.0)),
            Vertex::new(2, Point::new(0.0, 0.0)),
            Vertex::new(9, Point::new(5.0, 5.0)),
        ];
        let mut edges = vec![edge(0, &[(1.0, 0.0), (0.0005, 0.0)])];
        match_vertices_and_edges(&vertices, &mut edges, DEFAULT_MATCH_TOLERANCE);
        assert_eq!(edges[0].key(), (VertexId::new(2), VertexId::new(4)));
    }

    #[test]
    fn unmatched_edge_keeps_ids() {
        let vertices = vec![Vertex::new(1, Point::new(9.0, 9.0))];
        let mut edges = vec![edge(0, &[(0.0, 0.0), (1.0, 0.0)])];
        match_vertices_and_edges(&vertices, &mut edges, DEFAULT_MATCH_TOLERANCE);
        assert_eq!(edges[0].key(), (VertexId::new(0), VertexId::new(0)));
    }

    #[test]
    fn buildings_find_their_street() {
        let edges = vec![edge(10, &[(0.0, 0.0), (10.0, 0.0)]), edge(11, &[(0.0, 10.0), (10.0, 10.0)])];
        let house = Geometry::Polygon(Polygon::new(vec![
            Point::new(4.0, 7.0),
            Point::new(6.0, 7.0),
            Point::new(6.0, 9.0),
            Point::new(4.0, 9.0),
        ]));
        let closest = find_closest_edge(&[house], &edges).unwrap();
        assert_eq!(closest.nearest, vec![EdgeId::new(11)]);
        let connector = &closest.connectors[0];
        assert!(connector.end().unwrap().coincides(&Point::new(5.0, 10.0)));
    }

    #[test]
    fn bounds_cover_all_geometries() {
        let geoms = vec![
            Geometry::Point(Point::new(-1.0, 2.0)),
            Geometry::LineString(LineString::from_xy(&[(0.0, 0.0), (3.0, 4.0)])),
        ];
        let b = total_bounds(&geoms).unwrap();
        assert_eq!((b.min_x, b.min_y, b.max_x, b.max_y), (-1.0, 0.0, 3.0, 4.0));
        assert!(total_bounds(Vec::<Geometry>::new().iter()).is_none());
    }
}
