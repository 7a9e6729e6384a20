use crate::layers::Building;
use anyhow::{Context, Result};
use rivus_core::{Edge, EdgeId, Geometry};
use rivus_geo::{find_closest_edge, ClosestEdges};
use std::collections::BTreeMap;
use tracing::info;

/// Sums building floor areas by nearest edge and building type into the
/// edge area columns. Edges without buildings of a type get 0 for it.
///
/// Returns the centroid-to-street connectors for inspection.
pub fn aggregate_building_areas(buildings: &[Building], edges: &mut [Edge]) -> Result<ClosestEdges> {
    let footprints: Vec<Geometry> = buildings.iter().map(|b| b.geometry.clone()).collect();
    let closest = find_closest_edge(&footprints, edges).context("assigning buildings to edges")?;

    let mut totals: BTreeMap<(EdgeId, &str), f64> = BTreeMap::new();
    for (building, edge) in buildings.iter().zip(&closest.nearest) {
        *totals.entry((*edge, building.kind.as_str())).or_default() += building.total_area;
    }

    let kinds: Vec<&str> = {
        let mut kinds: Vec<&str> = buildings.iter().map(|b| b.kind.as_str()).collect();
        kinds.sort_unstable();
        kinds.dedup();
        kinds
    };
    for edge in edges.iter_mut() {
        for kind in &kinds {
            let area = totals.get(&(edge.id, *kind)).copied().unwrap_or(0.0);
            edge.areas.insert((*kind).to_string(), area);
        }
    }
    info!(
        buildings = buildings.len(),
        edges = edges.len(),
        types = kinds.len(),
        "aggregated building areas"
    );
    Ok(closest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rivus_core::{LineString, Point, Polygon, VertexId};

    fn square(x: f64, y: f64) -> Geometry {
        Geometry::Polygon(Polygon::new(vec![
            Point::new(x, y),
            Point::new(x + 1.0, y),
            Point::new(x + 1.0, y + 1.0),
            Point::new(x, y + 1.0),
        ]))
    }

    #[test]
    fn areas_are_summed_per_edge_and_type() {
        let mut edges = vec![
            Edge {
                id: EdgeId::new(0),
                vertex1: VertexId::new(0),
                vertex2: VertexId::new(1),
                geometry: LineString::from_xy(&[(0.0, 0.0), (10.0, 0.0)]),
                areas: BTreeMap::new(),
            },
            Edge {
                id: EdgeId::new(1),
                vertex1: VertexId::new(1),
                vertex2: VertexId::new(2),
                geometry: LineString::from_xy(&[(0.0, 20.0), (10.0, 20.0)]),
                areas: BTreeMap::new(),
            },
        ];
        let buildings = vec![
            Building { geometry: square(2.0, 1.0), kind: "residential".into(), total_area: 100.0 },
            Building { geometry: square(5.0, 2.0), kind: "residential".into(), total_area: 50.0 },
            Building { geometry: square(5.0, 18.0), kind: "commercial".into(), total_area: 70.0 },
        ];
        let closest = aggregate_building_areas(&buildings, &mut edges).unwrap();
        assert_eq!(closest.connectors.len(), 3);
        assert_eq!(edges[0].area("residential"), 150.0);
        assert_eq!(edges[0].areas.get("commercial"), Some(&0.0));
        assert_eq!(edges[1].area("commercial"), 70.0);
    }
}
