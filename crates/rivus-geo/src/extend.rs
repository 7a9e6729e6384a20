//! Filling generated grids with source capacities and building areas.

use rivus_core::{Edge, RivusError, RivusResult, Vertex, VertexId};
use serde::{Deserialize, Serialize};

/// Building type assigned when no sorts are given.
pub const DEFAULT_AREA_SORT: &str = "residential";

/// Area (m²) assigned per sort when no values are given.
pub const DEFAULT_AREA_INIT: f64 = 1000.0;

/// Source capacity of one commodity at one vertex, e.g. `("Elec", 1, 2000.0)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSetting {
    pub commodity: String,
    pub vertex: usize,
    pub capacity: f64,
}

impl SourceSetting {
    pub fn new(commodity: impl Into<String>, vertex: usize, capacity: f64) -> Self {
        Self {
            commodity: commodity.into(),
            vertex,
            capacity,
        }
    }
}

/// Gives every vertex a zero source entry per commodity, then applies `sources`.
pub fn vert_init_commodities(
    vertices: &mut [Vertex],
    commodities: &[String],
    sources: &[SourceSetting],
) -> RivusResult<()> {
    for vertex in vertices.iter_mut() {
        for commodity in commodities {
            vertex.sources.insert(commodity.clone(), 0.0);
        }
    }
    for source in sources {
        let vertex = vertices
            .iter_mut()
            .find(|v| v.id == VertexId::new(source.vertex))
            .ok_or_else(|| {
                RivusError::Validation(format!(
                    "source {} references unknown vertex {}",
                    source.commodity, source.vertex
                ))
            })?;
        vertex
            .sources
            .insert(source.commodity.clone(), source.capacity);
    }
    Ok(())
}

/// How values are spread over the edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionStrategy {
    /// Every edge gets the same value.
    #[default]
    Equal,
}

/// Adds one area column per sort to every edge.
///
/// `sorts` defaults to `["residential"]`, `inits` to 1000 per sort.
pub fn extend_edge_data(
    edges: &mut [Edge],
    strategy: DistributionStrategy,
    sorts: Option<&[String]>,
    inits: Option<&[f64]>,
) -> RivusResult<()> {
    let sorts: Vec<String> = match sorts {
        Some(s) if !s.is_empty() => s.to_vec(),
        _ => vec![DEFAULT_AREA_SORT.to_string()],
    };
    let inits: Vec<f64> = match inits {
        Some(i) if !i.is_empty() => i.to_vec(),
        _ => vec![DEFAULT_AREA_INIT; sorts.len()],
    };
    if sorts.len() != inits.len() {
        return Err(RivusError::Validation(format!(
            "{} area sorts but {} initial values",
            sorts.len(),
            inits.len()
        )));
    }
    match strategy {
        DistributionStrategy::Equal => {
            for edge in edges.iter_mut() {
                for (sort, value) in sorts.iter().zip(&inits) {
                    edge.areas.insert(sort.clone(), *value);
                }
            }
        }
    }
    Ok(())
}
