//! Model inputs and the sets and parameters derived from them.

use crate::error::{ModelError, ModelResult};
use rivus_core::{DataSet, Direction, Edge, EdgeKey, RivusError, StreetNetwork, VertexId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Share of the investment costs charged as fixed costs.
pub const DEFAULT_FIX_COST_SHARE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOptions {
    pub fix_cost_share: f64,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            fix_cost_share: DEFAULT_FIX_COST_SHARE,
        }
    }
}

/// Directed arc `(from, to)`; every edge yields both orientations.
pub type ArcKey = (VertexId, VertexId);

/// A dataset on a street network, with every set the formulation iterates.
///
/// Hubs are processes that can sit inside edges: no fixed investment costs,
/// no minimum capacity and exactly one input commodity with ratio 1. They
/// remain ordinary processes as well and may also be built at vertices.
#[derive(Debug, Clone)]
pub struct Problem {
    pub data: DataSet,
    pub network: StreetNetwork,
    pub options: ModelOptions,
    /// Input ratio per `(process, commodity)`
    pub r_in: BTreeMap<(String, String), f64>,
    /// Output ratio per `(process, commodity)`
    pub r_out: BTreeMap<(String, String), f64>,
    pub hubs: Vec<String>,
    /// Peak demand (kW) per `(edge, commodity)` for every demand commodity
    pub peak: BTreeMap<(EdgeKey, String), f64>,
    pub co_demand: Vec<String>,
    pub co_transportable: Vec<String>,
    pub co_source: Vec<String>,
    pub arcs: Vec<ArcKey>,
    pub neighbours: BTreeMap<VertexId, Vec<VertexId>>,
    /// Edge length in metres
    pub lengths: BTreeMap<EdgeKey, f64>,
}

impl Problem {
    pub fn new(data: DataSet, network: StreetNetwork) -> ModelResult<Self> {
        Self::with_options(data, network, ModelOptions::default())
    }

    pub fn with_options(
        data: DataSet,
        network: StreetNetwork,
        options: ModelOptions,
    ) -> ModelResult<Self> {
        data.validate()?;
        if data.time.is_empty() {
            return Err(RivusError::Validation("dataset has no time steps".into()).into());
        }
        if network.vertex_count() == 0 {
            return Err(RivusError::Network("street network has no vertices".into()).into());
        }
        if !(0.0..=1.0).contains(&options.fix_cost_share) {
            return Err(ModelError::Input(RivusError::Config(format!(
                "fix_cost_share must lie in [0, 1], got {}",
                options.fix_cost_share
            ))));
        }

        let mut r_in = BTreeMap::new();
        let mut r_out = BTreeMap::new();
        for pc in &data.process_commodities {
            let key = (pc.process.clone(), pc.commodity.clone());
            match pc.direction {
                Direction::In => r_in.insert(key, pc.ratio),
                Direction::Out => r_out.insert(key, pc.ratio),
            };
        }

        let hubs = data
            .processes
            .iter()
            .filter(|p| p.cost_inv_fix == 0.0 && p.cap_min == 0.0)
            .filter(|p| {
                let inputs: Vec<f64> = r_in
                    .iter()
                    .filter(|((process, _), _)| process == &p.name)
                    .map(|(_, ratio)| *ratio)
                    .collect();
                inputs.len() == 1 && inputs[0] == 1.0
            })
            .map(|p| p.name.clone())
            .collect();

        let co_demand = in_table_order(&data, data.area_demands.iter().map(|d| &d.commodity));
        let co_transportable = data
            .commodities
            .iter()
            .filter(|c| c.is_transportable())
            .map(|c| c.name.clone())
            .collect();
        let source_columns = network.source_commodities();
        let co_source = in_table_order(&data, source_columns.iter());

        let peak_per_area = data.peak_table();
        let area_types = data.area_types();
        let mut peak = BTreeMap::new();
        let mut lengths = BTreeMap::new();
        let mut arcs = Vec::with_capacity(network.edge_count() * 2);
        let mut neighbours: BTreeMap<VertexId, Vec<VertexId>> =
            network.vertices().map(|v| (v.id, Vec::new())).collect();
        for edge in network.edges() {
            let key = edge.key();
            for commodity in &co_demand {
                peak.insert(
                    (key, commodity.clone()),
                    edge_peak(edge, commodity, &area_types, &peak_per_area),
                );
            }
            lengths.insert(key, edge.length_m());
            let (v1, v2) = key;
            arcs.push((v1, v2));
            arcs.push((v2, v1));
            neighbours.entry(v1).or_default().push(v2);
            neighbours.entry(v2).or_default().push(v1);
        }

        Ok(Self {
            data,
            network,
            options,
            r_in,
            r_out,
            hubs,
            peak,
            co_demand,
            co_transportable,
            co_source,
            arcs,
            neighbours,
            lengths,
        })
    }

    /// Edge key for an arc in either orientation.
    pub fn edge_of_arc(&self, (i, j): ArcKey) -> EdgeKey {
        if self.lengths.contains_key(&(i, j)) {
            (i, j)
        } else {
            (j, i)
        }
    }

    pub fn edges(&self) -> impl Iterator<Item = EdgeKey> + '_ {
        self.network.edges().map(Edge::key)
    }

    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.network.vertices().map(|v| v.id)
    }

    pub fn is_hub(&self, process: &str) -> bool {
        self.hubs.iter().any(|h| h == process)
    }

    pub fn is_transportable(&self, commodity: &str) -> bool {
        self.co_transportable.iter().any(|c| c == commodity)
    }

    pub fn is_source(&self, commodity: &str) -> bool {
        self.co_source.iter().any(|c| c == commodity)
    }

    pub fn peak(&self, edge: EdgeKey, commodity: &str) -> f64 {
        self.peak
            .get(&(edge, commodity.to_string()))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn length(&self, edge: EdgeKey) -> f64 {
        self.lengths.get(&edge).copied().unwrap_or(0.0)
    }

    /// `(process, commodity, ratio)` inputs of every process.
    pub fn inputs(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.r_in
            .iter()
            .map(|((p, c), r)| (p.as_str(), c.as_str(), *r))
    }

    pub fn outputs(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.r_out
            .iter()
            .map(|((p, c), r)| (p.as_str(), c.as_str(), *r))
    }

    /// Total peak demand per commodity over all edges.
    pub fn total_peak(&self) -> BTreeMap<String, f64> {
        let mut totals = BTreeMap::new();
        for ((_, commodity), value) in &self.peak {
            *totals.entry(commodity.clone()).or_insert(0.0) += value;
        }
        totals
    }
}

fn edge_peak(
    edge: &Edge,
    commodity: &str,
    area_types: &[String],
    peak_per_area: &BTreeMap<(String, String), f64>,
) -> f64 {
    area_types
        .iter()
        .filter_map(|area| {
            peak_per_area
                .get(&(area.clone(), commodity.to_string()))
                .map(|peak| edge.area(area) * peak)
        })
        .sum()
}

/// Commodity names from `names` that the commodity table knows, in table order.
fn in_table_order<'a>(data: &DataSet, names: impl Iterator<Item = &'a String>) -> Vec<String> {
    let wanted: BTreeSet<&String> = names.collect();
    data.commodities
        .iter()
        .filter(|c| wanted.contains(&c.name))
        .map(|c| c.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{chain_network, heat_dataset};

    #[test]
    fn derives_sets_from_inputs() {
        let problem = Problem::new(heat_dataset(), chain_network()).unwrap();
        assert_eq!(problem.hubs, vec!["Domestic boiler".to_string()]);
        assert_eq!(problem.co_demand, vec!["Heat".to_string()]);
        assert_eq!(problem.co_transportable, vec!["Gas".to_string(), "Heat".to_string()]);
        assert_eq!(problem.co_source, vec!["Gas".to_string()]);
        assert_eq!(problem.arcs.len(), 4);
        assert_eq!(problem.neighbours[&VertexId::new(1)].len(), 2);
        assert_eq!(problem.r_out[&("Boiler".to_string(), "Heat".to_string())], 0.9);
    }

    #[test]
    fn peak_multiplies_area_by_specific_demand() {
        let problem = Problem::new(heat_dataset(), chain_network()).unwrap();
        let first = (VertexId::new(0), VertexId::new(1));
        let second = (VertexId::new(1), VertexId::new(2));
        assert!((problem.peak(first, "Heat") - 50.0).abs() < 1e-9);
        assert_eq!(problem.peak(second, "Heat"), 0.0);
        assert!((problem.total_peak()["Heat"] - 50.0).abs() < 1e-9);
    }

    #[test]
    fn arcs_map_back_to_their_edge() {
        let problem = Problem::new(heat_dataset(), chain_network()).unwrap();
        let edge = (VertexId::new(0), VertexId::new(1));
        assert_eq!(problem.edge_of_arc((VertexId::new(1), VertexId::new(0))), edge);
        assert_eq!(problem.edge_of_arc(edge), edge);
        assert!(problem.length(edge) > 100.0);
    }

    #[test]
    fn rejects_datasets_without_time_steps() {
        let mut data = heat_dataset();
        data.time.clear();
        assert!(Problem::new(data, chain_network()).is_err());
    }

    #[test]
    fn rejects_out_of_range_fix_cost_share() {
        let options = ModelOptions { fix_cost_share: 1.5 };
        let err = Problem::with_options(heat_dataset(), chain_network(), options).unwrap_err();
        assert!(err.to_string().contains("fix_cost_share"));
    }
}
