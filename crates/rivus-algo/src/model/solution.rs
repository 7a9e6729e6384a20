//! Solution values, keyed the same way as the model variables.

use crate::error::{ModelError, ModelResult};
use crate::model::catalog::{entity_info, EntityKind};
use rivus_core::VertexId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// `(Vertex1, Vertex2, commodity-or-hub, time)` and `(from, to, commodity, time)`
pub type EdgeTimeKey = (VertexId, VertexId, String, String);
/// `(Vertex1, Vertex2, commodity-or-hub)`
pub type EdgeItemKey = (VertexId, VertexId, String);
/// `(vertex, commodity-or-process, time)`
pub type VertexTimeKey = (VertexId, String, String);
/// `(vertex, process)`
pub type VertexItemKey = (VertexId, String);
/// `(vertex, process, commodity, time)`
pub type ProcessFlowKey = (VertexId, String, String, String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CostType {
    Inv,
    Fix,
    Var,
}

impl CostType {
    pub const ALL: [CostType; 3] = [CostType::Inv, CostType::Fix, CostType::Var];

    pub fn as_str(&self) -> &'static str {
        match self {
            CostType::Inv => "Inv",
            CostType::Fix => "Fix",
            CostType::Var => "Var",
        }
    }
}

impl fmt::Display for CostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per variable index. Instantiated with `good_lp::Variable` while
/// the model is built and with `f64` once it is solved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>"))]
pub struct EntityValues<T> {
    #[serde(with = "table")]
    pub supply: BTreeMap<EdgeTimeKey, T>,
    #[serde(with = "table")]
    pub flow_in: BTreeMap<EdgeTimeKey, T>,
    #[serde(with = "table")]
    pub flow_out: BTreeMap<EdgeTimeKey, T>,
    #[serde(with = "table")]
    pub arc_use: BTreeMap<EdgeTimeKey, T>,
    #[serde(with = "table")]
    pub edge_capacity: BTreeMap<EdgeItemKey, T>,
    #[serde(with = "table")]
    pub edge_built: BTreeMap<EdgeItemKey, T>,
    #[serde(with = "table")]
    pub source: BTreeMap<VertexTimeKey, T>,
    #[serde(with = "table")]
    pub hub_capacity: BTreeMap<EdgeItemKey, T>,
    #[serde(with = "table")]
    pub hub_activity: BTreeMap<EdgeTimeKey, T>,
    #[serde(with = "table")]
    pub process_capacity: BTreeMap<VertexItemKey, T>,
    #[serde(with = "table")]
    pub process_built: BTreeMap<VertexItemKey, T>,
    #[serde(with = "table")]
    pub throughput: BTreeMap<VertexTimeKey, T>,
    #[serde(with = "table")]
    pub process_input: BTreeMap<ProcessFlowKey, T>,
    #[serde(with = "table")]
    pub process_output: BTreeMap<ProcessFlowKey, T>,
    pub costs: BTreeMap<CostType, T>,
}

impl<T> Default for EntityValues<T> {
    fn default() -> Self {
        Self {
            supply: BTreeMap::new(),
            flow_in: BTreeMap::new(),
            flow_out: BTreeMap::new(),
            arc_use: BTreeMap::new(),
            edge_capacity: BTreeMap::new(),
            edge_built: BTreeMap::new(),
            source: BTreeMap::new(),
            hub_capacity: BTreeMap::new(),
            hub_activity: BTreeMap::new(),
            process_capacity: BTreeMap::new(),
            process_built: BTreeMap::new(),
            throughput: BTreeMap::new(),
            process_input: BTreeMap::new(),
            process_output: BTreeMap::new(),
            costs: BTreeMap::new(),
        }
    }
}

impl<T: Copy> EntityValues<T> {
    /// Applies `f` to every value, keeping the keys.
    pub fn map<U>(&self, mut f: impl FnMut(T) -> U) -> EntityValues<U> {
        fn each<K: Clone + Ord, T: Copy, U>(
            map: &BTreeMap<K, T>,
            f: &mut impl FnMut(T) -> U,
        ) -> BTreeMap<K, U> {
            map.iter().map(|(k, v)| (k.clone(), f(*v))).collect()
        }
        EntityValues {
            supply: each(&self.supply, &mut f),
            flow_in: each(&self.flow_in, &mut f),
            flow_out: each(&self.flow_out, &mut f),
            arc_use: each(&self.arc_use, &mut f),
            edge_capacity: each(&self.edge_capacity, &mut f),
            edge_built: each(&self.edge_built, &mut f),
            source: each(&self.source, &mut f),
            hub_capacity: each(&self.hub_capacity, &mut f),
            hub_activity: each(&self.hub_activity, &mut f),
            process_capacity: each(&self.process_capacity, &mut f),
            process_built: each(&self.process_built, &mut f),
            throughput: each(&self.throughput, &mut f),
            process_input: each(&self.process_input, &mut f),
            process_output: each(&self.process_output, &mut f),
            costs: each(&self.costs, &mut f),
        }
    }

    /// Number of indexed values over all entities.
    pub fn len(&self) -> usize {
        self.supply.len()
            + self.flow_in.len()
            + self.flow_out.len()
            + self.arc_use.len()
            + self.edge_capacity.len()
            + self.edge_built.len()
            + self.source.len()
            + self.hub_capacity.len()
            + self.hub_activity.len()
            + self.process_capacity.len()
            + self.process_built.len()
            + self.throughput.len()
            + self.process_input.len()
            + self.process_output.len()
            + self.costs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Values of a solved model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub objective: f64,
    pub values: EntityValues<f64>,
}

impl Solution {
    pub fn cost(&self, cost_type: CostType) -> f64 {
        self.values.costs.get(&cost_type).copied().unwrap_or(0.0)
    }

    pub fn total_cost(&self) -> f64 {
        CostType::ALL.iter().map(|c| self.cost(*c)).sum()
    }

    /// Rows of a variable entity as text labels and value.
    pub fn entity(&self, name: &str) -> ModelResult<EntityTable> {
        let info = entity_info(name).ok_or_else(|| ModelError::UnknownEntity(name.to_string()))?;
        if info.kind != EntityKind::Variable {
            return Err(ModelError::UnknownEntity(format!(
                "{name} is a {} and has no solution values",
                info.kind
            )));
        }
        let v = &self.values;
        let rows = match name {
            "supply" => rows(&v.supply),
            "flow_in" => rows(&v.flow_in),
            "flow_out" => rows(&v.flow_out),
            "arc_use" => rows(&v.arc_use),
            "edge_capacity" => rows(&v.edge_capacity),
            "edge_built" => rows(&v.edge_built),
            "source" => rows(&v.source),
            "hub_capacity" => rows(&v.hub_capacity),
            "hub_activity" => rows(&v.hub_activity),
            "process_capacity" => rows(&v.process_capacity),
            "process_built" => rows(&v.process_built),
            "throughput" => rows(&v.throughput),
            "process_input" => rows(&v.process_input),
            "process_output" => rows(&v.process_output),
            "costs" => v
                .costs
                .iter()
                .map(|(c, value)| (vec![c.to_string()], *value))
                .collect(),
            other => return Err(ModelError::UnknownEntity(other.to_string())),
        };
        Ok(EntityTable {
            name: info.name.to_string(),
            domain: info.domain.iter().map(|d| d.to_string()).collect(),
            rows,
        })
    }
}

/// A flattened entity: one label column per domain set plus the value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityTable {
    pub name: String,
    pub domain: Vec<String>,
    pub rows: Vec<(Vec<String>, f64)>,
}

impl EntityTable {
    pub fn value(&self, labels: &[&str]) -> Option<f64> {
        self.rows
            .iter()
            .find(|(key, _)| key.iter().map(String::as_str).eq(labels.iter().copied()))
            .map(|(_, v)| *v)
    }
}

/// Index tuples rendered as one label per domain set.
pub trait KeyLabels {
    fn labels(&self) -> Vec<String>;
}

impl KeyLabels for EdgeTimeKey {
    fn labels(&self) -> Vec<String> {
        vec![self.0.to_string(), self.1.to_string(), self.2.clone(), self.3.clone()]
    }
}

impl KeyLabels for EdgeItemKey {
    fn labels(&self) -> Vec<String> {
        vec![self.0.to_string(), self.1.to_string(), self.2.clone()]
    }
}

impl KeyLabels for VertexTimeKey {
    fn labels(&self) -> Vec<String> {
        vec![self.0.to_string(), self.1.clone(), self.2.clone()]
    }
}

impl KeyLabels for VertexItemKey {
    fn labels(&self) -> Vec<String> {
        vec![self.0.to_string(), self.1.clone()]
    }
}

impl KeyLabels for ProcessFlowKey {
    fn labels(&self) -> Vec<String> {
        vec![self.0.to_string(), self.1.clone(), self.2.clone(), self.3.clone()]
    }
}

fn rows<K: KeyLabels>(map: &BTreeMap<K, f64>) -> Vec<(Vec<String>, f64)> {
    map.iter().map(|(k, v)| (k.labels(), *v)).collect()
}

/// Tuple-keyed maps as JSON arrays of `[key, value]` pairs.
mod table {
    use serde::de::{Deserialize, Deserializer};
    use serde::ser::Serializer;
    use serde::Serialize;
    use std::collections::BTreeMap;

    pub fn serialize<K, V, S>(map: &BTreeMap<K, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        K: Serialize,
        V: Serialize,
        S: Serializer,
    {
        serializer.collect_seq(map.iter())
    }

    pub fn deserialize<'de, K, V, D>(deserializer: D) -> Result<BTreeMap<K, V>, D::Error>
    where
        K: Deserialize<'de> + Ord,
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        let pairs: Vec<(K, V)> = Vec::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}
