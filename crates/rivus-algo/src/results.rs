//! Post-processing of a solved model into capacity and timeseries tables.
//!
//! Values are rounded to whole kW/EUR and rows that are zero everywhere are
//! dropped, so the tables only list what the optimum actually builds or uses.

use crate::model::{CostType, Problem, Solution};
use anyhow::{Context, Result};
use rivus_core::{EdgeKey, VertexId};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const COSTS_FILE: &str = "costs.csv";
pub const EDGE_CAPACITY_FILE: &str = "edge_capacity.csv";
pub const HUB_CAPACITY_FILE: &str = "hub_capacity.csv";
pub const PROCESS_CAPACITY_FILE: &str = "process_capacity.csv";
pub const SOURCE_FILE: &str = "source.csv";
pub const FLOWS_FILE: &str = "flows.csv";
pub const HUBS_FILE: &str = "hubs.csv";
pub const PROCESS_FILE: &str = "process.csv";
pub const PROCESS_IO_FILE: &str = "process_io.csv";

fn value_of<K: Ord>(map: &BTreeMap<K, f64>, key: &K) -> f64 {
    map.get(key).copied().unwrap_or(0.0)
}

fn round(value: f64) -> f64 {
    // adding 0.0 turns -0.0 into 0.0
    value.round() + 0.0
}

/// The rounded value, if it is still positive.
fn rounded_positive(value: f64) -> Option<f64> {
    let rounded = round(value);
    (rounded > 0.0).then_some(rounded)
}

/// Values that stay positive after rounding, pivoted into one column per
/// item, missing cells as 0.
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityTable<K> {
    pub columns: Vec<String>,
    pub rows: BTreeMap<K, Vec<f64>>,
}

impl<K: Ord + Clone> CapacityTable<K> {
    fn pivot<'a>(values: impl Iterator<Item = (K, &'a str, f64)>) -> Self {
        let positive: Vec<(K, &str, f64)> = values
            .filter_map(|(k, c, v)| rounded_positive(v).map(|v| (k, c, v)))
            .collect();
        let columns: Vec<String> = positive
            .iter()
            .map(|(_, c, _)| c.to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let mut rows: BTreeMap<K, Vec<f64>> = BTreeMap::new();
        for (key, column, value) in positive {
            let idx = columns.iter().position(|c| c == column).unwrap_or(0);
            rows.entry(key).or_insert_with(|| vec![0.0; columns.len()])[idx] = value;
        }
        Self { columns, rows }
    }

    pub fn get(&self, row: &K, column: &str) -> f64 {
        let Some(idx) = self.columns.iter().position(|c| c == column) else {
            return 0.0;
        };
        self.rows.get(row).map_or(0.0, |values| values[idx])
    }

    /// Non-zero cells of one column.
    pub fn column<'s>(&'s self, column: &str) -> Vec<(&'s K, f64)> {
        let Some(idx) = self.columns.iter().position(|c| c == column) else {
            return Vec::new();
        };
        self.rows
            .iter()
            .map(|(k, values)| (k, values[idx]))
            .filter(|(_, v)| *v > 0.0)
            .collect()
    }

    /// Column sums.
    pub fn totals(&self) -> BTreeMap<String, f64> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, c)| (c.clone(), self.rows.values().map(|v| v[idx]).sum()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Time-independent results.
#[derive(Debug, Clone, PartialEq)]
pub struct Constants {
    pub costs: BTreeMap<CostType, f64>,
    /// Transport capacity per edge and commodity
    pub edge_capacity: CapacityTable<EdgeKey>,
    /// Hub capacity per edge and hub process
    pub hub_capacity: CapacityTable<EdgeKey>,
    /// Process capacity per vertex and process
    pub process_capacity: CapacityTable<VertexId>,
}

pub fn constants(solution: &Solution) -> Constants {
    let v = &solution.values;
    Constants {
        costs: CostType::ALL
            .iter()
            .map(|c| (*c, round(solution.cost(*c))))
            .collect(),
        edge_capacity: CapacityTable::pivot(
            v.edge_capacity
                .iter()
                .map(|((a, b, co), x)| ((*a, *b), co.as_str(), *x)),
        ),
        hub_capacity: CapacityTable::pivot(
            v.hub_capacity
                .iter()
                .map(|((a, b, h), x)| ((*a, *b), h.as_str(), *x)),
        ),
        process_capacity: CapacityTable::pivot(
            v.process_capacity
                .iter()
                .map(|((vertex, p), x)| (*vertex, p.as_str(), *x)),
        ),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRow {
    pub vertex: VertexId,
    pub commodity: String,
    pub time: String,
    pub value: f64,
}

/// Arc flows of one commodity; `supply` is reported on the row whose
/// orientation matches the stored edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowRow {
    pub from: VertexId,
    pub to: VertexId,
    pub commodity: String,
    pub time: String,
    pub flow_in: f64,
    pub flow_out: f64,
    pub arc_use: f64,
    pub supply: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HubRow {
    #[serde(rename = "Vertex1")]
    pub vertex1: VertexId,
    #[serde(rename = "Vertex2")]
    pub vertex2: VertexId,
    pub hub: String,
    pub time: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessIoRow {
    pub vertex: VertexId,
    pub process: String,
    pub commodity: String,
    pub time: String,
    pub input: f64,
    pub output: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThroughputRow {
    pub vertex: VertexId,
    pub process: String,
    pub time: String,
    pub value: f64,
}

/// Time-dependent results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeseries {
    pub source: Vec<SourceRow>,
    pub flows: Vec<FlowRow>,
    pub hubs: Vec<HubRow>,
    pub process_io: Vec<ProcessIoRow>,
    pub throughput: Vec<ThroughputRow>,
}

pub fn timeseries(solution: &Solution) -> Timeseries {
    let v = &solution.values;

    let source = v
        .source
        .iter()
        .filter_map(|((vertex, co, t), x)| {
            rounded_positive(*x).map(|value| SourceRow {
                vertex: *vertex,
                commodity: co.clone(),
                time: t.clone(),
                value,
            })
        })
        .collect();

    let flow_keys: BTreeSet<_> = v.flow_in.keys().chain(v.supply.keys()).collect();
    let flows = flow_keys
        .into_iter()
        .filter_map(|key| {
            let (from, to, co, t) = key;
            let row = FlowRow {
                from: *from,
                to: *to,
                commodity: co.clone(),
                time: t.clone(),
                flow_in: round(value_of(&v.flow_in, key)),
                flow_out: round(value_of(&v.flow_out, key)),
                arc_use: round(value_of(&v.arc_use, key)),
                supply: round(value_of(&v.supply, key)),
            };
            let sum = row.flow_in + row.flow_out + row.arc_use + row.supply;
            (sum > 0.0).then_some(row)
        })
        .collect();

    let hubs = v
        .hub_activity
        .iter()
        .filter_map(|((a, b, h, t), x)| {
            rounded_positive(*x).map(|value| HubRow {
                vertex1: *a,
                vertex2: *b,
                hub: h.clone(),
                time: t.clone(),
                value,
            })
        })
        .collect();

    let io_keys: BTreeSet<_> = v.process_input.keys().chain(v.process_output.keys()).collect();
    let process_io = io_keys
        .into_iter()
        .filter_map(|key| {
            let input = round(value_of(&v.process_input, key));
            let output = round(value_of(&v.process_output, key));
            let (vertex, process, co, t) = key;
            (input + output > 0.0).then(|| ProcessIoRow {
                vertex: *vertex,
                process: process.clone(),
                commodity: co.clone(),
                time: t.clone(),
                input,
                output,
            })
        })
        .collect();

    let throughput = v
        .throughput
        .iter()
        .filter_map(|((vertex, process, t), x)| {
            rounded_positive(*x).map(|value| ThroughputRow {
                vertex: *vertex,
                process: process.clone(),
                time: t.clone(),
                value,
            })
        })
        .collect();

    Timeseries {
        source,
        flows,
        hubs,
        process_io,
        throughput,
    }
}

/// Writes every constants and timeseries table as CSV into `dir`.
pub fn write_report(problem: &Problem, solution: &Solution, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("creating report directory {}", dir.display()))?;
    let constants = constants(solution);
    let series = timeseries(solution);
    let mut written = Vec::new();

    let path = dir.join(COSTS_FILE);
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("creating CSV writer for {}", path.display()))?;
    writer.write_record(["cost_type", "value"])?;
    for (cost_type, value) in &constants.costs {
        writer.write_record([cost_type.to_string(), value.to_string()])?;
    }
    writer.flush().context("flushing CSV writer")?;
    written.push(path);

    written.push(write_pivot(
        &dir.join(EDGE_CAPACITY_FILE),
        &["Vertex1", "Vertex2"],
        &constants.edge_capacity,
        |(a, b)| vec![a.to_string(), b.to_string()],
    )?);
    written.push(write_pivot(
        &dir.join(HUB_CAPACITY_FILE),
        &["Vertex1", "Vertex2"],
        &constants.hub_capacity,
        |(a, b)| vec![a.to_string(), b.to_string()],
    )?);
    written.push(write_pivot(
        &dir.join(PROCESS_CAPACITY_FILE),
        &["Vertex"],
        &constants.process_capacity,
        |v| vec![v.to_string()],
    )?);

    written.push(write_rows(&dir.join(SOURCE_FILE), &series.source)?);
    written.push(write_rows(&dir.join(FLOWS_FILE), &series.flows)?);
    written.push(write_rows(&dir.join(HUBS_FILE), &series.hubs)?);
    written.push(write_rows(&dir.join(PROCESS_FILE), &series.throughput)?);
    written.push(write_rows(&dir.join(PROCESS_IO_FILE), &series.process_io)?);

    info!(
        dir = %dir.display(),
        files = written.len(),
        edges = problem.network.edge_count(),
        "wrote report"
    );
    Ok(written)
}

fn write_pivot<K: Ord + Clone>(
    path: &Path,
    index: &[&str],
    table: &CapacityTable<K>,
    labels: impl Fn(&K) -> Vec<String>,
) -> Result<PathBuf> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating CSV writer for {}", path.display()))?;
    let header: Vec<String> = index
        .iter()
        .map(|s| s.to_string())
        .chain(table.columns.iter().cloned())
        .collect();
    writer.write_record(&header)?;
    for (key, values) in &table.rows {
        let record: Vec<String> = labels(key)
            .into_iter()
            .chain(values.iter().map(|v| v.to_string()))
            .collect();
        writer
            .write_record(&record)
            .with_context(|| format!("writing row to {}", path.display()))?;
    }
    writer.flush().context("flushing CSV writer")?;
    Ok(path.to_path_buf())
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<PathBuf> {
    rivus_io::write_table(path, rows)?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityValues, Solution};

    fn v(id: usize) -> VertexId {
        VertexId::new(id)
    }

    fn solution() -> Solution {
        let mut values = EntityValues::default();
        values.edge_capacity.insert((v(0), v(1), "Heat".into()), 62.4);
        values.edge_capacity.insert((v(0), v(1), "Gas".into()), 0.0);
        values.edge_capacity.insert((v(1), v(2), "Gas".into()), 70.6);
        values.edge_capacity.insert((v(1), v(2), "Heat".into()), -1e-12);
        values.process_capacity.insert((v(2), "Boiler".into()), 0.0);
        values.hub_capacity.insert((v(1), v(2), "Domestic boiler".into()), 0.3);
        values.flow_in.insert((v(1), v(0), "Heat".into(), "1".into()), 62.4);
        values.flow_in.insert((v(0), v(1), "Heat".into(), "1".into()), 0.0);
        values.supply.insert((v(0), v(1), "Heat".into(), "1".into()), 50.0);
        values.supply.insert((v(1), v(2), "Heat".into(), "1".into()), 0.0);
        values.throughput.insert((v(2), "Boiler".into(), "1".into()), 0.3);
        values.costs.insert(CostType::Inv, 1000.4);
        values.costs.insert(CostType::Fix, 50.02);
        values.costs.insert(CostType::Var, 0.0);
        Solution {
            objective: 1050.42,
            values,
        }
    }

    #[test]
    fn constants_drop_zero_rows_and_round() {
        let c = constants(&solution());
        assert_eq!(c.costs[&CostType::Inv], 1000.0);
        assert_eq!(c.edge_capacity.columns, vec!["Gas".to_string(), "Heat".to_string()]);
        assert_eq!(c.edge_capacity.get(&(v(0), v(1)), "Heat"), 62.0);
        assert_eq!(c.edge_capacity.get(&(v(0), v(1)), "Gas"), 0.0);
        assert_eq!(c.edge_capacity.get(&(v(1), v(2)), "Gas"), 71.0);
        assert!(c.process_capacity.is_empty());
        // 0.3 passes the solver tolerance but rounds to nothing
        assert!(c.hub_capacity.is_empty());
        assert!(c.hub_capacity.columns.is_empty());
        assert_eq!(c.edge_capacity.totals()["Gas"], 71.0);
    }

    #[test]
    fn timeseries_keeps_used_rows_only() {
        let ts = timeseries(&solution());
        assert_eq!(ts.flows.len(), 2);
        let forward = ts.flows.iter().find(|f| f.from == v(0)).unwrap();
        assert_eq!(forward.supply, 50.0);
        assert_eq!(forward.flow_in, 0.0);
        let backward = ts.flows.iter().find(|f| f.from == v(1)).unwrap();
        assert_eq!(backward.flow_in, 62.0);
        // 0.3 rounds to zero throughput
        assert!(ts.throughput.is_empty());
        assert!(ts.source.is_empty());
    }

    #[test]
    fn report_writes_one_file_per_table() {
        use crate::test_utils::{chain_network, heat_dataset};
        let problem = Problem::new(heat_dataset(), chain_network()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let files = write_report(&problem, &solution(), dir.path()).unwrap();
        assert_eq!(files.len(), 9);
        let pmax = fs::read_to_string(dir.path().join(EDGE_CAPACITY_FILE)).unwrap();
        assert!(pmax.starts_with("Vertex1,Vertex2,Gas,Heat"));
        assert!(pmax.contains("0,1,0,62"));
        let costs = fs::read_to_string(dir.path().join(COSTS_FILE)).unwrap();
        assert!(costs.contains("Inv,1000"));
    }
}
