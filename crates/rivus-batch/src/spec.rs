use anyhow::{Context, Result};
use rivus_algo::{ModelOptions, SolverOptions, SweepRange};
use rivus_core::ParameterTarget;
use rivus_viz::Fig3dOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Where sources are placed on every generated grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSpec {
    /// Commodities initialised with capacity 0 on every vertex
    pub commodities: Vec<String>,
    /// Source capacity per commodity; pair layouts need exactly two entries,
    /// the first commodity goes to the first vertex of the pair
    pub capacities: BTreeMap<String, f64>,
    /// Every commodity at the same symmetric candidate vertex
    pub single: bool,
    /// Opposite pairs of the symmetric candidates
    pub symmetric_pairs: bool,
    /// Opposite corners of the grid
    pub corner_pairs: bool,
}

impl Default for SourceSpec {
    fn default() -> Self {
        Self {
            commodities: vec!["Elec".into(), "Gas".into(), "Heat".into()],
            capacities: BTreeMap::from([("Elec".into(), 160_000.0), ("Gas".into(), 500_000.0)]),
            single: false,
            symmetric_pairs: true,
            corner_pairs: false,
        }
    }
}

/// One dataset cell to sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepSpec {
    pub target: ParameterTarget,
    #[serde(default)]
    pub range: SweepRange,
}

/// A batch of runs over grid sizes, source layouts and parameter sweeps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSpec {
    pub name: String,
    /// Directory with the dataset CSV tables, relative to the spec file
    pub dataset: PathBuf,
    /// Horizontal edge lengths (m)
    pub street_lengths: Vec<f64>,
    /// Edges per grid side
    pub num_edges: Vec<usize>,
    /// Vertical edge length as a share of the horizontal one
    pub dy_ratios: Vec<f64>,
    pub origin_latlon: Option<(f64, f64)>,
    pub sources: SourceSpec,
    pub parameters: Vec<SweepSpec>,
    pub model: ModelOptions,
    pub solver: SolverOptions,
    /// Run database url; runs are not stored without it
    pub database: Option<String>,
    pub runner: String,
    /// Layers of the 3-D figure written per run; empty skips the figure
    pub plot_commodities: Vec<String>,
    pub plot: Fig3dOptions,
    /// Jobs solved in parallel, 0 uses every core
    pub threads: usize,
}

impl Default for BatchSpec {
    fn default() -> Self {
        Self {
            name: "runbunch".into(),
            dataset: PathBuf::from("data"),
            street_lengths: vec![50.0, 150.0, 250.0],
            num_edges: vec![5],
            dy_ratios: vec![1.0, 0.5],
            origin_latlon: None,
            sources: SourceSpec::default(),
            parameters: Vec::new(),
            model: ModelOptions::default(),
            solver: SolverOptions::default(),
            database: None,
            runner: "rivus".into(),
            plot_commodities: vec!["Gas".into(), "Heat".into(), "Elec".into()],
            plot: Fig3dOptions {
                linescale: 8.0,
                use_hubs: true,
                ..Fig3dOptions::default()
            },
            threads: 1,
        }
    }
}

/// Reads a YAML or JSON batch spec; a relative `dataset` is resolved
/// against the spec's directory.
pub fn load_batch_spec(path: &Path) -> Result<BatchSpec> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading batch spec '{}'", path.display()))?;
    let mut spec: BatchSpec = match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => {
            serde_json::from_str(&data).context("parsing batch spec json")?
        }
        _ => serde_yaml::from_str(&data).context("parsing batch spec yaml")?,
    };
    if spec.dataset.is_relative() {
        if let Some(parent) = path.parent() {
            spec.dataset = parent.join(&spec.dataset);
        }
    }
    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn yaml_spec_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("batch.yaml");
        fs::write(
            &path,
            r#"
name: sweep
dataset: input
street_lengths: [100]
parameters:
  - target: { table: commodity, name: Heat, column: cost-inv-fix }
    range: { lim_lo: 0.5, lim_up: 1.6, step: 0.5 }
solver:
  time_limit: 60
"#,
        )
        .unwrap();
        let spec = load_batch_spec(&path).unwrap();
        assert_eq!(spec.name, "sweep");
        assert_eq!(spec.dataset, dir.path().join("input"));
        assert_eq!(spec.num_edges, vec![5]);
        assert_eq!(spec.parameters[0].range.step, 0.5);
        assert_eq!(spec.parameters[0].range.zero_root, None);
        assert_eq!(spec.solver.time_limit, Some(60.0));
        assert_eq!(spec.solver.mip_gap, None);
        assert!(spec.plot.use_hubs);
    }

    #[test]
    fn json_spec() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("batch.json");
        fs::write(&path, r#"{"dataset": "/abs/data", "threads": 4}"#).unwrap();
        let spec = load_batch_spec(&path).unwrap();
        assert_eq!(spec.dataset, PathBuf::from("/abs/data"));
        assert_eq!(spec.threads, 4);
    }
}
