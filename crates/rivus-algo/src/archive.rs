//! JSON result archives and their re-analysis across scenarios.

use crate::error::ModelResult;
use crate::model::{CostType, ModelOptions, Problem, Solution, SolveOutcome, SolveStatus, SolverKind};
use crate::results::constants;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rivus_core::{DataSet, StreetNetwork};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const ARCHIVE_EXTENSION: &str = "json";
pub const ARCHIVE_FORMAT_VERSION: u32 = 1;
const SCENARIO_PREFIX: &str = "scenario_";

/// Inputs and solution of one model run; enough to rebuild the [`Problem`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultArchive {
    pub format_version: u32,
    pub created: DateTime<Utc>,
    pub data: DataSet,
    pub network: StreetNetwork,
    pub options: ModelOptions,
    pub solver: SolverKind,
    pub status: SolveStatus,
    pub duration_secs: f64,
    pub solution: Option<Solution>,
}

impl ResultArchive {
    pub fn new(problem: &Problem, outcome: &SolveOutcome) -> Self {
        Self {
            format_version: ARCHIVE_FORMAT_VERSION,
            created: Utc::now(),
            data: problem.data.clone(),
            network: problem.network.clone(),
            options: problem.options,
            solver: outcome.solver,
            status: outcome.status,
            duration_secs: outcome.duration.as_secs_f64(),
            solution: outcome.solution.clone(),
        }
    }

    /// Rebuilds the problem the archived solution belongs to.
    pub fn problem(&self) -> ModelResult<Problem> {
        Problem::with_options(self.data.clone(), self.network.clone(), self.options)
    }
}

pub fn save_result(path: &Path, archive: &ResultArchive) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string(archive).context("serializing result archive")?;
    fs::write(path, json).with_context(|| format!("writing result archive {}", path.display()))?;
    debug!(path = %path.display(), "saved result archive");
    Ok(())
}

pub fn load_result(path: &Path) -> Result<ResultArchive> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading result archive {}", path.display()))?;
    let archive: ResultArchive = serde_json::from_str(&json)
        .with_context(|| format!("parsing result archive {}", path.display()))?;
    if archive.format_version != ARCHIVE_FORMAT_VERSION {
        warn!(
            path = %path.display(),
            version = archive.format_version,
            "archive format version differs from {ARCHIVE_FORMAT_VERSION}"
        );
    }
    Ok(archive)
}

/// Scenario name of an archive file: file stem without a `scenario_` prefix.
pub fn scenario_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    stem.strip_prefix(SCENARIO_PREFIX)
        .map(str::to_string)
        .unwrap_or(stem)
}

/// Totals of one archived scenario.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScenarioSummary {
    /// Summed peak demand per commodity
    pub demand: BTreeMap<String, f64>,
    pub costs: BTreeMap<CostType, f64>,
    /// Summed edge capacity per commodity
    pub edge_capacity: BTreeMap<String, f64>,
    /// Summed hub capacity per hub process
    pub hub_capacity: BTreeMap<String, f64>,
    /// Summed process capacity per process
    pub process_capacity: BTreeMap<String, f64>,
}

/// Summaries keyed by scenario name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Reanalysis {
    pub scenarios: BTreeMap<String, ScenarioSummary>,
}

/// Summarises every archive with a solution in `dir`.
pub fn reanalyse(dir: &Path) -> Result<Reanalysis> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("listing {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == ARCHIVE_EXTENSION))
        .collect();
    paths.sort();

    let mut result = Reanalysis::default();
    for path in paths {
        let archive = match load_result(&path) {
            Ok(archive) => archive,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping unreadable archive");
                continue;
            }
        };
        let Some(solution) = &archive.solution else {
            warn!(path = %path.display(), "skipping archive without solution");
            continue;
        };
        let problem = archive
            .problem()
            .with_context(|| format!("rebuilding problem of {}", path.display()))?;
        let constants = constants(solution);
        result.scenarios.insert(
            scenario_name(&path),
            ScenarioSummary {
                demand: problem.total_peak(),
                costs: constants.costs.clone(),
                edge_capacity: constants.edge_capacity.totals(),
                hub_capacity: constants.hub_capacity.totals(),
                process_capacity: constants.process_capacity.totals(),
            },
        );
    }
    info!(dir = %dir.display(), scenarios = result.scenarios.len(), "reanalysed archives");
    Ok(result)
}

/// Writes one CSV per quantity with a row per item and a column per scenario.
pub fn write_reanalysis(reanalysis: &Reanalysis, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let tables: [(&str, fn(&ScenarioSummary) -> BTreeMap<String, f64>); 5] = [
        ("demand.csv", |s| s.demand.clone()),
        ("costs.csv", |s| {
            s.costs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
        }),
        ("edge_capacity.csv", |s| s.edge_capacity.clone()),
        ("hub_capacity.csv", |s| s.hub_capacity.clone()),
        ("process_capacity.csv", |s| s.process_capacity.clone()),
    ];

    let mut written = Vec::new();
    for (file, extract) in tables {
        let columns: Vec<(&String, BTreeMap<String, f64>)> = reanalysis
            .scenarios
            .iter()
            .map(|(name, summary)| (name, extract(summary)))
            .collect();
        let items: BTreeSet<&String> = columns.iter().flat_map(|(_, m)| m.keys()).collect();

        let path = dir.join(file);
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("creating CSV writer for {}", path.display()))?;
        let header: Vec<&str> = std::iter::once("item")
            .chain(columns.iter().map(|(name, _)| name.as_str()))
            .collect();
        writer.write_record(&header)?;
        for item in items {
            let record: Vec<String> = std::iter::once(item.clone())
                .chain(
                    columns
                        .iter()
                        .map(|(_, m)| m.get(item).copied().unwrap_or(0.0).to_string()),
                )
                .collect();
            writer.write_record(&record)?;
        }
        writer.flush().context("flushing CSV writer")?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{solve, SolverOptions};
    use crate::test_utils::{chain_network, heat_dataset};
    use tempfile::tempdir;

    fn solved() -> (Problem, SolveOutcome) {
        let problem = Problem::new(heat_dataset(), chain_network()).unwrap();
        let options = SolverOptions {
            time_limit: None,
            mip_gap: None,
            ..SolverOptions::default()
        };
        let outcome = solve(&problem, &options);
        (problem, outcome)
    }

    #[test]
    fn scenario_prefix_is_stripped() {
        assert_eq!(scenario_name(Path::new("out/scenario_base.json")), "base");
        assert_eq!(scenario_name(Path::new("out/other.json")), "other");
    }

    #[test]
    fn archive_restores_problem_and_solution() {
        let (problem, outcome) = solved();
        let dir = tempdir().unwrap();
        let path = dir.path().join("scenario_base.json");
        save_result(&path, &ResultArchive::new(&problem, &outcome)).unwrap();

        let archive = load_result(&path).unwrap();
        assert_eq!(archive.status, SolveStatus::Optimal);
        assert_eq!(archive.solution, outcome.solution);
        let rebuilt = archive.problem().unwrap();
        assert_eq!(rebuilt.hubs, problem.hubs);
        assert_eq!(rebuilt.peak, problem.peak);
    }

    #[test]
    fn reanalyse_collects_every_scenario() {
        let (problem, outcome) = solved();
        let dir = tempdir().unwrap();
        let archive = ResultArchive::new(&problem, &outcome);
        save_result(&dir.path().join("scenario_a.json"), &archive).unwrap();
        save_result(&dir.path().join("scenario_b.json"), &archive).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let result = reanalyse(dir.path()).unwrap();
        assert_eq!(result.scenarios.len(), 2);
        let a = &result.scenarios["a"];
        assert!((a.demand["Heat"] - 50.0).abs() < 1e-9);
        assert_eq!(a, &result.scenarios["b"]);

        let out = tempdir().unwrap();
        let files = write_reanalysis(&result, out.path()).unwrap();
        assert_eq!(files.len(), 5);
        let demand = fs::read_to_string(out.path().join("demand.csv")).unwrap();
        assert!(demand.starts_with("item,a,b"));
        assert!(demand.contains("Heat,50,50"));
    }
}
