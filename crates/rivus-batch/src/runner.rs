use crate::job::{BatchJob, BatchJobRecord};
use crate::manifest::{write_batch_manifest, BatchManifest, MANIFEST_FILE};
use crate::spec::BatchSpec;
use anyhow::{Context, Result};
use chrono::Utc;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use rivus_algo::{
    constants, minimal_graph_analysis, save_result, solve, to_graphs, write_report,
    GraphAnalysis, ModelOptions, Problem, ResultArchive, Solution, SolveStatus, SolverOptions,
};
use rivus_db::{PhaseDurations, RunInit, RunOutcome, RunStatus, RunStore};
use rivus_geo::{create_square_grid, extend_edge_data, vert_init_commodities, DistributionStrategy};
use rivus_viz::{char_plot, fig3d, Fig3dOptions};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

pub struct BatchRunnerConfig {
    pub name: String,
    pub jobs: Vec<BatchJob>,
    pub output_root: PathBuf,
    /// Commodities every grid vertex gets a (zero) source entry for
    pub source_commodities: Vec<String>,
    pub model: ModelOptions,
    pub solver: SolverOptions,
    pub threads: usize,
    pub database: Option<String>,
    pub runner: String,
    pub plot_commodities: Vec<String>,
    pub plot: Fig3dOptions,
}

impl BatchRunnerConfig {
    pub fn from_spec(spec: &BatchSpec, jobs: Vec<BatchJob>, output_root: PathBuf) -> Self {
        Self {
            name: spec.name.clone(),
            jobs,
            output_root,
            source_commodities: spec.sources.commodities.clone(),
            model: spec.model,
            solver: spec.solver.clone(),
            threads: spec.threads,
            database: spec.database.clone(),
            runner: spec.runner.clone(),
            plot_commodities: spec.plot_commodities.clone(),
            plot: spec.plot,
        }
    }
}

pub struct BatchSummary {
    pub success: usize,
    pub failure: usize,
    pub manifest_path: PathBuf,
    pub jobs: Vec<BatchJobRecord>,
}

/// Database handle shared by the worker threads; each job blocks on its
/// own queries.
struct RunDatabase {
    runtime: Runtime,
    store: RunStore,
}

impl RunDatabase {
    fn open(url: &str) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("building tokio runtime for the run database")?;
        let store = runtime.block_on(async {
            let store = RunStore::connect(url).await?;
            store.init_schema().await?;
            anyhow::Ok(store)
        })?;
        Ok(Self { runtime, store })
    }
}

/// Maps a solver status onto the run table's status and outcome.
pub fn run_state(status: SolveStatus) -> (RunStatus, RunOutcome) {
    match status {
        SolveStatus::Optimal => (RunStatus::Run, RunOutcome::Optimum),
        SolveStatus::LimitReached => (RunStatus::Run, RunOutcome::OptimumNotReached),
        SolveStatus::Infeasible | SolveStatus::Error => (RunStatus::Error, RunOutcome::Error),
    }
}

pub fn run_batch(config: &BatchRunnerConfig) -> Result<BatchSummary> {
    fs::create_dir_all(&config.output_root).with_context(|| {
        format!(
            "creating batch output root '{}'",
            config.output_root.display()
        )
    })?;

    let database = config
        .database
        .as_deref()
        .map(RunDatabase::open)
        .transpose()?;

    let thread_count = if config.threads == 0 {
        num_cpus::get()
    } else {
        config.threads
    };
    let pool = ThreadPoolBuilder::new()
        .num_threads(thread_count)
        .build()
        .context("building Rayon thread pool for batch runs")?;
    info!(
        batch = %config.name,
        jobs = config.jobs.len(),
        threads = thread_count,
        "starting batch"
    );

    let job_records: Vec<BatchJobRecord> = pool.install(|| {
        config
            .jobs
            .par_iter()
            .map(|job| run_job(job, config, database.as_ref()))
            .collect()
    });

    let success = job_records
        .iter()
        .filter(|record| record.status == RunStatus::Run)
        .count();
    let failure = job_records.len() - success;

    let manifest = BatchManifest {
        created_at: Utc::now(),
        name: config.name.clone(),
        num_jobs: job_records.len(),
        success,
        failure,
        jobs: job_records.clone(),
    };
    let manifest_path = config.output_root.join(MANIFEST_FILE);
    write_batch_manifest(&manifest_path, &manifest)?;
    info!(success, failure, manifest = %manifest_path.display(), "batch finished");
    Ok(BatchSummary {
        success,
        failure,
        manifest_path,
        jobs: job_records,
    })
}

/// Elapsed seconds per phase, keyed like the manifest's `profiler`.
#[derive(Default)]
struct Profiler {
    timings: BTreeMap<String, f64>,
}

impl Profiler {
    fn time<T>(&mut self, phase: &str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let value = f();
        *self.timings.entry(phase.to_string()).or_insert(0.0) += start.elapsed().as_secs_f64();
        value
    }

    fn sum(&self, phases: &[&str]) -> Option<f64> {
        let values: Vec<f64> = phases
            .iter()
            .filter_map(|p| self.timings.get(*p).copied())
            .collect();
        (!values.is_empty()).then(|| values.iter().sum())
    }
}

/// Runs one job through grid generation, solve, analysis, archiving and
/// plotting. Failures after the solve are recorded but do not fail the run.
fn run_job(job: &BatchJob, config: &BatchRunnerConfig, db: Option<&RunDatabase>) -> BatchJobRecord {
    let mut record = BatchJobRecord {
        job_id: job.job_id.clone(),
        description: job.description.clone(),
        parameter: job.parameter.clone(),
        status: RunStatus::Prepared,
        outcome: RunOutcome::NotRun,
        objective: None,
        run_id: None,
        archive: None,
        errors: Vec::new(),
        profiler: BTreeMap::new(),
    };
    let mut profiler = Profiler::default();
    let job_dir = config.output_root.join(&job.job_id);
    info!(job = %job.job_id, description = %job.description, "running job");

    if let Some(db) = db {
        let init = RunInit {
            runner: config.runner.clone(),
            ..RunInit::default()
        };
        match db.runtime.block_on(db.store.init_run(&init)) {
            Ok(run_id) => record.run_id = Some(run_id),
            Err(err) => note_error(&mut record, "init run", err),
        }
    }

    let problem = profiler.time("model_creation", || build_problem(job, config, &job_dir));
    let problem = match problem {
        Ok(problem) => problem,
        Err(err) => {
            note_error(&mut record, "model creation", err);
            record.status = RunStatus::Error;
            record.outcome = RunOutcome::Error;
            finish(db, &mut record, &profiler);
            return record;
        }
    };

    let outcome = profiler.time("solve", || solve(&problem, &config.solver));
    let (status, run_outcome) = run_state(outcome.status);
    record.status = status;
    record.outcome = run_outcome;
    if outcome.status != SolveStatus::Optimal {
        warn!(
            job = %job.job_id,
            status = ?outcome.status,
            message = outcome.message.as_deref().unwrap_or(""),
            "solver finished without optimum"
        );
    }

    let archive_path = config
        .output_root
        .join("archives")
        .join(format!("scenario_{}.json", job.job_id));
    match save_result(&archive_path, &ResultArchive::new(&problem, &outcome)) {
        Ok(()) => record.archive = Some(archive_path.display().to_string()),
        Err(err) => note_error(&mut record, "archive", err),
    }

    if let Some(solution) = outcome.solution.as_ref().filter(|_| outcome.status.has_solution()) {
        record.objective = Some(solution.total_cost());
        post_process(job, config, db, &problem, solution, &job_dir, &mut record, &mut profiler);
    }

    finish(db, &mut record, &profiler);
    record
}

fn build_problem(job: &BatchJob, config: &BatchRunnerConfig, job_dir: &Path) -> Result<Problem> {
    let mut grid = create_square_grid(&job.grid)?;
    extend_edge_data(&mut grid.edges, DistributionStrategy::Equal, None, None)?;
    vert_init_commodities(&mut grid.vertices, &config.source_commodities, &job.sources)?;
    debug!(
        job = %job.job_id,
        "source layout\n{}",
        char_plot(&grid.vertices, grid.num_vert_x, false)
    );

    fs::create_dir_all(job_dir)
        .with_context(|| format!("creating job directory '{}'", job_dir.display()))?;
    rivus_io::write_vertices(&job_dir.join("vertex.geojson"), &grid.vertices)?;
    rivus_io::write_edges(&job_dir.join("edge.geojson"), &grid.edges)?;

    let network = grid.into_network()?;
    let problem = Problem::with_options(job.data.clone(), network, config.model)?;
    Ok(problem)
}

#[allow(clippy::too_many_arguments)]
fn post_process(
    job: &BatchJob,
    config: &BatchRunnerConfig,
    db: Option<&RunDatabase>,
    problem: &Problem,
    solution: &Solution,
    job_dir: &Path,
    record: &mut BatchJobRecord,
    profiler: &mut Profiler,
) {
    let analysis: Vec<GraphAnalysis> = profiler.time("all_graph_related", || {
        let graphs = to_graphs(problem, &constants(solution));
        minimal_graph_analysis(&graphs, true)
    });
    for result in &analysis {
        debug!(
            job = %job.job_id,
            commodity = %result.commodity,
            connected = result.is_connected,
            minimal = ?result.is_minimal,
            "graph analysis"
        );
    }

    if let Err(err) = profiler.time("report", || write_report(problem, solution, &job_dir.join("report"))) {
        note_error(record, "report", err);
    }

    if !config.plot_commodities.is_empty() {
        let plotted = profiler.time("3d_plot_prep", || -> Result<()> {
            let figure = fig3d(problem, solution, Some(&config.plot_commodities), &config.plot)?;
            let path = job_dir.join("fig3d.json");
            let json = serde_json::to_string(&figure).context("serializing 3-D figure")?;
            fs::write(&path, json)
                .with_context(|| format!("writing 3-D figure '{}'", path.display()))?;
            Ok(())
        });
        if let Err(err) = plotted {
            note_error(record, "3d plot", err);
        }
    }

    if let (Some(db), Some(run_id)) = (db, record.run_id) {
        let stored = profiler.time("store", || {
            db.runtime
                .block_on(db.store.store(run_id, problem, solution, &analysis))
        });
        if let Err(err) = stored {
            note_error(record, "store", err);
        }
    }
}

fn note_error(record: &mut BatchJobRecord, phase: &str, err: impl Into<anyhow::Error>) {
    let err = err.into();
    warn!(job = %record.job_id, phase, "job phase failed: {err:#}");
    record.errors.push(format!("{phase}: {err:#}"));
}

fn finish(db: Option<&RunDatabase>, record: &mut BatchJobRecord, profiler: &Profiler) {
    record.profiler = profiler.timings.clone();
    let (Some(db), Some(run_id)) = (db, record.run_id) else {
        return;
    };
    let durations = PhaseDurations {
        pre: profiler.sum(&["model_creation"]),
        solve: profiler.sum(&["solve"]),
        post: profiler.sum(&["all_graph_related", "report", "store"]),
        plot: profiler.sum(&["3d_plot_prep"]),
    };
    let finished =
        db.runtime
            .block_on(db.store.finish_run(run_id, record.status, record.outcome, &durations));
    if let Err(err) = finished {
        note_error(record, "finish run", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solver_status_maps_to_run_state() {
        assert_eq!(
            run_state(SolveStatus::Optimal),
            (RunStatus::Run, RunOutcome::Optimum)
        );
        assert_eq!(
            run_state(SolveStatus::LimitReached),
            (RunStatus::Run, RunOutcome::OptimumNotReached)
        );
        assert_eq!(
            run_state(SolveStatus::Infeasible),
            (RunStatus::Error, RunOutcome::Error)
        );
    }

    #[test]
    fn profiler_sums_known_phases() {
        let mut profiler = Profiler::default();
        profiler.time("solve", || ());
        assert!(profiler.sum(&["solve", "report"]).is_some());
        assert_eq!(profiler.sum(&["report"]), None);
    }
}
