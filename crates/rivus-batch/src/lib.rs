//! # rivus-batch: parameter studies on synthetic grids
//!
//! A [`BatchSpec`] (YAML or JSON) names grid sizes, source layouts and
//! parameter sweeps. [`expand_jobs`] turns it into one [`BatchJob`] per
//! combination and [`run_batch`] solves them on a Rayon pool. Each run
//! leaves a JSON archive, a CSV report and a 3-D figure under the output
//! root, optionally a row set in the run database, and a line in
//! `batch_manifest.json`.

pub mod job;
pub mod manifest;
pub mod runner;
pub mod spec;

pub use job::{expand_jobs, source_setups, BatchJob, BatchJobRecord};
pub use manifest::{load_batch_manifest, write_batch_manifest, BatchManifest, MANIFEST_FILE};
pub use runner::{run_batch, run_state, BatchRunnerConfig, BatchSummary};
pub use spec::{load_batch_spec, BatchSpec, SourceSpec, SweepSpec};

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Loads a batch spec and its dataset, expands and runs every job.
pub fn run_spec(spec_path: &Path, output_root: PathBuf) -> Result<BatchSummary> {
    let spec = load_batch_spec(spec_path)?;
    let data = rivus_io::read_dataset(&spec.dataset)?;
    let jobs = expand_jobs(&spec, &data)?;
    run_batch(&BatchRunnerConfig::from_spec(&spec, jobs, output_root))
}
