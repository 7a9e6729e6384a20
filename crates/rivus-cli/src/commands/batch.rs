use std::path::Path;

use anyhow::Result;
use rivus_batch::{expand_jobs, load_batch_spec, run_batch, BatchRunnerConfig};
use rivus_cli::Settings;

pub fn handle(
    spec_path: &Path,
    out: &Path,
    threads: Option<usize>,
    database: Option<&str>,
    settings: &Settings,
) -> Result<()> {
    let mut spec = load_batch_spec(spec_path)?;
    if let Some(threads) = threads {
        spec.threads = threads;
    }
    if let Some(url) = database {
        spec.database = Some(url.to_string());
    } else if spec.database.is_none() {
        spec.database = settings.database.clone();
    }
    let data = rivus_io::read_dataset(&spec.dataset)?;
    let jobs = expand_jobs(&spec, &data)?;
    println!("Running {} job(s) of batch '{}'", jobs.len(), spec.name);

    let summary = run_batch(&BatchRunnerConfig::from_spec(&spec, jobs, out.to_path_buf()))?;
    println!(
        "Batch finished: {} succeeded, {} failed; manifest at {}",
        summary.success,
        summary.failure,
        summary.manifest_path.display()
    );
    Ok(())
}
