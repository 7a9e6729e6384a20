use rivus_algo::test_utils::heat_dataset;
use rivus_batch::{
    expand_jobs, load_batch_manifest, run_batch, run_spec, BatchRunnerConfig, BatchSpec,
};
use rivus_db::{RunOutcome, RunStatus};
use std::fs;
use tempfile::tempdir;

const SPEC: &str = r#"
name: small
dataset: data
street_lengths: [100]
num_edges: [1]
dy_ratios: [1]
sources:
  commodities: [Gas]
  capacities: { Gas: 1000 }
  single: true
  symmetric_pairs: false
plot_commodities: [Gas, Heat]
solver:
  time_limit: 60
"#;

#[test]
fn spec_runs_end_to_end() {
    let dir = tempdir().unwrap();
    rivus_io::write_dataset(&dir.path().join("data"), &heat_dataset()).unwrap();
    let db = dir.path().join("runs.db");
    let spec = format!("{SPEC}database: \"sqlite://{}\"\n", db.display());
    let spec_path = dir.path().join("batch.yaml");
    fs::write(&spec_path, spec).unwrap();

    let out = dir.path().join("out");
    let summary = run_spec(&spec_path, out.clone()).unwrap();
    assert_eq!(summary.success, 1, "{:?}", summary.jobs[0].errors);
    assert_eq!(summary.failure, 0);

    let record = &summary.jobs[0];
    assert_eq!(record.job_id, "0000");
    assert_ne!(record.outcome, RunOutcome::Error);
    assert!(record.errors.is_empty(), "{:?}", record.errors);
    assert!(record.objective.unwrap() > 0.0);
    assert_eq!(record.run_id, Some(1));
    for phase in ["model_creation", "solve", "all_graph_related", "3d_plot_prep", "store"] {
        assert!(record.profiler.contains_key(phase), "missing {phase}");
    }

    assert!(out.join("archives").join("scenario_0000.json").exists());
    assert!(out.join("0000").join("report").is_dir());
    assert!(out.join("0000").join("vertex.geojson").exists());
    let figure: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("0000").join("fig3d.json")).unwrap())
            .unwrap();
    assert!(figure["data"].as_array().is_some_and(|d| !d.is_empty()));

    let manifest = load_batch_manifest(&summary.manifest_path).unwrap();
    assert_eq!(manifest.name, "small");
    assert_eq!(manifest.num_jobs, 1);
    assert!(db.exists());
}

#[test]
fn invalid_dataset_fails_the_job_only() {
    let mut data = heat_dataset();
    data.time.clear();
    let spec = BatchSpec {
        street_lengths: vec![100.0],
        num_edges: vec![1],
        dy_ratios: vec![1.0],
        ..BatchSpec::default()
    };
    let jobs = expand_jobs(&spec, &data).unwrap();
    let dir = tempdir().unwrap();
    let config = BatchRunnerConfig::from_spec(&spec, jobs, dir.path().to_path_buf());

    let summary = run_batch(&config).unwrap();
    assert_eq!(summary.success, 0);
    assert_eq!(summary.failure, 1);
    let record = &summary.jobs[0];
    assert_eq!(record.status, RunStatus::Error);
    assert_eq!(record.outcome, RunOutcome::Error);
    assert!(record.errors[0].starts_with("model creation"));
    assert!(record.archive.is_none());
    assert!(summary.manifest_path.exists());
}
