use assert_cmd::Command;
use predicates::prelude::*;
use rivus_algo::test_utils::heat_dataset;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn rivus(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("rivus").unwrap();
    cmd.current_dir(dir).env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_subcommands() {
    let dir = tempdir().unwrap();
    rivus(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("grid"))
        .stdout(predicate::str::contains("reanalyse"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn malformed_source_is_rejected() {
    let dir = tempdir().unwrap();
    rivus(dir.path())
        .args(["grid", "--out-dir", "net", "--source", "Gas:0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("COMMODITY:VERTEX:CAPACITY"));
}

#[test]
fn grid_solve_and_postprocess() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    rivus_io::write_dataset(&root.join("data"), &heat_dataset()).unwrap();

    rivus(root)
        .args([
            "grid",
            "--num-edge-x",
            "1",
            "--dx",
            "100",
            "--commodities",
            "Gas",
            "--source",
            "Gas:0:1000",
            "--out-dir",
            "net",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 4 vertices"));
    assert!(root.join("net").join("edge.geojson").exists());

    rivus(root)
        .args([
            "solve",
            "--data",
            "data",
            "--vertex",
            "net/vertex.geojson",
            "--edge",
            "net/edge.geojson",
            "--out",
            "results",
            "--name",
            "base",
            "--time-limit",
            "60",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total cost"));
    let archive = root.join("results").join("scenario_base.json");
    assert!(archive.exists());
    assert!(root.join("results").join("base").join("report").is_dir());

    rivus(root)
        .args(["report", "--archive", "results/scenario_base.json", "--out", "report2"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".csv"));

    rivus(root)
        .args([
            "graph",
            "--archive",
            "results/scenario_base.json",
            "--out",
            "graphs",
            "--spanning",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("COMMODITY"));

    rivus(root)
        .args([
            "plot",
            "map",
            "--archive",
            "results/scenario_base.json",
            "--commodity",
            "Heat",
            "--mode",
            "demand",
            "--out",
            "figs/heat.svg",
        ])
        .assert()
        .success();
    let svg = fs::read_to_string(root.join("figs").join("heat.svg")).unwrap();
    assert!(svg.starts_with("<svg"));

    rivus(root)
        .args([
            "plot",
            "fig3d",
            "--archive",
            "results/scenario_base.json",
            "--commodities",
            "Gas,Heat",
            "--out",
            "figs/fig3d.json",
        ])
        .assert()
        .success();
    assert!(root.join("figs").join("fig3d.json").exists());

    rivus(root)
        .args(["reanalyse", "--dir", "results", "--out", "compare"])
        .assert()
        .success()
        .stdout(predicate::str::contains("base"));
    assert!(root.join("compare").join("costs.csv").exists());
}

#[test]
fn settings_come_from_file_and_environment() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("rivus.toml"),
        "runner = \"nightly\"\n\n[solver]\ntime_limit = 30.0\n",
    )
    .unwrap();
    rivus(dir.path())
        .arg("config")
        .env("RIVUS_SOLVER__MIP_GAP", "0.01")
        .assert()
        .success()
        .stdout(predicate::str::contains("runner = \"nightly\""))
        .stdout(predicate::str::contains("time_limit = 30.0"))
        .stdout(predicate::str::contains("mip_gap = 0.01"));
}

#[test]
fn db_init_creates_the_database() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("runs.db");
    let url = format!("sqlite://{}", db.display());
    rivus(dir.path())
        .args(["db", "init", "--url", &url])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialised run database"));
    assert!(db.exists());

    rivus(dir.path())
        .args(["db", "show", "7", "--url", &url])
        .assert()
        .failure()
        .stderr(predicate::str::contains("run 7 not found"));
}

#[test]
fn db_without_url_fails() {
    let dir = tempdir().unwrap();
    rivus(dir.path())
        .args(["db", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no database url"));
}

#[test]
fn completions_for_bash() {
    let dir = tempdir().unwrap();
    rivus(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rivus"));
}
