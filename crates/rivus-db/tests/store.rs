use rivus_algo::model::{CostType, EntityValues};
use rivus_algo::test_utils::{chain_network, heat_dataset};
use rivus_algo::{minimal_graph_analysis, results::constants, to_graphs, Problem, Solution};
use rivus_core::VertexId;
use rivus_db::{PhaseDurations, ResultTable, RunInit, RunOutcome, RunStatus, RunStore};
use tempfile::tempdir;

fn solved() -> (Problem, Solution) {
    let problem = Problem::new(heat_dataset(), chain_network()).unwrap();
    let v = VertexId::new;
    let mut values = EntityValues::default();
    values.edge_capacity.insert((v(0), v(1), "Gas".into()), 70.0);
    values.edge_capacity.insert((v(1), v(2), "Gas".into()), 70.0);
    values.process_capacity.insert((v(0), "Boiler".into()), 56.0);
    values.source.insert((v(2), "Gas".into(), "1".into()), 70.0);
    values.costs.insert(CostType::Inv, 1000.0);
    values.costs.insert(CostType::Fix, 50.0);
    values.costs.insert(CostType::Var, 30.0);
    (
        problem,
        Solution {
            objective: 1080.0,
            values,
        },
    )
}

async fn store() -> (RunStore, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("runs.db").display());
    let store = RunStore::connect(&url).await.unwrap();
    store.init_schema().await.unwrap();
    (store, dir)
}

#[tokio::test]
async fn run_lifecycle() {
    let (store, _dir) = store().await;
    let init = RunInit {
        runner: "tester".into(),
        start_ts: Some("2017-06-01 08:00:00".into()),
        ..RunInit::default()
    };
    let run_id = store.init_run(&init).await.unwrap();
    let record = store.fetch_run(run_id).await.unwrap().unwrap();
    assert_eq!(record.runner, "tester");
    assert_eq!(record.start_ts, "2017-06-01 08:00:00");
    assert_eq!(record.status, "prepared");
    assert_eq!(record.outcome, "not_run");

    let durations = PhaseDurations {
        pre: Some(0.5),
        solve: Some(2.0),
        ..PhaseDurations::default()
    };
    store
        .finish_run(run_id, RunStatus::Run, RunOutcome::Optimum, &durations)
        .await
        .unwrap();
    let record = store.fetch_run(run_id).await.unwrap().unwrap();
    assert_eq!(record.outcome, "optimum");
    assert_eq!(record.solve_duration, Some(2.0));
    assert_eq!(record.plot_duration, None);
    assert!(record.end_ts.is_some());

    assert!(store.fetch_run(run_id + 1).await.unwrap().is_none());
    assert!(store
        .finish_run(run_id + 1, RunStatus::Error, RunOutcome::Error, &durations)
        .await
        .is_err());
}

#[tokio::test]
async fn results_are_stored_per_run() {
    let (store, _dir) = store().await;
    let (problem, solution) = solved();
    let analysis = minimal_graph_analysis(&to_graphs(&problem, &constants(&solution)), true);

    let first = store.init_run(&RunInit::default()).await.unwrap();
    let second = store.init_run(&RunInit::default()).await.unwrap();
    assert_ne!(first, second);
    store.store(first, &problem, &solution, &analysis).await.unwrap();

    let costs = store.fetch_costs(first).await.unwrap();
    assert_eq!(costs["Inv"], 1000.0);
    assert_eq!(costs.len(), 3);
    assert!(store.fetch_costs(second).await.unwrap().is_empty());

    assert_eq!(store.count_rows(ResultTable::EdgeCapacity, first).await.unwrap(), 2);
    assert_eq!(store.count_rows(ResultTable::ProcessCapacity, first).await.unwrap(), 1);
    assert_eq!(store.count_rows(ResultTable::HubCapacity, first).await.unwrap(), 0);
    assert_eq!(store.count_rows(ResultTable::Source, first).await.unwrap(), 1);
    assert_eq!(store.count_rows(ResultTable::Demand, first).await.unwrap(), 1);
    assert_eq!(store.count_rows(ResultTable::GraphAnalysis, first).await.unwrap(), 1);
}

#[tokio::test]
async fn in_memory_database() {
    let store = RunStore::connect("sqlite::memory:").await.unwrap();
    store.init_schema().await.unwrap();
    let run_id = store.init_run(&RunInit::default()).await.unwrap();
    assert_eq!(run_id, 1);
}
