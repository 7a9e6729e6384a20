use rivus_algo::test_utils::{chain_network, heat_dataset};
use rivus_algo::{
    constants, load_result, minimal_graph_analysis, parameter_range, reanalyse, save_result,
    solve, to_graphs, write_reanalysis, Problem, ResultArchive, SolveStatus, SolverOptions,
    SweepRange,
};
use rivus_core::ParameterTarget;
use tempfile::tempdir;

fn options() -> SolverOptions {
    SolverOptions {
        time_limit: None,
        mip_gap: None,
        ..SolverOptions::default()
    }
}

#[test]
fn sweep_solve_archive_and_reanalyse() {
    let target = ParameterTarget::Commodity {
        name: "Heat".into(),
        column: "cost-inv-fix".into(),
    };
    let range = SweepRange {
        lim_lo: 0.5,
        lim_up: 1.1,
        step: 0.5,
        zero_root: None,
    };
    let variants = parameter_range(&heat_dataset(), &target, &range).unwrap();
    assert_eq!(variants.len(), 2);

    let dir = tempdir().unwrap();
    for (index, variant) in variants.iter().enumerate() {
        let problem = Problem::new(variant.data.clone(), chain_network()).unwrap();
        let outcome = solve(&problem, &options());
        assert_eq!(outcome.status, SolveStatus::Optimal, "{:?}", outcome.message);
        let path = dir.path().join(format!("scenario_{index}.json"));
        save_result(&path, &ResultArchive::new(&problem, &outcome)).unwrap();

        let archive = load_result(&path).unwrap();
        let restored = archive.problem().unwrap();
        assert_eq!(restored.total_peak(), problem.total_peak());
    }

    let reanalysis = reanalyse(dir.path()).unwrap();
    assert_eq!(
        reanalysis.scenarios.keys().collect::<Vec<_>>(),
        vec!["0", "1"]
    );
    for summary in reanalysis.scenarios.values() {
        assert!((summary.demand["Heat"] - 50.0).abs() < 1e-9);
        assert!(summary.costs.values().sum::<f64>() > 0.0);
    }
    let written = write_reanalysis(&reanalysis, &dir.path().join("compare")).unwrap();
    assert_eq!(written.len(), 5);
}

#[test]
fn built_gas_network_is_connected() {
    let problem = Problem::new(heat_dataset(), chain_network()).unwrap();
    let solution = solve(&problem, &options()).into_solution().unwrap();
    let graphs = to_graphs(&problem, &constants(&solution));
    let analysis = minimal_graph_analysis(&graphs, true);
    let gas = analysis
        .iter()
        .find(|a| a.commodity == "Gas")
        .expect("gas is transported from vertex 2");
    assert!(gas.is_connected);
    assert_eq!(gas.connected_components, 1);
    assert_eq!(gas.is_minimal, Some(true));
}
