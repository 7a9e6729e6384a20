use rivus_algo::model::{CostType, EntityValues};
use rivus_algo::test_utils::{chain_network, heat_dataset};
use rivus_algo::{Problem, Solution};
use rivus_core::VertexId;
use rivus_viz::{fig3d, map_svg, Fig3dOptions, MapMode, MapOptions};

fn v(id: usize) -> VertexId {
    VertexId::new(id)
}

/// Gas piped from vertex 2 to 0, boiler at vertex 0, hub on edge (0, 1).
fn solved() -> (Problem, Solution) {
    let problem = Problem::new(heat_dataset(), chain_network()).unwrap();
    let mut values = EntityValues::default();
    values.edge_capacity.insert((v(0), v(1), "Gas".into()), 70.0);
    values.edge_capacity.insert((v(1), v(2), "Gas".into()), 70.0);
    values.edge_capacity.insert((v(0), v(1), "Heat".into()), 10.0);
    values.hub_capacity.insert((v(0), v(1), "Domestic boiler".into()), 50.0);
    values.process_capacity.insert((v(0), "Boiler".into()), 12.0);
    values.source.insert((v(2), "Gas".into(), "1".into()), 70.0);
    values.costs.insert(CostType::Inv, 100.0);
    (
        problem,
        Solution {
            objective: 100.0,
            values,
        },
    )
}

#[test]
fn capacity_map_draws_built_edges_and_markers() {
    let (problem, solution) = solved();
    let svg = map_svg(&problem, Some(&solution), "Gas", &MapOptions::default()).unwrap();
    assert!(svg.starts_with("<svg"));
    assert_eq!(svg.matches("<polyline").count(), 4, "2 streets + 2 gas edges");
    assert!(svg.contains(r#"class="source""#));
    assert!(svg.contains(r#"class="consumer""#));
    assert!(svg.contains("scale-bar"));
}

#[test]
fn demand_map_needs_a_demand_commodity() {
    let (problem, _) = solved();
    let options = MapOptions {
        mode: MapMode::Demand,
        scale_bar: false,
        ..MapOptions::default()
    };
    let svg = map_svg(&problem, None, "Heat", &options).unwrap();
    assert!(svg.contains("<title>50</title>"));
    assert!(!svg.contains("scale-bar"));
    assert!(map_svg(&problem, None, "Gas", &options).is_err());
    assert!(map_svg(&problem, None, "Steam", &options).is_err());
}

#[test]
fn capacity_map_without_solution_is_an_error() {
    let (problem, _) = solved();
    assert!(map_svg(&problem, None, "Gas", &MapOptions::default()).is_err());
}

#[test]
fn fig3d_layers_follow_default_order() {
    let (problem, solution) = solved();
    let options = Fig3dOptions {
        use_hubs: true,
        ..Fig3dOptions::default()
    };
    let figure = fig3d(&problem, &solution, None, &options).unwrap();
    let data = figure["data"].as_array().unwrap();

    let legends: Vec<&str> = data
        .iter()
        .filter(|t| t["showlegend"] == true && t["mode"] == "lines")
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(legends, vec!["Gas", "Heat"]);

    let hub = data
        .iter()
        .find(|t| t["name"] == "Hub: Gas -> Heat")
        .expect("hub connector");
    assert_eq!(hub["z"], serde_json::json!([0.0, 5.0]));

    let sources = data
        .iter()
        .find(|t| t["hovertext"].is_array() && t["legendgroup"] == "Gas")
        .unwrap();
    assert_eq!(sources["hovertext"][0], "Src: 70");
    assert_eq!(figure["layout"]["scene"]["aspectmode"], "data");
}

#[test]
fn fig3d_rejects_unknown_commodities() {
    let (problem, solution) = solved();
    let comms = vec!["Gas".to_string(), "Steam".to_string()];
    assert!(fig3d(&problem, &solution, Some(&comms), &Fig3dOptions::default()).is_err());
}
