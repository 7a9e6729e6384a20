//! Small fixtures shared by the unit tests of this and downstream crates.

use rivus_core::{
    AreaDemand, Commodity, DataSet, Direction, Edge, EdgeId, LineString, Point, Process,
    ProcessCommodity, StreetNetwork, TimeStep, Vertex, VertexId,
};
use std::collections::BTreeMap;

/// Gas and heat with one vertex process (`Boiler`) and one hub
/// (`Domestic boiler`); residential areas demand 0.05 kW/m² heat.
pub fn heat_dataset() -> DataSet {
    DataSet {
        commodities: vec![
            commodity("Gas", 100.0, 1.0, 0.05, 10_000.0),
            commodity("Heat", 200.0, 2.0, 0.0, 10_000.0),
        ],
        processes: vec![
            Process {
                name: "Boiler".into(),
                cost_inv_fix: 50.0,
                cost_inv_var: 5.0,
                cost_var: 0.0,
                cap_min: 0.0,
                cap_max: 1000.0,
            },
            Process {
                name: "Domestic boiler".into(),
                cost_inv_fix: 0.0,
                cost_inv_var: 3.0,
                cost_var: 0.0,
                cap_min: 0.0,
                cap_max: 1000.0,
            },
        ],
        process_commodities: vec![
            ratio("Boiler", "Gas", Direction::In, 1.0),
            ratio("Boiler", "Heat", Direction::Out, 0.9),
            ratio("Domestic boiler", "Gas", Direction::In, 1.0),
            ratio("Domestic boiler", "Heat", Direction::Out, 0.8),
        ],
        time: vec![TimeStep {
            name: "1".into(),
            weight: 8760.0,
            scale: 1.0,
        }],
        area_demands: vec![AreaDemand {
            area: "residential".into(),
            commodity: "Heat".into(),
            peak: 0.05,
        }],
    }
}

/// Three vertices in a north-running chain `0 -- 1 -- 2`, roughly 111 m apart.
/// Vertex 2 offers 1000 kW of gas; edge `(0, 1)` carries 1000 m² residential area.
pub fn chain_network() -> StreetNetwork {
    let coords = [(11.0, 48.0), (11.0, 48.001), (11.0, 48.002)];
    let vertices = coords
        .iter()
        .enumerate()
        .map(|(id, &(x, y))| {
            let mut vertex = Vertex::new(id, Point::new(x, y));
            vertex.sources.insert("Gas".into(), if id == 2 { 1000.0 } else { 0.0 });
            vertex
        })
        .collect();
    let edges = (0..2)
        .map(|id| Edge {
            id: EdgeId::new(id),
            vertex1: VertexId::new(id),
            vertex2: VertexId::new(id + 1),
            geometry: LineString::from_xy(&[coords[id], coords[id + 1]]),
            areas: if id == 0 {
                BTreeMap::from([("residential".to_string(), 1000.0)])
            } else {
                BTreeMap::from([("residential".to_string(), 0.0)])
            },
        })
        .collect();
    StreetNetwork::from_parts(vertices, edges).expect("chain fixture is a valid network")
}

fn commodity(name: &str, inv_fix: f64, inv_var: f64, var: f64, cap_max: f64) -> Commodity {
    Commodity {
        name: name.into(),
        cost_inv_fix: inv_fix,
        cost_inv_var: inv_var,
        cost_var: var,
        loss_fix: 0.0,
        loss_var: 0.0,
        cap_max,
    }
}

fn ratio(process: &str, commodity: &str, direction: Direction, ratio: f64) -> ProcessCommodity {
    ProcessCommodity {
        process: process.into(),
        commodity: commodity.into(),
        direction,
        ratio,
    }
}
