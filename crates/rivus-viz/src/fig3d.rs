//! Layered 3-D network figure in plotly's JSON schema.
//!
//! Every commodity gets its own z layer (`dz` apart, bottom to top in
//! order). Edges are drawn on every layer: solid with capacity-scaled width
//! where built, dashed otherwise. Hubs appear as vertical connectors from
//! their input layer to each output layer.

use crate::colors::color;
use crate::frame::{linewidth, MapFrame};
use rivus_algo::results::{constants, timeseries};
use rivus_algo::{Problem, Solution};
use rivus_core::{RivusError, RivusResult, VertexId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Bottom-to-top layer order used when no commodities are given.
pub const DEFAULT_LAYER_ORDER: [&str; 6] = ["Demand", "Gas", "CO2", "Heat", "Elec", "Cool"];

const FIG_EXTENT: f64 = 0.08;
const ANNOT_DIVIDER: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fig3dOptions {
    pub linescale: f64,
    pub use_hubs: bool,
    pub hub_opacity: f64,
    /// Distance between layers
    pub dz: f64,
    /// Hover markers with the capacity of built edges
    pub cap_text: bool,
    /// Add the edge length to the capacity hover text
    pub len_text: bool,
}

impl Default for Fig3dOptions {
    fn default() -> Self {
        Self {
            linescale: 1.0,
            use_hubs: false,
            hub_opacity: 0.55,
            dz: 5.0,
            cap_text: true,
            len_text: true,
        }
    }
}

/// Anchor offset of a layer's annotations along its edge.
fn annotation_offset(name: &str) -> f64 {
    match name {
        "Cool" => -2.0,
        "Elec" => -1.0,
        "Gas" => 1.0,
        "CO2" => 2.0,
        _ => 0.0,
    }
}

/// Commodities worth a layer: built on edges, or consumed or produced by a
/// built process or hub; sorted by [`DEFAULT_LAYER_ORDER`], others last.
pub fn default_commodities(problem: &Problem, solution: &Solution) -> Vec<String> {
    let constants = constants(solution);
    let mut names: BTreeSet<String> = constants.edge_capacity.columns.iter().cloned().collect();
    let used: Vec<&String> = constants
        .process_capacity
        .columns
        .iter()
        .chain(&constants.hub_capacity.columns)
        .collect();
    for process in used {
        for ((p, co), _) in problem.r_in.iter().chain(&problem.r_out) {
            if p == process {
                names.insert(co.clone());
            }
        }
    }
    let mut names: Vec<String> = names.into_iter().collect();
    names.sort_by_key(|name| {
        DEFAULT_LAYER_ORDER
            .iter()
            .position(|c| c == name)
            .unwrap_or(DEFAULT_LAYER_ORDER.len())
    });
    names
}

/// Builds the figure for `commodities` (bottom to top) or, when `None`,
/// for [`default_commodities`].
pub fn fig3d(
    problem: &Problem,
    solution: &Solution,
    commodities: Option<&[String]>,
    options: &Fig3dOptions,
) -> RivusResult<Value> {
    let comms: Vec<String> = match commodities {
        Some(given) => {
            if let Some(unknown) = given.iter().find(|c| problem.data.commodity(c).is_none()) {
                return Err(RivusError::Validation(format!("unknown commodity '{unknown}'")));
            }
            given.to_vec()
        }
        None => default_commodities(problem, solution),
    };
    let layer_z: BTreeMap<&str, f64> = comms
        .iter()
        .enumerate()
        .map(|(k, c)| (c.as_str(), options.dz * k as f64))
        .collect();
    let frame = MapFrame::new(&problem.network, FIG_EXTENT)?;
    let constants = constants(solution);
    let use_hubs = options.use_hubs && !constants.hub_capacity.is_empty();

    let mut capacities: Vec<Value> = Vec::new();
    let mut hub_connectors: Vec<Value> = Vec::new();
    let mut cap_groups: BTreeMap<&str, (Vec<f64>, Vec<f64>, Vec<f64>, Vec<String>)> =
        BTreeMap::new();

    for com in &comms {
        // legend entry
        capacities.push(json!({
            "type": "scatter3d",
            "x": [0, 0], "y": [0, 0], "z": [0, 0],
            "mode": "lines",
            "showlegend": true, "legendgroup": com, "name": com,
            "hoverinfo": "skip",
            "line": { "width": 10, "color": color(com).to_string() },
        }));
        if constants.edge_capacity.columns.contains(com) {
            cap_groups.insert(com.as_str(), Default::default());
        }
    }

    let cap_offset = if use_hubs { -3.0 } else { 0.0 };
    let mut hub_legends: BTreeSet<String> = BTreeSet::new();
    for edge in problem.network.edges() {
        let points = frame.project_line(&edge.geometry);
        let Some(first) = points.first().copied() else {
            continue;
        };
        let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.y).collect();
        let anchor_x = xs.iter().sum::<f64>() / xs.len() as f64;
        let anchor_y = ys.iter().sum::<f64>() / ys.len() as f64;
        let along = |offset: f64| {
            (
                (anchor_x - first.x).abs() / ANNOT_DIVIDER * offset + anchor_x,
                (anchor_y - first.y).abs() / ANNOT_DIVIDER * offset + anchor_y,
            )
        };

        for com in &comms {
            let z = layer_z[com.as_str()];
            let cap = constants.edge_capacity.get(&edge.key(), com);
            let (width, dash) = if cap > 0.0 {
                (linewidth(cap, options.linescale), "solid")
            } else {
                (2.0, "dash")
            };
            capacities.push(json!({
                "type": "scatter3d",
                "mode": "lines",
                "hoverinfo": "skip",
                "x": xs, "y": ys, "z": vec![z; xs.len()],
                "legendgroup": com, "name": com, "showlegend": false,
                "line": { "width": width, "color": color(com).to_string(), "dash": dash },
            }));

            if cap > 0.0 && options.cap_text {
                if let Some(group) = cap_groups.get_mut(com.as_str()) {
                    let (x, y) = along(cap_offset);
                    let text = if options.len_text {
                        format!("cap: {cap}<br>len: {:.1} m", problem.length(edge.key()))
                    } else {
                        format!("cap: {cap}")
                    };
                    group.0.push(x);
                    group.1.push(y);
                    group.2.push(z);
                    group.3.push(text);
                }
            }
        }

        if !use_hubs {
            continue;
        }
        for (hub, hub_cap) in constants
            .hub_capacity
            .columns
            .iter()
            .map(|h| (h, constants.hub_capacity.get(&edge.key(), h)))
            .filter(|(_, cap)| *cap > 0.0)
        {
            let Some(from_com) = problem
                .r_in
                .keys()
                .find(|(p, _)| p == hub)
                .map(|(_, co)| co.as_str())
            else {
                continue;
            };
            let produced: Vec<(&str, f64)> = problem
                .r_out
                .iter()
                .filter(|((p, _), _)| p == hub)
                .map(|((_, co), r)| (co.as_str(), r * hub_cap))
                .collect();
            let text = std::iter::once(format!("{hub}:"))
                .chain(produced.iter().map(|(co, v)| format!("{co} {v}")))
                .collect::<Vec<_>>()
                .join("<br>");
            for (prod_com, _) in &produced {
                let (Some(from_z), Some(to_z)) = (layer_z.get(from_com), layer_z.get(prod_com))
                else {
                    continue;
                };
                let (x, y) = along(annotation_offset(prod_com));
                let legend = format!("Hub: {from_com} -> {prod_com}");
                let is_first = hub_legends.insert(legend.clone());
                hub_connectors.push(json!({
                    "type": "scatter3d",
                    "x": [x, x], "y": [y, y], "z": [from_z, to_z],
                    "showlegend": is_first, "legendgroup": legend, "name": legend,
                    "opacity": options.hub_opacity, "hoverinfo": "text",
                    "text": [text, ""],
                    "mode": "lines+markers",
                    "line": { "color": color(prod_com).to_string(), "width": 8, "dash": "longdash" },
                    "marker": { "size": 6, "symbol": ["circle-open", "circle"] },
                }));
            }
        }
    }

    for (com, (x, y, z, text)) in cap_groups {
        capacities.push(json!({
            "type": "scatter3d",
            "x": x, "y": y, "z": z,
            "mode": "markers", "opacity": 0.5,
            "showlegend": false, "legendgroup": com, "name": com,
            "hoverinfo": "text", "text": text,
            "marker": { "size": 5, "symbol": "cross", "color": color(com).to_string() },
        }));
    }

    let markers = source_markers(problem, solution, &frame, &comms, &layer_z);
    let data: Vec<Value> = capacities
        .into_iter()
        .chain(hub_connectors)
        .chain(markers)
        .collect();
    debug!(layers = comms.len(), traces = data.len(), "built 3-D figure");

    let mut figure = Map::new();
    figure.insert("data".into(), Value::Array(data));
    figure.insert(
        "layout".into(),
        json!({
            "margin": { "l": 0, "r": 0, "b": 10, "t": 0, "pad": 4 },
            "legend": { "traceorder": "reversed" },
            "scene": {
                "xaxis": { "visible": false },
                "yaxis": { "visible": false },
                "zaxis": { "visible": false },
                "aspectmode": "data",
            },
        }),
    );
    Ok(Value::Object(figure))
}

/// One diamond scatter per layer at vertices with a source, labelled with
/// the largest source value over all time steps.
fn source_markers(
    problem: &Problem,
    solution: &Solution,
    frame: &MapFrame,
    comms: &[String],
    layer_z: &BTreeMap<&str, f64>,
) -> Vec<Value> {
    let mut peak_source: BTreeMap<(&str, VertexId), f64> = BTreeMap::new();
    let series = timeseries(solution);
    for row in &series.source {
        let entry = peak_source
            .entry((row.commodity.as_str(), row.vertex))
            .or_insert(0.0);
        *entry = entry.max(row.value);
    }
    comms
        .iter()
        .map(|com| {
            let mut xs = Vec::new();
            let mut ys = Vec::new();
            let mut texts = Vec::new();
            for ((_, vertex), value) in peak_source
                .iter()
                .filter(|((c, _), v)| *c == com.as_str() && **v > 0.0)
            {
                let Some(v) = problem.network.vertex(*vertex) else {
                    continue;
                };
                let p = frame.project(v.geometry);
                xs.push(p.x);
                ys.push(p.y);
                texts.push(format!("Src: {value:.0}"));
            }
            let z = layer_z[com.as_str()];
            json!({
                "type": "scatter3d",
                "x": xs, "y": ys, "z": vec![z; texts.len()],
                "mode": "markers",
                "legendgroup": com, "showlegend": false,
                "hoverinfo": "text",
                "hovertext": texts,
                "marker": {
                    "symbol": vec!["diamond"; texts.len()],
                    "size": 14,
                    "color": color(com).to_string(),
                },
            })
        })
        .collect()
}
