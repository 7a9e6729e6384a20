//! SVG map of one commodity on the street network.

use crate::colors::{color, BASE, DECORATION};
use crate::frame::{linewidth, MapFrame};
use rivus_algo::results::{constants, timeseries};
use rivus_algo::{Problem, Solution};
use rivus_core::{Point, RivusError, RivusResult, VertexId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use tracing::debug;

pub const MAP_EXTENT: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapMode {
    /// Built transport capacity with process and source markers
    #[default]
    Capacity,
    /// Peak demand per edge
    Demand,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapOptions {
    pub mode: MapMode,
    /// Multiplier for line widths
    pub linescale: f64,
    /// Output width in pixels
    pub width: f64,
    pub scale_bar: bool,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            mode: MapMode::Capacity,
            linescale: 1.0,
            width: 800.0,
            scale_bar: true,
        }
    }
}

struct Canvas {
    frame: MapFrame,
    width: f64,
    height: f64,
    ratio: f64,
}

impl Canvas {
    fn new(frame: MapFrame, width: f64) -> Self {
        let span_x = frame.width().max(1.0);
        let span_y = frame.height().max(1.0);
        let ratio = width / span_x;
        Self {
            frame,
            width,
            height: span_y * ratio,
            ratio,
        }
    }

    fn pixel(&self, lonlat: Point) -> (f64, f64) {
        let p = self.frame.project(lonlat);
        (p.x * self.ratio, self.height - p.y * self.ratio)
    }

    fn polyline(&self, coords: &[Point]) -> String {
        coords
            .iter()
            .map(|p| {
                let (x, y) = self.pixel(*p);
                format!("{x:.2},{y:.2}")
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Renders `commodity` as an SVG document.
///
/// Capacity mode needs a solution; demand mode draws the peak demand of the
/// problem and fails for commodities without demand.
pub fn map_svg(
    problem: &Problem,
    solution: Option<&Solution>,
    commodity: &str,
    options: &MapOptions,
) -> RivusResult<String> {
    if problem.data.commodity(commodity).is_none() {
        return Err(RivusError::Validation(format!("unknown commodity '{commodity}'")));
    }
    let canvas = Canvas::new(MapFrame::new(&problem.network, MAP_EXTENT)?, options.width);
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{:.0}" height="{:.0}" viewBox="0 0 {:.2} {:.2}">"#,
        canvas.width, canvas.height, canvas.width, canvas.height
    );
    let _ = writeln!(svg, r#"<title>{commodity}</title>"#);

    let _ = writeln!(svg, r#"<g id="streets" stroke="{BASE}" stroke-width="1" fill="none">"#);
    for edge in problem.network.edges() {
        let _ = writeln!(
            svg,
            r#"<polyline points="{}"/>"#,
            canvas.polyline(&edge.geometry.coords)
        );
    }
    svg.push_str("</g>\n");

    let stroke = color(commodity);
    match options.mode {
        MapMode::Capacity => {
            let solution = solution.ok_or_else(|| {
                RivusError::Validation("capacity map needs a solved result".into())
            })?;
            let constants = constants(solution);
            let _ = writeln!(
                svg,
                r#"<g id="capacity" stroke="{stroke}" stroke-linecap="round" fill="none">"#
            );
            for edge in problem.network.edges() {
                let cap = constants.edge_capacity.get(&edge.key(), commodity);
                if cap <= 0.0 {
                    continue;
                }
                let _ = writeln!(
                    svg,
                    r#"<polyline points="{}" stroke-width="{:.3}"><title>{cap}</title></polyline>"#,
                    canvas.polyline(&edge.geometry.coords),
                    linewidth(cap, options.linescale)
                );
            }
            svg.push_str("</g>\n");
            draw_markers(&mut svg, &canvas, problem, solution, commodity);
        }
        MapMode::Demand => {
            if !problem.co_demand.iter().any(|c| c == commodity) {
                return Err(RivusError::Validation(format!(
                    "commodity '{commodity}' has no demand"
                )));
            }
            let _ = writeln!(
                svg,
                r#"<g id="demand" stroke="{stroke}" stroke-linecap="round" fill="none">"#
            );
            for edge in problem.network.edges() {
                let peak = problem.peak(edge.key(), commodity);
                if peak <= 0.0 {
                    continue;
                }
                let _ = writeln!(
                    svg,
                    r#"<polyline points="{}" stroke-width="{:.3}"><title>{peak}</title></polyline>"#,
                    canvas.polyline(&edge.geometry.coords),
                    linewidth(peak, options.linescale)
                );
            }
            svg.push_str("</g>\n");
        }
    }

    if options.scale_bar {
        draw_scale_bar(&mut svg, &canvas);
    }
    svg.push_str("</svg>\n");
    debug!(commodity, mode = ?options.mode, bytes = svg.len(), "rendered map");
    Ok(svg)
}

/// Consumers (open circles), producers (filled circles) and sources
/// (diamonds) of `commodity`, labelled with their capacity.
fn draw_markers(
    svg: &mut String,
    canvas: &Canvas,
    problem: &Problem,
    solution: &Solution,
    commodity: &str,
) {
    let constants = constants(solution);
    let mut consumers: BTreeMap<VertexId, f64> = BTreeMap::new();
    let mut producers: BTreeMap<VertexId, f64> = BTreeMap::new();
    for (vertex, caps) in &constants.process_capacity.rows {
        for (process, cap) in constants.process_capacity.columns.iter().zip(caps) {
            let key = (process.clone(), commodity.to_string());
            if let Some(r) = problem.r_in.get(&key) {
                *consumers.entry(*vertex).or_insert(0.0) += cap * r;
            }
            if let Some(r) = problem.r_out.get(&key) {
                *producers.entry(*vertex).or_insert(0.0) += cap * r;
            }
        }
    }
    let mut sources: BTreeMap<VertexId, f64> = BTreeMap::new();
    for row in timeseries(solution).source {
        if row.commodity == commodity {
            let entry = sources.entry(row.vertex).or_insert(0.0);
            *entry = entry.max(row.value);
        }
    }

    let fill = color(commodity);
    let _ = writeln!(svg, r#"<g id="markers" stroke="{fill}" font-size="10" font-family="sans-serif">"#);
    let layers = [
        (&consumers, "consumer"),
        (&producers, "producer"),
        (&sources, "source"),
    ];
    for (values, kind) in layers {
        for (vertex, value) in values.iter().filter(|(_, v)| **v > 0.0) {
            let Some(v) = problem.network.vertex(*vertex) else {
                continue;
            };
            let (x, y) = canvas.pixel(v.geometry);
            let size = 3.0 + value.sqrt() * 0.15;
            let shape = match kind {
                "consumer" => format!(
                    r#"<circle class="{kind}" cx="{x:.2}" cy="{y:.2}" r="{size:.2}" fill="none"/>"#
                ),
                "producer" => format!(
                    r#"<circle class="{kind}" cx="{x:.2}" cy="{y:.2}" r="{size:.2}" fill="{fill}"/>"#
                ),
                _ => format!(
                    r#"<rect class="{kind}" x="{:.2}" y="{:.2}" width="{s:.2}" height="{s:.2}" fill="{fill}" transform="rotate(45 {x:.2} {y:.2})"/>"#,
                    x - size,
                    y - size,
                    s = 2.0 * size
                ),
            };
            let _ = writeln!(svg, "{shape}");
            let _ = writeln!(
                svg,
                r#"<text x="{:.2}" y="{:.2}" stroke="none" fill="{DECORATION}">{value:.0}</text>"#,
                x + size + 2.0,
                y - size
            );
        }
    }
    svg.push_str("</g>\n");
}

/// Round length (1, 2 or 5 times a power of ten) close to a fifth of `span`.
fn scale_bar_length(span: f64) -> f64 {
    let target = span / 5.0;
    if target <= 0.0 || !target.is_finite() {
        return 0.0;
    }
    let magnitude = 10f64.powf(target.log10().floor());
    [5.0, 2.0, 1.0]
        .into_iter()
        .map(|m| m * magnitude)
        .find(|len| *len <= target)
        .unwrap_or(magnitude)
}

fn draw_scale_bar(svg: &mut String, canvas: &Canvas) {
    let metres = scale_bar_length(canvas.frame.width());
    if metres <= 0.0 {
        return;
    }
    let length = metres * canvas.ratio;
    let x0 = 10.0;
    let y0 = canvas.height - 10.0;
    let label = if metres >= 1000.0 {
        format!("{} km", metres / 1000.0)
    } else {
        format!("{metres} m")
    };
    let _ = writeln!(
        svg,
        r#"<g id="scale-bar" stroke="{DECORATION}" stroke-width="2"><line x1="{x0:.2}" y1="{y0:.2}" x2="{:.2}" y2="{y0:.2}"/><text x="{x0:.2}" y="{:.2}" stroke="none" fill="{DECORATION}" font-size="10" font-family="sans-serif">{label}</text></g>"#,
        x0 + length,
        y0 - 4.0
    );
}
