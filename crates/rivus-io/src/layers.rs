//! GeoJSON vertex, edge, line and building layers.
//!
//! Vertex features are points with a `Vertex` id; every other numeric
//! property is the source capacity of the commodity it is named after.
//! Edge features are line strings with `Edge`, `Vertex1` and `Vertex2`; every
//! other numeric property is a building area. `null` values read as 0.

use anyhow::{anyhow, bail, Context, Result};
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, JsonValue, Value};
use rivus_core::{
    Edge, EdgeId, Geometry, LineString, Point, Polygon, StreetNetwork, Vertex, VertexId,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

pub const VERTEX_KEY: &str = "Vertex";
pub const EDGE_KEY: &str = "Edge";
pub const VERTEX1_KEY: &str = "Vertex1";
pub const VERTEX2_KEY: &str = "Vertex2";

/// A building footprint with its use type and floor area.
#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    pub geometry: Geometry,
    /// Use type, e.g. `residential`
    pub kind: String,
    /// Floor area (m²)
    pub total_area: f64,
}

fn read_features(path: &Path) -> Result<Vec<Feature>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let geojson: GeoJson = text
        .parse()
        .with_context(|| format!("parsing GeoJSON {}", path.display()))?;
    match geojson {
        GeoJson::FeatureCollection(collection) => Ok(collection.features),
        GeoJson::Feature(feature) => Ok(vec![feature]),
        GeoJson::Geometry(_) => bail!(
            "{} holds a bare geometry, expected a FeatureCollection",
            path.display()
        ),
    }
}

fn write_features(path: &Path, features: Vec<Feature>) -> Result<()> {
    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };
    let json = serde_json::to_string_pretty(&collection).context("serializing GeoJSON")?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn position(coords: &[f64]) -> Result<Point> {
    match coords {
        [x, y, ..] => Ok(Point::new(*x, *y)),
        _ => Err(anyhow!("position needs two coordinates, got {}", coords.len())),
    }
}

fn to_line(coords: &[Vec<f64>]) -> Result<LineString> {
    Ok(LineString::new(
        coords.iter().map(|c| position(c)).collect::<Result<_>>()?,
    ))
}

/// Converts a GeoJSON geometry into the rivus geometry model. Multi-part
/// geometries yield their first part.
pub fn to_geometry(value: &Value) -> Result<Geometry> {
    match value {
        Value::Point(p) => Ok(Geometry::Point(position(p)?)),
        Value::LineString(l) => Ok(Geometry::LineString(to_line(l)?)),
        Value::MultiLineString(parts) => {
            let first = parts.first().ok_or_else(|| anyhow!("empty MultiLineString"))?;
            Ok(Geometry::LineString(to_line(first)?))
        }
        Value::Polygon(rings) => {
            let exterior = rings.first().ok_or_else(|| anyhow!("polygon without rings"))?;
            Ok(Geometry::Polygon(Polygon::new(to_line(exterior)?.coords)))
        }
        Value::MultiPolygon(polygons) => {
            let exterior = polygons
                .first()
                .and_then(|rings| rings.first())
                .ok_or_else(|| anyhow!("empty MultiPolygon"))?;
            Ok(Geometry::Polygon(Polygon::new(to_line(exterior)?.coords)))
        }
        other => bail!("unsupported geometry type {}", other.type_name()),
    }
}

fn from_point(p: &Point) -> Vec<f64> {
    vec![p.x, p.y]
}

pub fn from_geometry(geometry: &Geometry) -> geojson::Geometry {
    let value = match geometry {
        Geometry::Point(p) => Value::Point(from_point(p)),
        Geometry::LineString(l) => Value::LineString(l.coords.iter().map(from_point).collect()),
        Geometry::Polygon(p) => {
            Value::Polygon(vec![p.boundary().coords.iter().map(from_point).collect()])
        }
    };
    geojson::Geometry::new(value)
}

fn feature(geometry: &Geometry, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(from_geometry(geometry)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn feature_geometry(feature: &Feature, index: usize) -> Result<Geometry> {
    let geometry = feature
        .geometry
        .as_ref()
        .ok_or_else(|| anyhow!("feature {index} has no geometry"))?;
    to_geometry(&geometry.value).with_context(|| format!("feature {index}"))
}

/// Numeric value of a property: numbers, numeric strings and `null` (as 0).
fn number(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Null => Some(0.0),
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        JsonValue::Bool(_) | JsonValue::Array(_) | JsonValue::Object(_) => None,
    }
}

fn id_property(feature: &Feature, key: &str, index: usize) -> Result<Option<usize>> {
    let Some(value) = feature.property(key) else {
        return Ok(None);
    };
    let id = number(value)
        .filter(|v| *v >= 0.0 && v.fract() == 0.0)
        .ok_or_else(|| anyhow!("feature {index}: property {key} is not an id: {value}"))?;
    Ok(Some(id as usize))
}

/// Numeric properties except the given id columns.
fn numeric_properties(feature: &Feature, skip: &[&str]) -> BTreeMap<String, f64> {
    let mut values = BTreeMap::new();
    if let Some(properties) = &feature.properties {
        for (key, value) in properties {
            if skip.contains(&key.as_str()) {
                continue;
            }
            match number(value) {
                Some(v) => {
                    values.insert(key.clone(), v);
                }
                None => debug!(property = %key, "ignoring non-numeric property"),
            }
        }
    }
    values
}

pub fn read_vertices(path: &Path) -> Result<Vec<Vertex>> {
    let features = read_features(path)?;
    let mut vertices = Vec::with_capacity(features.len());
    for (index, feature) in features.iter().enumerate() {
        let point = match feature_geometry(feature, index)? {
            Geometry::Point(p) => p,
            other => bail!(
                "{}: vertex feature {index} is a {}, expected a Point",
                path.display(),
                other.type_name()
            ),
        };
        let id = id_property(feature, VERTEX_KEY, index)?.unwrap_or(index);
        let mut vertex = Vertex::new(id, point);
        vertex.sources = numeric_properties(feature, &[VERTEX_KEY]);
        vertices.push(vertex);
    }
    debug!(path = %path.display(), vertices = vertices.len(), "read vertices");
    Ok(vertices)
}

pub fn read_edges(path: &Path) -> Result<Vec<Edge>> {
    let features = read_features(path)?;
    let mut edges = Vec::with_capacity(features.len());
    for (index, feature) in features.iter().enumerate() {
        let geometry = match feature_geometry(feature, index)? {
            Geometry::LineString(l) => l,
            other => bail!(
                "{}: edge feature {index} is a {}, expected a LineString",
                path.display(),
                other.type_name()
            ),
        };
        let id = id_property(feature, EDGE_KEY, index)?.unwrap_or(index);
        let vertex1 = id_property(feature, VERTEX1_KEY, index)?
            .ok_or_else(|| anyhow!("{}: edge {id} has no {VERTEX1_KEY}", path.display()))?;
        let vertex2 = id_property(feature, VERTEX2_KEY, index)?
            .ok_or_else(|| anyhow!("{}: edge {id} has no {VERTEX2_KEY}", path.display()))?;
        edges.push(Edge {
            id: EdgeId::new(id),
            vertex1: VertexId::new(vertex1),
            vertex2: VertexId::new(vertex2),
            geometry,
            areas: numeric_properties(feature, &[EDGE_KEY, VERTEX1_KEY, VERTEX2_KEY]),
        });
    }
    debug!(path = %path.display(), edges = edges.len(), "read edges");
    Ok(edges)
}

/// Reads both layers and builds the street graph.
pub fn read_network(vertex_path: &Path, edge_path: &Path) -> Result<StreetNetwork> {
    let vertices = read_vertices(vertex_path)?;
    let edges = read_edges(edge_path)?;
    StreetNetwork::from_parts(vertices, edges).context("building street network")
}

/// Every line string of a layer, regardless of properties. Other geometry
/// types are skipped.
pub fn read_lines(path: &Path) -> Result<Vec<LineString>> {
    let mut lines = Vec::new();
    for (index, feature) in read_features(path)?.iter().enumerate() {
        let Some(geometry) = &feature.geometry else {
            continue;
        };
        match &geometry.value {
            Value::LineString(l) => lines.push(to_line(l).with_context(|| format!("feature {index}"))?),
            Value::MultiLineString(parts) => {
                for part in parts {
                    lines.push(to_line(part).with_context(|| format!("feature {index}"))?);
                }
            }
            other => warn!(feature = index, kind = other.type_name(), "skipping non-line feature"),
        }
    }
    Ok(lines)
}

/// Building polygons with `type` and `total_area` properties.
pub fn read_buildings(path: &Path) -> Result<Vec<Building>> {
    let features = read_features(path)?;
    let mut buildings = Vec::with_capacity(features.len());
    for (index, feature) in features.iter().enumerate() {
        let geometry = feature_geometry(feature, index)?;
        let kind = match feature.property("type") {
            Some(JsonValue::String(s)) => s.clone(),
            _ => bail!("{}: building {index} has no type", path.display()),
        };
        let total_area = feature
            .property("total_area")
            .and_then(number)
            .unwrap_or(0.0);
        buildings.push(Building {
            geometry,
            kind,
            total_area,
        });
    }
    Ok(buildings)
}

pub fn write_vertices(path: &Path, vertices: &[Vertex]) -> Result<()> {
    let features = vertices
        .iter()
        .map(|v| {
            let mut properties = JsonObject::new();
            properties.insert(VERTEX_KEY.into(), JsonValue::from(v.id.value()));
            for (commodity, capacity) in &v.sources {
                properties.insert(commodity.clone(), JsonValue::from(*capacity));
            }
            feature(&Geometry::Point(v.geometry), properties)
        })
        .collect();
    write_features(path, features)
}

pub fn write_edges(path: &Path, edges: &[Edge]) -> Result<()> {
    let features = edges
        .iter()
        .map(|e| {
            let mut properties = JsonObject::new();
            properties.insert(EDGE_KEY.into(), JsonValue::from(e.id.value()));
            properties.insert(VERTEX1_KEY.into(), JsonValue::from(e.vertex1.value()));
            properties.insert(VERTEX2_KEY.into(), JsonValue::from(e.vertex2.value()));
            for (area, value) in &e.areas {
                properties.insert(area.clone(), JsonValue::from(*value));
            }
            feature(&Geometry::LineString(e.geometry.clone()), properties)
        })
        .collect();
    write_features(path, features)
}

/// Plain line layer, e.g. building connectors.
pub fn write_lines(path: &Path, lines: &[LineString]) -> Result<()> {
    let features = lines
        .iter()
        .map(|l| feature(&Geometry::LineString(l.clone()), JsonObject::new()))
        .collect();
    write_features(path, features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const VERTICES: &str = r#"{
      "type": "FeatureCollection",
      "features": [
        {"type": "Feature", "geometry": {"type": "Point", "coordinates": [11.0, 48.0]},
         "properties": {"Vertex": 0, "Elec": 2000, "Gas": null}},
        {"type": "Feature", "geometry": {"type": "Point", "coordinates": [11.001, 48.0]},
         "properties": {"Vertex": 1, "Elec": 0, "Gas": 0, "name": "corner"}}
      ]
    }"#;

    const EDGES: &str = r#"{
      "type": "FeatureCollection",
      "features": [
        {"type": "Feature",
         "geometry": {"type": "LineString", "coordinates": [[11.0, 48.0], [11.001, 48.0]]},
         "properties": {"Edge": 7, "Vertex1": 0, "Vertex2": 1, "residential": 1200.5, "other": null}}
      ]
    }"#;

    #[test]
    fn reads_vertex_and_edge_layers() {
        let dir = tempdir().unwrap();
        let vpath = dir.path().join("vertex.geojson");
        let epath = dir.path().join("edge.geojson");
        fs::write(&vpath, VERTICES).unwrap();
        fs::write(&epath, EDGES).unwrap();

        let network = read_network(&vpath, &epath).unwrap();
        let v0 = network.vertex(VertexId::new(0)).unwrap();
        assert_eq!(v0.source_capacity("Elec"), 2000.0);
        assert_eq!(v0.sources.get("Gas"), Some(&0.0));
        assert!(!network.vertex(VertexId::new(1)).unwrap().sources.contains_key("name"));

        let edge = network.edges().next().unwrap();
        assert_eq!(edge.id, EdgeId::new(7));
        assert_eq!(edge.area("residential"), 1200.5);
        assert_eq!(edge.area("other"), 0.0);
    }

    #[test]
    fn written_layers_read_back() {
        let dir = tempdir().unwrap();
        let vpath = dir.path().join("vertex.geojson");
        let epath = dir.path().join("edge.geojson");
        fs::write(&vpath, VERTICES).unwrap();
        fs::write(&epath, EDGES).unwrap();
        let vertices = read_vertices(&vpath).unwrap();
        let edges = read_edges(&epath).unwrap();

        let out_v = dir.path().join("v2.geojson");
        let out_e = dir.path().join("e2.geojson");
        write_vertices(&out_v, &vertices).unwrap();
        write_edges(&out_e, &edges).unwrap();
        assert_eq!(read_vertices(&out_v).unwrap(), vertices);
        assert_eq!(read_edges(&out_e).unwrap(), edges);
    }

    #[test]
    fn edge_without_vertex_ids_is_rejected() {
        let dir = tempdir().unwrap();
        let epath = dir.path().join("edge.geojson");
        fs::write(&epath, EDGES.replace("\"Vertex2\": 1,", "")).unwrap();
        let err = read_edges(&epath).unwrap_err();
        assert!(err.to_string().contains("Vertex2"));
    }

    #[test]
    fn lines_skip_points() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mixed.geojson");
        let mixed = VERTICES.replace(
            "\"Point\", \"coordinates\": [11.0, 48.0]",
            "\"LineString\", \"coordinates\": [[0, 0], [1, 1]]",
        );
        fs::write(&path, mixed).unwrap();
        let lines = read_lines(&path).unwrap();
        assert_eq!(lines.len(), 1);
        assert!((lines[0].length() - 2f64.sqrt()).abs() < 1e-12);
    }
}
