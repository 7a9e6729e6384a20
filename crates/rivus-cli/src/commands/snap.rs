use std::fs;

use anyhow::{Context, Result};
use rivus_cli::cli::SnapArgs;
use rivus_core::{Edge, EdgeId, Vertex, VertexId};
use rivus_geo::{
    endpoints_from_lines, linemerge, match_vertices_and_edges, one_linestring_per_intersection,
    prune_short_lines, snappy_endings, DEFAULT_MATCH_TOLERANCE,
};
use tracing::info;

pub fn handle(args: &SnapArgs) -> Result<()> {
    let lines = rivus_io::read_lines(&args.input)?;
    let read = lines.len();

    let lines = one_linestring_per_intersection(&lines);
    let lines = snappy_endings(&lines, args.max_distance)?;
    let lines = if args.min_length > 0.0 {
        prune_short_lines(&lines, args.min_length)?
    } else {
        lines
    };
    let lines = linemerge(&lines);
    rivus_io::write_lines(&args.out, &lines)?;
    info!(read, written = lines.len(), "cleaned line layer");
    println!(
        "Wrote {} lines ({} read) to {}",
        lines.len(),
        read,
        args.out.display()
    );

    if let Some(dir) = &args.network_dir {
        let vertices: Vec<Vertex> = endpoints_from_lines(&lines)
            .into_iter()
            .enumerate()
            .map(|(id, point)| Vertex::new(id, point))
            .collect();
        let mut edges: Vec<Edge> = lines
            .into_iter()
            .enumerate()
            .map(|(id, geometry)| Edge {
                id: EdgeId::new(id),
                vertex1: VertexId::new(0),
                vertex2: VertexId::new(0),
                geometry,
                areas: Default::default(),
            })
            .collect();
        match_vertices_and_edges(&vertices, &mut edges, DEFAULT_MATCH_TOLERANCE);

        fs::create_dir_all(dir)
            .with_context(|| format!("creating network directory '{}'", dir.display()))?;
        rivus_io::write_vertices(&dir.join("vertex.geojson"), &vertices)?;
        rivus_io::write_edges(&dir.join("edge.geojson"), &edges)?;
        println!(
            "Wrote {} vertices and {} edges to {}",
            vertices.len(),
            edges.len(),
            dir.display()
        );
    }
    Ok(())
}
