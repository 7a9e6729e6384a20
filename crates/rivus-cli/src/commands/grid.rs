use std::fs;

use anyhow::{Context, Result};
use rivus_cli::cli::GridArgs;
use rivus_geo::{
    create_square_grid, extend_edge_data, vert_init_commodities, DistributionStrategy, GridSpec,
    Matching,
};
use rivus_viz::char_plot;
use tracing::info;

pub fn handle(args: &GridArgs) -> Result<()> {
    let mut spec = GridSpec {
        num_edge_x: args.num_edge_x,
        num_edge_y: args.num_edge_y,
        dx: args.dx,
        dy: args.dy,
        noise_prop: args.noise,
        epsg: args.epsg,
        seed: args.seed,
        matching: if args.geographic {
            Matching::Geographic
        } else {
            Matching::Generated
        },
        ..GridSpec::default()
    };
    if let Some(origin) = args.origin {
        spec.origin_latlon = origin;
    }

    let mut grid = create_square_grid(&spec)?;
    vert_init_commodities(&mut grid.vertices, &args.commodities, &args.sources)?;
    let sorts = (!args.sorts.is_empty()).then_some(args.sorts.as_slice());
    let areas = (!args.areas.is_empty()).then_some(args.areas.as_slice());
    extend_edge_data(&mut grid.edges, DistributionStrategy::Equal, sorts, areas)?;

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating output directory '{}'", args.out_dir.display()))?;
    let vertex_path = args.out_dir.join("vertex.geojson");
    let edge_path = args.out_dir.join("edge.geojson");
    rivus_io::write_vertices(&vertex_path, &grid.vertices)?;
    rivus_io::write_edges(&edge_path, &grid.edges)?;
    info!(
        vertices = grid.vertices.len(),
        edges = grid.edges.len(),
        "generated grid"
    );

    print!("{}", char_plot(&grid.vertices, grid.num_vert_x, true));
    println!(
        "Wrote {} vertices to {} and {} edges to {}",
        grid.vertices.len(),
        vertex_path.display(),
        grid.edges.len(),
        edge_path.display()
    );
    Ok(())
}
