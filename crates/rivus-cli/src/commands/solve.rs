use anyhow::{bail, Result};
use rivus_algo::{save_result, solve, write_report, Problem, ResultArchive};
use rivus_cli::cli::SolveArgs;
use rivus_cli::Settings;
use rivus_core::StreetNetwork;
use tracing::info;

pub fn handle(args: &SolveArgs, settings: &Settings) -> Result<()> {
    let data = rivus_io::read_dataset(&args.data)?;
    let vertices = rivus_io::read_vertices(&args.vertex)?;
    let mut edges = rivus_io::read_edges(&args.edge)?;
    if let Some(path) = &args.buildings {
        let buildings = rivus_io::read_buildings(path)?;
        rivus_io::aggregate_building_areas(&buildings, &mut edges)?;
        info!(buildings = buildings.len(), "aggregated building areas");
    }
    let network = StreetNetwork::from_parts(vertices, edges)?;
    let problem = Problem::with_options(data, network, settings.model)?;

    let mut options = settings.solver.clone();
    if let Some(solver) = args.solver {
        options.solver = solver;
    }
    if args.no_time_limit {
        options.time_limit = None;
    } else if args.time_limit.is_some() {
        options.time_limit = args.time_limit;
    }
    if args.mip_gap.is_some() {
        options.mip_gap = args.mip_gap;
    }

    let outcome = solve(&problem, &options);
    let archive_path = args.out.join(format!("scenario_{}.json", args.name));
    save_result(&archive_path, &ResultArchive::new(&problem, &outcome))?;
    println!(
        "Solved with {} in {:.2}s: {:?} ({} variables, {} constraints)",
        outcome.solver,
        outcome.duration.as_secs_f64(),
        outcome.status,
        outcome.stats.variables,
        outcome.stats.constraint_count()
    );
    println!("Archive: {}", archive_path.display());

    let status = outcome.status;
    let Some(solution) = outcome.solution.filter(|_| status.has_solution()) else {
        bail!(
            "no solution ({status:?}){}",
            outcome
                .message
                .map(|m| format!(": {m}"))
                .unwrap_or_default()
        );
    };
    println!("Total cost: {:.2}", solution.total_cost());

    if !args.no_report {
        let report_dir = args.out.join(&args.name).join("report");
        let written = write_report(&problem, &solution, &report_dir)?;
        println!("Report: {} tables in {}", written.len(), report_dir.display());
    }
    Ok(())
}
