use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rivus_algo::load_result;
use rivus_cli::cli::MapModeArg;
use rivus_cli::{PlotCommands, Settings};
use rivus_viz::{fig3d, map_svg, MapMode};

pub fn handle(command: &PlotCommands, settings: &Settings) -> Result<()> {
    match command {
        PlotCommands::Map {
            archive,
            commodity,
            mode,
            linescale,
            out,
        } => {
            let archive = load_result(archive)?;
            let problem = archive.problem()?;
            let mut options = settings.map;
            if let Some(mode) = mode {
                options.mode = match mode {
                    MapModeArg::Capacity => MapMode::Capacity,
                    MapModeArg::Demand => MapMode::Demand,
                };
            }
            if let Some(scale) = linescale {
                options.linescale = *scale;
            }
            let svg = map_svg(&problem, archive.solution.as_ref(), commodity, &options)?;
            write_figure(out, &svg)
        }
        PlotCommands::Fig3d {
            archive,
            commodities,
            hubs,
            linescale,
            out,
        } => {
            let archive = load_result(archive)?;
            let problem = archive.problem()?;
            let solution = archive
                .solution
                .as_ref()
                .with_context(|| format!("archive holds no solution (status {:?})", archive.status))?;
            let mut options = settings.fig3d;
            options.use_hubs |= *hubs;
            if let Some(scale) = linescale {
                options.linescale = *scale;
            }
            let layers = (!commodities.is_empty()).then_some(commodities.as_slice());
            let figure = fig3d(&problem, solution, layers, &options)?;
            let json = serde_json::to_string(&figure).context("serializing 3-D figure")?;
            write_figure(out, &json)
        }
    }
}

fn write_figure(path: &Path, body: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating figure directory '{}'", parent.display()))?;
    }
    fs::write(path, body).with_context(|| format!("writing figure {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}
