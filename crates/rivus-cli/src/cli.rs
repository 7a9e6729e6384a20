use clap::{CommandFactory, Parser, Subcommand, ValueEnum, ValueHint};
use clap_complete::Shell;
use rivus_algo::SolverKind;
use rivus_geo::SourceSetting;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rivus", author, version, about = "Multi-commodity energy network planning", long_about = None)]
pub struct Cli {
    /// Set the logging level (RUST_LOG directives take precedence)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: tracing::Level,

    /// Settings file read after ./rivus.toml
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a square street grid as vertex and edge GeoJSON
    Grid(GridArgs),
    /// Clean a line layer: split at crossings, snap loose ends, prune and merge
    Snap(SnapArgs),
    /// Solve a dataset on a street network and archive the result
    Solve(SolveArgs),
    /// Write the CSV report of an archived result
    Report {
        #[arg(long, value_hint = ValueHint::FilePath)]
        archive: PathBuf,
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        out: PathBuf,
    },
    /// Compare every archive in a directory
    Reanalyse {
        #[arg(long, value_hint = ValueHint::DirPath)]
        dir: PathBuf,
        /// Directory for the comparison CSVs (defaults to --dir)
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        out: Option<PathBuf>,
    },
    /// Export and analyse the commodity networks of an archived result
    Graph {
        #[arg(long, value_hint = ValueHint::FilePath)]
        archive: PathBuf,
        /// Directory for one graph file per commodity
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        out: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = GraphFormat::Dot)]
        format: GraphFormat,
        /// Also check whether each network is a spanning tree
        #[arg(long)]
        spanning: bool,
    },
    /// Figures of an archived result
    Plot {
        #[command(subcommand)]
        command: PlotCommands,
    },
    /// Run a batch spec (YAML or JSON)
    Batch {
        #[arg(long, value_hint = ValueHint::FilePath)]
        spec: PathBuf,
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        out: PathBuf,
        /// Override the spec's thread count (0 = all cores)
        #[arg(long)]
        threads: Option<usize>,
        /// Override the spec's database url
        #[arg(long)]
        database: Option<String>,
    },
    /// Run database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Print the effective settings as TOML
    Config,
    /// Generate shell completion scripts
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
        /// Write output to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
pub struct GridArgs {
    /// Edges along x
    #[arg(long, default_value_t = 5)]
    pub num_edge_x: usize,
    /// Edges along y (defaults to --num-edge-x)
    #[arg(long)]
    pub num_edge_y: Option<usize>,
    /// Horizontal edge length (m)
    #[arg(long, default_value_t = 100.0)]
    pub dx: f64,
    /// Vertical edge length (m, defaults to --dx)
    #[arg(long)]
    pub dy: Option<f64>,
    /// Bottom-left vertex as LAT,LON
    #[arg(long, value_parser = parse_latlon)]
    pub origin: Option<(f64, f64)>,
    /// Relative vertex misplacement
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,
    #[arg(long)]
    pub seed: Option<u64>,
    /// UTM zone (326xx/327xx) to build the grid in
    #[arg(long)]
    pub epsg: Option<u32>,
    /// Match edge ends to vertices by geometry instead of generation order
    #[arg(long)]
    pub geographic: bool,
    /// Source capacity as COMMODITY:VERTEX:CAPACITY, repeatable
    #[arg(long = "source", value_parser = parse_source)]
    pub sources: Vec<SourceSetting>,
    /// Commodities every vertex gets a source column for
    #[arg(long, value_delimiter = ',', default_value = "Elec,Gas,Heat")]
    pub commodities: Vec<String>,
    /// Building types assigned to every edge
    #[arg(long, value_delimiter = ',')]
    pub sorts: Vec<String>,
    /// Area (m²) per building type
    #[arg(long, value_delimiter = ',')]
    pub areas: Vec<f64>,
    #[arg(short, long, value_hint = ValueHint::DirPath)]
    pub out_dir: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct SnapArgs {
    /// GeoJSON line layer
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub input: PathBuf,
    /// Cleaned line layer
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub out: PathBuf,
    /// Loose ends within this distance are snapped onto their neighbours
    #[arg(long, default_value_t = 0.0001)]
    pub max_distance: f64,
    /// Lines shorter than this are pruned
    #[arg(long, default_value_t = 0.0)]
    pub min_length: f64,
    /// Also write vertices and edges derived from the cleaned lines
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub network_dir: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct SolveArgs {
    /// Directory with the dataset CSV tables
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub data: PathBuf,
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub vertex: PathBuf,
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub edge: PathBuf,
    /// Building polygons whose areas replace the edge areas
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub buildings: Option<PathBuf>,
    #[arg(short, long, value_hint = ValueHint::DirPath)]
    pub out: PathBuf,
    /// Scenario name; the archive is written to scenario_<name>.json
    #[arg(long, default_value = "run")]
    pub name: String,
    #[arg(long)]
    pub solver: Option<SolverKind>,
    /// Time limit in seconds
    #[arg(long)]
    pub time_limit: Option<f64>,
    /// Solve without the configured time limit
    #[arg(long, conflicts_with = "time_limit")]
    pub no_time_limit: bool,
    #[arg(long)]
    pub mip_gap: Option<f64>,
    /// Skip the CSV report
    #[arg(long)]
    pub no_report: bool,
}

#[derive(Subcommand, Debug)]
pub enum PlotCommands {
    /// SVG map of one commodity
    Map {
        #[arg(long, value_hint = ValueHint::FilePath)]
        archive: PathBuf,
        #[arg(long)]
        commodity: String,
        #[arg(long, value_enum)]
        mode: Option<MapModeArg>,
        #[arg(long)]
        linescale: Option<f64>,
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: PathBuf,
    },
    /// Layered 3-D figure as plotly JSON
    Fig3d {
        #[arg(long, value_hint = ValueHint::FilePath)]
        archive: PathBuf,
        /// Layers bottom to top (defaults to the built commodities)
        #[arg(long, value_delimiter = ',')]
        commodities: Vec<String>,
        /// Draw hubs as connectors between layers
        #[arg(long)]
        hubs: bool,
        #[arg(long)]
        linescale: Option<f64>,
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum DbCommands {
    /// Create the run database tables
    Init {
        /// Database url (defaults to the configured one)
        #[arg(long)]
        url: Option<String>,
    },
    /// Show one run with its costs
    Show {
        run_id: i64,
        #[arg(long)]
        url: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphFormat {
    Dot,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapModeArg {
    Capacity,
    Demand,
}

pub fn parse_latlon(value: &str) -> Result<(f64, f64), String> {
    let (lat, lon) = value
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON, got '{value}'"))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<f64>()
            .map_err(|err| format!("invalid coordinate '{s}': {err}"))
    };
    Ok((parse(lat)?, parse(lon)?))
}

pub fn parse_source(value: &str) -> Result<SourceSetting, String> {
    let parts: Vec<&str> = value.split(':').collect();
    let [commodity, vertex, capacity] = parts.as_slice() else {
        return Err(format!("expected COMMODITY:VERTEX:CAPACITY, got '{value}'"));
    };
    let vertex = vertex
        .parse::<usize>()
        .map_err(|err| format!("invalid vertex '{vertex}': {err}"))?;
    let capacity = capacity
        .parse::<f64>()
        .map_err(|err| format!("invalid capacity '{capacity}': {err}"))?;
    Ok(SourceSetting::new(*commodity, vertex, capacity))
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        build_cli_command().debug_assert();
    }

    #[test]
    fn parses_sources_and_origins() {
        assert_eq!(
            parse_source("Gas:4:500").unwrap(),
            SourceSetting::new("Gas", 4, 500.0)
        );
        assert!(parse_source("Gas:4").is_err());
        assert!(parse_source("Gas:x:1").is_err());
        assert_eq!(parse_latlon("48.1, 11.5").unwrap(), (48.1, 11.5));
        assert!(parse_latlon("48.1").is_err());
    }

    #[test]
    fn time_limit_flags_conflict() {
        let solve = |extra: &[&str]| {
            let mut args = vec!["rivus", "solve", "--data", "d", "--vertex", "v", "--edge", "e"];
            args.extend(["-o", "out"]);
            args.extend_from_slice(extra);
            Cli::try_parse_from(args)
        };
        let Commands::Solve(args) = solve(&["--no-time-limit"]).unwrap().command else {
            panic!("expected solve");
        };
        assert!(args.no_time_limit);
        assert!(solve(&["--no-time-limit", "--time-limit", "5"]).is_err());
    }
}
