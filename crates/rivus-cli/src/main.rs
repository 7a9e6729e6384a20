use clap::Parser;
use rivus_cli::{Cli, Commands, Settings};
use std::io;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod commands;

fn init_logging(level: tracing::Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    match &cli.command {
        Commands::Grid(args) => commands::grid::handle(args),
        Commands::Snap(args) => commands::snap::handle(args),
        Commands::Solve(args) => commands::solve::handle(args, &settings),
        Commands::Report { archive, out } => commands::report::handle(archive, out),
        Commands::Reanalyse { dir, out } => commands::reanalyse::handle(dir, out.as_deref()),
        Commands::Graph {
            archive,
            out,
            format,
            spanning,
        } => commands::graph::handle(archive, out.as_deref(), *format, *spanning),
        Commands::Plot { command } => commands::plot::handle(command, &settings),
        Commands::Batch {
            spec,
            out,
            threads,
            database,
        } => commands::batch::handle(spec, out, *threads, database.as_deref(), &settings),
        Commands::Db { command } => commands::db::handle(command, &settings),
        Commands::Config => commands::config::handle(&settings),
        Commands::Completions { shell, out } => commands::completions::handle(*shell, out.as_deref()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level);
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
