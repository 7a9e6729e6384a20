pub mod cli;
pub mod settings;

pub use cli::{build_cli_command, Cli, Commands, DbCommands, GraphFormat, PlotCommands};
pub use settings::Settings;
