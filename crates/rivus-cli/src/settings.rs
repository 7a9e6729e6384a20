//! Layered settings: built-in defaults, `./rivus.toml`, an explicit
//! `--config` file and `RIVUS_*` environment variables, later sources
//! overriding earlier ones.
//!
//! Nested keys use a double underscore in the environment, e.g.
//! `RIVUS_SOLVER__TIME_LIMIT=600` or `RIVUS_DATABASE=sqlite://runs.db`.

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use rivus_algo::{ModelOptions, SolverOptions};
use rivus_viz::{Fig3dOptions, MapOptions};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SETTINGS_FILE: &str = "rivus";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Run database url used by `db` and as fallback for `batch`
    pub database: Option<String>,
    /// Name recorded in the run table
    pub runner: String,
    pub solver: SolverOptions,
    pub model: ModelOptions,
    pub map: MapOptions,
    pub fig3d: Fig3dOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: None,
            runner: "rivus".into(),
            solver: SolverOptions::default(),
            model: ModelOptions::default(),
            map: MapOptions::default(),
            fig3d: Fig3dOptions::default(),
        }
    }
}

impl Settings {
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let defaults =
            Config::try_from(&Settings::default()).context("encoding default settings")?;
        let mut builder = Config::builder()
            .add_source(defaults)
            .add_source(File::with_name(SETTINGS_FILE).required(false));
        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }
        let settings = builder
            .add_source(
                Environment::with_prefix("RIVUS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("reading settings")?
            .try_deserialize::<Settings>()
            .context("decoding settings")?;
        Ok(settings)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("encoding settings as TOML")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn explicit_file_overrides_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(
            &path,
            "database = \"sqlite://runs.db\"\n\n[solver]\ntime_limit = 60.0\n\n[model]\nfix_cost_share = 0.1\n",
        )
        .unwrap();
        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.database.as_deref(), Some("sqlite://runs.db"));
        assert_eq!(settings.solver.time_limit, Some(60.0));
        assert_eq!(settings.solver.mip_gap, None);
        assert_eq!(settings.model.fix_cost_share, 0.1);
        assert_eq!(settings.runner, "rivus");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(Settings::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn toml_output_reads_back() {
        let text = Settings::default().to_toml().unwrap();
        assert!(text.contains("[solver]"));
        let parsed: Settings = toml::from_str(&text).unwrap();
        assert_eq!(parsed, Settings::default());
    }
}
