//! Run bookkeeping values shared by the store and the batch runner.

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Prepared,
    Run,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    NotRun,
    Optimum,
    OptimumNotReached,
    Error,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Prepared => "prepared",
            RunStatus::Run => "run",
            RunStatus::Error => "error",
        }
    }
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunOutcome::NotRun => "not_run",
            RunOutcome::Optimum => "optimum",
            RunOutcome::OptimumNotReached => "optimum_not_reached",
            RunOutcome::Error => "error",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prepared" => Ok(RunStatus::Prepared),
            "run" => Ok(RunStatus::Run),
            "error" => Ok(RunStatus::Error),
            other => Err(format!("unknown run status '{other}'")),
        }
    }
}

impl FromStr for RunOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_run" => Ok(RunOutcome::NotRun),
            "optimum" => Ok(RunOutcome::Optimum),
            "optimum_not_reached" => Ok(RunOutcome::OptimumNotReached),
            "error" => Ok(RunOutcome::Error),
            other => Err(format!("unknown run outcome '{other}'")),
        }
    }
}

/// Fields of a new run row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInit {
    pub runner: String,
    /// `YYYY-MM-DD HH:MM:SS`; anything unparsable is replaced by now
    pub start_ts: Option<String>,
    pub status: RunStatus,
    pub outcome: RunOutcome,
}

impl Default for RunInit {
    fn default() -> Self {
        Self {
            runner: "rivus".into(),
            start_ts: None,
            status: RunStatus::Prepared,
            outcome: RunOutcome::NotRun,
        }
    }
}

/// Wall-clock seconds per phase of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseDurations {
    pub pre: Option<f64>,
    pub solve: Option<f64>,
    pub post: Option<f64>,
    pub plot: Option<f64>,
}

/// Normalised start timestamp.
pub fn start_timestamp(start_ts: Option<&str>) -> String {
    start_ts
        .and_then(|ts| NaiveDateTime::parse_from_str(ts.trim(), TIMESTAMP_FORMAT).ok())
        .unwrap_or_else(|| Utc::now().naive_utc())
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_are_kept_or_replaced() {
        assert_eq!(
            start_timestamp(Some("2017-05-04 10:11:12")),
            "2017-05-04 10:11:12"
        );
        let now = start_timestamp(Some("yesterday"));
        assert!(NaiveDateTime::parse_from_str(&now, TIMESTAMP_FORMAT).is_ok());
        assert_ne!(now, "yesterday");
    }

    #[test]
    fn labels_round_trip() {
        for outcome in [
            RunOutcome::NotRun,
            RunOutcome::Optimum,
            RunOutcome::OptimumNotReached,
            RunOutcome::Error,
        ] {
            assert_eq!(outcome.as_str().parse::<RunOutcome>(), Ok(outcome));
        }
        assert!("done".parse::<RunStatus>().is_err());
    }
}
