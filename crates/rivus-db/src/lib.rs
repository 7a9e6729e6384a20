//! # rivus-db: run database
//!
//! A SQLite database (via `sqlx`) with one `run` row per model run and
//! result tables keyed by `run_id`:
//!
//! | Table | Content |
//! |---|---|
//! | `run` | runner, start/end timestamps, status, outcome, phase durations |
//! | `demand` | summed peak demand per commodity |
//! | `cost` | costs per cost type |
//! | `edge_capacity`, `hub_capacity`, `process_capacity` | built capacities |
//! | `source` | source use per vertex, commodity and time step |
//! | `graph_analysis` | connectivity of every commodity network |
//!
//! ```ignore
//! let store = RunStore::connect("sqlite://runs.db").await?;
//! store.init_schema().await?;
//! let run_id = store.init_run(&RunInit::default()).await?;
//! store.store(run_id, &problem, &solution, &analysis).await?;
//! store.finish_run(run_id, RunStatus::Run, RunOutcome::Optimum, &durations).await?;
//! ```

pub mod run;
pub mod store;

pub use run::{start_timestamp, PhaseDurations, RunInit, RunOutcome, RunStatus, TIMESTAMP_FORMAT};
pub use store::{ResultTable, RunRecord, RunStore};
