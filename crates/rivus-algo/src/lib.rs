//! # rivus-algo: optimisation model and result analysis
//!
//! Builds and solves the rivus mixed-integer linear program: which street
//! edges carry which commodity, where hubs and vertex processes are built,
//! and how they are sized to cover peak and time-step demand at minimum
//! total cost.
//!
//! ## Model
//!
//! - [`Problem`]: derived sets and parameters (peak demand per edge,
//!   input/output ratios, hubs, neighbour lists)
//! - [`solve`]: formulation and solver dispatch ([`SolverKind`]); microlp is
//!   always built in, HiGHS and Clarabel behind the `solver-highs` and
//!   `solver-clarabel` features
//! - [`Solution`]: variable values per entity, queryable by name through
//!   the [`model::catalog`]
//!
//! ## Results
//!
//! - [`results`]: capacity pivots, time series and the CSV report
//! - [`archive`]: JSON archives of a run and cross-scenario reanalysis
//! - [`graph`]: one petgraph graph per built commodity with topology checks
//! - [`sweep`]: dataset variants for one-parameter sensitivity runs
//!
//! ## Example
//!
//! ```ignore
//! use rivus_algo::{solve, Problem, SolverOptions};
//!
//! let problem = Problem::new(data, network)?;
//! let outcome = solve(&problem, &SolverOptions::default());
//! if let Some(solution) = outcome.solution {
//!     println!("total cost: {:.2}", solution.total_cost());
//! }
//! ```

pub mod archive;
pub mod error;
pub mod graph;
pub mod model;
pub mod results;
pub mod sweep;
pub mod test_utils;

pub use archive::{
    load_result, reanalyse, save_result, write_reanalysis, Reanalysis, ResultArchive,
    ScenarioSummary,
};
pub use error::{ModelError, ModelResult};
pub use graph::{
    minimal_graph_analysis, to_dot, to_graphs, to_node_link_json, CommodityGraph, GraphAnalysis,
};
pub use model::{
    solve, CostType, EntityKind, EntityTable, ModelOptions, ModelStats, Problem, Solution,
    SolveOutcome, SolveStatus, SolverKind, SolverOptions,
};
pub use results::{constants, timeseries, write_report, CapacityTable, Constants, Timeseries};
pub use sweep::{parameter_range, sweep_values, ParameterVariant, SweepRange};
