//! The rivus mixed-integer model
//!
//! - [`Problem`]: indexed sets and parameters derived from a [`rivus_core::DataSet`]
//!   and a [`rivus_core::StreetNetwork`]
//! - formulation: decision variables and constraints on top of good_lp
//! - [`solve`]: solver dispatch with [`SolverOptions`]
//! - [`Solution`]: solved variable values keyed by entity
//! - [`catalog`]: names and descriptions of every set, parameter, variable and constraint

pub mod catalog;
mod formulation;
mod problem;
mod solution;
mod solver;

pub use catalog::{entity_info, list_entities, EntityInfo, EntityKind, ENTITIES};
pub use formulation::ModelStats;
pub use problem::{ArcKey, ModelOptions, Problem, DEFAULT_FIX_COST_SHARE};
pub use solution::{
    CostType, EdgeItemKey, EdgeTimeKey, EntityTable, EntityValues, KeyLabels, ProcessFlowKey,
    Solution, VertexItemKey, VertexTimeKey,
};
pub use solver::{solve, SolveOutcome, SolveStatus, SolverKind, SolverOptions};
