//! Solver selection, option handling and the solve entry point.

use super::formulation::{formulate, Formulation, ModelStats};
use super::problem::Problem;
use super::solution::Solution;
use crate::error::{ModelError, ModelResult};
#[cfg(feature = "solver-clarabel")]
use good_lp::solvers::clarabel::clarabel as clarabel_solver;
#[cfg(feature = "solver-highs")]
use good_lp::solvers::highs::highs as highs_solver;
use good_lp::solvers::microlp::microlp as microlp_solver;
use good_lp::{Constraint, ResolutionError, Solution as _, SolverModel};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// MILP backend used through `good_lp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    /// Pure-Rust branch and bound, always available
    #[default]
    MicroLp,
    #[cfg(feature = "solver-highs")]
    Highs,
    /// Interior point LP solver; binaries are relaxed to `[0, 1]`
    #[cfg(feature = "solver-clarabel")]
    Clarabel,
}

const AVAILABLE_SOLVERS: &[&str] = &[
    "microlp",
    #[cfg(feature = "solver-highs")]
    "highs",
    #[cfg(feature = "solver-clarabel")]
    "clarabel",
];

impl SolverKind {
    pub fn available() -> &'static [&'static str] {
        AVAILABLE_SOLVERS
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SolverKind::MicroLp => "microlp",
            #[cfg(feature = "solver-highs")]
            SolverKind::Highs => "highs",
            #[cfg(feature = "solver-clarabel")]
            SolverKind::Clarabel => "clarabel",
        }
    }

    /// Whether the backend only solves the LP relaxation.
    pub fn relaxes_integers(&self) -> bool {
        match self {
            SolverKind::MicroLp => false,
            #[cfg(feature = "solver-highs")]
            SolverKind::Highs => false,
            #[cfg(feature = "solver-clarabel")]
            SolverKind::Clarabel => true,
        }
    }

    /// Whether the backend stops at `SolverOptions::time_limit`.
    pub fn applies_time_limit(&self) -> bool {
        match self {
            SolverKind::MicroLp => false,
            #[cfg(feature = "solver-highs")]
            SolverKind::Highs => true,
            #[cfg(feature = "solver-clarabel")]
            SolverKind::Clarabel => false,
        }
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn unknown_solver_error(label: &str) -> ModelError {
    ModelError::UnknownSolver {
        name: label.to_string(),
        supported: SolverKind::available().join(", "),
    }
}

impl FromStr for SolverKind {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.to_ascii_lowercase();
        match normalized.as_str() {
            "microlp" | "default" => Ok(SolverKind::MicroLp),
            "highs" => {
                #[cfg(feature = "solver-highs")]
                {
                    Ok(SolverKind::Highs)
                }
                #[cfg(not(feature = "solver-highs"))]
                {
                    Err(unknown_solver_error(&normalized))
                }
            }
            "clarabel" => {
                #[cfg(feature = "solver-clarabel")]
                {
                    Ok(SolverKind::Clarabel)
                }
                #[cfg(not(feature = "solver-clarabel"))]
                {
                    Err(unknown_solver_error(&normalized))
                }
            }
            other => Err(unknown_solver_error(other)),
        }
    }
}

/// Backend options. Options a backend cannot take are logged and ignored.
///
/// Limits are unset by default; set them for HiGHS, which honours both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    pub solver: SolverKind,
    /// Wall clock limit in seconds
    pub time_limit: Option<f64>,
    /// Relative MIP gap at which the search stops
    pub mip_gap: Option<f64>,
    /// Worker threads, 0 uses every core
    pub threads: usize,
    pub log_file: Option<PathBuf>,
    pub log_to_console: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            solver: SolverKind::default(),
            time_limit: None,
            mip_gap: None,
            threads: 0,
            log_file: None,
            log_to_console: false,
        }
    }
}

impl SolverOptions {
    pub fn effective_threads(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }

    fn warn_unsupported(&self) {
        let solver = self.solver.as_str();
        if self.time_limit.is_some() {
            warn!(solver, "time_limit is not supported by this solver; ignoring");
        }
        if self.mip_gap.is_some() && !self.solver.relaxes_integers() {
            warn!(solver, "mip_gap is not supported by this solver; ignoring");
        }
        if self.threads > 1 {
            warn!(solver, "threads is not supported by this solver; ignoring");
        }
        if self.log_file.is_some() {
            warn!(solver, "log_file is not supported by this solver; ignoring");
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    Optimal,
    /// A solution returned by a backend that stopped at its time limit
    LimitReached,
    Infeasible,
    Error,
}

impl SolveStatus {
    pub fn has_solution(&self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::LimitReached)
    }
}

/// What a solve produced, including failures.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    pub solver: SolverKind,
    pub solution: Option<Solution>,
    pub stats: ModelStats,
    pub duration: Duration,
    pub message: Option<String>,
}

impl SolveOutcome {
    pub fn into_solution(self) -> ModelResult<Solution> {
        match (self.status, self.solution) {
            (status, Some(solution)) if status.has_solution() => Ok(solution),
            (SolveStatus::Infeasible, _) => Err(ModelError::Infeasible),
            _ => Err(ModelError::Solver {
                solver: self.solver.as_str(),
                message: self.message.unwrap_or_else(|| "no solution".to_string()),
            }),
        }
    }
}

/// Formulates `problem` and hands it to the configured backend.
pub fn solve(problem: &Problem, options: &SolverOptions) -> SolveOutcome {
    let start = Instant::now();
    let formulation = formulate(problem, options.solver.relaxes_integers());
    let stats = formulation.stats.clone();
    info!(
        solver = options.solver.as_str(),
        variables = stats.variables,
        binaries = stats.binaries,
        constraints = stats.constraint_count(),
        "solving model"
    );

    let result = run_solver(formulation, options);
    let duration = start.elapsed();
    match result {
        Ok(solution) => {
            let limit_hit = options.solver.applies_time_limit()
                && options
                    .time_limit
                    .is_some_and(|limit| duration.as_secs_f64() >= limit);
            let status = if limit_hit {
                SolveStatus::LimitReached
            } else {
                SolveStatus::Optimal
            };
            info!(
                objective = solution.objective,
                seconds = duration.as_secs_f64(),
                ?status,
                "model solved"
            );
            SolveOutcome {
                status,
                solver: options.solver,
                solution: Some(solution),
                stats,
                duration,
                message: None,
            }
        }
        Err(err) => {
            warn!(error = %err, seconds = duration.as_secs_f64(), "solve failed");
            let status = match err {
                ModelError::Infeasible => SolveStatus::Infeasible,
                _ => SolveStatus::Error,
            };
            SolveOutcome {
                status,
                solver: options.solver,
                solution: None,
                stats,
                duration,
                message: Some(err.to_string()),
            }
        }
    }
}

fn run_solver(formulation: Formulation, options: &SolverOptions) -> ModelResult<Solution> {
    let Formulation {
        vars,
        handles,
        objective,
        constraints,
        ..
    } = formulation;
    let unsolved = vars.minimise(objective);
    let solver = options.solver.as_str();

    let solution: Box<dyn good_lp::Solution> = match options.solver {
        SolverKind::MicroLp => {
            options.warn_unsupported();
            let problem = add_model_constraints(unsolved.using(microlp_solver), constraints);
            Box::new(problem.solve().map_err(|e| resolution_error(solver, e))?)
        }
        #[cfg(feature = "solver-highs")]
        SolverKind::Highs => {
            let problem = configure_highs(unsolved.using(highs_solver), options);
            let problem = add_model_constraints(problem, constraints);
            Box::new(problem.solve().map_err(|e| resolution_error(solver, e))?)
        }
        #[cfg(feature = "solver-clarabel")]
        SolverKind::Clarabel => {
            options.warn_unsupported();
            warn!("clarabel solves the LP relaxation; binaries are fractional");
            let problem = add_model_constraints(unsolved.using(clarabel_solver), constraints);
            Box::new(problem.solve().map_err(|e| resolution_error(solver, e))?)
        }
    };

    let values = handles.map(|var| solution.value(var));
    let objective = values.costs.values().sum();
    Ok(Solution { objective, values })
}

fn add_model_constraints<M>(mut problem: M, constraints: Vec<Constraint>) -> M
where
    M: SolverModel,
{
    for constraint in constraints {
        problem = problem.with(constraint);
    }
    problem
}

#[cfg(feature = "solver-highs")]
fn configure_highs(
    problem: good_lp::solvers::highs::HighsProblem,
    options: &SolverOptions,
) -> good_lp::solvers::highs::HighsProblem {
    let mut problem = problem
        .set_option("threads", options.effective_threads() as i32)
        .set_option("log_to_console", options.log_to_console)
        .set_option("output_flag", options.log_to_console || options.log_file.is_some());
    if let Some(limit) = options.time_limit {
        problem = problem.set_option("time_limit", limit);
    }
    if let Some(gap) = options.mip_gap {
        problem = problem.set_option("mip_rel_gap", gap);
    }
    if let Some(path) = &options.log_file {
        problem = problem.set_option("log_file", path.to_string_lossy().as_ref());
    }
    problem
}

fn resolution_error(solver: &'static str, err: ResolutionError) -> ModelError {
    match err {
        ResolutionError::Infeasible => ModelError::Infeasible,
        ResolutionError::Unbounded => ModelError::Unbounded,
        other => ModelError::Solver {
            solver,
            message: other.to_string(),
        },
    }
}
