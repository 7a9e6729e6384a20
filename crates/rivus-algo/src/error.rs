//! Errors raised while assembling and solving a model.

use rivus_core::RivusError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    /// Inputs that cannot form a model (unknown references, empty sets)
    #[error("invalid model input: {0}")]
    Input(#[from] RivusError),

    /// The backend proved the model infeasible
    #[error("model is infeasible")]
    Infeasible,

    /// The backend proved the model unbounded
    #[error("model is unbounded")]
    Unbounded,

    /// Any other backend failure
    #[error("{solver} failed: {message}")]
    Solver { solver: &'static str, message: String },

    /// A solver name that is unknown or not compiled in
    #[error("unknown solver '{name}'; supported values: {supported}")]
    UnknownSolver { name: String, supported: String },

    /// Lookup of an entity that the catalog does not know
    #[error("unknown entity '{0}'")]
    UnknownEntity(String),
}

pub type ModelResult<T> = Result<T, ModelError>;

impl From<good_lp::ResolutionError> for ModelError {
    fn from(err: good_lp::ResolutionError) -> Self {
        match err {
            good_lp::ResolutionError::Infeasible => ModelError::Infeasible,
            good_lp::ResolutionError::Unbounded => ModelError::Unbounded,
            other => ModelError::Solver {
                solver: "solver",
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_keep_their_message() {
        let err: ModelError = RivusError::Validation("no time steps".into()).into();
        assert!(err.to_string().contains("no time steps"));
    }

    #[test]
    fn resolution_errors_map_to_variants() {
        assert!(matches!(
            ModelError::from(good_lp::ResolutionError::Infeasible),
            ModelError::Infeasible
        ));
        assert!(matches!(
            ModelError::from(good_lp::ResolutionError::Unbounded),
            ModelError::Unbounded
        ));
    }
}
