//! Errors raised while building or checking rivus inputs.
//!
//! Library crates return [`RivusError`] at their API boundaries; command line
//! and batch code wrap it in `anyhow` with context.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RivusError {
    /// Input tables or parameters that do not fit together
    #[error("invalid input: {0}")]
    Validation(String),

    /// Degenerate lines, points that cannot be placed on a geometry
    #[error("geometry error: {0}")]
    Geometry(String),

    /// Street networks with dangling, duplicate or looping edges
    #[error("street network error: {0}")]
    Network(String),

    /// Settings outside their admissible range (sweep steps, fixed cost share)
    #[error("configuration error: {0}")]
    Config(String),
}

pub type RivusResult<T> = Result<T, RivusError>;
