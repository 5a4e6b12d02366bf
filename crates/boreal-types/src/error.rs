use thiserror::Error;

/// Library-level error type for the decision engine.
///
/// Application code (the CLI, batch runners) wraps these in `anyhow::Result`
/// and adds context; the engine itself never depends on `anyhow`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid trace: {0}")]
    InvalidTrace(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("LP solver unavailable or non-optimal: {0}")]
    SolverUnavailable(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
