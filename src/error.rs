//! Error taxonomy for the model-checking core.
//!
//! `Unsat` is deliberately absent here: per the design, "no satisfying
//! assignment" is not an error, it is reported as `Ok(None)` from every
//! `find`/`maximize`/`minimize` call.

use thiserror::Error;

/// Crate-wide result alias.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors a query can abort with.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The chosen backend cannot encode a required operator.
    #[error("backend {backend} cannot encode operator {operator}")]
    Unsupported {
        backend: &'static str,
        operator: &'static str,
    },

    /// The solver did not finish within the caller-provided deadline.
    /// The solver instance that produced this error must be discarded,
    /// never reused.
    #[error("solver timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    /// The backend reported an internal failure, surfaced verbatim.
    #[error("solver failure: {0}")]
    SolverFailure(String),

    /// A programming error: a malformed DAG, a merge across variants, or
    /// an argument identifier with no binding. Fatal; never retried.
    #[error("invariant violated: {0}")]
    InvariantViolated(String),
}

impl CoreError {
    pub fn unsupported(backend: &'static str, operator: &'static str) -> Self {
        CoreError::Unsupported { backend, operator }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        CoreError::InvariantViolated(message.into())
    }
}
