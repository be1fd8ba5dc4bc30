//! Error taxonomy shared by every solver variant.

use thiserror::Error;

/// Errors that can occur while solving a dense linear system.
///
/// All variants are final: no solver attempts local recovery, and a failed
/// solve leaves the returned solution unspecified.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    /// A pivot candidate, or the final diagonal entry, fell below the pivot
    /// tolerance. Agreed on by every worker before any of them returns.
    #[error("matrix is singular or nearly singular")]
    SingularMatrix,

    /// The system size or worker count cannot describe a solvable problem.
    #[error("invalid dimension: n = {n}, workers = {workers}")]
    InvalidDimension { n: usize, workers: usize },

    /// The coefficient matrix and the right-hand side disagree on the size.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// A fabric-level fault (disconnected peer, malformed message, worker
    /// panic). Fatal and never retried.
    #[error("communication failure: {0}")]
    CommunicationFailure(String),
}
