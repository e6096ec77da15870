//! Error types for the assembler core.

use thiserror::Error;

/// Errors surfaced by subtask dispatch.
///
/// These are recorded as data on failed subtask results rather than
/// propagated; a single failed dispatch never aborts the surrounding
/// execution on its own.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// No team member's capability tags overlap the subtask's requirements.
    #[error("No suitable agent found")]
    NoSuitableAgent,

    /// The dispatch exceeded the configured timeout. Distinct from a
    /// handler-raised error; carries the configured timeout value.
    #[error("Timeout after {seconds}s")]
    Timeout { seconds: f64 },

    /// An error surfaced by the agent handler, message preserved verbatim.
    #[error("{message}")]
    Handler { message: String },
}

/// Errors from the external search provider contract.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The provider exists but has not been initialized.
    #[error("Search provider is not initialized")]
    Uninitialized,

    /// The provider failed to answer the query.
    #[error("Search provider error: {message}")]
    Provider { message: String },
}

/// Errors from the external task-decomposition contract.
///
/// Any of these triggers the deterministic fallbacks in the task analyzer.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// No decomposition provider was configured.
    #[error("Decomposition provider is not available")]
    Unavailable,

    /// The provider failed to produce a usable answer.
    #[error("Decomposition provider error: {message}")]
    Provider { message: String },
}
