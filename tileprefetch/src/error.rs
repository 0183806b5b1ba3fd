//! Error types for the prefetch core.

use thiserror::Error;

/// Result type for prefetch core operations.
pub type PrefetchResult<T> = Result<T, PrefetchError>;

/// Errors raised by the prefetch core.
///
/// Fetch failures never appear here; they belong to the fetcher.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PrefetchError {
    /// `pop_last` was called on an empty key set.
    ///
    /// Callers must check the length first, so this indicates a contract
    /// violation rather than a runtime condition.
    #[error("Tile key set is empty")]
    EmptyQueue,

    /// No tokio runtime was available to drive fetch completions.
    #[error("No tokio runtime available: {0}")]
    NoRuntime(String),
}
