//! Error types for this crate.
//!
//! All fallible operations return [`Result<T>`] which uses [`PipelineError`]
//! as the error type.

use thiserror::Error;

/// A [`Result`](std::result::Result) alias using [`PipelineError`] as the error type.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// The unified error type for all crate errors.
///
/// # Example
///
/// ```rust,no_run
/// use sentiment_pipeline::error::PipelineError;
///
/// fn handle_error(e: PipelineError) {
///     match &e {
///         PipelineError::Input(_) => {
///             // Bad input text - fix and retry
///         }
///         PipelineError::NotReady => {
///             // Pipeline still loading or training - retry once Ready
///         }
///         PipelineError::Persistence(_) => {
///             // Saved state unusable - the pipeline retrains on its own
///         }
///         PipelineError::Training(_) => {
///             // No usable model can be produced - fatal for the session
///         }
///         PipelineError::Unexpected(_) => {
///             // Internal error - report bug
///             eprintln!("Internal error: {e}");
///         }
///         _ => {
///             // Future error variants
///         }
///     }
/// }
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PipelineError {
    /// Empty or otherwise unusable input text. Fix the input and retry.
    #[error("{0}")]
    Input(String),

    /// `predict` was called before the pipeline reached `Ready`.
    #[error("pipeline is not ready; call ensure_ready() and retry")]
    NotReady,

    /// Invalid pipeline configuration. Fix the builder arguments.
    #[error("{0}")]
    Config(String),

    /// Training could not produce a usable model. Fatal for the session.
    #[error("{0}")]
    Training(String),

    /// Saved state could not be read or written.
    #[error("{0}")]
    Persistence(String),

    /// Internal error. Report if seen.
    #[error("{0}")]
    Unexpected(String),
}

impl From<candle_core::Error> for PipelineError {
    fn from(value: candle_core::Error) -> Self {
        PipelineError::Unexpected(value.to_string())
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(value: std::io::Error) -> Self {
        PipelineError::Persistence(value.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(value: serde_json::Error) -> Self {
        PipelineError::Persistence(value.to_string())
    }
}
