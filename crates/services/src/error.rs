//! Shared error types for the services crate.

use thiserror::Error;

/// Errors emitted by the model transport.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    #[error("model access is not configured")]
    Disabled,
    #[error("model returned an empty response")]
    EmptyResponse,
    #[error("model request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by `QuizSession`.
///
/// `NoSelection` is a user-input error: the submit transition is refused and
/// the session state is left untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("quiz has no items")]
    Empty,
    #[error("quiz already completed")]
    Completed,
    #[error("no choice selected")]
    NoSelection,
    #[error("current item has not been answered yet")]
    NotAnswered,
    #[error("answer has not been revealed yet")]
    NotRevealed,
}

/// Errors emitted while generating a quiz from model output.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerateError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Quiz(#[from] quiz_core::Error),
}
