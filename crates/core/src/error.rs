use thiserror::Error;

use crate::normalize::ParseError;
use crate::validate::SchemaError;

/// Errors produced while turning raw model text into a canonical quiz.
///
/// Callers branch on the kind: a `Parse` failure needs fresh model output,
/// a `Schema` failure points at the offending item(s).
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}
