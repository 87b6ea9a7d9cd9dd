use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by text extraction. Each kind maps to a distinct
/// user-facing message, so a malformed payload is never reported as an
/// empty one.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("unsupported document format '{0}' (expected pdf, docx, txt or json)")]
    UnsupportedFormat(String),

    #[error("document could not be parsed: {0}")]
    CorruptDocument(String),

    #[error("no text could be extracted from the document")]
    EmptyDocument,
}

/// Errors from the local inference backend.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model '{0}' is not installed or the backend is unreachable")]
    ModelUnavailable(String),

    #[error("model call exceeded its {} second deadline", .0.as_secs())]
    Timeout(Duration),

    #[error("inference backend returned malformed or empty output: {0}")]
    InferenceFailure(String),
}

/// Errors in session state handling.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no document is loaded in the current session")]
    NotFound,

    #[error("the document was replaced while the question was in flight")]
    SessionReplaced,
}
