//! Errors surfaced by the inliner.
//!
//! Malformed CSS and selectors the matcher cannot handle are not errors:
//! they are logged and the affected rules are kept in the residual
//! stylesheet. Only input that cannot be processed at all fails a call.

use thiserror::Error;

/// Failure of an inlining call or of engine construction.
#[derive(Debug, Error)]
pub enum InlinerError {
    /// The HTML input is empty, cannot be parsed, or the JSON envelope has
    /// no string `html` member.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A configured regular expression or attribute rule is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The JSON envelope or configuration document is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<regex::Error> for InlinerError {
    fn from(err: regex::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<mordant_html::ParseError> for InlinerError {
    fn from(err: mordant_html::ParseError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}
