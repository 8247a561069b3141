//! Feed error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FeedError {
    /// Short label used for drop-reason metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::ParseError(_) => "parse",
            Self::MissingField(_) => "missing_field",
            Self::InvalidData(_) => "invalid_data",
            Self::Json(_) => "json",
        }
    }
}

impl From<odm_core::CoreError> for FeedError {
    fn from(e: odm_core::CoreError) -> Self {
        Self::InvalidData(e.to_string())
    }
}

pub type FeedResult<T> = Result<T, FeedError>;
