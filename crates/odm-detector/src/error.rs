//! Detector error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Index {index} out of range for series of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

pub type DetectorResult<T> = Result<T, DetectorError>;
