//! Curve errors

use thiserror::Error;

pub type CurveResult<T> = Result<T, CurveError>;

/// Errors raised while building, reading or writing motion curves
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CurveError {
    /// Empty curve, non-finite values or timestamps out of order
    #[error("Malformed curve: {0}")]
    Malformed(String),

    /// No curve available for a song or channel
    #[error("Missing data: {0}")]
    MissingData(String),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(String),

    /// Curve file could not be parsed or serialized
    #[error("Invalid curve file: {0}")]
    Format(String),
}
