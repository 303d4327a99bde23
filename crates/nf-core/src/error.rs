//! Error types for nufit

use thiserror::Error;

/// nufit error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Validation error (bad configuration, inconsistent inputs)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Computation error
    #[error("Computation error: {0}")]
    Computation(String),

    /// No channel is registered under this sample name
    #[error("Unknown sample: {0}")]
    UnknownSample(String),

    /// Covariance matrix could not be inverted
    #[error("Singular covariance for sample '{0}'")]
    SingularCovariance(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
