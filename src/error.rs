//! Error types for the shipping estimate engine

use std::time::Duration;
use thiserror::Error;

/// Structural misuse of the estimation API.
///
/// Everything else (missing carrier, empty prices, incomplete items) degrades
/// to a fallback instead of surfacing here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EstimateError {
    /// Destination point identifier is blank
    #[error("destination point identifier is missing")]
    MissingDestination,

    /// Packaging plan claims zero packages
    #[error("packaging plan has no packages")]
    EmptyPlan,
}

/// Failures talking to the Carrier Pricing Service
#[derive(Error, Debug, Clone)]
pub enum CarrierError {
    /// No carrier endpoint is configured
    #[error("carrier pricing service is not configured")]
    Unavailable,

    /// The call did not finish within the configured bound
    #[error("carrier call timed out after {0:?}")]
    Timeout(Duration),

    /// Transport level failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// Carrier answered with a non-success status
    #[error("carrier returned status {0}")]
    Status(u16),

    /// Response body could not be decoded
    #[error("malformed carrier response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for CarrierError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            CarrierError::Malformed(err.to_string())
        } else {
            CarrierError::Http(err.to_string())
        }
    }
}

/// Problems loading or validating the engine configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Box catalog has no entries
    #[error("box catalog is empty")]
    EmptyCatalog,

    /// Catalog volumes must strictly increase
    #[error("box catalog is not in ascending volume order at '{0}'")]
    CatalogNotAscending(String),

    /// A catalog or default box exceeds the carrier clamp bounds
    #[error("box '{0}' lies outside the carrier size bounds")]
    BoxOutOfBounds(String),

    /// A surcharge or size step is zero or negative
    #[error("step '{0}' must be positive")]
    InvalidStep(&'static str),
}
