//! Error types for the clustering engine.

use crate::index::ClusterId;
use thiserror::Error;

/// Errors surfaced by the clustering engine.
///
/// Empty queries and oversized clusters are not errors: the former yield an
/// empty result, the latter are truncated to the configured fetch limit.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Configuration rejected at load time (non-positive radius, malformed domain, ...)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input data rejected at load time (out-of-range coordinates, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No cluster with the given id exists in the current index
    #[error("No cluster with id {0}")]
    ClusterNotFound(ClusterId),

    #[error("GeoJSON error: {0}")]
    GeoJson(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "toml")]
    #[error("TOML error: {0}")]
    Toml(String),
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, ClusterError>;
