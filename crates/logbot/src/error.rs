//! Error types for the ingestion pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ingestion errors
///
/// Only [`Error::ResourceDiscovery`] and [`Error::IngestionInProgress`] ever
/// terminate an ingestion run. Everything else is recovered per block,
/// per finding or per file and shows up in the run summary instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// First line of a log block is not a valid header
    #[error("Malformed log header '{line}': {reason}")]
    MalformedHeader { line: String, reason: String },

    /// Transaction report has no usable DATE/TIME header
    #[error("Report date unavailable")]
    ReportDateUnavailable,

    /// A single structured write failed
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// Input files could not be enumerated or read
    #[error("Failed to read input resource '{}': {source}", .path.display())]
    ResourceDiscovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Another ingestion run holds the single-flight guard
    #[error("An ingestion run is already in progress")]
    IngestionInProgress,

    /// Embedding error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Semantic index error
    #[error("Semantic index error: {0}")]
    SemanticIndex(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML config error
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a malformed header error
    pub fn malformed_header(line: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedHeader {
            line: line.into(),
            reason: reason.into(),
        }
    }

    /// Create a resource discovery error
    pub fn resource_discovery(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ResourceDiscovery {
            path: path.into(),
            source,
        }
    }

    /// Create a persistence error
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a semantic index error
    pub fn semantic_index(message: impl Into<String>) -> Self {
        Self::SemanticIndex(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether this error aborts an ingestion run
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ResourceDiscovery { .. } | Self::IngestionInProgress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let discovery = Error::resource_discovery(
            "simulated_logs",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(discovery.is_fatal());
        assert!(discovery.to_string().contains("simulated_logs"));

        assert!(!Error::malformed_header("garbage", "no match").is_fatal());
        assert!(!Error::persistence("constraint violation").is_fatal());
        assert!(!Error::ReportDateUnavailable.is_fatal());
    }
}
