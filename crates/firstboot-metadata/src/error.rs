//! Error types for metadata retrieval and lookup

use thiserror::Error;

/// Error type for metadata operations
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The requested path does not exist in the loaded metadata
    #[error("metadata not found: {0}")]
    NotFound(String),

    /// The path exists but holds a value of the wrong shape
    #[error("unexpected value at {path}: expected {expected}")]
    UnexpectedType { path: String, expected: &'static str },

    /// The metadata payload is not valid JSON
    #[error("failed to parse metadata: {0}")]
    Parse(#[from] serde_json::Error),

    /// The metadata endpoint could not be reached
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The configured base URL is unusable
    #[error("invalid metadata URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Error type for the HTTP transport
#[derive(Debug, Error)]
pub enum TransportError {
    /// Request could not be sent or the body could not be read
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Every attempt failed
    #[error("giving up on {target} after {attempts} attempts")]
    RetriesExhausted {
        target: String,
        attempts: u32,
        #[source]
        last: Box<TransportError>,
    },

    /// CA bundle could not be read
    #[error("failed to read CA bundle {path}: {source}")]
    CaBundle {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for metadata operations
pub type Result<T> = std::result::Result<T, MetadataError>;
