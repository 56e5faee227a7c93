//! Error types for hostname changes

use std::path::PathBuf;
use thiserror::Error;

/// Error type for hostname operations
#[derive(Debug, Error)]
pub enum HostnameError {
    /// The platform does not allow changing the hostname right now
    #[error("hostname cannot be changed: {0}")]
    PolicyViolation(String),

    /// A system call failed
    #[error("system call failed: {0}")]
    Sys(#[from] nix::Error),

    /// Reading or writing a platform file failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The kernel reported a hostname that is not valid UTF-8
    #[error("current hostname is not valid UTF-8")]
    InvalidEncoding,
}

/// Result type for hostname operations
pub type Result<T> = std::result::Result<T, HostnameError>;
