//! Error types for gdrive-dl
//!
//! This module provides the error taxonomy for the library:
//! - Resolution errors (missing folder payload, malformed title, depth guard)
//! - Per-file download errors (non-200 status, transport failure, disk I/O)
//! - Ambient errors (configuration, invalid input, network, I/O, serialization)
//!
//! Resolution errors abort a whole folder download. Download errors are
//! isolated per file by the orchestrator and never abort the remaining files.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for gdrive-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for gdrive-dl
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "download.chunk_size")
        key: Option<String>,
    },

    /// Caller supplied an unusable link, id or combination of both
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Folder tree resolution failed
    #[error("resolution error: {0}")]
    Resolve(#[from] ResolveError),

    /// File content download failed
    #[error("download error: {0}")]
    Download(#[from] DownloadError),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Folder-tree resolution errors
///
/// Any of these aborts the resolution of the whole tree; no partial tree is
/// handed back to the caller.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The folder page does not carry the embedded listing payload.
    ///
    /// Usually means the folder is private, the service is throttling us, or
    /// the page layout changed.
    #[error(
        "no folder data found at {url}; check the sharing permissions or retry later if the link was accessed too often"
    )]
    DataNotFound {
        /// The canonical URL of the page that was inspected
        url: String,
    },

    /// The payload was found but could not be decoded
    #[error("malformed folder payload at {url}: {reason}")]
    MalformedPayload {
        /// The canonical URL of the page that was inspected
        url: String,
        /// What was wrong with the payload
        reason: String,
    },

    /// The page title does not have the "<name> - <service>" shape
    #[error("cannot extract folder name from title {title:?}")]
    TitleParse {
        /// The raw title text (empty when the page has no title element)
        title: String,
    },

    /// Folder nesting is deeper than the configured guard
    #[error("folder {folder_id} exceeds the maximum nesting depth of {max_depth}")]
    DepthExceeded {
        /// The folder that would have been resolved past the limit
        folder_id: String,
        /// The configured maximum depth
        max_depth: usize,
    },
}

/// Per-file download errors
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Content endpoint answered with something other than 200
    #[error("file {id} returned HTTP {status}")]
    HttpStatus {
        /// Remote id of the file
        id: String,
        /// The HTTP status code received
        status: u16,
    },

    /// Request or body stream failed at the transport level
    #[error("transport failure for file {id}: {reason}")]
    Transport {
        /// Remote id of the file
        id: String,
        /// The underlying error message
        reason: String,
    },

    /// Writing the file to disk failed
    #[error("failed to write {}: {reason}", path.display())]
    Write {
        /// Local path that could not be written
        path: PathBuf,
        /// The underlying error message
        reason: String,
    },
}

impl Error {
    /// Stable machine-readable code for this error.
    ///
    /// Used by the command-line front end for its final error line; scripts can
    /// match on it without parsing the human-readable message.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::InvalidInput(_) => "invalid_input",
            Error::Resolve(e) => match e {
                ResolveError::DataNotFound { .. } => "data_not_found",
                ResolveError::MalformedPayload { .. } => "malformed_payload",
                ResolveError::TitleParse { .. } => "title_parse_error",
                ResolveError::DepthExceeded { .. } => "depth_exceeded",
            },
            Error::Download(e) => match e {
                DownloadError::HttpStatus { .. } => "http_status",
                DownloadError::Transport { .. } => "transport_error",
                DownloadError::Write { .. } => "write_failed",
            },
            Error::Network(_) => "network_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::Other(_) => "internal_error",
        }
    }
}
