//! Error types for NYC 311 Fetcher
//!
//! Each stage of a run has its own error enum. Configuration, transfer and
//! filesystem errors are fatal and surface through [`AppError`]; metadata
//! errors are soft and only ever logged before the run falls back to the
//! current time.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors, raised before any network activity
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No credential in the environment
    #[error("No API token supplied. Set the APP_TOKEN environment variable")]
    MissingToken,

    /// Credential cannot be sent as an HTTP header value
    #[error("Invalid API token: {reason}")]
    InvalidToken { reason: String },

    /// Proxy URL from the environment could not be parsed
    #[error("Invalid {scheme} proxy URL '{url}': {reason}")]
    InvalidProxy {
        scheme: &'static str,
        url: String,
        reason: String,
    },

    /// Chunk size must allow progress
    #[error("Chunk size must be greater than 0")]
    InvalidChunkSize,

    /// Explicit configuration file does not exist
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Configuration file exists but could not be read
    #[error("Failed to read configuration file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for this application
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// HTTP client could not be constructed
    #[error("Failed to build HTTP client")]
    Client(#[from] reqwest::Error),
}

/// Reasons a metadata lookup produced no timestamp
#[derive(Error, Debug)]
pub enum MetadataError {
    /// Request failed before a response arrived
    #[error("Metadata request failed")]
    Http(#[from] reqwest::Error),

    /// Server answered with an error status
    #[error("Metadata endpoint returned HTTP {status}")]
    ServerError { status: u16 },

    /// Response body was not JSON
    #[error("Metadata response is not valid JSON")]
    Json(#[from] serde_json::Error),

    /// None of the known update fields carried a value
    #[error("Metadata response has no update timestamp")]
    MissingTimestamp,

    /// Update field present but not a recognizable timestamp
    #[error("Unrecognized update timestamp: {value}")]
    MalformedTimestamp { value: String },
}

/// Network failures while fetching the bulk export
#[derive(Error, Debug)]
pub enum TransferError {
    /// Request could not be sent or the response headers never arrived
    #[error("Bulk export request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Export endpoint answered with an error status
    #[error("Bulk export request to {url} failed with HTTP {status}")]
    ServerError { url: String, status: u16 },

    /// Body stream broke after the destination was opened
    #[error(
        "Transfer interrupted after {bytes_written} bytes; output {path} may be incomplete"
    )]
    Interrupted {
        path: PathBuf,
        bytes_written: u64,
        #[source]
        source: std::io::Error,
    },
}

/// Local disk failures while writing the destination
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Parent directory could not be created
    #[error("Failed to create directory {path}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Destination could not be opened for writing
    #[error("Failed to open {path} for writing")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Write or flush failed part way through
    #[error("Failed to write {path} after {bytes_written} bytes")]
    Write {
        path: PathBuf,
        bytes_written: u64,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Transfer error
    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// Filesystem error
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

impl AppError {
    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config",
            AppError::Transfer(_) => "transfer",
            AppError::Filesystem(_) => "filesystem",
        }
    }

    /// Render the error with its chain of causes on one line
    pub fn report(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            let cause_text = cause.to_string();
            if !message.ends_with(&cause_text) {
                message.push_str(": ");
                message.push_str(&cause_text);
            }
            source = cause.source();
        }
        message
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Metadata result type alias
pub type MetadataResult<T> = std::result::Result<T, MetadataError>;
