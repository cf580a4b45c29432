//! Application constants for NYC 311 Fetcher
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain.

use std::time::Duration;

/// Environment variable names read by the configuration loader
pub mod env {
    /// Socrata application token sent with every request
    pub const APP_TOKEN: &str = "APP_TOKEN";

    /// Proxy for plain HTTP requests
    pub const HTTP_PROXY: &str = "HTTP_PROXY";

    /// Proxy for HTTPS requests
    pub const HTTPS_PROXY: &str = "HTTPS_PROXY";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = concat!("NYC311-Fetcher/", env!("CARGO_PKG_VERSION"));

    /// Header carrying the Socrata application token
    pub const APP_TOKEN_HEADER: &str = "X-App-Token";

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Timeout for the whole metadata request
    pub const METADATA_TIMEOUT: Duration = Duration::from_secs(30);
}

/// Socrata service location and dataset identity
pub mod socrata {
    /// NYC Open Data portal
    pub const BASE_DOMAIN: &str = "data.cityofnewyork.us";

    /// 311 Service Requests from 2010 to Present
    pub const DATASET_ID: &str = "erm2-nwe9";

    /// Top-level metadata fields holding the last update time, in priority order
    pub const UPDATED_AT_FIELDS: [&str; 2] = ["rowsUpdatedAt", "dataUpdatedAt"];

    /// Same fields looked up inside the nested `metadata` object, in priority order
    pub const NESTED_UPDATED_AT_FIELDS: [&str; 2] = ["dataUpdatedAt", "rowsUpdatedAt"];
}

/// Download and output constants
pub mod download {
    use super::Duration;

    /// Bytes requested from the response body per read (1 MiB)
    pub const DEFAULT_CHUNK_SIZE: usize = 1 << 20;

    /// Minimum interval between plain-text progress lines when stderr is not a terminal
    pub const TEXT_PROGRESS_INTERVAL: Duration = Duration::from_secs(5);

    /// Timestamp layout embedded in generated file names (YYYYMMDDHHMM)
    pub const STAMP_FORMAT: &str = "%Y%m%d%H%M";

    /// Extension of generated file names
    pub const OUTPUT_EXTENSION: &str = "csv";
}

/// Configuration file location
pub mod files {
    /// Directory name under the platform config directory
    pub const CONFIG_DIR_NAME: &str = "nyc311_fetcher";

    /// Configuration file name
    pub const CONFIG_FILE_NAME: &str = "config.toml";
}

/// Step between byte units when formatting sizes
pub const BYTES_PER_UNIT: u64 = 1024;

/// Unit suffixes used when formatting byte counts
pub const BYTE_UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

// Re-export commonly used constants at module level
pub use download::DEFAULT_CHUNK_SIZE;
pub use env::APP_TOKEN as ENV_APP_TOKEN;
pub use http::USER_AGENT;
pub use socrata::DATASET_ID;
