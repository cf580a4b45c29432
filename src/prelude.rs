//! Prelude module for NYC 311 Fetcher Library
//!
//! Re-exports the items needed for a typical embedding with a single
//! `use nyc311_fetcher::prelude::*;` statement.

// Core result types
pub use crate::errors::{AppError, Result};

// Essential app components
pub use crate::app::{
    BulkDownloader, ClientConfig, Coordinator, DatasetMetadata, DownloadRequest, DownloadSummary,
    Endpoints, MetadataFetcher, Session,
};

// Configuration
pub use crate::config::{AppConfig, EnvSettings};

// Commonly used constants
pub use crate::constants::{DATASET_ID, DEFAULT_CHUNK_SIZE, ENV_APP_TOKEN};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_imports() {
        let _config = ClientConfig::default();
        let _request = DownloadRequest::default();
        let _settings = EnvSettings::default();

        assert_eq!(Endpoints::default().dataset_id, DATASET_ID);
        assert_eq!(AppConfig::default().download.chunk_size, DEFAULT_CHUNK_SIZE);
    }
}
