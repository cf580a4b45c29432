//! Core application logic for NYC 311 Fetcher
//!
//! This module contains the HTTP session, dataset metadata lookup, output
//! path resolution, progress tracking and the streaming downloader, plus the
//! coordinator that runs them in order.
//!
//! # Examples
//!
//! ```rust,no_run
//! use nyc311_fetcher::app::{ClientConfig, Coordinator, DownloadRequest, Endpoints};
//! use nyc311_fetcher::config::EnvSettings;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = EnvSettings::from_env();
//! let coordinator = Coordinator::new(&settings, ClientConfig::default(), Endpoints::default())?;
//!
//! let summary = coordinator.run(&DownloadRequest::default()).await?;
//! println!("Saved {} bytes to {}", summary.bytes_written, summary.destination.display());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod coordinator;
pub mod models;
pub mod output;
pub mod progress;

// Re-export main public API
pub use client::{
    BulkDownloader, ClientConfig, MetadataFetcher, ProxySettings, Session, SessionBuilder,
};
pub use coordinator::{Coordinator, DownloadRequest};
pub use models::{DatasetMetadata, DownloadSummary, Endpoints};
pub use output::{default_file_name, format_stamp, resolve_output_path};
pub use progress::{format_bytes, format_duration, format_rate, DownloadProgress};
