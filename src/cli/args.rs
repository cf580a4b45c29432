//! Command-line argument parsing for NYC 311 Fetcher
//!
//! This module defines the CLI structure using clap derive macros. There is
//! a single command: download the full dataset.

use std::path::PathBuf;

use clap::Parser;

use crate::errors::{ConfigError, ConfigResult};

/// NYC 311 Fetcher - Download the full NYC 311 service request dataset
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(
    name = "nyc311_fetcher",
    version,
    about = "Download the entire NYC 311 dataset via the Socrata bulk CSV export",
    long_about = "Streams the complete NYC 311 service request dataset (erm2-nwe9) from NYC Open Data to a local CSV file.
Requires a Socrata application token in the APP_TOKEN environment variable (a .env file is also read).
HTTP_PROXY and HTTPS_PROXY are honored when set."
)]
pub struct Cli {
    /// Destination file path for the CSV. If omitted, a timestamped name
    /// based on the dataset's last update (or the current time) is used
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Chunk size in bytes for streaming download [default: 1048576]
    #[arg(long, value_name = "BYTES")]
    pub chunk_size: Option<usize>,

    /// Print progress updates while downloading
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode - only errors and the final summary line
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level based on verbosity flags
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::INFO
        } else {
            tracing::Level::WARN
        }
    }

    /// Chunk size from the command line, else the configured value
    pub fn effective_chunk_size(&self, configured: usize) -> usize {
        self.chunk_size.unwrap_or(configured)
    }

    /// Check argument values clap cannot express
    pub fn validate(&self) -> ConfigResult<()> {
        if self.chunk_size == Some(0) {
            return Err(ConfigError::InvalidChunkSize);
        }

        Ok(())
    }
}
