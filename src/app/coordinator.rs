//! Orchestration of a complete download run
//!
//! A run is strictly linear: build the session, look up the dataset's last
//! update (only when a file name has to be generated), resolve the output
//! path, then stream the export. Nothing runs in the background.

use std::path::PathBuf;

use chrono::Utc;
use tracing::info;

use crate::app::client::{BulkDownloader, ClientConfig, MetadataFetcher, Session};
use crate::app::models::{DownloadSummary, Endpoints};
use crate::app::output::resolve_output_path;
use crate::config::EnvSettings;
use crate::constants::download;
use crate::errors::Result;

/// Parameters of one download run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Explicit destination; a name is generated when absent
    pub output: Option<PathBuf>,
    /// Maximum bytes read from the body per iteration
    pub chunk_size: usize,
    /// Report progress while streaming
    pub verbose: bool,
}

impl Default for DownloadRequest {
    fn default() -> Self {
        Self {
            output: None,
            chunk_size: download::DEFAULT_CHUNK_SIZE,
            verbose: false,
        }
    }
}

/// Runs the session, metadata, path and download steps in order
#[derive(Debug)]
pub struct Coordinator {
    session: Session,
    endpoints: Endpoints,
}

impl Coordinator {
    /// Build the session from environment settings
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the token is missing or invalid, or a proxy
    /// URL cannot be parsed. No request has been made at that point.
    pub fn new(
        settings: &EnvSettings,
        client_config: ClientConfig,
        endpoints: Endpoints,
    ) -> Result<Self> {
        let session = Session::from_settings(settings, client_config)?;
        Ok(Self::with_session(session, endpoints))
    }

    /// Use an already built session
    pub fn with_session(session: Session, endpoints: Endpoints) -> Self {
        Self { session, endpoints }
    }

    /// The session shared by all requests
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Endpoints used by this coordinator
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Decide where the export goes
    ///
    /// Metadata is only requested when no explicit path was given, and its
    /// failure only changes the generated name.
    pub async fn resolve_destination(&self, requested: Option<&std::path::Path>) -> PathBuf {
        let requested = requested.filter(|path| !path.as_os_str().is_empty());
        let stamp = match requested {
            Some(_) => None,
            None => {
                MetadataFetcher::new(&self.session, &self.endpoints.metadata_url)
                    .fetch_last_update_stamp()
                    .await
            }
        };

        resolve_output_path(requested, stamp.as_deref(), &self.endpoints.dataset_id, Utc::now())
    }

    /// Execute the run
    ///
    /// # Errors
    ///
    /// Returns `AppError` on a zero chunk size, a failed or interrupted
    /// transfer, or a filesystem failure. Metadata problems never fail the run.
    pub async fn run(&self, request: &DownloadRequest) -> Result<DownloadSummary> {
        let destination = self.resolve_destination(request.output.as_deref()).await;
        info!("Downloading dataset {} to {}", self.endpoints.dataset_id, destination.display());

        BulkDownloader::new(&self.session, &self.endpoints.export_url)
            .chunk_size(request.chunk_size)
            .verbose(request.verbose)
            .download(&destination)
            .await
    }
}
