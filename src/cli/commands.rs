//! Command handler for NYC 311 Fetcher CLI
//!
//! Turns parsed arguments, the configuration file and the environment into
//! a [`DownloadRequest`] and runs it.

use std::time::Instant;

use tracing::{debug, info};

use crate::app::{
    format_bytes, format_duration, format_rate, Coordinator, DownloadRequest, DownloadSummary,
    Endpoints,
};
use crate::cli::Cli;
use crate::config::{AppConfig, EnvSettings};
use crate::errors::Result;

/// Handle the download command
///
/// Configuration problems are reported before any request is made. On
/// success the final `Saved ... to ...` line is printed to stdout.
pub async fn handle_download(cli: &Cli) -> Result<DownloadSummary> {
    let start_time = Instant::now();

    cli.validate()?;

    let config = AppConfig::load(cli.config.as_deref())?;
    debug!("Effective configuration: {:?}", config);

    let settings = EnvSettings::from_env();
    debug!("Environment settings: {:?}", settings);

    let coordinator = Coordinator::new(
        &settings,
        config.client.to_runtime_config(),
        Endpoints::default(),
    )?;

    let request = build_request(cli, &config);
    let summary = coordinator.run(&request).await?;

    println!("{}", summary_line(&summary));

    info!(
        "Transferred {} in {} ({} average), run took {}",
        format_bytes(summary.bytes_written),
        format_duration(summary.elapsed),
        format_rate(summary.average_rate_bps()),
        format_duration(start_time.elapsed())
    );

    Ok(summary)
}

/// Combine CLI flags with configured defaults
pub fn build_request(cli: &Cli, config: &AppConfig) -> DownloadRequest {
    DownloadRequest {
        output: cli.output.clone(),
        chunk_size: cli.effective_chunk_size(config.download.chunk_size),
        verbose: cli.verbose,
    }
}

/// Final line printed after a successful download
pub fn summary_line(summary: &DownloadSummary) -> String {
    format!(
        "Saved {} to {}.",
        format_bytes(summary.bytes_written),
        summary.destination.display()
    )
}
