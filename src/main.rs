//! NYC 311 Fetcher CLI application
//!
//! Command-line interface for downloading the full NYC 311 service request
//! dataset as a single CSV file.

use std::process;

use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use nyc311_fetcher::cli::{handle_download, Cli};
use nyc311_fetcher::config::load_dotenv;
use nyc311_fetcher::errors::Result;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize program
    let result = run().await;

    // Handle any errors that occurred
    if let Err(e) = result {
        debug!("Run failed with {} error", e.category());
        eprintln!("Error: {}", e.report());
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load environment variables from .env file if it exists
    load_dotenv();

    // Initialize logging based on verbosity
    init_logging(&cli);

    info!("NYC 311 Fetcher v{} starting", env!("CARGO_PKG_VERSION"));

    handle_download(&cli).await.map(|_| ())
}

/// Initialize logging based on CLI verbosity settings
fn init_logging(cli: &Cli) {
    let log_level = cli.log_level();

    // Create environment filter
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("nyc311_fetcher={}", log_level).parse() {
        filter = filter.add_directive(directive);
    }

    // Initialize subscriber
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.verbose {
        info!("Verbose logging enabled");
    }
}
