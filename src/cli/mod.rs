//! Command-line interface components
//!
//! This module contains CLI-specific code for the NYC 311 Fetcher
//! application: argument parsing and the download command handler.

pub mod args;
pub mod commands;

pub use args::Cli;
pub use commands::{build_request, handle_download, summary_line};
