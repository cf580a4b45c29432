//! NYC 311 Fetcher Library
//!
//! A Rust library for downloading the complete NYC 311 service request
//! dataset from the NYC Open Data Socrata bulk CSV export. The export is
//! streamed to disk in bounded chunks with optional progress reporting, and
//! the output file is named after the dataset's last update when no path is
//! given.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
