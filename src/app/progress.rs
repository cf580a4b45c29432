//! Progress tracking for the bulk download
//!
//! [`DownloadProgress`] keeps the running byte count for one transfer and,
//! when verbose, reports it either as an `indicatif` bar (stderr is a
//! terminal) or as periodic log lines (stderr is redirected).

use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::info;

use crate::constants::{download, BYTES_PER_UNIT, BYTE_UNITS};

/// Render a byte count as a human-friendly string, e.g. `"1.2 GB"`
///
/// Uses binary steps of 1024 and one decimal place. Zero is `"0 B"`.
pub fn format_bytes(num_bytes: u64) -> String {
    if num_bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = num_bytes as f64;
    let mut unit = 0;
    while size >= BYTES_PER_UNIT as f64 && unit < BYTE_UNITS.len() - 1 {
        size /= BYTES_PER_UNIT as f64;
        unit += 1;
    }

    format!("{:.1} {}", size, BYTE_UNITS[unit])
}

/// Render a transfer rate, e.g. `"12.3 MB/s"`
pub fn format_rate(bytes_per_sec: f64) -> String {
    format!("{}/s", format_bytes(bytes_per_sec.max(0.0).round() as u64))
}

/// Format a duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();

    if total_secs < 60 {
        format!("{}s", total_secs)
    } else if total_secs < 3600 {
        format!("{}m{}s", total_secs / 60, total_secs % 60)
    } else {
        format!("{}h{}m", total_secs / 3600, (total_secs % 3600) / 60)
    }
}

/// How progress is surfaced to the user
enum Reporter {
    /// Nothing is printed
    Silent,
    /// Live bar on a terminal
    Bar(ProgressBar),
    /// Log line at most once per interval
    Text { last_report: Option<Instant> },
}

/// Running counters for one transfer
pub struct DownloadProgress {
    bytes_transferred: u64,
    total_bytes: Option<u64>,
    started: Instant,
    reporter: Reporter,
}

impl DownloadProgress {
    /// Create a tracker, picking the reporter from verbosity and terminal state
    ///
    /// A total of zero is treated as unknown.
    pub fn new(total_bytes: Option<u64>, verbose: bool) -> Self {
        let total_bytes = total_bytes.filter(|total| *total > 0);
        let reporter = if !verbose {
            Reporter::Silent
        } else if atty::is(atty::Stream::Stderr) {
            Reporter::Bar(Self::build_bar(total_bytes))
        } else {
            Reporter::Text { last_report: None }
        };

        Self {
            bytes_transferred: 0,
            total_bytes,
            started: Instant::now(),
            reporter,
        }
    }

    /// Create a tracker that never prints
    pub fn silent(total_bytes: Option<u64>) -> Self {
        Self {
            bytes_transferred: 0,
            total_bytes: total_bytes.filter(|total| *total > 0),
            started: Instant::now(),
            reporter: Reporter::Silent,
        }
    }

    fn build_bar(total_bytes: Option<u64>) -> ProgressBar {
        let bar = match total_bytes {
            Some(total) => {
                let bar = ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stderr());
                if let Ok(style) = ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {msg}")
                {
                    bar.set_style(style.progress_chars("##-"));
                }
                bar
            }
            None => {
                let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
                if let Ok(style) =
                    ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
                {
                    bar.set_style(style);
                }
                bar
            }
        };
        bar.set_message("Waiting for data...");
        bar
    }

    /// Record a chunk written to disk and report if due
    pub fn advance(&mut self, bytes: u64) {
        self.bytes_transferred += bytes;

        let status = match &self.reporter {
            Reporter::Silent => return,
            _ => self.status_line(),
        };

        match &mut self.reporter {
            Reporter::Silent => {}
            Reporter::Bar(bar) => {
                bar.set_position(self.bytes_transferred);
                bar.set_message(status);
            }
            Reporter::Text { last_report } => {
                let due = last_report
                    .map_or(true, |last| last.elapsed() >= download::TEXT_PROGRESS_INTERVAL);
                if due {
                    info!("{}", status);
                    *last_report = Some(Instant::now());
                }
            }
        }
    }

    /// Close the bar or emit a final line
    pub fn finish(&mut self) {
        let status = self.status_line();
        match &self.reporter {
            Reporter::Silent => {}
            Reporter::Bar(bar) => bar.finish_with_message(status),
            Reporter::Text { .. } => info!("{}", status),
        }
    }

    /// Stop drawing without a final message, leaving counters intact
    pub fn abandon(&mut self) {
        if let Reporter::Bar(bar) = &self.reporter {
            bar.abandon();
        }
    }

    /// Bytes written so far
    pub fn bytes_transferred(&self) -> u64 {
        self.bytes_transferred
    }

    /// Size announced by the server, if any
    pub fn total_bytes(&self) -> Option<u64> {
        self.total_bytes
    }

    /// Time since the tracker was created
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Average rate since the start, in bytes per second
    pub fn rate_bps(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.bytes_transferred as f64 / secs
        } else {
            0.0
        }
    }

    /// Completion percentage when the total is known
    pub fn percent(&self) -> Option<f64> {
        self.total_bytes
            .map(|total| self.bytes_transferred as f64 / total as f64 * 100.0)
    }

    /// Estimated time remaining when the total is known and data is flowing
    pub fn eta(&self) -> Option<Duration> {
        let total = self.total_bytes?;
        let rate = self.rate_bps();
        if rate <= 0.0 {
            return None;
        }
        let remaining = total.saturating_sub(self.bytes_transferred) as f64;
        Some(Duration::from_secs_f64(remaining / rate))
    }

    /// One-line description of the current state
    pub fn status_line(&self) -> String {
        let elapsed = format_duration(self.elapsed());
        let rate = format_rate(self.rate_bps());

        match (self.total_bytes, self.percent()) {
            (Some(total), Some(percent)) => {
                let eta = self
                    .eta()
                    .map(format_duration)
                    .unwrap_or_else(|| "unknown".to_string());
                format!(
                    "Downloaded {} of {} ({:.1}%) at {}, elapsed {}, ETA {}",
                    format_bytes(self.bytes_transferred),
                    format_bytes(total),
                    percent,
                    rate,
                    elapsed,
                    eta
                )
            }
            _ => format!(
                "Downloaded {} at {}, elapsed {}",
                format_bytes(self.bytes_transferred),
                rate,
                elapsed
            ),
        }
    }
}
