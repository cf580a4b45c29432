//! Data structures shared across a download run
//!
//! Endpoint locations, dataset metadata and the summary of a completed
//! transfer.

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDateTime;
use url::Url;

use crate::constants::{download, socrata};

/// Remote locations for one Socrata dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Dataset identifier, e.g. `erm2-nwe9`
    pub dataset_id: String,
    /// JSON view metadata
    pub metadata_url: Url,
    /// Full CSV export
    pub export_url: Url,
}

impl Endpoints {
    /// Build the metadata and export URLs for a dataset under a Socrata base URL
    ///
    /// # Errors
    ///
    /// Returns `url::ParseError` if the joined URLs are invalid
    pub fn socrata(base_url: &Url, dataset_id: &str) -> Result<Self, url::ParseError> {
        let metadata_url = base_url.join(&format!("/api/views/{}.json", dataset_id))?;
        let mut export_url = base_url.join(&format!("/api/views/{}/rows.csv", dataset_id))?;
        export_url
            .query_pairs_mut()
            .append_pair("accessType", "DOWNLOAD");

        Ok(Self {
            dataset_id: dataset_id.to_string(),
            metadata_url,
            export_url,
        })
    }
}

impl Default for Endpoints {
    /// The NYC 311 service request dataset on NYC Open Data
    fn default() -> Self {
        let base_url = Url::parse(&format!("https://{}/", socrata::BASE_DOMAIN))
            .expect("Base URL should be valid");
        Self::socrata(&base_url, socrata::DATASET_ID).expect("Dataset URLs should be valid")
    }
}

/// Metadata derived from the dataset's view description
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetMetadata {
    /// When the dataset rows were last updated, in UTC when the source carried a zone
    pub last_update: Option<NaiveDateTime>,
}

impl DatasetMetadata {
    /// Last update formatted for file names (`YYYYMMDDHHMM`)
    pub fn stamp(&self) -> Option<String> {
        self.last_update
            .map(|updated| updated.format(download::STAMP_FORMAT).to_string())
    }
}

/// Outcome of a completed bulk download
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadSummary {
    /// Where the export was written
    pub destination: PathBuf,
    /// Bytes written to the destination
    pub bytes_written: u64,
    /// Size announced by the server, if any
    pub expected_bytes: Option<u64>,
    /// Wall time of the streaming loop
    pub elapsed: Duration,
}

impl DownloadSummary {
    /// Average transfer rate in bytes per second
    pub fn average_rate_bps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.bytes_written as f64 / secs
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_default_endpoints() {
        let endpoints = Endpoints::default();

        assert_eq!(endpoints.dataset_id, "erm2-nwe9");
        assert_eq!(
            endpoints.metadata_url.as_str(),
            "https://data.cityofnewyork.us/api/views/erm2-nwe9.json"
        );
        assert_eq!(
            endpoints.export_url.as_str(),
            "https://data.cityofnewyork.us/api/views/erm2-nwe9/rows.csv?accessType=DOWNLOAD"
        );
    }

    #[test]
    fn test_endpoints_against_local_server() {
        let base = Url::parse("http://127.0.0.1:8080").unwrap();
        let endpoints = Endpoints::socrata(&base, "abcd-1234").unwrap();

        assert_eq!(endpoints.metadata_url.path(), "/api/views/abcd-1234.json");
        assert_eq!(endpoints.export_url.path(), "/api/views/abcd-1234/rows.csv");
        assert_eq!(endpoints.export_url.query(), Some("accessType=DOWNLOAD"));
    }

    #[test]
    fn test_metadata_stamp_format() {
        let metadata = DatasetMetadata {
            last_update: NaiveDate::from_ymd_opt(2025, 1, 1)
                .and_then(|date| date.and_hms_opt(12, 0, 59)),
        };
        assert_eq!(metadata.stamp().as_deref(), Some("202501011200"));
        assert_eq!(DatasetMetadata::default().stamp(), None);
    }

    #[test]
    fn test_summary_rate() {
        let summary = DownloadSummary {
            destination: PathBuf::from("out.csv"),
            bytes_written: 2048,
            expected_bytes: Some(2048),
            elapsed: Duration::from_secs(2),
        };
        assert_eq!(summary.average_rate_bps(), 1024.0);

        let instant = DownloadSummary {
            elapsed: Duration::ZERO,
            ..summary
        };
        assert_eq!(instant.average_rate_bps(), 0.0);
    }
}
