//! Best-effort lookup of the dataset's last update time
//!
//! The Socrata view description carries the update time under a few
//! different keys and in a few different shapes depending on the dataset's
//! age. Any failure here yields an empty [`DatasetMetadata`]; the caller
//! falls back to the current time and the download proceeds.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::app::client::Session;
use crate::app::models::DatasetMetadata;
use crate::constants::socrata;
use crate::errors::{MetadataError, MetadataResult};

/// Naive date-time layouts accepted after RFC 3339 fails
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Queries the metadata endpoint of a dataset
pub struct MetadataFetcher<'a> {
    session: &'a Session,
    url: &'a Url,
}

impl<'a> MetadataFetcher<'a> {
    /// Creates a fetcher for the given metadata URL
    pub fn new(session: &'a Session, url: &'a Url) -> Self {
        Self { session, url }
    }

    /// Fetch the dataset metadata, never failing
    ///
    /// Issues a single request with no retries. The reason for an empty
    /// result is logged at info level.
    pub async fn fetch(&self) -> DatasetMetadata {
        match self.try_fetch().await {
            Ok(last_update) => {
                debug!("Dataset last updated at {}", last_update);
                DatasetMetadata {
                    last_update: Some(last_update),
                }
            }
            Err(e) => {
                info!("Dataset metadata unavailable, using current time: {}", e);
                DatasetMetadata::default()
            }
        }
    }

    /// Fetch and format the last update as `YYYYMMDDHHMM`
    pub async fn fetch_last_update_stamp(&self) -> Option<String> {
        self.fetch().await.stamp()
    }

    async fn try_fetch(&self) -> MetadataResult<NaiveDateTime> {
        debug!("Requesting dataset metadata from {}", self.url);

        let response = self
            .session
            .client()
            .get(self.url.clone())
            .timeout(self.session.config().metadata_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MetadataError::ServerError {
                status: response.status().as_u16(),
            });
        }

        let body = response.bytes().await?;
        let metadata: Value = serde_json::from_slice(&body)?;

        let updated_at = find_updated_at(&metadata).ok_or(MetadataError::MissingTimestamp)?;
        parse_updated_at(updated_at)
    }
}

/// Find the first populated update field
///
/// Top-level fields take priority over those nested under `metadata`.
pub fn find_updated_at(metadata: &Value) -> Option<&Value> {
    let nested = metadata.get("metadata");

    socrata::UPDATED_AT_FIELDS
        .iter()
        .filter_map(|field| metadata.get(*field))
        .chain(
            socrata::NESTED_UPDATED_AT_FIELDS
                .iter()
                .filter_map(|field| nested.and_then(|section| section.get(*field))),
        )
        .find(|value| is_populated(value))
}

/// Whether a JSON value carries something worth parsing
fn is_populated(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map_or(true, |n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// Interpret an update field as a date-time
///
/// Accepts integer Unix seconds, strings of digits holding Unix seconds,
/// RFC 3339 strings (converted to UTC) and naive ISO date-times (taken as
/// they are).
pub fn parse_updated_at(value: &Value) -> MetadataResult<NaiveDateTime> {
    let malformed = || MetadataError::MalformedTimestamp {
        value: value.to_string(),
    };

    match value {
        Value::Number(number) => number
            .as_i64()
            .and_then(from_unix_seconds)
            .ok_or_else(malformed),
        Value::String(text) => {
            let text = text.trim();
            if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
                text.parse::<i64>()
                    .ok()
                    .and_then(from_unix_seconds)
                    .ok_or_else(malformed)
            } else {
                parse_iso_datetime(text).ok_or_else(malformed)
            }
        }
        _ => Err(malformed()),
    }
}

fn from_unix_seconds(secs: i64) -> Option<NaiveDateTime> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .map(|datetime| datetime.naive_utc())
}

fn parse_iso_datetime(text: &str) -> Option<NaiveDateTime> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some(datetime.naive_utc());
    }
    if let Ok(datetime) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(datetime.naive_utc());
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
