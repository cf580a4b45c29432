//! Output path resolution
//!
//! Decides where the export is written: the caller's path verbatim, or a
//! generated `<dataset-id>_<YYYYMMDDHHMM>.csv` in the working directory.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::constants::download;

/// Format a UTC instant the same way metadata timestamps are formatted
pub fn format_stamp(instant: DateTime<Utc>) -> String {
    instant.format(download::STAMP_FORMAT).to_string()
}

/// Generated file name for a dataset snapshot
pub fn default_file_name(dataset_id: &str, stamp: &str) -> String {
    format!("{}_{}.{}", dataset_id, stamp, download::OUTPUT_EXTENSION)
}

/// Resolve the destination of a download
///
/// A non-empty `requested` path is returned unchanged; directory existence
/// and overwriting are the caller's concern. Otherwise the name embeds
/// `stamp`, or `now` formatted identically when no stamp is available.
pub fn resolve_output_path(
    requested: Option<&Path>,
    stamp: Option<&str>,
    dataset_id: &str,
    now: DateTime<Utc>,
) -> PathBuf {
    if let Some(path) = requested.filter(|path| !path.as_os_str().is_empty()) {
        return path.to_path_buf();
    }

    let stamp = match stamp.filter(|stamp| !stamp.is_empty()) {
        Some(stamp) => stamp.to_string(),
        None => format_stamp(now),
    };

    PathBuf::from(default_file_name(dataset_id, &stamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap()
    }

    #[test]
    fn test_explicit_path_is_returned_verbatim() {
        for stamp in [Some("202501011200"), None] {
            let resolved = resolve_output_path(
                Some(Path::new("/tmp/out.csv")),
                stamp,
                "erm2-nwe9",
                fixed_now(),
            );
            assert_eq!(resolved, PathBuf::from("/tmp/out.csv"));
        }
    }

    #[test]
    fn test_relative_and_odd_paths_are_untouched() {
        for requested in ["data/311.csv", "./x", "no_extension", "../up/../down.csv"] {
            let resolved =
                resolve_output_path(Some(Path::new(requested)), None, "erm2-nwe9", fixed_now());
            assert_eq!(resolved.as_os_str(), requested);
        }
    }

    #[test]
    fn test_metadata_stamp_names_the_file() {
        let resolved = resolve_output_path(None, Some("202501011200"), "erm2-nwe9", fixed_now());
        assert_eq!(resolved, PathBuf::from("erm2-nwe9_202501011200.csv"));
    }

    #[test]
    fn test_current_time_fallback() {
        let resolved = resolve_output_path(None, None, "erm2-nwe9", fixed_now());
        assert_eq!(resolved, PathBuf::from("erm2-nwe9_202603040506.csv"));
    }

    #[test]
    fn test_empty_inputs_count_as_absent() {
        let resolved = resolve_output_path(Some(Path::new("")), Some(""), "erm2-nwe9", fixed_now());
        assert_eq!(resolved, PathBuf::from("erm2-nwe9_202603040506.csv"));
    }

    #[test]
    fn test_resolution_is_total() {
        let requested = [None, Some(Path::new("out.csv"))];
        let stamps = [None, Some("202501011200")];

        for path in requested {
            for stamp in stamps {
                let resolved = resolve_output_path(path, stamp, "erm2-nwe9", fixed_now());
                assert!(!resolved.as_os_str().is_empty());
                if let Some(path) = path {
                    assert_eq!(resolved, path);
                }
            }
        }
    }

    #[test]
    fn test_stamp_format_matches_metadata_format() {
        let stamp = format_stamp(fixed_now());
        assert_eq!(stamp.len(), 12);
        assert!(stamp.bytes().all(|b| b.is_ascii_digit()));
    }
}
