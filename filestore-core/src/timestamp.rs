/*!
Timestamped file naming and best-effort resolution of logical names.

Saves embed a generation timestamp (`{base}_{yyyymmdd_HHMMSS}.{ext}`) unless
the caller disables it; loads that miss on the exact name fall back to the
newest timestamped variant. The timestamp format is fixed-width, so the
lexicographically greatest match is also the most recent.
*/

use crate::formats::FileFormat;
use crate::{Result, StoreError};
use chrono::{DateTime, Utc};
use regex::Regex;

/// Timestamp layout embedded in generated file names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// File name for a save without timestamping: `{base}.{ext}` (the extension
/// is appended only when not already present).
pub fn plain_file_name(base: &str, format: FileFormat) -> String {
    let suffix = format!(".{}", format.extension());
    if base.ends_with(&suffix) {
        base.to_string()
    } else {
        format!("{base}{suffix}")
    }
}

/// File name for a timestamped save: `{base}_{yyyymmdd_HHMMSS}.{ext}`.
pub fn stamped_file_name(base: &str, format: FileFormat, now: DateTime<Utc>) -> String {
    let plain = plain_file_name(base, format);
    let stem = plain
        .strip_suffix(&format!(".{}", format.extension()))
        .unwrap_or(&plain);
    format!(
        "{stem}_{}.{}",
        now.format(TIMESTAMP_FORMAT),
        format.extension()
    )
}

/// Locate the concrete file for a logical name within a directory listing.
///
/// An exact listing entry wins outright; otherwise the lexicographically
/// greatest `{base}_{yyyymmdd_HHMMSS}.{ext}` match is selected. Zero matches
/// is `NotFound`.
pub fn resolve(logical_name: &str, listing: &[String]) -> Result<String> {
    if listing.iter().any(|name| name == logical_name) {
        return Ok(logical_name.to_string());
    }

    let (stem, extension) = match logical_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, ext),
        _ => {
            return Err(StoreError::not_found(format!(
                "'{logical_name}' has no extension to match timestamped variants against"
            )))
        }
    };

    let pattern = format!(
        r"^{}_\d{{8}}_\d{{6}}\.{}$",
        regex::escape(stem),
        regex::escape(extension)
    );
    let matcher = Regex::new(&pattern)
        .map_err(|e| StoreError::storage(format!("bad timestamp pattern: {e}")))?;

    listing
        .iter()
        .filter(|name| matcher.is_match(name))
        .max()
        .cloned()
        .ok_or_else(|| {
            StoreError::not_found(format!(
                "no file matching '{logical_name}' or timestamped variants"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn stamped_name_uses_fixed_width_format() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 7).unwrap();
        assert_eq!(
            stamped_file_name("report", FileFormat::Json, now),
            "report_20240301_090507.json"
        );
        // An already-suffixed base does not get a second extension.
        assert_eq!(
            stamped_file_name("report.json", FileFormat::Json, now),
            "report_20240301_090507.json"
        );
        assert_eq!(plain_file_name("report", FileFormat::Csv), "report.csv");
    }

    #[test]
    fn newest_timestamped_variant_wins() {
        let listing = names(&[
            "report_20240101_080000.json",
            "report_20240301_090000.json",
            "report_20231215_235959.json",
            "other_20240401_000000.json",
        ]);
        assert_eq!(
            resolve("report.json", &listing).unwrap(),
            "report_20240301_090000.json"
        );
    }

    #[test]
    fn exact_name_takes_precedence() {
        let listing = names(&["report.json", "report_20240301_090000.json"]);
        assert_eq!(resolve("report.json", &listing).unwrap(), "report.json");
    }

    #[test]
    fn non_timestamp_suffixes_do_not_match() {
        let listing = names(&["report_final.json", "report_2024.json"]);
        let err = resolve("report.json", &listing).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn base_with_regex_metacharacters() {
        let listing = names(&["a+b_20240101_000000.csv"]);
        assert_eq!(
            resolve("a+b.csv", &listing).unwrap(),
            "a+b_20240101_000000.csv"
        );
    }

    #[test]
    fn empty_listing_is_not_found() {
        assert!(resolve("report.json", &[]).unwrap_err().is_not_found());
    }
}
