//! The `manifest.json` document embedded in every package.
//!
//! A [`PackageManifest`] is built once per creation run from the scanned
//! file entries and is trusted as ground truth on import. Aggregate fields
//! (symbols, event types, sources, date range, totals) are always derived
//! from [`PackageManifest::files`] by [`PackageManifest::new`]; they are
//! never set by hand.

use crate::inference::{CompressionType, DataFormat};
use crate::options::{InternalLayout, PackageFormat};
use crate::schema::EventSchema;
use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the manifest entry at the archive root.
pub const MANIFEST_ENTRY: &str = "manifest.json";

/// Manifest schema version written by this crate.
pub const PACKAGE_VERSION: &str = "1.0";

/// One data file stored in the package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageFileEntry {
    /// Archive-internal path; unique within a manifest.
    pub path: String,
    /// Path relative to the data root the file was collected from.
    pub source_path: String,
    /// Upper-cased ticker symbol.
    #[serde(default)]
    pub symbol: Option<String>,
    /// Event type.
    #[serde(default)]
    pub event_type: Option<String>,
    /// Trading date the file covers.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Collection source (`live` or `historical`).
    #[serde(default)]
    pub source: Option<String>,
    /// Serialization format.
    pub format: DataFormat,
    /// Whether the file is stream-compressed on disk.
    #[serde(default)]
    pub is_compressed: bool,
    /// Stream compression, when compressed.
    #[serde(default)]
    pub compression_type: Option<CompressionType>,
    /// Size of the file as stored.
    pub size_bytes: u64,
    /// Estimated size once decompressed.
    #[serde(default)]
    pub uncompressed_size_bytes: u64,
    /// Estimated number of events.
    #[serde(default)]
    pub event_count: u64,
    /// Lower-case hex SHA-256, or empty when checksums were disabled.
    #[serde(default)]
    pub checksum: String,
}

impl PackageFileEntry {
    /// Returns true when a checksum was recorded for this file.
    #[must_use]
    pub fn has_checksum(&self) -> bool {
        !self.checksum.trim().is_empty()
    }
}

/// Inclusive span of dates covered by the package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    /// Earliest dated file.
    pub start: NaiveDate,
    /// Latest dated file.
    pub end: NaiveDate,
    /// Inclusive number of calendar days.
    pub calendar_days: u64,
    /// Weekdays within the span.
    pub trading_days: u64,
}

impl DateRange {
    /// Build a range, swapping the bounds if they arrive reversed.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use mdpack_packager::manifest::DateRange;
    ///
    /// // Friday through Monday.
    /// let start = NaiveDate::from_ymd_opt(2024, 1, 5).expect("date");
    /// let end = NaiveDate::from_ymd_opt(2024, 1, 8).expect("date");
    /// let range = DateRange::new(start, end);
    /// assert_eq!(range.calendar_days, 4);
    /// assert_eq!(range.trading_days, 2);
    /// ```
    #[must_use]
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        let (start, end) = if end < start { (end, start) } else { (start, end) };
        let calendar_days = u64::try_from((end - start).num_days() + 1).unwrap_or_default();
        Self {
            start,
            end,
            calendar_days,
            trading_days: u64::try_from(trading_days_between(start, end).count())
                .unwrap_or_default(),
        }
    }

    /// Iterate over the weekdays in the range.
    pub fn trading_days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        trading_days_between(self.start, self.end)
    }
}

fn trading_days_between(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start
        .iter_days()
        .take_while(move |day| *day <= end)
        .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
}

/// Flags marking which manifest figures are estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateFlags {
    /// Event counts come from line sampling.
    pub event_counts: bool,
    /// Uncompressed sizes assume a fixed expansion ratio.
    pub uncompressed_size: bool,
}

impl Default for EstimateFlags {
    fn default() -> Self {
        Self {
            event_counts: true,
            uncompressed_size: true,
        }
    }
}

/// Identity and container settings of a package, fixed before files are
/// aggregated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageIdentity {
    /// Unique package id.
    pub package_id: String,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Creator name.
    pub creator: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Container format.
    pub format: PackageFormat,
    /// Internal layout used for data paths.
    pub layout: InternalLayout,
}

/// The canonical package description stored as `manifest.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    /// Unique package id.
    pub package_id: String,
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Manifest schema version.
    pub version: String,
    /// Creator name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    /// Creation timestamp (UTC).
    pub created_at: DateTime<Utc>,
    /// Container format name.
    pub format: String,
    /// Internal layout name.
    pub layout: String,
    /// Every data file in the package.
    pub files: Vec<PackageFileEntry>,
    /// Always equal to `files.len()`.
    pub total_files: usize,
    /// Distinct symbols, case-insensitively deduplicated and sorted.
    #[serde(default)]
    pub symbols: Vec<String>,
    /// Distinct event types, case-insensitively deduplicated and sorted.
    #[serde(default)]
    pub event_types: Vec<String>,
    /// Distinct collection sources.
    #[serde(default)]
    pub sources: Vec<String>,
    /// Span of dated files, if any file is dated.
    #[serde(default)]
    pub date_range: Option<DateRange>,
    /// Sum of estimated per-file event counts.
    #[serde(default)]
    pub total_events: u64,
    /// Sum of estimated per-file uncompressed sizes.
    #[serde(default)]
    pub uncompressed_size_bytes: u64,
    /// Size of the archive as first written.
    #[serde(default)]
    pub compressed_size_bytes: u64,
    /// SHA-256 of the archive as first written.
    #[serde(default)]
    pub package_checksum: String,
    /// Which figures are estimates.
    #[serde(default)]
    pub estimates: EstimateFlags,
    /// Per-event-type schemas.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schemas: Option<BTreeMap<String, EventSchema>>,
    /// Generated artefacts stored alongside the data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplementary_files: Option<Vec<String>>,
    /// Always false; encryption is not implemented.
    #[serde(default)]
    pub encrypted: bool,
}

impl PackageManifest {
    /// Build a manifest, deriving every aggregate from `files`.
    #[must_use]
    pub fn new(identity: PackageIdentity, files: Vec<PackageFileEntry>) -> Self {
        let symbols = distinct_sorted(files.iter().filter_map(|f| f.symbol.as_deref()));
        let event_types = distinct_sorted(files.iter().filter_map(|f| f.event_type.as_deref()));
        let sources = distinct_sorted(files.iter().filter_map(|f| f.source.as_deref()));
        let date_range = date_span(&files);
        let total_events = files.iter().map(|f| f.event_count).sum();
        let uncompressed_size_bytes = files.iter().map(|f| f.uncompressed_size_bytes).sum();

        Self {
            package_id: identity.package_id,
            name: identity.name,
            description: identity.description,
            version: PACKAGE_VERSION.to_owned(),
            creator: identity.creator,
            created_at: identity.created_at,
            format: identity.format.as_str().to_owned(),
            layout: identity.layout.as_str().to_owned(),
            total_files: files.len(),
            files,
            symbols,
            event_types,
            sources,
            date_range,
            total_events,
            uncompressed_size_bytes,
            compressed_size_bytes: 0,
            package_checksum: String::new(),
            estimates: EstimateFlags::default(),
            schemas: None,
            supplementary_files: None,
            encrypted: false,
        }
    }

    /// Sum of stored file sizes.
    #[must_use]
    pub fn data_size_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size_bytes).sum()
    }

    /// Look up a file entry by its archive path.
    #[must_use]
    pub fn file(&self, path: &str) -> Option<&PackageFileEntry> {
        self.files.iter().find(|f| f.path == path)
    }

    /// Serialize as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns the serializer error; not expected for well-formed values.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Deduplicate case-insensitively, keeping the first spelling, sorted.
fn distinct_sorted<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: BTreeMap<String, String> = BTreeMap::new();
    for value in values.filter(|v| !v.trim().is_empty()) {
        seen.entry(value.to_lowercase())
            .or_insert_with(|| value.to_owned());
    }
    seen.into_values().collect()
}

fn date_span(files: &[PackageFileEntry]) -> Option<DateRange> {
    let mut dates = files.iter().filter_map(|f| f.date);
    let first = dates.next()?;
    let (start, end) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
    Some(DateRange::new(start, end))
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
