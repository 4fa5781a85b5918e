//! Metadata inference from collected event-file paths.
//!
//! Collectors and backfill jobs write files in several layouts, for example
//! `live/AAPL/Trade/2024-01-02.jsonl` or `historical/AAPL_Trade_2024-01-02.csv`.
//! [`infer_metadata`] recovers symbol, event type, date, source, format, and
//! compression from the relative directory and the filename alone, without
//! touching the file system.
//!
//! Directory segments are authoritative; filename tokens only fill fields
//! that the directories left unset.

use camino::{Utf8Component, Utf8Path};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Event-type tokens recognised in paths, in canonical spelling.
pub const EVENT_TYPE_TOKENS: [&str; 7] = [
    "Trade",
    "BboQuote",
    "Quote",
    "L2Snapshot",
    "OrderBook",
    "Bar",
    "Depth",
];

/// Leading segments that describe the collection root rather than the data.
const ROOT_SEGMENTS: [&str; 3] = ["live", "historical", "data"];

/// Root segments that double as the file's collection source.
const SOURCE_SEGMENTS: [&str; 2] = ["live", "historical"];

/// Date layouts accepted in addition to RFC 3339 timestamps.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Date-time layouts whose date part is accepted.
const DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Serialization format of an event file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    /// Newline-delimited JSON.
    Jsonl,
    /// Apache Parquet.
    Parquet,
    /// Comma-separated values.
    Csv,
}

impl DataFormat {
    /// Lower-case name recorded in manifests.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Jsonl => "jsonl",
            Self::Parquet => "parquet",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stream compression applied to an event file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionType {
    /// `.gz` suffix.
    Gzip,
    /// `.zst` suffix.
    Zstd,
}

impl CompressionType {
    /// Lower-case name recorded in manifests.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Zstd => "zstd",
        }
    }
}

impl fmt::Display for CompressionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recognised event-file suffix.
struct KnownExtension {
    suffix: &'static str,
    format: DataFormat,
    compression: Option<CompressionType>,
}

/// Longest suffixes first so `.jsonl.gz` wins over `.jsonl`.
const KNOWN_EXTENSIONS: [KnownExtension; 5] = [
    KnownExtension {
        suffix: ".jsonl.gz",
        format: DataFormat::Jsonl,
        compression: Some(CompressionType::Gzip),
    },
    KnownExtension {
        suffix: ".jsonl.zst",
        format: DataFormat::Jsonl,
        compression: Some(CompressionType::Zstd),
    },
    KnownExtension {
        suffix: ".jsonl",
        format: DataFormat::Jsonl,
        compression: None,
    },
    KnownExtension {
        suffix: ".parquet",
        format: DataFormat::Parquet,
        compression: None,
    },
    KnownExtension {
        suffix: ".csv",
        format: DataFormat::Csv,
        compression: None,
    },
];

/// Fields recovered from a file's relative location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InferredMetadata {
    /// Upper-cased ticker symbol.
    pub symbol: Option<String>,
    /// Event type, canonicalised when it is a known token.
    pub event_type: Option<String>,
    /// Trading date the file covers.
    pub date: Option<NaiveDate>,
    /// Collection source (`live` or `historical`).
    pub source: Option<String>,
    /// Serialization format.
    pub format: Option<DataFormat>,
    /// Stream compression.
    pub compression: Option<CompressionType>,
}

/// Match a filename against the recognised event-file suffixes.
///
/// # Examples
///
/// ```
/// use mdpack_packager::inference::{CompressionType, DataFormat, recognise_extension};
///
/// assert_eq!(
///     recognise_extension("AAPL.jsonl.gz"),
///     Some((DataFormat::Jsonl, Some(CompressionType::Gzip)))
/// );
/// assert_eq!(recognise_extension("notes.txt"), None);
/// ```
#[must_use]
pub fn recognise_extension(filename: &str) -> Option<(DataFormat, Option<CompressionType>)> {
    let lower = filename.to_ascii_lowercase();
    KNOWN_EXTENSIONS
        .iter()
        .find(|ext| lower.ends_with(ext.suffix))
        .map(|ext| (ext.format, ext.compression))
}

/// Remove a recognised suffix from `filename`, if present.
#[must_use]
pub fn strip_known_extension(filename: &str) -> &str {
    let lower = filename.to_ascii_lowercase();
    KNOWN_EXTENSIONS
        .iter()
        .find(|ext| lower.ends_with(ext.suffix))
        .and_then(|ext| filename.get(..filename.len() - ext.suffix.len()))
        .unwrap_or(filename)
}

/// Return the canonical spelling of a known event-type token.
///
/// # Examples
///
/// ```
/// use mdpack_packager::inference::canonical_event_type;
///
/// assert_eq!(canonical_event_type("bboquote"), Some("BboQuote"));
/// assert_eq!(canonical_event_type("AAPL"), None);
/// ```
#[must_use]
pub fn canonical_event_type(token: &str) -> Option<&'static str> {
    EVENT_TYPE_TOKENS
        .iter()
        .copied()
        .find(|known| known.eq_ignore_ascii_case(token))
}

/// Parse a path or filename token as a calendar date.
///
/// Accepts ISO dates (`2024-01-02`), a few common separators, and
/// timestamps whose date part is taken.
#[must_use]
pub fn parse_date(token: &str) -> Option<NaiveDate> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATE_TIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Infer event-file metadata from its relative directory and filename.
///
/// Directory segments are walked left to right. A leading run of
/// `live`/`historical`/`data` segments is skipped (the first `live` or
/// `historical` one is kept as the source). The first known event-type
/// segment sets the event type; otherwise the first non-date segment sets
/// the upper-cased symbol. Filename tokens (split on `.` and `_` after the
/// suffix is removed) fill a missing symbol from token 0 and a missing
/// event type from token 1. The date is the first parseable filename
/// token, then the first parseable directory segment.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use mdpack_packager::inference::infer_metadata;
///
/// let meta = infer_metadata(Utf8Path::new("live/aapl/Trade"), "2024-01-02.jsonl");
/// assert_eq!(meta.symbol.as_deref(), Some("AAPL"));
/// assert_eq!(meta.event_type.as_deref(), Some("Trade"));
/// assert_eq!(meta.source.as_deref(), Some("live"));
/// assert_eq!(meta.date.map(|d| d.to_string()).as_deref(), Some("2024-01-02"));
/// ```
#[must_use]
pub fn infer_metadata(relative_dir: &Utf8Path, filename: &str) -> InferredMetadata {
    let segments: Vec<&str> = relative_dir
        .components()
        .filter_map(|component| match component {
            Utf8Component::Normal(segment) => Some(segment),
            _ => None,
        })
        .collect();

    let mut meta = InferredMetadata::default();
    apply_directory_segments(&mut meta, &segments);

    let stem = strip_known_extension(filename);
    let tokens: Vec<&str> = stem
        .split(['.', '_'])
        .filter(|token| !token.is_empty())
        .collect();
    apply_filename_tokens(&mut meta, &tokens);

    meta.date = tokens
        .iter()
        .chain(segments.iter())
        .find_map(|token| parse_date(token));

    if let Some((format, compression)) = recognise_extension(filename) {
        meta.format = Some(format);
        meta.compression = compression;
    }

    meta
}

fn apply_directory_segments(meta: &mut InferredMetadata, segments: &[&str]) {
    let mut in_root_prefix = true;
    for segment in segments {
        if in_root_prefix && is_root_segment(segment) {
            if meta.source.is_none() && is_source_segment(segment) {
                meta.source = Some(segment.to_ascii_lowercase());
            }
            continue;
        }
        in_root_prefix = false;

        match canonical_event_type(segment) {
            Some(event_type) if meta.event_type.is_none() => {
                meta.event_type = Some(event_type.to_owned());
            }
            _ => {
                if meta.symbol.is_none() && parse_date(segment).is_none() {
                    meta.symbol = Some(segment.to_uppercase());
                }
            }
        }
    }
}

fn apply_filename_tokens(meta: &mut InferredMetadata, tokens: &[&str]) {
    if meta.symbol.is_none() {
        meta.symbol = tokens.first().map(|token| token.to_uppercase());
    }
    if meta.event_type.is_none() {
        meta.event_type = tokens.get(1).map(|token| {
            canonical_event_type(token).map_or_else(|| (*token).to_owned(), str::to_owned)
        });
    }
}

fn is_root_segment(segment: &str) -> bool {
    ROOT_SEGMENTS.iter().any(|root| root.eq_ignore_ascii_case(segment))
}

fn is_source_segment(segment: &str) -> bool {
    SOURCE_SEGMENTS
        .iter()
        .any(|source| source.eq_ignore_ascii_case(segment))
}

#[cfg(test)]
#[path = "inference_tests.rs"]
mod tests;
