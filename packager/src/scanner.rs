//! Source scanning: enumerate collected event files under a data root.
//!
//! The scan walks the data root recursively, keeps files with a recognised
//! event-file suffix, infers their metadata from the relative path, and
//! applies the caller's [`PackageFilter`]. The resulting inventory is held
//! in memory for the rest of the run.

use crate::error::Result;
use crate::inference::{CompressionType, DataFormat, infer_metadata, recognise_extension};
use crate::options::PackageFilter;
use crate::progress::CancellationFlag;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDate;
use log::debug;
use std::fs::File;
use walkdir::WalkDir;

/// One event file found during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFileRecord {
    /// Location on disk.
    pub path: Utf8PathBuf,
    /// Path relative to the data root, `/`-separated.
    pub relative_path: String,
    /// Final path component.
    pub file_name: String,
    /// Upper-cased ticker symbol.
    pub symbol: Option<String>,
    /// Event type.
    pub event_type: Option<String>,
    /// Trading date.
    pub date: Option<NaiveDate>,
    /// Collection source (`live` or `historical`).
    pub source: Option<String>,
    /// Serialization format.
    pub format: DataFormat,
    /// Stream compression, if any.
    pub compression: Option<CompressionType>,
    /// Size on disk.
    pub size_bytes: u64,
}

impl SourceFileRecord {
    /// Returns true when the file is stream-compressed.
    #[must_use]
    pub const fn is_compressed(&self) -> bool {
        self.compression.is_some()
    }

    /// Build a record for `path` under `root` from its location and size.
    ///
    /// Returns `None` when the file does not carry a recognised event-file
    /// suffix or does not live under `root`.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use mdpack_packager::scanner::SourceFileRecord;
    ///
    /// let record = SourceFileRecord::from_location(
    ///     Utf8Path::new("/srv/data"),
    ///     Utf8Path::new("/srv/data/live/AAPL/Trade/2024-01-02.jsonl"),
    ///     42,
    /// )
    /// .expect("event file");
    /// assert_eq!(record.relative_path, "live/AAPL/Trade/2024-01-02.jsonl");
    /// assert_eq!(record.symbol.as_deref(), Some("AAPL"));
    /// assert_eq!(record.source.as_deref(), Some("live"));
    /// ```
    #[must_use]
    pub fn from_location(root: &Utf8Path, path: &Utf8Path, size_bytes: u64) -> Option<Self> {
        let file_name = path.file_name()?;
        let (format, compression) = recognise_extension(file_name)?;
        let relative = path.strip_prefix(root).ok()?;
        let relative_dir = relative.parent().unwrap_or_else(|| Utf8Path::new(""));
        let meta = infer_metadata(relative_dir, file_name);
        let relative_path = relative
            .components()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join("/");

        Some(Self {
            path: path.to_owned(),
            relative_path,
            file_name: file_name.to_owned(),
            symbol: meta.symbol,
            event_type: meta.event_type,
            date: meta.date,
            source: meta.source,
            format,
            compression,
            size_bytes,
        })
    }
}

/// Walk `root` and return the filtered, sorted event-file inventory.
///
/// Files are ordered by symbol, then date (undated first), then relative
/// path. A missing root yields an empty inventory. Entries that cannot be
/// read or whose path is not UTF-8 are skipped and logged at debug level.
///
/// # Errors
///
/// Returns [`crate::error::PackagerError::Cancelled`] when `cancel` is
/// raised during the walk.
pub fn scan_source(
    root: &Utf8Path,
    filter: &PackageFilter,
    cancel: &CancellationFlag,
) -> Result<Vec<SourceFileRecord>> {
    if !root.is_dir() {
        debug!("scan_source: data root {root} does not exist; nothing to scan");
        return Ok(Vec::new());
    }

    let mut records = Vec::new();
    for walked in WalkDir::new(root).follow_links(false) {
        cancel.check()?;
        let entry = match walked {
            Ok(entry) => entry,
            Err(e) => {
                debug!("scan_source: skipping unreadable entry: {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(path) = Utf8Path::from_path(entry.path()) else {
            debug!("scan_source: skipping non-UTF-8 path {}", entry.path().display());
            continue;
        };
        let size_bytes = match entry.metadata() {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                debug!("scan_source: skipping {path}: {e}");
                continue;
            }
        };
        if let Err(e) = File::open(path) {
            debug!("scan_source: skipping unreadable {path}: {e}");
            continue;
        }
        let Some(record) = SourceFileRecord::from_location(root, path, size_bytes) else {
            continue;
        };
        if filter.matches(
            record.symbol.as_deref(),
            record.event_type.as_deref(),
            record.date,
        ) {
            records.push(record);
        }
    }

    sort_records(&mut records);
    debug!("scan_source: {} file(s) selected under {root}", records.len());
    Ok(records)
}

fn sort_records(records: &mut [SourceFileRecord]) {
    records.sort_by(|a, b| {
        a.symbol
            .cmp(&b.symbol)
            .then_with(|| a.date.cmp(&b.date))
            .then_with(|| a.relative_path.cmp(&b.relative_path))
    });
}
