//! Turn scanned source files into manifest file entries.
//!
//! For each [`SourceFileRecord`] the builder computes the archive-internal
//! path from the [`InternalLayout`], the optional SHA-256 checksum, and the
//! advisory event-count and size estimates.

use crate::error::{PackagerError, Result};
use crate::estimate::{estimate_event_count, estimate_uncompressed_size, heuristic_event_count};
use crate::inference::strip_known_extension;
use crate::manifest::PackageFileEntry;
use crate::options::InternalLayout;
use crate::progress::{CancellationFlag, PackageProgress, PackageStage, ProgressSink};
use crate::scanner::SourceFileRecord;
use crate::sha256_digest::compute_sha256;
use camino::Utf8PathBuf;
use chrono::NaiveDate;
use log::warn;
use std::collections::HashSet;

/// Placeholder for a missing symbol in internal paths.
pub const UNKNOWN_SYMBOL: &str = "UNKNOWN";
/// Placeholder for a missing event type in internal paths.
pub const UNKNOWN_EVENT_TYPE: &str = "Unknown";
/// Placeholder for a missing date in internal paths.
pub const UNDATED: &str = "undated";

/// Root directory for data files inside a package.
pub const DATA_DIR: &str = "data";

/// A manifest entry paired with the file it will be copied from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    /// Source file on disk.
    pub source: Utf8PathBuf,
    /// Entry recorded in the manifest.
    pub entry: PackageFileEntry,
}

/// Entries produced by [`build_file_entries`].
#[derive(Debug, Default)]
pub struct FilePlan {
    /// Files in inventory order.
    pub files: Vec<PlannedFile>,
    /// Non-fatal notes, such as renamed path collisions.
    pub warnings: Vec<String>,
}

impl FilePlan {
    /// The manifest entries, in order.
    #[must_use]
    pub fn entries(&self) -> Vec<PackageFileEntry> {
        self.files.iter().map(|f| f.entry.clone()).collect()
    }

    /// Sum of source file sizes.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.entry.size_bytes).sum()
    }
}

/// Archive-internal path for a data file under `layout`.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use mdpack_packager::manifest_builder::internal_path;
/// use mdpack_packager::options::InternalLayout;
///
/// let date = NaiveDate::from_ymd_opt(2024, 1, 2);
/// assert_eq!(
///     internal_path(InternalLayout::BySymbol, Some("AAPL"), Some("Trade"), date, "a.jsonl"),
///     "data/AAPL/Trade/2024-01-02/a.jsonl"
/// );
/// assert_eq!(
///     internal_path(InternalLayout::ByDate, None, None, None, "a.jsonl"),
///     "data/undated/UNKNOWN/Unknown/a.jsonl"
/// );
/// ```
#[must_use]
pub fn internal_path(
    layout: InternalLayout,
    symbol: Option<&str>,
    event_type: Option<&str>,
    date: Option<NaiveDate>,
    file_name: &str,
) -> String {
    let sym = symbol.unwrap_or(UNKNOWN_SYMBOL);
    let kind = event_type.unwrap_or(UNKNOWN_EVENT_TYPE);
    let day = date.map_or_else(|| UNDATED.to_owned(), |d| d.format("%Y-%m-%d").to_string());
    match layout {
        InternalLayout::ByDate => format!("{DATA_DIR}/{day}/{sym}/{kind}/{file_name}"),
        InternalLayout::BySymbol => format!("{DATA_DIR}/{sym}/{kind}/{day}/{file_name}"),
        InternalLayout::ByType => format!("{DATA_DIR}/{kind}/{sym}/{day}/{file_name}"),
        InternalLayout::Flat => format!("{DATA_DIR}/{file_name}"),
    }
}

/// Settings that shape the generated entries.
#[derive(Debug, Clone, Copy)]
pub struct BuildSettings {
    /// Internal path layout.
    pub layout: InternalLayout,
    /// Compute per-file SHA-256 digests.
    pub verify_checksums: bool,
}

/// Build manifest entries for every scanned record.
///
/// Emits one [`PackageStage::GeneratingManifest`] progress event per file.
///
/// # Errors
///
/// Returns [`crate::error::PackagerError::Cancelled`] if `cancel` is
/// raised, or [`PackagerError::SourceFile`] if a file cannot be hashed.
pub fn build_file_entries(
    records: &[SourceFileRecord],
    settings: BuildSettings,
    progress: &mut dyn ProgressSink,
    cancel: &CancellationFlag,
) -> Result<FilePlan> {
    let mut plan = FilePlan::default();
    let mut used_paths = HashSet::new();
    let total = records.len();

    for (index, record) in records.iter().enumerate() {
        cancel.check()?;
        progress.report(&PackageProgress::file(
            PackageStage::GeneratingManifest,
            index,
            total,
            &record.relative_path,
        ));

        let preferred = internal_path(
            settings.layout,
            record.symbol.as_deref(),
            record.event_type.as_deref(),
            record.date,
            &record.file_name,
        );
        let path = unique_path(&preferred, &mut used_paths);
        if path != preferred {
            plan.warnings.push(format!(
                "Duplicate archive path {preferred}; stored {} as {path}",
                record.relative_path
            ));
        }

        let checksum = if settings.verify_checksums {
            compute_sha256(record.path.as_std_path())
                .map_err(PackagerError::source_file(&record.path))?
                .into_inner()
        } else {
            String::new()
        };

        plan.files.push(PlannedFile {
            source: record.path.clone(),
            entry: PackageFileEntry {
                path,
                source_path: record.relative_path.clone(),
                symbol: record.symbol.clone(),
                event_type: record.event_type.clone(),
                date: record.date,
                source: record.source.clone(),
                format: record.format,
                is_compressed: record.is_compressed(),
                compression_type: record.compression,
                size_bytes: record.size_bytes,
                uncompressed_size_bytes: estimate_uncompressed_size(
                    record.size_bytes,
                    record.is_compressed(),
                ),
                event_count: event_count_for(record),
                checksum,
            },
        });
    }

    Ok(plan)
}

fn event_count_for(record: &SourceFileRecord) -> u64 {
    estimate_event_count(
        record.path.as_std_path(),
        record.size_bytes,
        record.format,
        record.compression,
    )
    .unwrap_or_else(|e| {
        warn!(
            "could not sample {}: {e}; using size heuristic",
            record.relative_path
        );
        heuristic_event_count(record.size_bytes)
    })
}

/// Reserve `preferred`, or the first free `-N` suffixed variant of it.
fn unique_path(preferred: &str, used: &mut HashSet<String>) -> String {
    if used.insert(preferred.to_owned()) {
        return preferred.to_owned();
    }
    let (dir, file_name) = preferred.rsplit_once('/').unwrap_or(("", preferred));
    let known_stem = strip_known_extension(file_name);
    let stem = if known_stem.len() == file_name.len() {
        file_name.rsplit_once('.').map_or(file_name, |(base, _)| base)
    } else {
        known_stem
    };
    let extension = file_name.get(stem.len()..).unwrap_or_default();

    let mut counter = 2u32;
    loop {
        let candidate = if dir.is_empty() {
            format!("{stem}-{counter}{extension}")
        } else {
            format!("{dir}/{stem}-{counter}{extension}")
        };
        if used.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::DataFormat;
    use crate::progress::MockProgressSink;
    use camino::Utf8Path;
    use rstest::rstest;

    fn day() -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2024, 1, 2)
    }

    #[rstest]
    #[case(InternalLayout::ByDate, "data/2024-01-02/AAPL/Trade/f.jsonl")]
    #[case(InternalLayout::BySymbol, "data/AAPL/Trade/2024-01-02/f.jsonl")]
    #[case(InternalLayout::ByType, "data/Trade/AAPL/2024-01-02/f.jsonl")]
    #[case(InternalLayout::Flat, "data/f.jsonl")]
    fn layouts_follow_templates(#[case] layout: InternalLayout, #[case] expected: &str) {
        assert_eq!(
            internal_path(layout, Some("AAPL"), Some("Trade"), day(), "f.jsonl"),
            expected
        );
    }

    #[test]
    fn collisions_get_numeric_suffixes() {
        let mut used = HashSet::new();
        assert_eq!(unique_path("data/a.jsonl.gz", &mut used), "data/a.jsonl.gz");
        assert_eq!(unique_path("data/a.jsonl.gz", &mut used), "data/a-2.jsonl.gz");
        assert_eq!(unique_path("data/a.jsonl.gz", &mut used), "data/a-3.jsonl.gz");
        assert_eq!(unique_path("data/b.bin", &mut used), "data/b.bin");
        assert_eq!(unique_path("data/b.bin", &mut used), "data/b-2.bin");
    }

    fn write_record(root: &Utf8Path, relative: &str, body: &str) -> SourceFileRecord {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&path, body).expect("write");
        SourceFileRecord::from_location(root, &path, body.len() as u64).expect("record")
    }

    #[test]
    fn flat_layout_renames_duplicates_with_warning() {
        let dir = tempfile::tempdir().expect("temp dir");
        let root = Utf8Path::from_path(dir.path()).expect("utf8");
        let records = vec![
            write_record(root, "AAPL/Trade/2024-01-02.jsonl", "{}\n"),
            write_record(root, "MSFT/Trade/2024-01-02.jsonl", "{}\n{}\n"),
        ];
        let settings = BuildSettings {
            layout: InternalLayout::Flat,
            verify_checksums: true,
        };
        let mut sink = MockProgressSink::new();
        sink.expect_report()
            .withf(|p| p.stage == PackageStage::GeneratingManifest)
            .times(2)
            .return_const(());

        let plan = build_file_entries(&records, settings, &mut sink, &CancellationFlag::new())
            .expect("plan");
        let paths: Vec<&str> = plan.files.iter().map(|f| f.entry.path.as_str()).collect();
        assert_eq!(paths, vec!["data/2024-01-02.jsonl", "data/2024-01-02-2.jsonl"]);
        assert_eq!(plan.warnings.len(), 1);
        assert!(plan.files.iter().all(|f| f.entry.checksum.len() == 64));
        assert_eq!(plan.files.get(1).map(|f| f.entry.event_count), Some(2));
        assert_eq!(plan.total_bytes(), 9);
    }

    #[test]
    fn skipped_checksums_are_empty() {
        let dir = tempfile::tempdir().expect("temp dir");
        let root = Utf8Path::from_path(dir.path()).expect("utf8");
        let records = vec![write_record(root, "SPY/Bar/2024-01-02.parquet", "PAR1")];
        let settings = BuildSettings {
            layout: InternalLayout::ByType,
            verify_checksums: false,
        };
        let mut sink = |_: &PackageProgress| {};
        let plan = build_file_entries(&records, settings, &mut sink, &CancellationFlag::new())
            .expect("plan");
        let entry = &plan.files.first().expect("one file").entry;
        assert!(entry.checksum.is_empty());
        assert_eq!(entry.format, DataFormat::Parquet);
        assert_eq!(entry.path, "data/Bar/SPY/2024-01-02/2024-01-02.parquet");
    }

    #[test]
    fn vanished_source_file_error_names_the_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let root = Utf8Path::from_path(dir.path()).expect("utf8");
        let record = write_record(root, "AAPL/Trade/2024-01-02.jsonl", "{}\n");
        std::fs::remove_file(&record.path).expect("remove");
        let settings = BuildSettings {
            layout: InternalLayout::BySymbol,
            verify_checksums: true,
        };
        let mut sink = |_: &PackageProgress| {};

        let err = build_file_entries(
            std::slice::from_ref(&record),
            settings,
            &mut sink,
            &CancellationFlag::new(),
        )
        .expect_err("missing file");
        assert!(matches!(err, PackagerError::SourceFile { .. }));
        assert!(err.to_string().contains(record.path.as_str()));
    }
}
