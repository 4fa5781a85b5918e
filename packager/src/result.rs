//! Outcomes of create, import, validate, and list operations.
//!
//! Create and import return result structs rather than `Result`: a failed
//! package run is a reportable outcome (with warnings, partial counts, and
//! itemized validation errors), not an exceptional one.

use crate::error::PackagerError;
use crate::manifest::{DateRange, PackageFileEntry, PackageManifest};
use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

/// Fixed message used for cancelled operations.
pub const CANCELLED_MESSAGE: &str = "Operation cancelled";

/// Why an operation did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationFailure {
    /// The caller raised the cancellation flag.
    Cancelled,
    /// Any other failure, with a descriptive message.
    Error(String),
}

impl OperationFailure {
    /// Returns true for [`OperationFailure::Cancelled`].
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl fmt::Display for OperationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => f.write_str(CANCELLED_MESSAGE),
            Self::Error(message) => f.write_str(message),
        }
    }
}

impl From<&PackagerError> for OperationFailure {
    fn from(err: &PackagerError) -> Self {
        if err.is_cancelled() {
            Self::Cancelled
        } else {
            Self::Error(err.to_string())
        }
    }
}

/// Outcome of [`crate::packaging::create_package`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PackageResult {
    /// True when the package was written completely.
    pub success: bool,
    /// Location of the written package.
    pub package_path: Option<Utf8PathBuf>,
    /// The final manifest, including the archive digest.
    pub manifest: Option<PackageManifest>,
    /// Data files stored in the package.
    pub files_included: usize,
    /// Sum of stored data file sizes.
    pub data_bytes: u64,
    /// Size of the package file as first written.
    pub package_size_bytes: u64,
    /// SHA-256 of the package file as first written.
    pub checksum: Option<String>,
    /// Non-fatal notes.
    pub warnings: Vec<String>,
    /// Set when `success` is false.
    pub failure: Option<OperationFailure>,
    /// Wall-clock time spent.
    pub elapsed: Duration,
}

impl PackageResult {
    /// Failure message, if the run failed.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.failure.as_ref().map(ToString::to_string)
    }
}

/// Category of an itemized validation or import problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorKind {
    /// Content hash differs from the manifest checksum.
    ChecksumMismatch,
    /// A manifest file is absent from the container.
    MissingFile,
    /// An entry path is absolute or escapes the destination.
    UnsafePath,
    /// An entry could not be written to the destination.
    ExtractionFailed,
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ChecksumMismatch => "checksum mismatch",
            Self::MissingFile => "missing file",
            Self::UnsafePath => "unsafe path",
            Self::ExtractionFailed => "extraction failed",
        })
    }
}

/// One itemized problem found while validating or importing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Archive path of the affected entry.
    pub path: String,
    /// Problem category.
    pub kind: ValidationErrorKind,
    /// Expected value (for checksum mismatches).
    pub expected: Option<String>,
    /// Observed value (for checksum mismatches).
    pub actual: Option<String>,
    /// Human-readable description.
    pub message: String,
}

impl ValidationError {
    /// A content hash that differs from the recorded checksum.
    #[must_use]
    pub fn checksum_mismatch(path: &str, expected: &str, actual: &str) -> Self {
        Self {
            path: path.to_owned(),
            kind: ValidationErrorKind::ChecksumMismatch,
            expected: Some(expected.to_owned()),
            actual: Some(actual.to_owned()),
            message: format!("Checksum mismatch for {path}"),
        }
    }

    /// A manifest file with no matching container entry.
    #[must_use]
    pub fn missing_file(path: &str) -> Self {
        Self {
            path: path.to_owned(),
            kind: ValidationErrorKind::MissingFile,
            expected: None,
            actual: None,
            message: format!("File listed in manifest is missing from package: {path}"),
        }
    }

    /// An entry refused because its path is unsafe.
    #[must_use]
    pub fn unsafe_path(path: &str, reason: &str) -> Self {
        Self {
            path: path.to_owned(),
            kind: ValidationErrorKind::UnsafePath,
            expected: None,
            actual: None,
            message: format!("Refused unsafe entry path {path}: {reason}"),
        }
    }

    /// An entry that could not be written.
    #[must_use]
    pub fn extraction_failed(path: &str, reason: &str) -> Self {
        Self {
            path: path.to_owned(),
            kind: ValidationErrorKind::ExtractionFailed,
            expected: None,
            actual: None,
            message: format!("Failed to extract {path}: {reason}"),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.expected, &self.actual) {
            (Some(expected), Some(actual)) => {
                write!(f, "{} (expected {expected}, got {actual})", self.message)
            }
            _ => f.write_str(&self.message),
        }
    }
}

/// Outcome of [`crate::extraction::import_package`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImportResult {
    /// True when validation was disabled or nothing failed validation.
    pub success: bool,
    /// Directory the package was extracted into.
    pub destination: Utf8PathBuf,
    /// The package manifest, when it could be read.
    pub manifest: Option<PackageManifest>,
    /// Entries written to the destination.
    pub files_extracted: usize,
    /// Entries left untouched because an identical file already existed.
    pub files_skipped: usize,
    /// Bytes written.
    pub bytes_extracted: u64,
    /// Itemized problems.
    pub validation_errors: Vec<ValidationError>,
    /// Non-fatal notes, such as files a merge left in place.
    pub warnings: Vec<String>,
    /// Set when the import could not run to completion.
    pub failure: Option<OperationFailure>,
    /// Wall-clock time spent.
    pub elapsed: Duration,
}

impl ImportResult {
    /// Failure message: the operation failure, or a summary of validation
    /// errors.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        if let Some(failure) = &self.failure {
            return Some(failure.to_string());
        }
        if self.success {
            return None;
        }
        Some(format!(
            "{} file(s) failed validation",
            self.validation_errors.len()
        ))
    }
}

/// Outcome of [`crate::inspection::validate_package`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PackageValidationResult {
    /// No issues, no missing files, and no checksum mismatches.
    pub is_valid: bool,
    /// The manifest, when it could be read.
    pub manifest: Option<PackageManifest>,
    /// Structural problems.
    pub issues: Vec<String>,
    /// Manifest paths without a container entry.
    pub missing_files: Vec<String>,
    /// Itemized checksum mismatches (only when hashing was requested).
    pub checksum_errors: Vec<ValidationError>,
}

/// Manifest-derived summary of a package, plus its size on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageContents {
    /// Package file.
    pub package_path: Utf8PathBuf,
    /// Size of the package file.
    pub package_size_bytes: u64,
    /// Unique package id.
    pub package_id: String,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Container format name.
    pub format: String,
    /// Internal layout name.
    pub layout: String,
    /// Number of data files.
    pub total_files: usize,
    /// Estimated events.
    pub total_events: u64,
    /// Estimated uncompressed size.
    pub uncompressed_size_bytes: u64,
    /// Distinct symbols.
    pub symbols: Vec<String>,
    /// Distinct event types.
    pub event_types: Vec<String>,
    /// Span of dated files.
    pub date_range: Option<DateRange>,
    /// Data file entries.
    pub files: Vec<PackageFileEntry>,
    /// Generated artefacts.
    pub supplementary_files: Vec<String>,
}

impl PackageContents {
    /// Summarise `manifest` for a package file of `package_size_bytes`.
    #[must_use]
    pub fn from_manifest(
        package_path: Utf8PathBuf,
        package_size_bytes: u64,
        manifest: PackageManifest,
    ) -> Self {
        Self {
            package_path,
            package_size_bytes,
            package_id: manifest.package_id,
            name: manifest.name,
            description: manifest.description,
            created_at: manifest.created_at,
            format: manifest.format,
            layout: manifest.layout,
            total_files: manifest.total_files,
            total_events: manifest.total_events,
            uncompressed_size_bytes: manifest.uncompressed_size_bytes,
            symbols: manifest.symbols,
            event_types: manifest.event_types,
            date_range: manifest.date_range,
            files: manifest.files,
            supplementary_files: manifest.supplementary_files.unwrap_or_default(),
        }
    }
}

/// Format a byte count with a binary unit suffix.
///
/// Sizes of a kilobyte or more carry one decimal place, rounded half up.
///
/// # Examples
///
/// ```
/// use mdpack_packager::result::human_size;
///
/// assert_eq!(human_size(512), "512B");
/// assert_eq!(human_size(1536), "1.5KB");
/// assert_eq!(human_size(3 * 1024 * 1024), "3.0MB");
/// ```
#[must_use]
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    let mut divisor = 1_u64;
    let mut unit = "B";
    for name in UNITS {
        let next = divisor.saturating_mul(1024);
        if bytes < next {
            break;
        }
        divisor = next;
        unit = name;
    }
    if divisor == 1 {
        return format!("{bytes}B");
    }
    let tenths = u128::from(bytes)
        .saturating_mul(10)
        .saturating_add(u128::from(divisor >> 1))
        .checked_div(u128::from(divisor))
        .unwrap_or_default();
    let whole = tenths.checked_div(10).unwrap_or_default();
    let fraction = tenths.checked_rem(10).unwrap_or_default();
    format!("{whole}.{fraction}{unit}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn cancellation_keeps_fixed_message() {
        let failure = OperationFailure::from(&PackagerError::Cancelled);
        assert!(failure.is_cancelled());
        assert_eq!(failure.to_string(), CANCELLED_MESSAGE);
    }

    #[test]
    fn other_errors_keep_their_message() {
        let failure = OperationFailure::from(&PackagerError::NoMatchingFiles);
        assert!(!failure.is_cancelled());
        assert_eq!(
            failure.to_string(),
            "No files found matching the specified criteria"
        );
    }

    #[test]
    fn checksum_mismatch_displays_both_digests() {
        let err = ValidationError::checksum_mismatch("data/a.jsonl", "aa", "bb");
        assert_eq!(err.kind, ValidationErrorKind::ChecksumMismatch);
        assert_eq!(
            err.to_string(),
            "Checksum mismatch for data/a.jsonl (expected aa, got bb)"
        );
    }

    #[test]
    fn import_error_message_summarises_validation_failures() {
        let result = ImportResult {
            success: false,
            validation_errors: vec![ValidationError::missing_file("data/a.jsonl")],
            ..ImportResult::default()
        };
        assert_eq!(
            result.error_message().as_deref(),
            Some("1 file(s) failed validation")
        );
        let ok = ImportResult {
            success: true,
            ..ImportResult::default()
        };
        assert_eq!(ok.error_message(), None);
    }

    #[rstest]
    #[case::zero(0, "0B")]
    #[case::just_below_a_kilobyte(1023, "1023B")]
    #[case::exact_kilobyte(1024, "1.0KB")]
    #[case::rounds_half_up(1280, "1.3KB")]
    #[case::rounds_into_next_whole(1_048_575, "1024.0KB")]
    #[case::gigabytes(5 * 1024 * 1024 * 1024 + 100 * 1024 * 1024, "5.1GB")]
    #[case::caps_at_terabytes(5 * 1024_u64.pow(5), "5120.0TB")]
    #[case::largest(u64::MAX, "16777216.0TB")]
    fn human_size_uses_integer_tenths(#[case] bytes: u64, #[case] expected: &str) {
        assert_eq!(human_size(bytes), expected);
    }
}
