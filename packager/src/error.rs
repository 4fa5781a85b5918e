//! Error types for packaging, inspection, and import operations.
//!
//! Public create and import entry points never return these directly; they
//! are folded into [`crate::result::PackageResult`] and
//! [`crate::result::ImportResult`]. Inspection helpers such as
//! [`crate::inspection::read_manifest`] surface them as ordinary `Result`
//! values.

use crate::manifest_parser::ManifestParseError;
use crate::options::PackageFormat;
use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// Errors arising while scanning, writing, or reading packages.
#[derive(Debug, Error)]
pub enum PackagerError {
    /// An I/O operation failed (reading sources, writing the archive).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A scanned source file could not be read while hashing or packing it.
    #[error("failed to read source file {path}: {source}")]
    SourceFile {
        /// Location of the unreadable file.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization of the manifest or a generated artefact failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The Zip container could not be read or written.
    #[error("zip container error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The embedded manifest exists but could not be parsed.
    #[error(transparent)]
    ManifestParse(#[from] ManifestParseError),

    /// The caller cancelled the operation.
    #[error("Operation cancelled")]
    Cancelled,

    /// The scan produced no files after filtering.
    #[error("No files found matching the specified criteria")]
    NoMatchingFiles,

    /// The requested container format is declared but has no backend.
    #[error("{format} packages are not supported")]
    UnsupportedFormat {
        /// The rejected format.
        format: PackageFormat,
    },

    /// The package file does not exist.
    #[error("package file not found: {path}")]
    PackageNotFound {
        /// Path that was looked up.
        path: Utf8PathBuf,
    },

    /// The container has no `manifest.json`.
    #[error("{path} is not a valid package (manifest.json not found)")]
    NotAPackage {
        /// Path of the rejected container.
        path: Utf8PathBuf,
    },

    /// The container structure does not follow the package layout.
    #[error("malformed {format} container: {reason}")]
    MalformedContainer {
        /// Container format being parsed.
        format: PackageFormat,
        /// Description of the structural problem.
        reason: String,
    },
}

impl PackagerError {
    /// Returns true when the error represents caller cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Wrap an I/O failure on the source file at `path`.
    pub(crate) fn source_file(path: &Utf8Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::SourceFile {
            path: path.to_owned(),
            source,
        }
    }
}

/// Result type alias using [`PackagerError`].
pub type Result<T> = std::result::Result<T, PackagerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_uses_fixed_message() {
        assert_eq!(PackagerError::Cancelled.to_string(), "Operation cancelled");
        assert!(PackagerError::Cancelled.is_cancelled());
    }

    #[test]
    fn not_a_package_names_the_path() {
        let err = PackagerError::NotAPackage {
            path: Utf8PathBuf::from("/tmp/broken.zip"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/broken.zip"));
        assert!(msg.contains("not a valid package"));
        assert!(!err.is_cancelled());
    }

    #[test]
    fn unsupported_format_names_the_format() {
        let err = PackagerError::UnsupportedFormat {
            format: PackageFormat::SevenZip,
        };
        assert_eq!(err.to_string(), "7z packages are not supported");
    }

    #[test]
    fn source_file_errors_name_the_file() {
        let path = Utf8Path::new("/srv/data/AAPL/Trade/2024-01-02.jsonl");
        let err = PackagerError::source_file(path)(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "Permission denied",
        ));
        assert_eq!(
            err.to_string(),
            "failed to read source file /srv/data/AAPL/Trade/2024-01-02.jsonl: Permission denied"
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
