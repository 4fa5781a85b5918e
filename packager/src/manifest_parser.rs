//! Manifest deserialization for package inspection and import.
//!
//! Parses the `manifest.json` entry read from a container into a
//! [`PackageManifest`]. Field types (dates, timestamps, counts) are checked
//! during deserialization, so a manifest that parses is structurally typed;
//! semantic checks such as "has at least one file" live in
//! [`crate::inspection::validate_package`].

use crate::manifest::PackageManifest;

/// Errors arising from manifest parsing.
#[derive(Debug, thiserror::Error)]
pub enum ManifestParseError {
    /// The manifest bytes are not UTF-8.
    #[error("manifest is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// JSON deserialization or field validation failed.
    #[error("manifest parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse a JSON string into a [`PackageManifest`].
///
/// # Errors
///
/// Returns an error if the JSON is malformed or a field has the wrong
/// shape.
///
/// # Examples
///
/// ```
/// use mdpack_packager::manifest_parser::parse_manifest;
///
/// let json = concat!(
///     r#"{"packageId":"p1","name":"demo","version":"1.0","#,
///     r#""createdAt":"2026-01-02T03:04:05Z","format":"zip","layout":"ByDate","#,
///     r#""files":[],"totalFiles":0}"#,
/// );
/// let manifest = parse_manifest(json).expect("valid manifest");
/// assert_eq!(manifest.name, "demo");
/// ```
pub fn parse_manifest(json: &str) -> Result<PackageManifest, ManifestParseError> {
    Ok(serde_json::from_str(json)?)
}

/// Parse raw manifest bytes as read from an archive entry.
///
/// A leading UTF-8 byte-order mark is tolerated.
///
/// # Errors
///
/// Returns an error if the bytes are not UTF-8 or not a valid manifest.
pub fn parse_manifest_bytes(bytes: &[u8]) -> Result<PackageManifest, ManifestParseError> {
    let text = std::str::from_utf8(bytes)?;
    parse_manifest(text.trim_start_matches('\u{feff}'))
}
