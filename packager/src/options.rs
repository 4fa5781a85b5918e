//! Input configuration for package creation and import runs.
//!
//! [`PackageOptions`] is built once by the caller (usually the CLI layer
//! merging configuration and flags) and treated as read-only for the rest
//! of the run.

use camino::Utf8PathBuf;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A textual option value that does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} \"{value}\"; expected one of: {expected}")]
pub struct ParseOptionError {
    /// Which option was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
    /// Comma-separated accepted spellings.
    pub expected: &'static str,
}

/// Container format of a package file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum PackageFormat {
    /// Standard Zip container.
    #[default]
    Zip,
    /// Simplified delimiter-based layout inside a gzip stream.
    TarGz,
    /// Declared for compatibility; no backend exists.
    SevenZip,
}

impl PackageFormat {
    /// File extension (including the leading dot) for this format.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Zip => ".zip",
            Self::TarGz => ".tar.gz",
            Self::SevenZip => ".7z",
        }
    }

    /// Name recorded in the manifest `format` field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::TarGz => "tar.gz",
            Self::SevenZip => "7z",
        }
    }
}

impl fmt::Display for PackageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageFormat {
    type Err = ParseOptionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "zip" => Ok(Self::Zip),
            "targz" | "tar.gz" | "tgz" => Ok(Self::TarGz),
            "7z" | "sevenzip" => Ok(Self::SevenZip),
            _ => Err(ParseOptionError {
                kind: "package format",
                value: value.to_owned(),
                expected: "zip, tar.gz, 7z",
            }),
        }
    }
}

impl TryFrom<String> for PackageFormat {
    type Error = ParseOptionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Compression effort requested for the container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum CompressionLevel {
    /// Store entries without compression.
    None,
    /// Fastest compression.
    Fast,
    /// Balanced speed and ratio.
    #[default]
    Balanced,
    /// Smallest output.
    Maximum,
}

impl FromStr for CompressionLevel {
    type Err = ParseOptionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" | "store" => Ok(Self::None),
            "fast" | "fastest" => Ok(Self::Fast),
            "balanced" | "optimal" | "default" => Ok(Self::Balanced),
            "maximum" | "max" | "smallest" => Ok(Self::Maximum),
            _ => Err(ParseOptionError {
                kind: "compression level",
                value: value.to_owned(),
                expected: "none, fast, balanced, maximum",
            }),
        }
    }
}

impl TryFrom<String> for CompressionLevel {
    type Error = ParseOptionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Path-naming strategy for data files inside the archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum InternalLayout {
    /// `data/{date}/{symbol}/{eventType}/{filename}`
    #[default]
    ByDate,
    /// `data/{symbol}/{eventType}/{date}/{filename}`
    BySymbol,
    /// `data/{eventType}/{symbol}/{date}/{filename}`
    ByType,
    /// `data/{filename}`
    Flat,
}

impl InternalLayout {
    /// Name recorded in the manifest `layout` field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ByDate => "ByDate",
            Self::BySymbol => "BySymbol",
            Self::ByType => "ByType",
            Self::Flat => "Flat",
        }
    }
}

impl fmt::Display for InternalLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InternalLayout {
    type Err = ParseOptionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "bydate" | "date" => Ok(Self::ByDate),
            "bysymbol" | "symbol" => Ok(Self::BySymbol),
            "bytype" | "type" | "byeventtype" => Ok(Self::ByType),
            "flat" => Ok(Self::Flat),
            _ => Err(ParseOptionError {
                kind: "internal layout",
                value: value.to_owned(),
                expected: "by-date, by-symbol, by-type, flat",
            }),
        }
    }
}

impl TryFrom<String> for InternalLayout {
    type Error = ParseOptionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Database engines that receive a generated SQL import script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum ImportTarget {
    /// PostgreSQL (`COPY` based loading).
    PostgreSql,
    /// ClickHouse (`INSERT ... FORMAT JSONEachRow`).
    ClickHouse,
    /// DuckDB (`read_json_auto`).
    DuckDb,
}

impl ImportTarget {
    /// Every supported target, in script-generation order.
    pub const ALL: [Self; 3] = [Self::PostgreSql, Self::ClickHouse, Self::DuckDb];

    /// Lower-case name used in `scripts/import_<name>.sql`.
    #[must_use]
    pub const fn file_stem(self) -> &'static str {
        match self {
            Self::PostgreSql => "postgresql",
            Self::ClickHouse => "clickhouse",
            Self::DuckDb => "duckdb",
        }
    }

    /// Human-readable product name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::PostgreSql => "PostgreSQL",
            Self::ClickHouse => "ClickHouse",
            Self::DuckDb => "DuckDB",
        }
    }
}

impl FromStr for ImportTarget {
    type Err = ParseOptionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgresql" | "postgres" | "pg" => Ok(Self::PostgreSql),
            "clickhouse" => Ok(Self::ClickHouse),
            "duckdb" => Ok(Self::DuckDb),
            _ => Err(ParseOptionError {
                kind: "import target",
                value: value.to_owned(),
                expected: "postgresql, clickhouse, duckdb",
            }),
        }
    }
}

impl TryFrom<String> for ImportTarget {
    type Error = ParseOptionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Allow-lists and date bounds applied to scanned files.
///
/// An empty or absent list means "no restriction". Files without an
/// inferred date are never excluded by the date bounds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageFilter {
    /// Symbols to keep (case-insensitive).
    pub symbols: Option<Vec<String>>,
    /// Event types to keep (case-insensitive).
    pub event_types: Option<Vec<String>>,
    /// Inclusive lower date bound.
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper date bound.
    pub end_date: Option<NaiveDate>,
}

impl PackageFilter {
    /// Returns true when a file with the given inferred fields passes.
    ///
    /// # Examples
    ///
    /// ```
    /// use mdpack_packager::options::PackageFilter;
    ///
    /// let filter = PackageFilter {
    ///     symbols: Some(vec!["aapl".to_owned()]),
    ///     ..PackageFilter::default()
    /// };
    /// assert!(filter.matches(Some("AAPL"), Some("Trade"), None));
    /// assert!(!filter.matches(Some("MSFT"), Some("Trade"), None));
    /// ```
    #[must_use]
    pub fn matches(
        &self,
        symbol: Option<&str>,
        event_type: Option<&str>,
        date: Option<NaiveDate>,
    ) -> bool {
        if !allowed(self.symbols.as_deref(), symbol) {
            return false;
        }
        if !allowed(self.event_types.as_deref(), event_type) {
            return false;
        }
        let Some(day) = date else {
            return true;
        };
        if self.start_date.is_some_and(|start| day < start) {
            return false;
        }
        !self.end_date.is_some_and(|end| day > end)
    }
}

fn allowed(list: Option<&[String]>, value: Option<&str>) -> bool {
    match list {
        None | Some([]) => true,
        Some(names) => value.is_some_and(|v| names.iter().any(|item| item.eq_ignore_ascii_case(v))),
    }
}

/// Full configuration for one package creation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOptions {
    /// Root of the collected event-file tree.
    pub source_directory: Utf8PathBuf,
    /// Directory receiving the package file; created when absent.
    pub output_directory: Utf8PathBuf,
    /// Package name; also the output file stem. Generated when absent.
    pub name: Option<String>,
    /// Free-form description stored in the manifest.
    pub description: Option<String>,
    /// Creator recorded in the manifest.
    pub creator: Option<String>,
    /// File selection rules.
    pub filter: PackageFilter,
    /// Container format.
    pub format: PackageFormat,
    /// Container compression effort.
    pub compression: CompressionLevel,
    /// Internal path layout for data files.
    pub layout: InternalLayout,
    /// Emit `README.md`.
    pub include_readme: bool,
    /// Emit `metadata/data_dictionary.md`.
    pub include_data_dictionary: bool,
    /// Emit `scripts/load_data.py` and `scripts/load_data.R`.
    pub include_loader_scripts: bool,
    /// Emit `metadata/quality_report.json`.
    pub include_quality_report: bool,
    /// Emit `scripts/import_<target>.sql` for each listed engine.
    pub import_targets: Vec<ImportTarget>,
    /// Embed per-event-type schemas in the manifest.
    pub generate_schemas: bool,
    /// Compute per-file SHA-256 digests.
    pub verify_checksums: bool,
    /// Reserved: archive encryption is not implemented.
    pub password: Option<String>,
    /// Reserved: multi-part splitting is not implemented.
    pub max_package_bytes: Option<u64>,
}

impl Default for PackageOptions {
    fn default() -> Self {
        Self {
            source_directory: Utf8PathBuf::from("data"),
            output_directory: Utf8PathBuf::from("packages"),
            name: None,
            description: None,
            creator: None,
            filter: PackageFilter::default(),
            format: PackageFormat::default(),
            compression: CompressionLevel::default(),
            layout: InternalLayout::default(),
            include_readme: true,
            include_data_dictionary: true,
            include_loader_scripts: true,
            include_quality_report: true,
            import_targets: Vec::new(),
            generate_schemas: true,
            verify_checksums: true,
            password: None,
            max_package_bytes: None,
        }
    }
}

impl PackageOptions {
    /// Resolve the package name, generating a timestamped one if unset.
    #[must_use]
    pub fn resolved_name(&self, now: DateTime<Utc>) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => format!("market-data-{}", now.format("%Y%m%d-%H%M%S")),
        }
    }

    /// File name of the package inside [`Self::output_directory`].
    ///
    /// # Examples
    ///
    /// ```
    /// use mdpack_packager::options::{PackageFormat, PackageOptions};
    ///
    /// let options = PackageOptions {
    ///     name: Some("equities q1".to_owned()),
    ///     format: PackageFormat::TarGz,
    ///     ..PackageOptions::default()
    /// };
    /// assert_eq!(options.package_file_name(chrono::Utc::now()), "equities_q1.tar.gz");
    /// ```
    #[must_use]
    pub fn package_file_name(&self, now: DateTime<Utc>) -> String {
        let stem: String = self
            .resolved_name(now)
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("{stem}{}", self.format.extension())
    }

    /// Warnings for options that are accepted but not acted upon.
    #[must_use]
    pub fn reserved_option_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.password.is_some() {
            warnings.push("Password was supplied but package encryption is not supported; the package is unencrypted".to_owned());
        }
        if self.max_package_bytes.is_some() {
            warnings.push("Maximum package size was supplied but multi-part packages are not supported; a single package was written".to_owned());
        }
        warnings
    }
}

/// Configuration for one import run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    /// Directory receiving the extracted tree.
    pub destination: Utf8PathBuf,
    /// Re-hash extracted files against manifest checksums.
    pub validate_checksums: bool,
    /// Leave existing files whose digest already matches untouched.
    pub merge: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            destination: Utf8PathBuf::from("data"),
            validate_checksums: true,
            merge: false,
        }
    }
}
