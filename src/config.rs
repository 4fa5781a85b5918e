//! `mdpack.toml` configuration loader.
//!
//! The file has two tables, `[packaging]` and `[import]`. Every key is
//! optional and unknown keys are rejected. Command-line flags override the
//! values loaded here. When no path is given the loader looks for
//! `mdpack.toml` in the working directory and falls back to defaults if it
//! is absent.

use camino::{Utf8Path, Utf8PathBuf};
use mdpack_packager::options::{CompressionLevel, ImportTarget, InternalLayout, PackageFormat};
use serde::Deserialize;
use std::fs;
use thiserror::Error;

/// File name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "mdpack.toml";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// File that was requested.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("invalid config file {path}: {source}")]
    Parse {
        /// File that was parsed.
        path: Utf8PathBuf,
        /// Parser error, including the offending key.
        #[source]
        source: toml::de::Error,
    },
}

/// Top-level configuration.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct MdpackConfig {
    /// Defaults for `--package`.
    pub packaging: PackagingConfig,
    /// Defaults for `--import-package`.
    pub import: ImportConfig,
}

impl MdpackConfig {
    /// Load configuration from `path`, or from [`DEFAULT_CONFIG_FILE`] when
    /// `path` is `None`.
    ///
    /// An explicit path must exist; the implicit default may be absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when an explicit file cannot be read
    /// and [`ConfigError::Parse`] when a file is malformed.
    pub fn load(path: Option<&Utf8Path>) -> Result<Self, ConfigError> {
        let (file, required) = path.map_or_else(
            || (Utf8PathBuf::from(DEFAULT_CONFIG_FILE), false),
            |explicit| (explicit.to_owned(), true),
        );
        if !required && !file.is_file() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(&file).map_err(|source| ConfigError::Read {
            path: file.clone(),
            source,
        })?;
        Self::from_toml(&file, &text)
    }

    /// Parse configuration text read from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML or unknown keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use mdpack::config::MdpackConfig;
    ///
    /// let config = MdpackConfig::from_toml(
    ///     Utf8Path::new("mdpack.toml"),
    ///     "[packaging]\nformat = \"tar.gz\"\n",
    /// )
    /// .expect("valid config");
    /// assert_eq!(config.packaging.format.as_str(), "tar.gz");
    /// ```
    pub fn from_toml(path: &Utf8Path, text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }
}

/// `[packaging]` table.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PackagingConfig {
    /// Directory scanned for event files.
    pub data_root: Utf8PathBuf,
    /// Directory receiving packages.
    pub output_directory: Utf8PathBuf,
    /// Recorded as the package creator.
    pub creator: Option<String>,
    /// Container format.
    pub format: PackageFormat,
    /// Compression effort.
    pub compression: CompressionLevel,
    /// Internal path layout.
    pub layout: InternalLayout,
    /// Add `README.md`.
    pub include_readme: bool,
    /// Add `metadata/data_dictionary.md`.
    pub include_data_dictionary: bool,
    /// Add the Python and R loaders.
    pub include_loader_scripts: bool,
    /// Add `metadata/quality_report.json`.
    pub include_quality_report: bool,
    /// Databases that receive SQL import scripts.
    pub import_targets: Vec<ImportTarget>,
    /// Embed per-event-type schemas.
    pub generate_schemas: bool,
    /// Record per-file SHA-256 checksums.
    pub verify_checksums: bool,
}

impl Default for PackagingConfig {
    fn default() -> Self {
        Self {
            data_root: Utf8PathBuf::from("data"),
            output_directory: Utf8PathBuf::from("packages"),
            creator: None,
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
        }
    }
}

/// `[import]` table.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ImportConfig {
    /// Extraction directory; the packaging data root when unset.
    pub destination: Option<Utf8PathBuf>,
    /// Re-hash extracted files.
    pub validate_checksums: bool,
    /// Leave identical existing files untouched.
    pub merge: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            destination: None,
            validate_checksums: true,
            merge: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(source: &str) -> Result<MdpackConfig, ConfigError> {
        MdpackConfig::from_toml(Utf8Path::new("mdpack.toml"), source)
    }

    #[rstest]
    fn defaults_package_everything() {
        let config = MdpackConfig::default();
        assert_eq!(config.packaging.data_root, Utf8PathBuf::from("data"));
        assert_eq!(config.packaging.format, PackageFormat::Zip);
        assert!(config.packaging.include_quality_report);
        assert!(config.import.validate_checksums);
        assert!(config.import.destination.is_none());
    }

    #[rstest]
    fn deserialises_overrides() {
        let config = parse(concat!(
            "[packaging]\n",
            "data_root = \"/srv/md\"\n",
            "layout = \"by-symbol\"\n",
            "compression = \"maximum\"\n",
            "import_targets = [\"duckdb\", \"postgresql\"]\n",
            "include_readme = false\n",
            "[import]\n",
            "merge = true\n",
        ))
        .expect("expected configuration to parse successfully");

        assert_eq!(config.packaging.data_root, Utf8PathBuf::from("/srv/md"));
        assert_eq!(config.packaging.layout, InternalLayout::BySymbol);
        assert_eq!(config.packaging.compression, CompressionLevel::Maximum);
        assert_eq!(
            config.packaging.import_targets,
            vec![ImportTarget::DuckDb, ImportTarget::PostgreSql]
        );
        assert!(!config.packaging.include_readme);
        assert!(config.packaging.include_data_dictionary);
        assert!(config.import.merge);
    }

    #[rstest]
    #[case::unknown_table("[export]\nformat = \"zip\"\n")]
    #[case::unknown_key("[packaging]\nencrypt = true\n")]
    #[case::bad_format("[packaging]\nformat = \"rar\"\n")]
    fn rejects_invalid_files(#[case] source: &str) {
        let err = parse(source).expect_err("expected a parse error");
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("mdpack.toml"));
    }

    #[rstest]
    fn explicit_missing_file_is_an_error() {
        let err = MdpackConfig::load(Some(Utf8Path::new("/definitely/not/mdpack.toml")))
            .expect_err("missing file");
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[rstest]
    fn loads_explicit_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("custom.toml")).expect("utf8 path");
        fs::write(&path, "[import]\nvalidate_checksums = false\n").expect("write config");
        let config = MdpackConfig::load(Some(&path)).expect("load");
        assert!(!config.import.validate_checksums);
    }
}
