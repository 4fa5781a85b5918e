//! CLI argument definitions for `mdpack`.
//!
//! Exactly one mode flag is accepted per invocation: `--package`,
//! `--import-package`, `--list-package`, or `--validate-package`. Option
//! flags for each mode override the matching `mdpack.toml` values.

use crate::config::MdpackConfig;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDate;
use clap::{ArgGroup, Parser};
use mdpack_packager::options::{
    CompressionLevel, ImportOptions, ImportTarget, InternalLayout, PackageFilter, PackageFormat,
    PackageOptions,
};

/// Package collected market-data event files into portable archives.
#[derive(Parser, Debug)]
#[command(name = "mdpack")]
#[command(version, about)]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .args(["package", "import_package", "list_package", "validate_package"])
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Package two symbols for January by symbol:\n",
    "    $ mdpack --package --package-symbols AAPL,MSFT \\\n",
    "        --package-from 2024-01-01 --package-to 2024-01-31 --package-layout by-symbol\n\n",
    "  Import a package into ./restore without re-hashing:\n",
    "    $ mdpack --import-package packages/q1.zip --import-destination restore --skip-validation\n\n",
    "  Show what a package contains:\n",
    "    $ mdpack --list-package packages/q1.zip",
))]
pub struct Cli {
    /// Create a package from the data root.
    #[arg(long)]
    pub package: bool,

    /// Package creation options.
    #[command(flatten)]
    pub package_args: PackageArgs,

    /// Extract a package into the destination directory.
    #[arg(long, value_name = "PACKAGE")]
    pub import_package: Option<Utf8PathBuf>,

    /// Import options.
    #[command(flatten)]
    pub import_args: ImportArgs,

    /// Print the manifest summary of a package.
    #[arg(long, value_name = "PACKAGE")]
    pub list_package: Option<Utf8PathBuf>,

    /// Check a package against its manifest without extracting it.
    #[arg(long, value_name = "PACKAGE")]
    pub validate_package: Option<Utf8PathBuf>,

    /// Configuration file [default: ./mdpack.toml when present].
    #[arg(long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Root of the collected event-file tree.
    #[arg(long, value_name = "DIR")]
    pub data_root: Option<Utf8PathBuf>,

    /// Suppress progress output (results and errors still shown).
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments used with `--package`.
#[derive(Parser, Debug, Clone, Default)]
pub struct PackageArgs {
    /// Package name, also used as the output file stem.
    #[arg(long, value_name = "NAME")]
    pub package_name: Option<String>,

    /// Description stored in the manifest.
    #[arg(long, value_name = "TEXT")]
    pub package_description: Option<String>,

    /// Directory receiving the package.
    #[arg(long, value_name = "DIR")]
    pub package_output: Option<Utf8PathBuf>,

    /// Comma-separated symbols to include.
    #[arg(long, value_name = "SYMBOLS", value_delimiter = ',')]
    pub package_symbols: Vec<String>,

    /// Comma-separated event types to include.
    #[arg(long, value_name = "TYPES", value_delimiter = ',')]
    pub package_events: Vec<String>,

    /// First date to include (YYYY-MM-DD).
    #[arg(long, value_name = "DATE")]
    pub package_from: Option<NaiveDate>,

    /// Last date to include (YYYY-MM-DD).
    #[arg(long, value_name = "DATE")]
    pub package_to: Option<NaiveDate>,

    /// Container format: zip, tar.gz, or 7z.
    #[arg(long, value_name = "FORMAT")]
    pub package_format: Option<PackageFormat>,

    /// Compression: none, fast, balanced, or maximum.
    #[arg(long, value_name = "LEVEL")]
    pub package_compression: Option<CompressionLevel>,

    /// Internal layout: by-date, by-symbol, by-type, or flat.
    #[arg(long, value_name = "LAYOUT")]
    pub package_layout: Option<InternalLayout>,

    /// Comma-separated databases to generate SQL import scripts for.
    #[arg(long, value_name = "TARGETS", value_delimiter = ',')]
    pub package_import_targets: Vec<ImportTarget>,

    /// Omit `metadata/quality_report.json`.
    #[arg(long)]
    pub no_quality_report: bool,

    /// Omit `metadata/data_dictionary.md`.
    #[arg(long)]
    pub no_data_dictionary: bool,

    /// Omit the Python and R loader scripts.
    #[arg(long)]
    pub no_loader_scripts: bool,

    /// Do not record per-file checksums.
    #[arg(long)]
    pub skip_checksums: bool,
}

/// Arguments used with `--import-package` and `--validate-package`.
#[derive(Parser, Debug, Clone, Default)]
pub struct ImportArgs {
    /// Extraction directory [default: the data root].
    #[arg(long, value_name = "DIR")]
    pub import_destination: Option<Utf8PathBuf>,

    /// Do not re-hash files against manifest checksums.
    #[arg(long)]
    pub skip_validation: bool,

    /// Keep existing files whose contents already match.
    #[arg(long)]
    pub merge: bool,
}

/// The operation selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode<'a> {
    /// `--package`
    Package,
    /// `--import-package <PACKAGE>`
    Import(&'a Utf8Path),
    /// `--list-package <PACKAGE>`
    List(&'a Utf8Path),
    /// `--validate-package <PACKAGE>`
    Validate(&'a Utf8Path),
}

impl Cli {
    /// The selected operation.
    ///
    /// Clap guarantees exactly one mode flag, so the fallback is `--package`.
    #[must_use]
    pub fn mode(&self) -> Mode<'_> {
        if let Some(path) = &self.import_package {
            return Mode::Import(path);
        }
        if let Some(path) = &self.list_package {
            return Mode::List(path);
        }
        if let Some(path) = &self.validate_package {
            return Mode::Validate(path);
        }
        Mode::Package
    }

    /// Data root from `--data-root`, else the configured one.
    #[must_use]
    pub fn data_root(&self, config: &MdpackConfig) -> Utf8PathBuf {
        self.data_root
            .clone()
            .unwrap_or_else(|| config.packaging.data_root.clone())
    }

    /// Merge package flags over `config`.
    ///
    /// # Examples
    ///
    /// ```
    /// use clap::Parser;
    /// use mdpack::cli::Cli;
    /// use mdpack::config::MdpackConfig;
    ///
    /// let cli = Cli::parse_from(["mdpack", "--package", "--no-quality-report"]);
    /// let options = cli.package_options(&MdpackConfig::default());
    /// assert!(!options.include_quality_report);
    /// assert!(options.include_readme);
    /// ```
    #[must_use]
    pub fn package_options(&self, config: &MdpackConfig) -> PackageOptions {
        let args = &self.package_args;
        let packaging = &config.packaging;
        let import_targets = if args.package_import_targets.is_empty() {
            packaging.import_targets.clone()
        } else {
            args.package_import_targets.clone()
        };
        PackageOptions {
            source_directory: self.data_root(config),
            output_directory: args
                .package_output
                .clone()
                .unwrap_or_else(|| packaging.output_directory.clone()),
            name: args.package_name.clone(),
            description: args.package_description.clone(),
            creator: packaging.creator.clone(),
            filter: PackageFilter {
                symbols: non_empty(&args.package_symbols),
                event_types: non_empty(&args.package_events),
                start_date: args.package_from,
                end_date: args.package_to,
            },
            format: args.package_format.unwrap_or(packaging.format),
            compression: args.package_compression.unwrap_or(packaging.compression),
            layout: args.package_layout.unwrap_or(packaging.layout),
            include_readme: packaging.include_readme,
            include_data_dictionary: packaging.include_data_dictionary && !args.no_data_dictionary,
            include_loader_scripts: packaging.include_loader_scripts && !args.no_loader_scripts,
            include_quality_report: packaging.include_quality_report && !args.no_quality_report,
            import_targets,
            generate_schemas: packaging.generate_schemas,
            verify_checksums: packaging.verify_checksums && !args.skip_checksums,
            password: None,
            max_package_bytes: None,
        }
    }

    /// Merge import flags over `config`.
    ///
    /// The destination falls back to the configured import destination and
    /// then to the data root.
    #[must_use]
    pub fn import_options(&self, config: &MdpackConfig) -> ImportOptions {
        let args = &self.import_args;
        let destination = args
            .import_destination
            .clone()
            .or_else(|| config.import.destination.clone())
            .unwrap_or_else(|| self.data_root(config));
        ImportOptions {
            destination,
            validate_checksums: config.import.validate_checksums && !args.skip_validation,
            merge: config.import.merge || args.merge,
        }
    }
}

fn non_empty(values: &[String]) -> Option<Vec<String>> {
    let kept: Vec<String> = values
        .iter()
        .map(|value| value.trim())
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_owned)
        .collect();
    (!kept.is_empty()).then_some(kept)
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
