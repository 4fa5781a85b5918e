//! Tests for CLI parsing and configuration merging.

use super::*;
use crate::config::{ImportConfig, PackagingConfig};
use clap::error::ErrorKind;
use rstest::rstest;

fn configured() -> MdpackConfig {
    MdpackConfig {
        packaging: PackagingConfig {
            data_root: Utf8PathBuf::from("/srv/marketdata"),
            output_directory: Utf8PathBuf::from("/srv/packages"),
            format: PackageFormat::TarGz,
            layout: InternalLayout::ByType,
            include_loader_scripts: false,
            import_targets: vec![ImportTarget::DuckDb],
            creator: Some("ops".to_owned()),
            ..PackagingConfig::default()
        },
        import: ImportConfig {
            destination: Some(Utf8PathBuf::from("/srv/restore")),
            validate_checksums: true,
            merge: true,
        },
    }
}

#[test]
fn package_mode_parses_with_defaults() {
    let cli = Cli::parse_from(["mdpack", "--package"]);
    assert_eq!(cli.mode(), Mode::Package);
    assert!(cli.package_args.package_symbols.is_empty());
    assert!(cli.package_args.package_format.is_none());
    assert!(!cli.quiet);
}

#[rstest]
#[case::import("--import-package", Mode::Import(Utf8Path::new("q1.zip")))]
#[case::list("--list-package", Mode::List(Utf8Path::new("q1.zip")))]
#[case::validate("--validate-package", Mode::Validate(Utf8Path::new("q1.zip")))]
fn path_modes_carry_the_package(#[case] flag: &str, #[case] expected: Mode<'static>) {
    let cli = Cli::parse_from(["mdpack", flag, "q1.zip"]);
    assert_eq!(cli.mode(), expected);
}

#[test]
fn a_mode_is_required() {
    let err = Cli::try_parse_from(["mdpack", "--data-root", "data"])
        .err()
        .map(|err| err.kind());
    assert_eq!(err, Some(ErrorKind::MissingRequiredArgument));
}

#[test]
fn modes_are_exclusive() {
    let err = Cli::try_parse_from(["mdpack", "--package", "--list-package", "q1.zip"])
        .err()
        .map(|err| err.kind());
    assert_eq!(err, Some(ErrorKind::ArgumentConflict));
}

#[test]
fn package_filters_parse() {
    let cli = Cli::parse_from([
        "mdpack",
        "--package",
        "--package-symbols",
        "AAPL, MSFT",
        "--package-events",
        "Trade",
        "--package-from",
        "2024-01-01",
        "--package-to",
        "2024-01-31",
    ]);
    let options = cli.package_options(&MdpackConfig::default());
    assert_eq!(
        options.filter.symbols,
        Some(vec!["AAPL".to_owned(), "MSFT".to_owned()])
    );
    assert_eq!(options.filter.event_types, Some(vec!["Trade".to_owned()]));
    assert_eq!(
        options.filter.start_date,
        NaiveDate::from_ymd_opt(2024, 1, 1)
    );
    assert_eq!(options.filter.end_date, NaiveDate::from_ymd_opt(2024, 1, 31));
}

#[rstest]
#[case::bad_date(&["mdpack", "--package", "--package-from", "01/02/2024"])]
#[case::bad_format(&["mdpack", "--package", "--package-format", "rar"])]
#[case::bad_layout(&["mdpack", "--package", "--package-layout", "by-exchange"])]
#[case::bad_target(&["mdpack", "--package", "--package-import-targets", "oracle"])]
fn invalid_values_are_rejected(#[case] args: &[&str]) {
    let err = Cli::try_parse_from(args).err().map(|err| err.kind());
    assert_eq!(err, Some(ErrorKind::ValueValidation));
}

#[test]
fn configuration_supplies_unset_flags() {
    let cli = Cli::parse_from(["mdpack", "--package"]);
    let options = cli.package_options(&configured());
    assert_eq!(options.source_directory, Utf8PathBuf::from("/srv/marketdata"));
    assert_eq!(options.output_directory, Utf8PathBuf::from("/srv/packages"));
    assert_eq!(options.format, PackageFormat::TarGz);
    assert_eq!(options.layout, InternalLayout::ByType);
    assert!(!options.include_loader_scripts);
    assert_eq!(options.import_targets, vec![ImportTarget::DuckDb]);
    assert_eq!(options.creator.as_deref(), Some("ops"));
    assert_eq!(options.filter, PackageFilter::default());
}

#[test]
fn flags_override_configuration() {
    let cli = Cli::parse_from([
        "mdpack",
        "--package",
        "--data-root",
        "local",
        "--package-output",
        "out",
        "--package-format",
        "zip",
        "--package-layout",
        "flat",
        "--package-compression",
        "none",
        "--package-import-targets",
        "postgresql,clickhouse",
        "--skip-checksums",
    ]);
    let options = cli.package_options(&configured());
    assert_eq!(options.source_directory, Utf8PathBuf::from("local"));
    assert_eq!(options.output_directory, Utf8PathBuf::from("out"));
    assert_eq!(options.format, PackageFormat::Zip);
    assert_eq!(options.layout, InternalLayout::Flat);
    assert_eq!(options.compression, CompressionLevel::None);
    assert_eq!(
        options.import_targets,
        vec![ImportTarget::PostgreSql, ImportTarget::ClickHouse]
    );
    assert!(!options.verify_checksums);
}

#[test]
fn import_destination_falls_back_to_data_root() {
    let cli = Cli::parse_from(["mdpack", "--import-package", "q1.zip", "--data-root", "here"]);
    let options = cli.import_options(&MdpackConfig::default());
    assert_eq!(options.destination, Utf8PathBuf::from("here"));
    assert!(options.validate_checksums);
    assert!(!options.merge);
}

#[test]
fn import_flags_override_configuration() {
    let cli = Cli::parse_from([
        "mdpack",
        "--import-package",
        "q1.zip",
        "--import-destination",
        "restore",
        "--skip-validation",
    ]);
    let options = cli.import_options(&configured());
    assert_eq!(options.destination, Utf8PathBuf::from("restore"));
    assert!(!options.validate_checksums);
    assert!(options.merge);
}

#[test]
fn configured_import_destination_wins_over_data_root() {
    let cli = Cli::parse_from(["mdpack", "--import-package", "q1.zip"]);
    let options = cli.import_options(&configured());
    assert_eq!(options.destination, Utf8PathBuf::from("/srv/restore"));
}
