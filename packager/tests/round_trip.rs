//! End-to-end create, list, validate, and import tests.

mod support;

use camino::Utf8PathBuf;
use mdpack_packager::options::{ImportOptions, InternalLayout, PackageFilter, PackageFormat, PackageOptions};
use mdpack_packager::progress::{CancellationFlag, NoProgress};
use mdpack_packager::result::ValidationErrorKind;
use mdpack_packager::{create_package, import_package, list_package_contents, validate_package};
use rstest::{fixture, rstest};
use std::fs;
use support::{Sandbox, corrupt_zip_entry};

#[fixture]
fn sandbox() -> Sandbox {
    let sandbox = Sandbox::new();
    sandbox.add_events("AAPL", "Trade", "2024-01-02", 10);
    sandbox.add_events("MSFT", "Trade", "2024-01-03", 5);
    sandbox
}

fn options(sandbox: &Sandbox, format: PackageFormat, layout: InternalLayout) -> PackageOptions {
    PackageOptions {
        source_directory: sandbox.data.clone(),
        output_directory: sandbox.out.clone(),
        name: Some("round-trip".to_owned()),
        format,
        layout,
        ..PackageOptions::default()
    }
}

fn create(sandbox: &Sandbox, format: PackageFormat, layout: InternalLayout) -> Utf8PathBuf {
    let result = create_package(
        &options(sandbox, format, layout),
        &mut NoProgress,
        &CancellationFlag::new(),
    );
    assert!(result.success, "{:?}", result.error_message());
    result.package_path.expect("package path")
}

fn import_into(package: &Utf8PathBuf, destination: &Utf8PathBuf, validate: bool) -> mdpack_packager::result::ImportResult {
    import_package(
        package,
        &ImportOptions {
            destination: destination.clone(),
            validate_checksums: validate,
            merge: false,
        },
        &mut NoProgress,
        &CancellationFlag::new(),
    )
}

#[rstest]
#[case::zip(PackageFormat::Zip)]
#[case::tar_gz(PackageFormat::TarGz)]
fn import_reproduces_source_bytes(sandbox: Sandbox, #[case] format: PackageFormat) {
    let package = create(&sandbox, format, InternalLayout::BySymbol);
    let result = import_into(&package, &sandbox.restore, true);
    assert!(result.success, "{:?}", result.validation_errors);

    let manifest = result.manifest.expect("manifest");
    assert_eq!(manifest.files.len(), 2);
    for file in &manifest.files {
        let original = fs::read(sandbox.data.join(&file.source_path)).expect("source");
        let restored = fs::read(sandbox.restore.join(&file.path)).expect("restored");
        assert_eq!(original, restored, "{} differs", file.path);
    }
    assert!(sandbox.restore.join("manifest.json").is_file());
    assert!(sandbox.restore.join("README.md").is_file());
}

#[rstest]
#[case::by_date(InternalLayout::ByDate, "data/2024-01-02/AAPL/Trade/2024-01-02.jsonl")]
#[case::by_symbol(InternalLayout::BySymbol, "data/AAPL/Trade/2024-01-02/2024-01-02.jsonl")]
#[case::by_type(InternalLayout::ByType, "data/Trade/AAPL/2024-01-02/2024-01-02.jsonl")]
#[case::flat(InternalLayout::Flat, "data/2024-01-02.jsonl")]
fn layouts_place_files_where_expected(
    sandbox: Sandbox,
    #[case] layout: InternalLayout,
    #[case] aapl_path: &str,
) {
    let package = create(&sandbox, PackageFormat::Zip, layout);
    let contents = list_package_contents(&package).expect("list");
    assert!(
        contents.files.iter().any(|f| f.path == aapl_path),
        "{:?}",
        contents.files.iter().map(|f| &f.path).collect::<Vec<_>>()
    );
    assert_eq!(contents.layout, layout.as_str());
}

#[rstest]
fn one_corrupted_byte_is_one_mismatch(sandbox: Sandbox) {
    let package = create(&sandbox, PackageFormat::Zip, InternalLayout::ByDate);
    let target = "data/2024-01-03/MSFT/Trade/2024-01-03.jsonl";
    corrupt_zip_entry(&package, target);

    let strict = import_into(&package, &sandbox.restore, true);
    assert!(!strict.success);
    assert_eq!(strict.validation_errors.len(), 1);
    let error = strict.validation_errors.first().expect("one error");
    assert_eq!(error.kind, ValidationErrorKind::ChecksumMismatch);
    assert_eq!(error.path, target);

    let validation = validate_package(&package, true);
    assert!(!validation.is_valid);
    assert_eq!(validation.checksum_errors.len(), 1);

    let lenient = import_into(&package, &sandbox.out.join("lenient"), false);
    assert!(lenient.success);
    assert!(lenient.validation_errors.is_empty());
}

#[rstest]
fn listing_twice_gives_the_same_summary(sandbox: Sandbox) {
    let package = create(&sandbox, PackageFormat::TarGz, InternalLayout::ByDate);
    let first = list_package_contents(&package).expect("list");
    let second = list_package_contents(&package).expect("list");
    assert_eq!(first, second);
    assert_eq!(first.total_events, 15);
    assert_eq!(first.name, "round-trip");
}

#[rstest]
fn symbol_filter_limits_the_package(sandbox: Sandbox) {
    let options = PackageOptions {
        filter: PackageFilter {
            symbols: Some(vec!["aapl".to_owned()]),
            ..PackageFilter::default()
        },
        ..options(&sandbox, PackageFormat::Zip, InternalLayout::ByDate)
    };
    let result = create_package(&options, &mut NoProgress, &CancellationFlag::new());
    let manifest = result.manifest.expect("manifest");
    assert_eq!(manifest.symbols, vec!["AAPL"]);
    assert!(manifest.files.iter().all(|f| f.symbol.as_deref() == Some("AAPL")));
}

#[rstest]
fn archive_without_manifest_is_rejected(sandbox: Sandbox) {
    fs::create_dir_all(&sandbox.out).expect("out dir");
    let plain = sandbox.out.join("plain.zip");
    let mut writer = zip::ZipWriter::new(fs::File::create(&plain).expect("create"));
    writer
        .start_file("notes.txt", zip::write::SimpleFileOptions::default())
        .expect("start");
    std::io::Write::write_all(&mut writer, b"not a package").expect("write");
    writer.finish().expect("finish");

    let err = list_package_contents(&plain).expect_err("must fail");
    assert!(err.to_string().contains("not a valid package"));
    let imported = import_into(&plain, &sandbox.restore, true);
    assert!(!imported.success);
    assert!(
        imported
            .error_message()
            .expect("message")
            .contains("not a valid package")
    );
}

#[rstest]
fn same_day_symbols_share_one_date_directory() {
    let sandbox = Sandbox::new();
    sandbox.add_events("AAPL", "Trade", "2024-01-02", 10);
    sandbox.add_events("MSFT", "Trade", "2024-01-02", 5);
    let result = create_package(
        &options(&sandbox, PackageFormat::Zip, InternalLayout::ByDate),
        &mut NoProgress,
        &CancellationFlag::new(),
    );
    let manifest = result.manifest.expect("manifest");

    assert_eq!(manifest.total_files, 2);
    assert_eq!(manifest.symbols, vec!["AAPL", "MSFT"]);
    assert_eq!(manifest.event_types, vec!["Trade"]);
    let range = manifest.date_range.expect("date range");
    assert_eq!(range.start, range.end);
    assert_eq!(range.start.to_string(), "2024-01-02");
    let paths: Vec<&str> = manifest.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "data/2024-01-02/AAPL/Trade/2024-01-02.jsonl",
            "data/2024-01-02/MSFT/Trade/2024-01-02.jsonl",
        ]
    );
    assert_eq!(manifest.total_events, 15);
}
