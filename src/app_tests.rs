//! Tests for mode dispatch and exit-code mapping.

use super::*;
use camino::Utf8PathBuf;
use clap::Parser;
use rstest::{fixture, rstest};
use std::fs;
use tempfile::TempDir;

struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
    config: Utf8PathBuf,
}

impl Workspace {
    fn path(&self, relative: &str) -> String {
        self.root.join(relative).into_string()
    }

    fn run(&self, args: &[&str]) -> (i32, String, String) {
        let mut argv = vec!["mdpack", "--config", self.config.as_str()];
        argv.extend_from_slice(args);
        let cli = Cli::parse_from(argv);
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let result = run(&cli, &mut stdout, &mut stderr);
        let code = exit_code(&result, &mut stderr);
        (
            code,
            String::from_utf8_lossy(&stdout).into_owned(),
            String::from_utf8_lossy(&stderr).into_owned(),
        )
    }
}

#[fixture]
fn workspace() -> Workspace {
    let dir = tempfile::tempdir().unwrap_or_else(|err| panic!("temp dir: {err}"));
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
        .unwrap_or_else(|path| panic!("non UTF-8 temp dir {}", path.display()));
    let events = root.join("data/AAPL/Trade");
    fs::create_dir_all(&events).unwrap_or_else(|err| panic!("mkdir: {err}"));
    fs::write(
        events.join("2024-01-02.jsonl"),
        "{\"timestamp\":\"2024-01-02T14:30:00Z\",\"price\":185.5,\"size\":100}\n",
    )
    .unwrap_or_else(|err| panic!("write events: {err}"));
    let config = root.join("mdpack.toml");
    fs::write(
        &config,
        format!(
            "[packaging]\ndata_root = \"{}\"\noutput_directory = \"{}\"\n",
            root.join("data"),
            root.join("packages")
        ),
    )
    .unwrap_or_else(|err| panic!("write config: {err}"));
    Workspace {
        _dir: dir,
        root,
        config,
    }
}

#[rstest]
fn package_then_list_then_validate(workspace: Workspace) {
    let (code, stdout, stderr) = workspace.run(&["--package", "--package-name", "cli"]);
    assert_eq!(code, EXIT_SUCCESS, "{stdout}{stderr}");
    assert!(stdout.contains("Package created:"));
    assert!(stderr.contains("Scanning data root..."));

    let package = workspace.path("packages/cli.zip");
    let (code, stdout, _) = workspace.run(&["--list-package", &package]);
    assert_eq!(code, EXIT_SUCCESS);
    assert!(stdout.contains("Package:     cli"));
    assert!(stdout.contains("Symbols:     AAPL"));

    let (code, stdout, _) = workspace.run(&["--validate-package", &package]);
    assert_eq!(code, EXIT_SUCCESS);
    assert!(stdout.contains("Package is valid (1 files)"));
}

#[rstest]
fn import_round_trips_quietly(workspace: Workspace) {
    let (code, _, _) = workspace.run(&["--package", "--package-name", "rt", "--quiet"]);
    assert_eq!(code, EXIT_SUCCESS);

    let restore = workspace.path("restore");
    let package = workspace.path("packages/rt.zip");
    let (code, stdout, stderr) = workspace.run(&[
        "--import-package",
        &package,
        "--import-destination",
        &restore,
        "--quiet",
    ]);
    assert_eq!(code, EXIT_SUCCESS, "{stdout}");
    assert!(stderr.is_empty());
    assert!(stdout.contains("Import complete"));
    assert!(workspace.root.join("restore/manifest.json").is_file());
}

#[rstest]
fn empty_selection_exits_with_failure(workspace: Workspace) {
    let (code, stdout, stderr) = workspace.run(&["--package", "--package-symbols", "ZZZZ"]);
    assert_eq!(code, EXIT_FAILURE);
    assert!(stdout.contains("No files found matching the specified criteria"));
    assert!(stderr.contains("Failed..."));
}

#[rstest]
fn listing_a_missing_package_is_a_failure(workspace: Workspace) {
    let missing = workspace.path("packages/none.zip");
    let (code, stdout, stderr) = workspace.run(&["--list-package", &missing]);
    assert_eq!(code, EXIT_FAILURE);
    assert!(stdout.is_empty());
    assert!(stderr.starts_with("error: "));
}

#[rstest]
fn inverted_dates_are_a_usage_error(workspace: Workspace) {
    let (code, _, stderr) = workspace.run(&[
        "--package",
        "--package-from",
        "2024-02-01",
        "--package-to",
        "2024-01-01",
    ]);
    assert_eq!(code, EXIT_USAGE);
    assert!(stderr.contains("is after"));
}

#[rstest]
fn malformed_config_is_a_usage_error(workspace: Workspace) {
    fs::write(&workspace.config, "[packaging]\nunknown = 1\n")
        .unwrap_or_else(|err| panic!("write config: {err}"));
    let (code, _, stderr) = workspace.run(&["--package"]);
    assert_eq!(code, EXIT_USAGE);
    assert!(stderr.contains("invalid config file"));
}

#[test]
fn operation_failure_maps_to_one_without_message() {
    let mut stderr = Vec::new();
    assert_eq!(exit_code(&Ok(Outcome::Failed), &mut stderr), EXIT_FAILURE);
    assert!(stderr.is_empty());
}
