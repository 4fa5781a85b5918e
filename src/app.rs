//! Mode dispatch for the `mdpack` binary.
//!
//! [`run`] loads configuration, executes the selected mode, and renders the
//! outcome to stdout. Stage progress goes to stderr unless `--quiet` is set.
//! [`exit_code`] maps the outcome to the process exit status.

use crate::cli::{Cli, Mode};
use crate::config::{ConfigError, MdpackConfig};
use crate::output::{
    StageReporter, render_contents, render_import_result, render_package_result,
    render_validation, write_line,
};
use camino::Utf8Path;
use chrono::NaiveDate;
use log::{debug, info};
use mdpack_packager::options::PackageFilter;
use mdpack_packager::progress::{CancellationFlag, NoProgress, ProgressSink};
use mdpack_packager::{create_package, import_package, list_package_contents, validate_package};
use std::io::{self, Write};
use thiserror::Error;

/// Exit status for a successful run.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit status when the selected operation failed.
pub const EXIT_FAILURE: i32 = 1;
/// Exit status for configuration and usage errors.
pub const EXIT_USAGE: i32 = 2;

/// Errors that stop a run before or after the operation itself.
#[derive(Debug, Error)]
pub enum AppError {
    /// The configuration file could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The requested date window is empty.
    #[error("--package-from {from} is after --package-to {to}")]
    InvertedDateRange {
        /// Requested first date.
        from: NaiveDate,
        /// Requested last date.
        to: NaiveDate,
    },

    /// Listing a package failed.
    #[error(transparent)]
    Packager(#[from] mdpack_packager::PackagerError),

    /// Writing results to stdout failed.
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl AppError {
    /// Exit status for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::InvertedDateRange { .. } => EXIT_USAGE,
            Self::Packager(_) | Self::Output(_) => EXIT_FAILURE,
        }
    }
}

/// Whether the selected operation reported success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The operation succeeded.
    Succeeded,
    /// The operation ran but reported failure; details were rendered.
    Failed,
}

impl Outcome {
    const fn from_success(success: bool) -> Self {
        if success {
            Self::Succeeded
        } else {
            Self::Failed
        }
    }
}

/// Run the mode selected by `cli`.
///
/// # Errors
///
/// Returns [`AppError`] for configuration problems, listing failures, and
/// stdout write failures. Operation failures that produce a result are
/// rendered and reported as [`Outcome::Failed`] instead.
pub fn run(cli: &Cli, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<Outcome, AppError> {
    let config = MdpackConfig::load(cli.config.as_deref())?;
    debug!("loaded configuration: {config:?}");
    let cancel = CancellationFlag::new();

    match cli.mode() {
        Mode::Package => {
            let options = cli.package_options(&config);
            check_date_window(&options.filter)?;
            info!("packaging {} into {}", options.source_directory, options.output_directory);
            let result = with_progress(cli.quiet, stderr, |sink| {
                create_package(&options, sink, &cancel)
            });
            render_package_result(stdout, &result)?;
            Ok(Outcome::from_success(result.success))
        }
        Mode::Import(package) => {
            let options = cli.import_options(&config);
            info!("importing {package} into {}", options.destination);
            let result = with_progress(cli.quiet, stderr, |sink| {
                import_package(package, &options, sink, &cancel)
            });
            render_import_result(stdout, &result)?;
            Ok(Outcome::from_success(result.success))
        }
        Mode::List(package) => {
            let contents = list_package_contents(package)?;
            render_contents(stdout, &contents)?;
            Ok(Outcome::Succeeded)
        }
        Mode::Validate(package) => run_validate(cli, &config, package, stdout),
    }
}

fn check_date_window(filter: &PackageFilter) -> Result<(), AppError> {
    match (filter.start_date, filter.end_date) {
        (Some(from), Some(to)) if from > to => Err(AppError::InvertedDateRange { from, to }),
        _ => Ok(()),
    }
}

fn run_validate(
    cli: &Cli,
    config: &MdpackConfig,
    package: &Utf8Path,
    stdout: &mut dyn Write,
) -> Result<Outcome, AppError> {
    let verify_checksums = cli.import_options(config).validate_checksums;
    let result = validate_package(package, verify_checksums);
    render_validation(stdout, &result)?;
    Ok(Outcome::from_success(result.is_valid))
}

fn with_progress<T>(
    quiet: bool,
    stderr: &mut dyn Write,
    operation: impl FnOnce(&mut dyn ProgressSink) -> T,
) -> T {
    if quiet {
        operation(&mut NoProgress)
    } else {
        operation(&mut StageReporter::new(stderr))
    }
}

/// Map a run result to an exit status, reporting errors on `stderr`.
#[must_use]
pub fn exit_code(result: &Result<Outcome, AppError>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(Outcome::Succeeded) => EXIT_SUCCESS,
        Ok(Outcome::Failed) => EXIT_FAILURE,
        Err(err) => {
            write_line(stderr, format_args!("error: {err}"));
            err.exit_code()
        }
    }
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
