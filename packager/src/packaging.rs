//! Package creation: scan, build the manifest, write, then embed the digest.
//!
//! [`create_package`] is the public boundary. Every failure inside the
//! pipeline is folded into a [`PackageResult`]; cancellation is kept
//! distinguishable through [`OperationFailure::Cancelled`].

use crate::container::{PackageWriter, create_writer, replace_manifest};
use crate::error::{PackagerError, Result};
use crate::manifest::{PackageIdentity, PackageManifest};
use crate::manifest_builder::{BuildSettings, FilePlan, build_file_entries};
use crate::options::{PackageFormat, PackageOptions};
use crate::progress::{CancellationFlag, PackageProgress, PackageStage, ProgressSink};
use crate::result::{OperationFailure, PackageResult};
use crate::scanner::scan_source;
use crate::schema::generate_schemas;
use crate::sha256_digest::compute_sha256;
use crate::supplementary::{SupplementaryFile, generate_supplementary, planned_paths};
use camino::Utf8Path;
use chrono::Utc;
use log::{debug, error, info, warn};
use std::fs::{self, File};
use std::time::Instant;
use uuid::Uuid;

/// Create a package from `options.source_directory`.
///
/// Progress runs `Initializing → Scanning → GeneratingManifest → Writing →
/// ComputingChecksums → Complete`. Failures other than cancellation are
/// logged and reported with a final [`PackageStage::Failed`] event. A
/// partially written package file is removed.
///
/// # Examples
///
/// ```no_run
/// use camino::Utf8PathBuf;
/// use mdpack_packager::options::PackageOptions;
/// use mdpack_packager::packaging::create_package;
/// use mdpack_packager::progress::{CancellationFlag, NoProgress};
///
/// let options = PackageOptions {
///     source_directory: Utf8PathBuf::from("data"),
///     output_directory: Utf8PathBuf::from("packages"),
///     ..PackageOptions::default()
/// };
/// let result = create_package(&options, &mut NoProgress, &CancellationFlag::new());
/// if let Some(path) = result.package_path {
///     println!("wrote {path}");
/// }
/// ```
pub fn create_package(
    options: &PackageOptions,
    progress: &mut dyn ProgressSink,
    cancel: &CancellationFlag,
) -> PackageResult {
    let started = Instant::now();
    let mut outcome = PackageResult {
        warnings: options.reserved_option_warnings(),
        ..PackageResult::default()
    };
    for warning in &outcome.warnings {
        warn!("{warning}");
    }

    progress.report(&PackageProgress::stage(PackageStage::Initializing));
    match run_pipeline(options, progress, cancel, &mut outcome) {
        Ok(()) => {
            outcome.success = true;
            progress.report(&PackageProgress::stage(PackageStage::Complete));
        }
        Err(err) => {
            if let Some(path) = outcome.package_path.take() {
                remove_partial(&path);
            }
            outcome.manifest = None;
            outcome.checksum = None;
            if err.is_cancelled() {
                info!("packaging cancelled");
            } else {
                error!("packaging failed: {err}");
                progress.report(&PackageProgress::stage(PackageStage::Failed));
            }
            outcome.failure = Some(OperationFailure::from(&err));
        }
    }
    outcome.elapsed = started.elapsed();
    outcome
}

fn run_pipeline(
    options: &PackageOptions,
    progress: &mut dyn ProgressSink,
    cancel: &CancellationFlag,
    outcome: &mut PackageResult,
) -> Result<()> {
    if options.format == PackageFormat::SevenZip {
        return Err(PackagerError::UnsupportedFormat {
            format: options.format,
        });
    }
    let now = Utc::now();
    fs::create_dir_all(&options.output_directory)?;

    cancel.check()?;
    progress.report(&PackageProgress::stage(PackageStage::Scanning));
    let records = scan_source(&options.source_directory, &options.filter, cancel)?;
    if records.is_empty() {
        return Err(PackagerError::NoMatchingFiles);
    }
    info!(
        "packaging {} file(s) from {}",
        records.len(),
        options.source_directory
    );

    cancel.check()?;
    let plan = build_file_entries(
        &records,
        BuildSettings {
            layout: options.layout,
            verify_checksums: options.verify_checksums,
        },
        progress,
        cancel,
    )?;
    outcome.warnings.extend(plan.warnings.iter().cloned());

    let identity = PackageIdentity {
        package_id: Uuid::new_v4().to_string(),
        name: options.resolved_name(now),
        description: options.description.clone(),
        creator: options.creator.clone(),
        created_at: now,
        format: options.format,
        layout: options.layout,
    };
    let mut manifest = PackageManifest::new(identity, plan.entries());
    if options.generate_schemas {
        manifest.schemas = Some(generate_schemas(&manifest.event_types));
    }
    let planned = planned_paths(options);
    if !planned.is_empty() {
        manifest.supplementary_files = Some(planned);
    }
    let supplementary = generate_supplementary(&manifest, options)?;

    cancel.check()?;
    let package_path = options
        .output_directory
        .join(options.package_file_name(now));
    outcome.package_path = Some(package_path.clone());
    let writer = create_writer(options.format, &package_path, options.compression)?;
    write_body(writer, &manifest, &plan, &supplementary, progress, cancel)?;

    cancel.check()?;
    progress.report(&PackageProgress::stage(PackageStage::ComputingChecksums));
    let digest = compute_sha256(package_path.as_std_path())?;
    let package_size = fs::metadata(&package_path)?.len();
    manifest.package_checksum = digest.as_str().to_owned();
    manifest.compressed_size_bytes = package_size;
    replace_manifest(
        options.format,
        &package_path,
        manifest.to_json_pretty()?.as_bytes(),
        options.compression,
    )?;
    debug!("embedded package digest {digest} into {package_path}");

    outcome.files_included = manifest.total_files;
    outcome.data_bytes = plan.total_bytes();
    outcome.package_size_bytes = package_size;
    outcome.checksum = Some(digest.into_inner());
    outcome.manifest = Some(manifest);
    Ok(())
}

/// Write the manifest, data files, and generated artefacts in that order.
fn write_body(
    mut writer: Box<dyn PackageWriter>,
    manifest: &PackageManifest,
    plan: &FilePlan,
    supplementary: &[SupplementaryFile],
    progress: &mut dyn ProgressSink,
    cancel: &CancellationFlag,
) -> Result<()> {
    writer.write_manifest(manifest.to_json_pretty()?.as_bytes())?;

    let total_files = plan.files.len() + supplementary.len();
    let total_bytes = plan.total_bytes()
        + supplementary
            .iter()
            .map(|f| u64::try_from(f.contents.len()).unwrap_or(u64::MAX))
            .sum::<u64>();
    let mut bytes_done = 0;
    let mut report = |position: usize, path: &str, written: u64| {
        progress.report(
            &PackageProgress::file(PackageStage::Writing, position, total_files, path)
                .with_bytes(written, total_bytes),
        );
    };

    for (index, planned) in plan.files.iter().enumerate() {
        cancel.check()?;
        report(index, &planned.entry.path, bytes_done);
        let mut source =
            File::open(&planned.source).map_err(PackagerError::source_file(&planned.source))?;
        bytes_done += writer.write_entry(&planned.entry.path, &mut source, planned.entry.size_bytes)?;
    }
    for (offset, file) in supplementary.iter().enumerate() {
        cancel.check()?;
        report(plan.files.len() + offset, &file.path, bytes_done);
        let size = u64::try_from(file.contents.len()).unwrap_or(u64::MAX);
        bytes_done += writer.write_entry(&file.path, &mut file.contents.as_slice(), size)?;
    }
    writer.finish()
}

fn remove_partial(path: &Utf8Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("removed partial package {path}"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("could not remove partial package {path}: {e}"),
    }
}

#[cfg(test)]
#[path = "packaging_tests.rs"]
mod tests;
