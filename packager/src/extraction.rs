//! Package import: extract every entry and verify it against the manifest.
//!
//! Extraction never aborts on a single bad entry. Unsafe paths, write
//! failures, and checksum mismatches are itemized in
//! [`ImportResult::validation_errors`] and the remaining entries are still
//! written. Files already extracted stay on disk when a run fails.

use crate::container::{ArchiveEntry, open_reader};
use crate::error::{PackagerError, Result};
use crate::manifest::{PackageFileEntry, PackageManifest};
use crate::manifest_parser::parse_manifest_bytes;
use crate::options::ImportOptions;
use crate::progress::{CancellationFlag, PackageProgress, PackageStage, ProgressSink};
use crate::result::{ImportResult, OperationFailure, ValidationError};
use crate::sha256_digest::{HashingWriter, Sha256Digest, compute_sha256};
use crate::verification::VerificationPolicy;
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use log::{debug, error, info, warn};
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{self, BufWriter, Read};
use std::time::Instant;

/// Import the package at `package_path` into `options.destination`.
///
/// Progress runs `Initializing → Extracting → Validating → Complete`; the
/// `Validating` stage only appears when checksum validation is enabled.
/// The result is successful when no entry was refused, failed to write,
/// or failed validation.
///
/// # Examples
///
/// ```no_run
/// use camino::{Utf8Path, Utf8PathBuf};
/// use mdpack_packager::extraction::import_package;
/// use mdpack_packager::options::ImportOptions;
/// use mdpack_packager::progress::{CancellationFlag, NoProgress};
///
/// let options = ImportOptions {
///     destination: Utf8PathBuf::from("restored"),
///     ..ImportOptions::default()
/// };
/// let result = import_package(
///     Utf8Path::new("packages/equities.zip"),
///     &options,
///     &mut NoProgress,
///     &CancellationFlag::new(),
/// );
/// println!("{} file(s) extracted", result.files_extracted);
/// ```
pub fn import_package(
    package_path: &Utf8Path,
    options: &ImportOptions,
    progress: &mut dyn ProgressSink,
    cancel: &CancellationFlag,
) -> ImportResult {
    let started = Instant::now();
    let mut outcome = ImportResult {
        destination: options.destination.clone(),
        ..ImportResult::default()
    };

    progress.report(&PackageProgress::stage(PackageStage::Initializing));
    match run_import(package_path, options, progress, cancel, &mut outcome) {
        Ok(()) => {
            outcome.success = outcome.validation_errors.is_empty();
            if outcome.success {
                progress.report(&PackageProgress::stage(PackageStage::Complete));
            } else {
                warn!(
                    "import of {package_path} finished with {} error(s)",
                    outcome.validation_errors.len()
                );
                progress.report(&PackageProgress::stage(PackageStage::Failed));
            }
        }
        Err(err) => {
            if err.is_cancelled() {
                info!("import of {package_path} cancelled");
            } else {
                error!("import of {package_path} failed: {err}");
                progress.report(&PackageProgress::stage(PackageStage::Failed));
            }
            outcome.failure = Some(OperationFailure::from(&err));
        }
    }
    outcome.elapsed = started.elapsed();
    outcome
}

fn run_import(
    package_path: &Utf8Path,
    options: &ImportOptions,
    progress: &mut dyn ProgressSink,
    cancel: &CancellationFlag,
    outcome: &mut ImportResult,
) -> Result<()> {
    cancel.check()?;
    let mut reader = open_reader(package_path)?;
    let bytes = reader
        .read_manifest()?
        .ok_or_else(|| PackagerError::NotAPackage {
            path: package_path.to_owned(),
        })?;
    let manifest = parse_manifest_bytes(&bytes)?;
    let entries = reader.list_entries()?;
    fs::create_dir_all(&options.destination)?;

    cancel.check()?;
    let policy = VerificationPolicy::new(options.validate_checksums);
    let by_path: HashMap<&str, &PackageFileEntry> =
        manifest.files.iter().map(|f| (f.path.as_str(), f)).collect();
    let total_files = entries.iter().filter(|e| !e.is_dir).count();
    let mut seen: HashSet<String> = HashSet::new();
    let mut index = 0;
    let mut extractor = Extractor {
        destination: &options.destination,
        merge: options.merge,
        policy,
        outcome,
    };

    progress.report(&PackageProgress::stage(PackageStage::Extracting));
    reader.visit_entries(&mut |entry: &ArchiveEntry, data: &mut dyn Read| -> Result<()> {
        cancel.check()?;
        if entry.is_dir {
            return Ok(());
        }
        progress.report(
            &PackageProgress::file(PackageStage::Extracting, index, total_files, &entry.path)
                .with_bytes(extractor.outcome.bytes_extracted, 0),
        );
        index += 1;
        seen.insert(entry.path.clone());
        extractor.extract(entry, data, by_path.get(entry.path.as_str()).copied());
        Ok(())
    })?;

    let imported = extractor.outcome;
    if policy.verify_checksums() {
        cancel.check()?;
        progress.report(&PackageProgress::stage(PackageStage::Validating));
        report_missing(&manifest, &seen, imported);
    }
    debug!(
        "extracted {} file(s), skipped {}",
        imported.files_extracted, imported.files_skipped
    );
    imported.manifest = Some(manifest);
    Ok(())
}

fn report_missing(manifest: &PackageManifest, seen: &HashSet<String>, outcome: &mut ImportResult) {
    for file in &manifest.files {
        if !seen.contains(&file.path) {
            outcome
                .validation_errors
                .push(ValidationError::missing_file(&file.path));
        }
    }
}

struct Extractor<'a> {
    destination: &'a Utf8Path,
    merge: bool,
    policy: VerificationPolicy,
    outcome: &'a mut ImportResult,
}

impl Extractor<'_> {
    fn extract(
        &mut self,
        entry: &ArchiveEntry,
        data: &mut dyn Read,
        manifest_entry: Option<&PackageFileEntry>,
    ) {
        let target = match safe_destination(self.destination, &entry.path) {
            Ok(target) => target,
            Err(reason) => {
                warn!("refusing entry {}: {reason}", entry.path);
                self.outcome
                    .validation_errors
                    .push(ValidationError::unsafe_path(&entry.path, reason));
                return;
            }
        };

        if self.merge && manifest_entry.is_some_and(|file| already_present(&target, file)) {
            debug!("{target} already matches its checksum; leaving it in place");
            self.outcome.files_skipped += 1;
            self.outcome.warnings.push(format!(
                "Skipped {}: existing file already matches its checksum",
                entry.path
            ));
            return;
        }

        match write_file(&target, data) {
            Ok((bytes, digest)) => {
                self.outcome.files_extracted += 1;
                self.outcome.bytes_extracted += bytes;
                if let Some(err) = manifest_entry.and_then(|file| self.policy.check(file, &digest)) {
                    warn!("{err}");
                    self.outcome.validation_errors.push(err);
                }
            }
            Err(e) => {
                warn!("could not extract {}: {e}", entry.path);
                self.outcome
                    .validation_errors
                    .push(ValidationError::extraction_failed(&entry.path, &e.to_string()));
            }
        }
    }
}

fn already_present(target: &Utf8Path, file: &PackageFileEntry) -> bool {
    if !file.has_checksum() || !target.is_file() {
        return false;
    }
    compute_sha256(target.as_std_path()).is_ok_and(|digest| digest.matches(&file.checksum))
}

fn write_file(target: &Utf8Path, data: &mut dyn Read) -> io::Result<(u64, Sha256Digest)> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = HashingWriter::new(BufWriter::new(File::create(target)?));
    io::copy(data, &mut writer)?;
    let bytes = writer.bytes_written();
    let (_, digest) = writer.finish()?;
    Ok((bytes, digest))
}

/// Resolve `entry_path` under `destination`, refusing absolute paths and
/// parent-directory segments.
///
/// Both `/` and `\` count as separators.
///
/// # Errors
///
/// Returns a short reason when the path is unsafe.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use mdpack_packager::extraction::safe_destination;
///
/// let root = Utf8Path::new("/srv/import");
/// assert_eq!(
///     safe_destination(root, "data/AAPL/a.jsonl").unwrap(),
///     Utf8Path::new("/srv/import/data/AAPL/a.jsonl")
/// );
/// assert!(safe_destination(root, "../escape.txt").is_err());
/// assert!(safe_destination(root, "/etc/passwd").is_err());
/// ```
pub fn safe_destination(
    destination: &Utf8Path,
    entry_path: &str,
) -> std::result::Result<Utf8PathBuf, &'static str> {
    if entry_path.trim().is_empty() {
        return Err("empty path");
    }
    if entry_path.starts_with(['/', '\\']) || has_drive_prefix(entry_path) {
        return Err("absolute path");
    }
    if entry_path.split(['/', '\\']).any(|segment| segment == "..") {
        return Err("parent directory segment");
    }
    let relative = Utf8Path::new(entry_path);
    if relative
        .components()
        .any(|c| !matches!(c, Utf8Component::Normal(_) | Utf8Component::CurDir))
    {
        return Err("absolute path");
    }
    Ok(destination.join(relative))
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    matches!(bytes, [letter, b':', ..] if letter.is_ascii_alphabetic())
}
