//! Read-only inspection of existing packages.
//!
//! Nothing here writes to disk. [`validate_package`] reports problems as
//! data; [`read_manifest`] and [`list_package_contents`] return errors for
//! unreadable containers.

use crate::container::{ArchiveEntry, PackageReader, open_reader};
use crate::error::{PackagerError, Result};
use crate::manifest::{PackageFileEntry, PackageManifest};
use crate::manifest_parser::parse_manifest_bytes;
use crate::result::{PackageContents, PackageValidationResult};
use crate::sha256_digest::hash_reader;
use crate::verification::VerificationPolicy;
use camino::Utf8Path;
use log::debug;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Read;

/// Read and parse the manifest of the package at `package_path`.
///
/// Returns `Ok(None)` when the file does not exist or carries no manifest.
///
/// # Errors
///
/// Returns an error if the container cannot be opened or the manifest is
/// not valid JSON.
pub fn read_manifest(package_path: &Utf8Path) -> Result<Option<PackageManifest>> {
    if !package_path.is_file() {
        debug!("read_manifest: {package_path} does not exist");
        return Ok(None);
    }
    let mut reader = open_reader(package_path)?;
    load_manifest(reader.as_mut())
}

fn load_manifest(reader: &mut dyn PackageReader) -> Result<Option<PackageManifest>> {
    reader
        .read_manifest()?
        .map(|bytes| parse_manifest_bytes(&bytes))
        .transpose()
        .map_err(PackagerError::from)
}

/// Check a package for structural completeness.
///
/// Every manifest path must have a container entry. With `verify_checksums`,
/// every present entry with a recorded checksum is hashed in place.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use mdpack_packager::inspection::validate_package;
///
/// let result = validate_package(Utf8Path::new("/no/such/package.zip"), false);
/// assert!(!result.is_valid);
/// assert_eq!(result.issues.len(), 1);
/// ```
#[must_use]
pub fn validate_package(package_path: &Utf8Path, verify_checksums: bool) -> PackageValidationResult {
    let mut result = PackageValidationResult::default();
    if let Err(err) = check_package(
        package_path,
        VerificationPolicy::new(verify_checksums),
        &mut result,
    ) {
        result.issues.push(err.to_string());
    }
    result.is_valid =
        result.issues.is_empty() && result.missing_files.is_empty() && result.checksum_errors.is_empty();
    debug!(
        "validate_package: {package_path} valid={} issues={} missing={} mismatches={}",
        result.is_valid,
        result.issues.len(),
        result.missing_files.len(),
        result.checksum_errors.len()
    );
    result
}

fn check_package(
    package_path: &Utf8Path,
    policy: VerificationPolicy,
    result: &mut PackageValidationResult,
) -> Result<()> {
    let mut reader = open_reader(package_path)?;
    let Some(manifest) = load_manifest(reader.as_mut())? else {
        return Err(PackagerError::NotAPackage {
            path: package_path.to_owned(),
        });
    };

    if manifest.package_id.trim().is_empty() {
        result.issues.push("Package ID is missing".to_owned());
    }
    if manifest.version.trim().is_empty() {
        result.issues.push("Package version is missing".to_owned());
    }
    if manifest.files.is_empty() {
        result.issues.push("Package contains no files".to_owned());
    }

    let present: HashSet<String> = reader
        .list_entries()?
        .into_iter()
        .filter(|e| !e.is_dir)
        .map(|e| e.path)
        .collect();
    result.missing_files = manifest
        .files
        .iter()
        .filter(|f| !present.contains(&f.path))
        .map(|f| f.path.clone())
        .collect();

    if policy.verify_checksums() {
        let by_path: HashMap<&str, &PackageFileEntry> = manifest
            .files
            .iter()
            .filter(|f| policy.applies_to(f))
            .map(|f| (f.path.as_str(), f))
            .collect();
        reader.visit_entries(&mut |entry: &ArchiveEntry, data: &mut dyn Read| -> Result<()> {
            let Some(file) = by_path.get(entry.path.as_str()) else {
                return Ok(());
            };
            let digest = hash_reader(data)?;
            if let Some(err) = policy.check(file, &digest) {
                result.checksum_errors.push(err);
            }
            Ok(())
        })?;
    }

    result.manifest = Some(manifest);
    Ok(())
}

/// Summarise the package at `package_path` from its manifest.
///
/// # Errors
///
/// Returns [`PackagerError::PackageNotFound`] for a missing file and
/// [`PackagerError::NotAPackage`] when the container has no manifest.
pub fn list_package_contents(package_path: &Utf8Path) -> Result<PackageContents> {
    let mut reader = open_reader(package_path)?;
    let manifest = load_manifest(reader.as_mut())?.ok_or_else(|| PackagerError::NotAPackage {
        path: package_path.to_owned(),
    })?;
    let size = fs::metadata(package_path)?.len();
    Ok(PackageContents::from_manifest(
        package_path.to_owned(),
        size,
        manifest,
    ))
}
