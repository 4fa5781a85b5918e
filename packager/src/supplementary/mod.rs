//! Generated artefacts stored alongside the data files.
//!
//! Each generator is a pure function of the [`PackageManifest`] (and, for
//! SQL scripts, the target engine). [`generate_supplementary`] decides which
//! artefacts to emit from [`PackageOptions`] and returns them in archive
//! order.

mod dictionary;
mod loaders;
mod quality;
mod readme;
mod sql;

use crate::error::Result;
use crate::manifest::PackageManifest;
use crate::options::{ImportTarget, PackageOptions};

pub use dictionary::render_data_dictionary;
pub use loaders::{render_python_loader, render_r_loader};
pub use quality::{QualityReport, SymbolCoverage, build_quality_report};
pub use readme::render_readme;
pub use sql::render_import_script;

/// `README.md` at the package root.
pub const README_PATH: &str = "README.md";
/// Markdown data dictionary.
pub const DATA_DICTIONARY_PATH: &str = "metadata/data_dictionary.md";
/// JSON coverage report.
pub const QUALITY_REPORT_PATH: &str = "metadata/quality_report.json";
/// Python loader script.
pub const PYTHON_LOADER_PATH: &str = "scripts/load_data.py";
/// R loader script.
pub const R_LOADER_PATH: &str = "scripts/load_data.R";

/// Archive path of the SQL import script for `target`.
#[must_use]
pub fn import_script_path(target: ImportTarget) -> String {
    format!("scripts/import_{}.sql", target.file_stem())
}

/// One generated artefact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplementaryFile {
    /// Archive path.
    pub path: String,
    /// File contents.
    pub contents: Vec<u8>,
}

impl SupplementaryFile {
    fn text(path: impl Into<String>, contents: String) -> Self {
        Self {
            path: path.into(),
            contents: contents.into_bytes(),
        }
    }
}

/// Archive paths of every artefact `options` asks for, in archive order.
///
/// # Examples
///
/// ```
/// use mdpack_packager::options::{ImportTarget, PackageOptions};
/// use mdpack_packager::supplementary::planned_paths;
///
/// let options = PackageOptions {
///     include_loader_scripts: false,
///     include_quality_report: false,
///     import_targets: vec![ImportTarget::DuckDb],
///     ..PackageOptions::default()
/// };
/// assert_eq!(
///     planned_paths(&options),
///     vec!["README.md", "metadata/data_dictionary.md", "scripts/import_duckdb.sql"]
/// );
/// ```
#[must_use]
pub fn planned_paths(options: &PackageOptions) -> Vec<String> {
    let mut paths = Vec::new();
    if options.include_readme {
        paths.push(README_PATH.to_owned());
    }
    if options.include_data_dictionary {
        paths.push(DATA_DICTIONARY_PATH.to_owned());
    }
    if options.include_loader_scripts {
        paths.push(PYTHON_LOADER_PATH.to_owned());
        paths.push(R_LOADER_PATH.to_owned());
    }
    for target in distinct_targets(&options.import_targets) {
        paths.push(import_script_path(target));
    }
    if options.include_quality_report {
        paths.push(QUALITY_REPORT_PATH.to_owned());
    }
    paths
}

fn distinct_targets(targets: &[ImportTarget]) -> Vec<ImportTarget> {
    ImportTarget::ALL
        .into_iter()
        .filter(|t| targets.contains(t))
        .collect()
}

/// Render every artefact `options` asks for.
///
/// `manifest.supplementary_files` should already hold
/// [`planned_paths`] so the README can list them.
///
/// # Errors
///
/// Returns a serialization error if the quality report cannot be encoded.
pub fn generate_supplementary(
    manifest: &PackageManifest,
    options: &PackageOptions,
) -> Result<Vec<SupplementaryFile>> {
    let mut files = Vec::new();
    if options.include_readme {
        files.push(SupplementaryFile::text(README_PATH, render_readme(manifest)));
    }
    if options.include_data_dictionary {
        files.push(SupplementaryFile::text(
            DATA_DICTIONARY_PATH,
            render_data_dictionary(manifest),
        ));
    }
    if options.include_loader_scripts {
        files.push(SupplementaryFile::text(
            PYTHON_LOADER_PATH,
            render_python_loader(manifest),
        ));
        files.push(SupplementaryFile::text(R_LOADER_PATH, render_r_loader(manifest)));
    }
    for target in distinct_targets(&options.import_targets) {
        files.push(SupplementaryFile::text(
            import_script_path(target),
            render_import_script(target, manifest),
        ));
    }
    if options.include_quality_report {
        let report = build_quality_report(manifest);
        files.push(SupplementaryFile {
            path: QUALITY_REPORT_PATH.to_owned(),
            contents: serde_json::to_vec_pretty(&report)?,
        });
    }
    Ok(files)
}
