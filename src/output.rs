//! Human-readable rendering of operation outcomes.
//!
//! Renderers write to a caller-supplied [`Write`] so the binary can target
//! stdout while tests capture into a buffer.

use mdpack_packager::manifest::DateRange;
use mdpack_packager::progress::{PackageProgress, PackageStage, ProgressSink};
use mdpack_packager::result::{
    ImportResult, PackageContents, PackageResult, PackageValidationResult, human_size,
};
use std::io::{self, Write};

/// Present-tense label for a progress stage.
#[must_use]
pub const fn stage_label(stage: PackageStage) -> &'static str {
    match stage {
        PackageStage::Initializing => "Initializing",
        PackageStage::Scanning => "Scanning data root",
        PackageStage::GeneratingManifest => "Generating manifest",
        PackageStage::Writing => "Writing package",
        PackageStage::ComputingChecksums => "Computing checksums",
        PackageStage::Validating => "Validating",
        PackageStage::Extracting => "Extracting",
        PackageStage::Complete => "Complete",
        PackageStage::Failed => "Failed",
    }
}

/// Progress sink that prints one line per stage transition.
///
/// Per-file events within a stage are folded into the first line for that
/// stage, so output stays proportional to the number of stages.
pub struct StageReporter<'a> {
    out: &'a mut dyn Write,
    last: Option<PackageStage>,
}

impl<'a> StageReporter<'a> {
    /// Report stage transitions to `out`.
    #[must_use]
    pub const fn new(out: &'a mut dyn Write) -> Self {
        Self { out, last: None }
    }
}

impl ProgressSink for StageReporter<'_> {
    fn report(&mut self, progress: &PackageProgress) {
        if self.last == Some(progress.stage) {
            return;
        }
        self.last = Some(progress.stage);
        let line = if progress.total_files > 0 {
            format!(
                "{}... ({} files)",
                stage_label(progress.stage),
                progress.total_files
            )
        } else {
            format!("{}...", stage_label(progress.stage))
        };
        write_line(self.out, line);
    }
}

/// Render the outcome of `--package`.
///
/// # Errors
///
/// Returns any error raised by `out`.
pub fn render_package_result(out: &mut dyn Write, result: &PackageResult) -> io::Result<()> {
    for warning in &result.warnings {
        writeln!(out, "warning: {warning}")?;
    }
    if !result.success {
        let message = result.error_message().unwrap_or_default();
        return writeln!(out, "Packaging failed: {message}");
    }
    if let Some(path) = &result.package_path {
        writeln!(out, "Package created: {path}")?;
    }
    writeln!(
        out,
        "  Files:    {} ({} of data)",
        result.files_included,
        human_size(result.data_bytes)
    )?;
    writeln!(out, "  Size:     {}", human_size(result.package_size_bytes))?;
    if let Some(checksum) = &result.checksum {
        writeln!(out, "  SHA-256:  {checksum}")?;
    }
    writeln!(out, "  Elapsed:  {:.2}s", result.elapsed.as_secs_f64())
}

/// Render the outcome of `--import-package`.
///
/// # Errors
///
/// Returns any error raised by `out`.
pub fn render_import_result(out: &mut dyn Write, result: &ImportResult) -> io::Result<()> {
    for warning in &result.warnings {
        writeln!(out, "warning: {warning}")?;
    }
    if let Some(failure) = &result.failure {
        return writeln!(out, "Import failed: {failure}");
    }
    let verdict = if result.success {
        "Import complete"
    } else {
        "Import finished with errors"
    };
    writeln!(out, "{verdict}: {}", result.destination)?;
    writeln!(
        out,
        "  Extracted: {} files ({})",
        result.files_extracted,
        human_size(result.bytes_extracted)
    )?;
    if result.files_skipped > 0 {
        writeln!(out, "  Skipped:   {} unchanged files", result.files_skipped)?;
    }
    for error in &result.validation_errors {
        writeln!(out, "  error: {error}")?;
    }
    Ok(())
}

/// Render `--list-package` output.
///
/// # Errors
///
/// Returns any error raised by `out`.
pub fn render_contents(out: &mut dyn Write, contents: &PackageContents) -> io::Result<()> {
    writeln!(out, "Package:     {}", contents.name)?;
    writeln!(out, "Id:          {}", contents.package_id)?;
    if let Some(description) = &contents.description {
        writeln!(out, "Description: {description}")?;
    }
    writeln!(
        out,
        "Created:     {}",
        contents.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(
        out,
        "Format:      {} ({} layout)",
        contents.format, contents.layout
    )?;
    writeln!(
        out,
        "Size:        {} packed, ~{} unpacked",
        human_size(contents.package_size_bytes),
        human_size(contents.uncompressed_size_bytes)
    )?;
    writeln!(
        out,
        "Files:       {} (~{} events)",
        contents.total_files, contents.total_events
    )?;
    writeln!(out, "Symbols:     {}", joined(&contents.symbols))?;
    writeln!(out, "Event types: {}", joined(&contents.event_types))?;
    writeln!(out, "Dates:       {}", date_span(contents.date_range.as_ref()))?;
    writeln!(out)?;
    for file in &contents.files {
        writeln!(out, "  {:>10}  {}", human_size(file.size_bytes), file.path)?;
    }
    for path in &contents.supplementary_files {
        writeln!(out, "  {:>10}  {path}", "-")?;
    }
    Ok(())
}

/// Render `--validate-package` output.
///
/// # Errors
///
/// Returns any error raised by `out`.
pub fn render_validation(out: &mut dyn Write, result: &PackageValidationResult) -> io::Result<()> {
    if result.is_valid {
        let files = result.manifest.as_ref().map_or(0, |m| m.total_files);
        return writeln!(out, "Package is valid ({files} files)");
    }
    writeln!(out, "Package is NOT valid")?;
    for issue in &result.issues {
        writeln!(out, "  issue: {issue}")?;
    }
    for path in &result.missing_files {
        writeln!(out, "  missing: {path}")?;
    }
    for error in &result.checksum_errors {
        writeln!(out, "  error: {error}")?;
    }
    Ok(())
}

/// Write `message` and a newline, ignoring write failures.
pub fn write_line(out: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(out, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}

fn joined(values: &[String]) -> String {
    if values.is_empty() {
        "(none)".to_owned()
    } else {
        values.join(", ")
    }
}

fn date_span(range: Option<&DateRange>) -> String {
    range.map_or_else(
        || "(undated)".to_owned(),
        |span| {
            format!(
                "{} to {} ({} trading days)",
                span.start, span.end, span.trading_days
            )
        },
    )
}
