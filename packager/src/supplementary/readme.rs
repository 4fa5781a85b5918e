//! `README.md` rendering.

use crate::manifest::PackageManifest;
use crate::result::human_size;

fn layout_template(layout: &str) -> &'static str {
    match layout {
        "BySymbol" => "data/{symbol}/{eventType}/{date}/{filename}",
        "ByType" => "data/{eventType}/{symbol}/{date}/{filename}",
        "Flat" => "data/{filename}",
        _ => "data/{date}/{symbol}/{eventType}/{filename}",
    }
}

fn list_or_none(values: &[String]) -> String {
    if values.is_empty() {
        "(none)".to_owned()
    } else {
        values.join(", ")
    }
}

/// Render the package README from its manifest.
#[must_use]
pub fn render_readme(manifest: &PackageManifest) -> String {
    let mut lines = vec![format!("# {}", manifest.name), String::new()];
    if let Some(description) = manifest.description.as_deref().filter(|d| !d.trim().is_empty()) {
        lines.push(description.to_owned());
        lines.push(String::new());
    }

    let created = manifest.created_at.format("%Y-%m-%d %H:%M:%S UTC");
    lines.push(manifest.creator.as_deref().map_or_else(
        || format!("Portable market-data package created {created}."),
        |creator| format!("Portable market-data package created {created} by {creator}."),
    ));
    lines.push(String::new());

    let date_range = manifest.date_range.map_or_else(
        || "(undated)".to_owned(),
        |range| {
            format!(
                "{} to {} ({} calendar days, {} trading days)",
                range.start, range.end, range.calendar_days, range.trading_days
            )
        },
    );
    lines.extend([
        "## Summary".to_owned(),
        String::new(),
        "| Field | Value |".to_owned(),
        "|---|---|".to_owned(),
        format!("| Package id | `{}` |", manifest.package_id),
        format!("| Manifest version | {} |", manifest.version),
        format!("| Format | {} |", manifest.format),
        format!("| Layout | {} |", manifest.layout),
        format!("| Files | {} |", manifest.total_files),
        format!("| Data size | {} |", human_size(manifest.data_size_bytes())),
        format!("| Estimated events | {} |", manifest.total_events),
        format!("| Symbols | {} |", list_or_none(&manifest.symbols)),
        format!("| Event types | {} |", list_or_none(&manifest.event_types)),
        format!("| Sources | {} |", list_or_none(&manifest.sources)),
        format!("| Date range | {date_range} |"),
        String::new(),
        "Event counts and uncompressed sizes are estimates.".to_owned(),
        String::new(),
        "## Layout".to_owned(),
        String::new(),
        format!(
            "Data files are stored under `data/` as `{}`. `manifest.json` lists every file with its SHA-256 checksum.",
            layout_template(&manifest.layout)
        ),
        String::new(),
        "## Importing".to_owned(),
        String::new(),
        "```sh".to_owned(),
        "mdpack --import-package <package-file> --import-destination <directory>".to_owned(),
        "```".to_owned(),
        String::new(),
        "Checksums are verified during import unless `--skip-validation` is given.".to_owned(),
    ]);

    if let Some(extra) = manifest.supplementary_files.as_deref().filter(|f| !f.is_empty()) {
        lines.push(String::new());
        lines.push("## Included files".to_owned());
        lines.push(String::new());
        lines.extend(extra.iter().map(|path| format!("- `{path}`")));
    }

    lines.push(String::new());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supplementary::tests::sample_manifest;

    #[test]
    fn readme_summarises_manifest() {
        let readme = render_readme(&sample_manifest());
        assert!(readme.starts_with("# equities\n"));
        assert!(readme.contains("| Symbols | AAPL, MSFT |"));
        assert!(readme.contains("data/{date}/{symbol}/{eventType}/{filename}"));
        assert!(readme.contains("2024-01-02 to 2024-01-03"));
        assert!(readme.contains("- `scripts/load_data.py`"));
    }

    #[test]
    fn readme_omits_empty_description() {
        let mut manifest = sample_manifest();
        manifest.description = Some("  ".to_owned());
        let readme = render_readme(&manifest);
        assert!(readme.starts_with("# equities\n\nPortable"));
    }
}
