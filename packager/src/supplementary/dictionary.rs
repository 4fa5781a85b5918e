//! `metadata/data_dictionary.md` rendering.

use crate::manifest::PackageManifest;
use crate::schema::{EventSchema, schema_for};

const FILE_ENTRY_FIELDS: [(&str, &str); 13] = [
    ("path", "Location of the file inside the package"),
    ("sourcePath", "Location relative to the original data root"),
    ("symbol", "Upper-cased ticker symbol"),
    ("eventType", "Kind of market event stored in the file"),
    ("date", "Trading date covered by the file (YYYY-MM-DD)"),
    ("source", "Collection mode (`live` or `historical`)"),
    ("format", "Serialization format (`jsonl`, `csv`, `parquet`)"),
    ("isCompressed", "Whether the file is gzip or zstd compressed"),
    ("compressionType", "`gzip` or `zstd` when compressed"),
    ("sizeBytes", "Stored size in bytes"),
    ("uncompressedSizeBytes", "Estimated decompressed size in bytes"),
    ("eventCount", "Estimated number of events"),
    ("checksum", "SHA-256 of the stored bytes; empty when not recorded"),
];

fn schema_section(schema: &EventSchema) -> Vec<String> {
    let mut lines = vec![format!("### {}", schema.event_type), String::new()];
    if schema.is_placeholder() {
        lines.push("No fixed field list is defined for this event type.".to_owned());
        lines.push(String::new());
        return lines;
    }
    lines.push("| Field | Type | Nullable | Description |".to_owned());
    lines.push("|---|---|---|---|".to_owned());
    lines.extend(schema.fields.iter().map(|field| {
        format!(
            "| `{}` | {} | {} | {} |",
            field.name,
            field.field_type,
            if field.nullable { "yes" } else { "no" },
            field.description
        )
    }));
    lines.push(String::new());
    lines
}

/// Render the data dictionary for the event types in `manifest`.
///
/// Embedded manifest schemas are used when present; otherwise the built-in
/// schema for each event type is described.
#[must_use]
pub fn render_data_dictionary(manifest: &PackageManifest) -> String {
    let mut lines = vec![
        format!("# Data dictionary: {}", manifest.name),
        String::new(),
        "## Event types".to_owned(),
        String::new(),
    ];

    if manifest.event_types.is_empty() {
        lines.push("No event types were identified in this package.".to_owned());
        lines.push(String::new());
    }
    for event_type in &manifest.event_types {
        let schema = manifest
            .schemas
            .as_ref()
            .and_then(|schemas| schemas.get(event_type))
            .cloned()
            .unwrap_or_else(|| schema_for(event_type));
        lines.extend(schema_section(&schema));
    }

    lines.extend([
        "## Manifest file entries".to_owned(),
        String::new(),
        "| Field | Description |".to_owned(),
        "|---|---|".to_owned(),
    ]);
    lines.extend(
        FILE_ENTRY_FIELDS
            .iter()
            .map(|(name, description)| format!("| `{name}` | {description} |")),
    );
    lines.push(String::new());
    lines.join("\n")
}
