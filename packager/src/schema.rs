//! Field schemas for well-known event types.
//!
//! Only trades and top-of-book quotes have a fixed record shape. Any other
//! event type gets an empty placeholder so consumers can still see that the
//! type exists in the package.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Schema version stamped on generated schemas.
pub const SCHEMA_VERSION: &str = "1.0";

/// One column of an event record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaField {
    /// Field name as it appears in JSONL records.
    pub name: String,
    /// Logical type (`datetime`, `string`, `decimal`, `int64`).
    #[serde(rename = "type")]
    pub field_type: String,
    /// Human-readable meaning.
    pub description: String,
    /// Whether the field may be absent or null.
    pub nullable: bool,
}

/// Typed field list for one event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSchema {
    /// Event type this schema describes.
    pub event_type: String,
    /// Schema revision.
    pub version: String,
    /// Ordered fields; empty for unrecognised types.
    pub fields: Vec<SchemaField>,
}

impl EventSchema {
    /// Returns true when no field list is known for this type.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.fields.is_empty()
    }
}

type FieldSpec = (&'static str, &'static str, &'static str, bool);

const TRADE_FIELDS: [FieldSpec; 8] = [
    ("timestamp", "datetime", "Exchange timestamp of the trade (UTC)", false),
    ("symbol", "string", "Instrument symbol", false),
    ("price", "decimal", "Execution price", false),
    ("size", "int64", "Executed quantity", false),
    ("side", "string", "Aggressor side (Buy, Sell, Unknown)", true),
    ("exchange", "string", "Venue or exchange code", true),
    ("tradeId", "string", "Venue-assigned trade identifier", true),
    ("sequenceNumber", "int64", "Collector sequence number", false),
];

const QUOTE_FIELDS: [FieldSpec; 9] = [
    ("timestamp", "datetime", "Exchange timestamp of the quote (UTC)", false),
    ("symbol", "string", "Instrument symbol", false),
    ("bidPrice", "decimal", "Best bid price", false),
    ("bidSize", "int64", "Quantity at the best bid", false),
    ("askPrice", "decimal", "Best ask price", false),
    ("askSize", "int64", "Quantity at the best ask", false),
    ("bidExchange", "string", "Venue of the best bid", true),
    ("askExchange", "string", "Venue of the best ask", true),
    ("sequenceNumber", "int64", "Collector sequence number", false),
];

/// Build the schema for `event_type`.
///
/// # Examples
///
/// ```
/// use mdpack_packager::schema::schema_for;
///
/// assert!(schema_for("Trade").fields.iter().any(|f| f.name == "price"));
/// assert!(schema_for("L2Snapshot").is_placeholder());
/// ```
#[must_use]
pub fn schema_for(event_type: &str) -> EventSchema {
    let specs: &[FieldSpec] = match event_type.to_ascii_lowercase().as_str() {
        "trade" => &TRADE_FIELDS,
        "bboquote" | "quote" => &QUOTE_FIELDS,
        _ => &[],
    };
    EventSchema {
        event_type: event_type.to_owned(),
        version: SCHEMA_VERSION.to_owned(),
        fields: specs
            .iter()
            .map(|(name, field_type, description, nullable)| SchemaField {
                name: (*name).to_owned(),
                field_type: (*field_type).to_owned(),
                description: (*description).to_owned(),
                nullable: *nullable,
            })
            .collect(),
    }
}

/// Build schemas for every listed event type, keyed by event type.
#[must_use]
pub fn generate_schemas(event_types: &[String]) -> BTreeMap<String, EventSchema> {
    event_types
        .iter()
        .map(|event_type| (event_type.clone(), schema_for(event_type)))
        .collect()
}
