//! SQL import scripts for PostgreSQL, ClickHouse, and DuckDB.
//!
//! Every script creates `trades`, `quotes`, and `bars` tables and then
//! lists one load statement per packaged file whose event type maps to
//! one of them. Table columns are snake_case; JSON fields are camelCase.

use crate::inference::{CompressionType, DataFormat};
use crate::manifest::{PackageFileEntry, PackageManifest};
use crate::options::ImportTarget;

#[derive(Debug, Clone, Copy)]
enum ColumnType {
    Timestamp,
    Text,
    Decimal,
    Integer,
}

/// `(column, json_field, type)`
type Column = (&'static str, &'static str, ColumnType);

struct Table {
    name: &'static str,
    columns: &'static [Column],
}

const TRADES: Table = Table {
    name: "trades",
    columns: &[
        ("timestamp", "timestamp", ColumnType::Timestamp),
        ("symbol", "symbol", ColumnType::Text),
        ("price", "price", ColumnType::Decimal),
        ("size", "size", ColumnType::Integer),
        ("side", "side", ColumnType::Text),
        ("exchange", "exchange", ColumnType::Text),
        ("trade_id", "tradeId", ColumnType::Text),
        ("sequence_number", "sequenceNumber", ColumnType::Integer),
    ],
};

const QUOTES: Table = Table {
    name: "quotes",
    columns: &[
        ("timestamp", "timestamp", ColumnType::Timestamp),
        ("symbol", "symbol", ColumnType::Text),
        ("bid_price", "bidPrice", ColumnType::Decimal),
        ("bid_size", "bidSize", ColumnType::Integer),
        ("ask_price", "askPrice", ColumnType::Decimal),
        ("ask_size", "askSize", ColumnType::Integer),
        ("bid_exchange", "bidExchange", ColumnType::Text),
        ("ask_exchange", "askExchange", ColumnType::Text),
        ("sequence_number", "sequenceNumber", ColumnType::Integer),
    ],
};

const BARS: Table = Table {
    name: "bars",
    columns: &[
        ("timestamp", "timestamp", ColumnType::Timestamp),
        ("symbol", "symbol", ColumnType::Text),
        ("open", "open", ColumnType::Decimal),
        ("high", "high", ColumnType::Decimal),
        ("low", "low", ColumnType::Decimal),
        ("close", "close", ColumnType::Decimal),
        ("volume", "volume", ColumnType::Integer),
    ],
};

const TABLES: [&Table; 3] = [&TRADES, &QUOTES, &BARS];

fn table_for(event_type: Option<&str>) -> Option<&'static Table> {
    match event_type?.to_ascii_lowercase().as_str() {
        "trade" => Some(&TRADES),
        "bboquote" | "quote" => Some(&QUOTES),
        "bar" => Some(&BARS),
        _ => None,
    }
}

fn sql_type(target: ImportTarget, column_type: ColumnType) -> &'static str {
    match (target, column_type) {
        (ImportTarget::PostgreSql, ColumnType::Timestamp) => "TIMESTAMPTZ NOT NULL",
        (ImportTarget::PostgreSql, ColumnType::Text) => "TEXT",
        (ImportTarget::PostgreSql, ColumnType::Decimal) => "NUMERIC(18, 8)",
        (ImportTarget::PostgreSql, ColumnType::Integer) => "BIGINT",
        (ImportTarget::ClickHouse, ColumnType::Timestamp) => "DateTime64(9, 'UTC')",
        (ImportTarget::ClickHouse, ColumnType::Text) => "LowCardinality(String)",
        (ImportTarget::ClickHouse, ColumnType::Decimal) => "Decimal(18, 8)",
        (ImportTarget::ClickHouse, ColumnType::Integer) => "Int64",
        (ImportTarget::DuckDb, ColumnType::Timestamp) => "TIMESTAMPTZ",
        (ImportTarget::DuckDb, ColumnType::Text) => "VARCHAR",
        (ImportTarget::DuckDb, ColumnType::Decimal) => "DECIMAL(18, 8)",
        (ImportTarget::DuckDb, ColumnType::Integer) => "BIGINT",
    }
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn create_table(target: ImportTarget, table: &Table) -> String {
    let columns: Vec<String> = table
        .columns
        .iter()
        .map(|(name, _, column_type)| format!("    {name} {}", sql_type(target, *column_type)))
        .collect();
    let engine = if target == ImportTarget::ClickHouse {
        "\nENGINE = MergeTree\nORDER BY (symbol, timestamp)"
    } else {
        ""
    };
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n){engine};\n",
        table.name,
        columns.join(",\n")
    )
}

fn column_list(table: &Table) -> String {
    table
        .columns
        .iter()
        .map(|(name, _, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

const fn postgres_cast(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::Timestamp => "::timestamptz",
        ColumnType::Text => "",
        ColumnType::Decimal => "::numeric",
        ColumnType::Integer => "::bigint",
    }
}

fn postgres_load(table: &Table, file: &PackageFileEntry) -> String {
    let path = quote_literal(&file.path);
    match file.format {
        DataFormat::Parquet => {
            format!("-- skipped {}: COPY cannot read Parquet\n", file.path)
        }
        DataFormat::Csv => format!(
            "\\copy {} ({}) FROM {path} WITH (FORMAT csv, HEADER true)\n",
            table.name,
            column_list(table)
        ),
        DataFormat::Jsonl => {
            let source = match file.compression_type {
                None => format!("FROM {path}"),
                Some(CompressionType::Gzip) => {
                    format!("FROM PROGRAM {}", quote_literal(&format!("gzip -dc {}", file.path)))
                }
                Some(CompressionType::Zstd) => {
                    format!("FROM PROGRAM {}", quote_literal(&format!("zstd -dc {}", file.path)))
                }
            };
            let selects: Vec<String> = table
                .columns
                .iter()
                .map(|(_, field, column_type)| {
                    format!("(doc->>'{field}'){}", postgres_cast(*column_type))
                })
                .collect();
            format!(
                "TRUNCATE raw_events;\n\\copy raw_events (doc) {source} WITH (FORMAT csv, QUOTE e'\\x01', DELIMITER e'\\x02')\nINSERT INTO {} ({}) SELECT {} FROM raw_events;\n",
                table.name,
                column_list(table),
                selects.join(", ")
            )
        }
    }
}

fn json_projection(table: &Table, quote: char) -> String {
    table
        .columns
        .iter()
        .map(|(name, field, _)| {
            if name == field {
                format!("{quote}{field}{quote}")
            } else {
                format!("{quote}{field}{quote} AS {name}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn clickhouse_load(table: &Table, file: &PackageFileEntry) -> String {
    let (input_format, projection) = match file.format {
        DataFormat::Jsonl => ("JSONEachRow", json_projection(table, '`')),
        DataFormat::Csv => ("CSVWithNames", column_list(table)),
        DataFormat::Parquet => ("Parquet", column_list(table)),
    };
    format!(
        "INSERT INTO {} ({}) SELECT {projection} FROM file({}, '{input_format}');\n",
        table.name,
        column_list(table),
        quote_literal(&file.path)
    )
}

fn duckdb_load(table: &Table, file: &PackageFileEntry) -> String {
    let path = quote_literal(&file.path);
    let (reader, projection) = match file.format {
        DataFormat::Jsonl => (
            format!("read_json_auto({path})"),
            json_projection(table, '"'),
        ),
        DataFormat::Csv => (format!("read_csv_auto({path})"), column_list(table)),
        DataFormat::Parquet => (format!("read_parquet({path})"), column_list(table)),
    };
    format!(
        "INSERT INTO {} ({}) SELECT {projection} FROM {reader};\n",
        table.name,
        column_list(table)
    )
}

/// Render `scripts/import_<target>.sql` for `manifest`.
///
/// Paths in load statements are relative to the directory the package was
/// imported into.
#[must_use]
pub fn render_import_script(target: ImportTarget, manifest: &PackageManifest) -> String {
    let mut script = format!(
        "-- {} import script for package {} ({})\n-- Run from the directory the package was imported into.\n\n",
        target.display_name(),
        manifest.name,
        manifest.package_id
    );
    if target == ImportTarget::ClickHouse {
        script.push_str("-- file() paths resolve against the server's user_files_path.\n\n");
    }
    for table in TABLES {
        script.push_str(&create_table(target, table));
        script.push('\n');
    }
    if target == ImportTarget::PostgreSql {
        script.push_str("CREATE TEMP TABLE IF NOT EXISTS raw_events (doc JSONB);\n\n");
    }

    for file in &manifest.files {
        let Some(table) = table_for(file.event_type.as_deref()) else {
            script.push_str(&format!("-- no table for {}\n", file.path));
            continue;
        };
        let statement = match target {
            ImportTarget::PostgreSql => postgres_load(table, file),
            ImportTarget::ClickHouse => clickhouse_load(table, file),
            ImportTarget::DuckDb => duckdb_load(table, file),
        };
        script.push_str(&statement);
    }
    script
}
