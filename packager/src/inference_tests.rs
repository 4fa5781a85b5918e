//! Unit tests for path and filename metadata inference.

use super::*;
use rstest::rstest;

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

#[rstest]
#[case::symbol_then_type("AAPL/Trade", "2024-01-02.jsonl", "AAPL", "Trade")]
#[case::type_then_symbol("Trade/msft", "2024-01-02.jsonl", "MSFT", "Trade")]
#[case::live_prefix("live/spy/BboQuote", "2024-01-02.jsonl.gz", "SPY", "BboQuote")]
#[case::data_prefix("data/historical/QQQ/bar", "2024-01-02.csv", "QQQ", "Bar")]
#[case::date_directory("2024-01-02/IWM/Depth", "part.parquet", "IWM", "Depth")]
#[case::filename_fallback("", "tsla_trade_2024-01-02.jsonl", "TSLA", "Trade")]
#[case::filename_fills_type("NVDA", "NVDA.quote.2024-01-02.jsonl.zst", "NVDA", "Quote")]
fn infers_symbol_and_event_type(
    #[case] dir: &str,
    #[case] file: &str,
    #[case] symbol: &str,
    #[case] event_type: &str,
) {
    let meta = infer_metadata(Utf8Path::new(dir), file);
    assert_eq!(meta.symbol.as_deref(), Some(symbol));
    assert_eq!(meta.event_type.as_deref(), Some(event_type));
    assert_eq!(meta.date, date(2024, 1, 2));
}

#[test]
fn directory_segments_take_precedence_over_filename_tokens() {
    let meta = infer_metadata(Utf8Path::new("AAPL/Trade"), "MSFT_Quote_2024-03-04.jsonl");
    assert_eq!(meta.symbol.as_deref(), Some("AAPL"));
    assert_eq!(meta.event_type.as_deref(), Some("Trade"));
    assert_eq!(meta.date, date(2024, 3, 4));
}

#[test]
fn filename_date_wins_over_directory_date() {
    let meta = infer_metadata(Utf8Path::new("2024-01-01/AAPL/Trade"), "x_y_2024-02-02.jsonl");
    assert_eq!(meta.date, date(2024, 2, 2));
}

#[test]
fn directory_date_used_when_filename_has_none() {
    let meta = infer_metadata(Utf8Path::new("AAPL/Trade/2024-05-06"), "part-0001.jsonl");
    assert_eq!(meta.date, date(2024, 5, 6));
}

#[test]
fn second_event_type_segment_becomes_symbol_when_symbol_unset() {
    // Only the first event-type segment is taken; later ones fall through.
    let meta = infer_metadata(Utf8Path::new("Trade/Quote"), "2024-01-02.jsonl");
    assert_eq!(meta.event_type.as_deref(), Some("Trade"));
    assert_eq!(meta.symbol.as_deref(), Some("QUOTE"));
}

#[test]
fn unknown_filename_event_type_is_kept_verbatim() {
    let meta = infer_metadata(Utf8Path::new(""), "ES_Imbalance.csv");
    assert_eq!(meta.symbol.as_deref(), Some("ES"));
    assert_eq!(meta.event_type.as_deref(), Some("Imbalance"));
    assert_eq!(meta.date, None);
}

#[test]
fn root_segment_after_symbol_is_not_skipped() {
    let meta = infer_metadata(Utf8Path::new("AAPL/data"), "2024-01-02.jsonl");
    assert_eq!(meta.symbol.as_deref(), Some("AAPL"));
    // `data` is no longer leading and the filename has a single token, so
    // nothing supplies an event type.
    assert_eq!(meta.event_type.as_deref(), None);
}

#[rstest]
#[case("live", Some("live"))]
#[case("historical", Some("historical"))]
#[case("data", None)]
#[case("data/live", Some("live"))]
fn records_collection_source(#[case] prefix: &str, #[case] expected: Option<&str>) {
    let dir = format!("{prefix}/AAPL/Trade");
    let meta = infer_metadata(Utf8Path::new(&dir), "2024-01-02.jsonl");
    assert_eq!(meta.source.as_deref(), expected);
    assert_eq!(meta.symbol.as_deref(), Some("AAPL"));
}

#[rstest]
#[case("a.jsonl", DataFormat::Jsonl, None)]
#[case("a.JSONL.GZ", DataFormat::Jsonl, Some(CompressionType::Gzip))]
#[case("a.jsonl.zst", DataFormat::Jsonl, Some(CompressionType::Zstd))]
#[case("a.parquet", DataFormat::Parquet, None)]
#[case("a.csv", DataFormat::Csv, None)]
fn recognises_format_and_compression(
    #[case] file: &str,
    #[case] format: DataFormat,
    #[case] compression: Option<CompressionType>,
) {
    let meta = infer_metadata(Utf8Path::new("AAPL/Trade"), file);
    assert_eq!(meta.format, Some(format));
    assert_eq!(meta.compression, compression);
}

#[rstest]
#[case("2024-01-02", date(2024, 1, 2))]
#[case("2024/01/02", date(2024, 1, 2))]
#[case("01/02/2024", date(2024, 1, 2))]
#[case("2024-01-02T09:30:00", date(2024, 1, 2))]
#[case("2024-01-02T09:30:00Z", date(2024, 1, 2))]
#[case("AAPL", None)]
#[case("Trade", None)]
#[case("", None)]
#[case("2024-13-40", None)]
fn parses_dates(#[case] token: &str, #[case] expected: Option<NaiveDate>) {
    assert_eq!(parse_date(token), expected);
}

#[test]
fn strips_only_known_extensions() {
    assert_eq!(strip_known_extension("AAPL_Trade.jsonl.gz"), "AAPL_Trade");
    assert_eq!(strip_known_extension("notes.txt"), "notes.txt");
}
