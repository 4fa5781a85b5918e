//! Advisory event-count and size estimates for manifest entries.
//!
//! JSONL files (plain, gzip, or zstd) are sampled line by line; once the
//! sample limit is reached the count is extrapolated from the fraction of
//! the raw file consumed. Other formats fall back to a bytes-per-event
//! heuristic. Manifests flag all of these figures as estimates.

use crate::inference::{CompressionType, DataFormat};
use flate2::read::MultiGzDecoder;
use std::cell::Cell;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

/// Lines read from a JSONL file before extrapolating.
pub const SAMPLE_LINES: u64 = 100_000;

/// Assumed average record size for formats that are not sampled.
pub const BYTES_PER_EVENT_HEURISTIC: u64 = 100;

/// Assumed expansion ratio of compressed files.
pub const COMPRESSED_EXPANSION_FACTOR: u64 = 5;

/// Read adapter that counts raw bytes pulled from `inner`.
struct CountingReader<'a, R: Read> {
    inner: R,
    count: &'a Cell<u64>,
}

impl<R: Read> Read for CountingReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        let read_bytes = u64::try_from(read).unwrap_or(u64::MAX);
        self.count.set(self.count.get().saturating_add(read_bytes));
        Ok(read)
    }
}

/// Estimated uncompressed size of a file.
///
/// # Examples
///
/// ```
/// use mdpack_packager::estimate::estimate_uncompressed_size;
///
/// assert_eq!(estimate_uncompressed_size(1_000, true), 5_000);
/// assert_eq!(estimate_uncompressed_size(1_000, false), 1_000);
/// ```
#[must_use]
pub const fn estimate_uncompressed_size(size_bytes: u64, is_compressed: bool) -> u64 {
    if is_compressed {
        size_bytes.saturating_mul(COMPRESSED_EXPANSION_FACTOR)
    } else {
        size_bytes
    }
}

/// Event count implied by the bytes-per-event heuristic.
///
/// # Examples
///
/// ```
/// use mdpack_packager::estimate::heuristic_event_count;
///
/// assert_eq!(heuristic_event_count(1_050), 10);
/// ```
#[must_use]
pub const fn heuristic_event_count(size_bytes: u64) -> u64 {
    match size_bytes.checked_div(BYTES_PER_EVENT_HEURISTIC) {
        Some(count) => count,
        None => 0,
    }
}

/// Estimate the number of events stored in a file.
///
/// # Errors
///
/// Returns an I/O error if a JSONL file cannot be opened or decoded.
pub fn estimate_event_count(
    path: &Path,
    size_bytes: u64,
    format: DataFormat,
    compression: Option<CompressionType>,
) -> io::Result<u64> {
    if format != DataFormat::Jsonl {
        return Ok(heuristic_event_count(size_bytes));
    }

    let raw_bytes = Cell::new(0u64);
    let counting = CountingReader {
        inner: File::open(path)?,
        count: &raw_bytes,
    };
    let decoded: Box<dyn Read + '_> = match compression {
        None => Box::new(counting),
        Some(CompressionType::Gzip) => Box::new(MultiGzDecoder::new(counting)),
        Some(CompressionType::Zstd) => Box::new(zstd::Decoder::new(counting)?),
    };

    let (lines, reached_end) = count_lines(BufReader::new(decoded), SAMPLE_LINES)?;
    if reached_end {
        return Ok(lines);
    }
    Ok(extrapolate(lines, raw_bytes.get(), size_bytes))
}

/// Count non-empty lines, stopping after `limit`.
///
/// Returns the count and whether the end of input was reached.
fn count_lines(mut reader: impl BufRead, limit: u64) -> io::Result<(u64, bool)> {
    let mut line = Vec::new();
    let mut count = 0u64;
    while count < limit {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Ok((count, true));
        }
        if line.iter().any(|b| !b.is_ascii_whitespace()) {
            count += 1;
        }
    }
    let at_end = reader.fill_buf()?.is_empty();
    Ok((count, at_end))
}

/// Scale `lines` by the ratio of total to consumed raw bytes.
fn extrapolate(lines: u64, bytes_read: u64, total_bytes: u64) -> u64 {
    if bytes_read == 0 || bytes_read >= total_bytes {
        return lines;
    }
    let scaled = u128::from(lines)
        .saturating_mul(u128::from(total_bytes))
        .checked_div(u128::from(bytes_read))
        .unwrap_or_default();
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use rstest::rstest;
    use std::io::Write;

    fn jsonl(lines: usize) -> String {
        (0..lines).map(|i| format!("{{\"seq\":{i}}}\n")).collect()
    }

    #[test]
    fn counts_plain_jsonl_lines() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("a.jsonl");
        let body = format!("{}\n\n", jsonl(10));
        std::fs::write(&path, &body).expect("write");

        let count = estimate_event_count(&path, body.len() as u64, DataFormat::Jsonl, None)
            .expect("estimate");
        assert_eq!(count, 10);
    }

    #[test]
    fn counts_final_line_without_newline() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("a.jsonl");
        std::fs::write(&path, "{}\n{}").expect("write");
        assert_eq!(
            estimate_event_count(&path, 5, DataFormat::Jsonl, None).expect("estimate"),
            2
        );
    }

    #[test]
    fn counts_gzip_jsonl_lines() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("a.jsonl.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(jsonl(25).as_bytes()).expect("encode");
        let compressed = encoder.finish().expect("finish");
        std::fs::write(&path, &compressed).expect("write");

        let count = estimate_event_count(
            &path,
            compressed.len() as u64,
            DataFormat::Jsonl,
            Some(CompressionType::Gzip),
        )
        .expect("estimate");
        assert_eq!(count, 25);
    }

    #[test]
    fn counts_zstd_jsonl_lines() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("a.jsonl.zst");
        let compressed = zstd::encode_all(jsonl(7).as_bytes(), 3).expect("encode");
        std::fs::write(&path, &compressed).expect("write");

        let count = estimate_event_count(
            &path,
            compressed.len() as u64,
            DataFormat::Jsonl,
            Some(CompressionType::Zstd),
        )
        .expect("estimate");
        assert_eq!(count, 7);
    }

    #[rstest]
    #[case(DataFormat::Parquet, 12_345, 123)]
    #[case(DataFormat::Csv, 99, 0)]
    fn non_jsonl_uses_size_heuristic(
        #[case] format: DataFormat,
        #[case] size: u64,
        #[case] expected: u64,
    ) {
        let path = Path::new("/nonexistent/file");
        assert_eq!(
            estimate_event_count(path, size, format, None).expect("estimate"),
            expected
        );
    }

    #[test]
    fn sampling_stops_at_limit() {
        let input = jsonl(50);
        let (count, at_end) = count_lines(input.as_bytes(), 20).expect("count");
        assert_eq!(count, 20);
        assert!(!at_end);
    }

    #[rstest]
    #[case(100, 1_000, 4_000, 400)]
    #[case(100, 0, 4_000, 100)]
    #[case(100, 5_000, 4_000, 100)]
    fn extrapolates_proportionally(
        #[case] lines: u64,
        #[case] read: u64,
        #[case] total: u64,
        #[case] expected: u64,
    ) {
        assert_eq!(extrapolate(lines, read, total), expected);
    }

    #[test]
    fn missing_jsonl_file_is_an_error() {
        let result =
            estimate_event_count(Path::new("/nonexistent/a.jsonl"), 10, DataFormat::Jsonl, None);
        assert!(result.is_err());
    }
}
