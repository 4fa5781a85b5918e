//! `metadata/quality_report.json`: per-symbol date coverage.
//!
//! Coverage is measured against the weekdays between each symbol's first
//! and last dated file. Exchange holidays are not known here, so they show
//! up as missing trading days. Coverage ratios are reported in basis
//! points (hundredths of a percent).

use crate::manifest::{DateRange, PackageManifest};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Coverage figures for one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolCoverage {
    /// Upper-cased symbol.
    pub symbol: String,
    /// Event types seen for the symbol.
    pub event_types: Vec<String>,
    /// Files stored for the symbol.
    pub file_count: usize,
    /// Files without a date.
    pub undated_files: usize,
    /// Estimated events.
    pub estimated_events: u64,
    /// First dated file.
    pub first_date: Option<NaiveDate>,
    /// Last dated file.
    pub last_date: Option<NaiveDate>,
    /// Weekdays between the first and last date.
    pub expected_trading_days: u64,
    /// Weekdays with at least one file.
    pub covered_trading_days: u64,
    /// Weekdays with no file.
    pub missing_trading_days: Vec<NaiveDate>,
    /// `covered / expected` in basis points, rounded half up.
    pub coverage_basis_points: u64,
}

/// Package-wide coverage report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    /// Package the report describes.
    pub package_id: String,
    /// When the report was produced (the manifest creation time).
    pub generated_at: DateTime<Utc>,
    /// Files in the package.
    pub total_files: usize,
    /// Files with no inferred symbol.
    pub files_without_symbol: usize,
    /// Files with no inferred date.
    pub files_without_date: usize,
    /// Files stored without a checksum.
    pub files_without_checksum: usize,
    /// Mean coverage across symbols with dated files, in basis points.
    pub overall_coverage_basis_points: u64,
    /// One entry per symbol, sorted by symbol.
    pub symbols: Vec<SymbolCoverage>,
}

#[derive(Default)]
struct SymbolAccumulator {
    event_types: BTreeSet<String>,
    dates: BTreeSet<NaiveDate>,
    file_count: usize,
    undated_files: usize,
    estimated_events: u64,
}

impl SymbolAccumulator {
    fn into_coverage(self, symbol: String) -> SymbolCoverage {
        let first_date = self.dates.first().copied();
        let last_date = self.dates.last().copied();
        let (expected, missing) = match (first_date, last_date) {
            (Some(first), Some(last)) => {
                let range = DateRange::new(first, last);
                let missing: Vec<NaiveDate> = range
                    .trading_days()
                    .filter(|day| !self.dates.contains(day))
                    .collect();
                (range.trading_days, missing)
            }
            _ => (0, Vec::new()),
        };
        let covered = expected.saturating_sub(u64::try_from(missing.len()).unwrap_or(u64::MAX));
        SymbolCoverage {
            symbol,
            event_types: self.event_types.into_iter().collect(),
            file_count: self.file_count,
            undated_files: self.undated_files,
            estimated_events: self.estimated_events,
            first_date,
            last_date,
            expected_trading_days: expected,
            covered_trading_days: covered,
            missing_trading_days: missing,
            coverage_basis_points: basis_points(covered, expected),
        }
    }
}

const FULL_COVERAGE: u64 = 10_000;

/// `part / whole` in basis points, rounded half up; zero when `whole` is zero.
const fn basis_points(part: u64, whole: u64) -> u64 {
    let scaled = part.saturating_mul(FULL_COVERAGE).saturating_add(whole >> 1);
    match scaled.checked_div(whole) {
        Some(points) => points,
        None => 0,
    }
}

/// Build the coverage report for `manifest`.
#[must_use]
pub fn build_quality_report(manifest: &PackageManifest) -> QualityReport {
    let mut by_symbol: BTreeMap<String, SymbolAccumulator> = BTreeMap::new();
    for file in &manifest.files {
        let Some(symbol) = file.symbol.as_deref() else {
            continue;
        };
        let acc = by_symbol.entry(symbol.to_uppercase()).or_default();
        acc.file_count += 1;
        acc.estimated_events += file.event_count;
        if let Some(event_type) = &file.event_type {
            acc.event_types.insert(event_type.clone());
        }
        if file.date.is_none() {
            acc.undated_files += 1;
        }
        acc.dates.extend(file.date);
    }

    let symbols: Vec<SymbolCoverage> = by_symbol
        .into_iter()
        .map(|(symbol, acc)| acc.into_coverage(symbol))
        .collect();
    let dated: Vec<u64> = symbols
        .iter()
        .filter(|s| s.expected_trading_days > 0)
        .map(|s| s.coverage_basis_points)
        .collect();
    let dated_count = u64::try_from(dated.len()).unwrap_or(u64::MAX);
    let overall = dated
        .iter()
        .sum::<u64>()
        .saturating_add(dated_count >> 1)
        .checked_div(dated_count)
        .unwrap_or_default();

    QualityReport {
        package_id: manifest.package_id.clone(),
        generated_at: manifest.created_at,
        total_files: manifest.total_files,
        files_without_symbol: manifest.files.iter().filter(|f| f.symbol.is_none()).count(),
        files_without_date: manifest.files.iter().filter(|f| f.date.is_none()).count(),
        files_without_checksum: manifest.files.iter().filter(|f| !f.has_checksum()).count(),
        overall_coverage_basis_points: overall,
        symbols,
    }
}
