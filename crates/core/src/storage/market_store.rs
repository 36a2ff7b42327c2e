use std::path::Path;

use crate::errors::CoreError;
use crate::models::benchmark::BenchmarkSeries;
use crate::models::price::MarketPriceSnapshot;

use super::fsutil;

/// JSON files for the manually-refreshed price snapshot and the static
/// benchmark reference data. Absent files yield defaults (no quotes, zero
/// APY, no index levels) — valuation then degrades to cost basis and
/// zero-valued benchmarks rather than failing.
pub struct MarketStore;

impl MarketStore {
    pub fn load_prices(path: &Path) -> Result<MarketPriceSnapshot, CoreError> {
        fsutil::read_json_or_default(path)
    }

    pub fn save_prices(path: &Path, snapshot: &MarketPriceSnapshot) -> Result<(), CoreError> {
        fsutil::write_json_atomic(path, snapshot)?;
        log::info!(
            "wrote {} quotes to {}",
            snapshot.prices_by_instrument.len(),
            path.display()
        );
        Ok(())
    }

    pub fn load_benchmarks(path: &Path) -> Result<BenchmarkSeries, CoreError> {
        fsutil::read_json_or_default(path)
    }

    pub fn save_benchmarks(path: &Path, series: &BenchmarkSeries) -> Result<(), CoreError> {
        fsutil::write_json_atomic(path, series)
    }
}
