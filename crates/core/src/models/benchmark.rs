use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One historical level of the reference index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexLevel {
    pub date: NaiveDate,
    pub level: f64,
}

/// Static reference data for the two benchmarks the experiment is
/// measured against: a high-interest savings account at a fixed APY and a
/// dollar-cost-averaged index position priced off a sparse level table.
///
/// Append-only; the level table is small and dense enough that nearest-date
/// lookup is a linear scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkSeries {
    /// Historical index levels, not required to be sorted.
    #[serde(default)]
    pub index_levels: Vec<IndexLevel>,

    /// Annual percentage yield of the savings benchmark (e.g., 0.04).
    #[serde(default)]
    pub savings_apy: f64,
}

impl Default for BenchmarkSeries {
    fn default() -> Self {
        Self {
            index_levels: Vec::new(),
            savings_apy: 0.0,
        }
    }
}
