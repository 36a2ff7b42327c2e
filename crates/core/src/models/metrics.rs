use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Aggregate performance snapshot. Recomputed on every read from the
/// ledgers, the latest price snapshot, and the benchmark reference —
/// never persisted as authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub as_of: NaiveDate,

    /// Sum of all weekly deposits across both books.
    pub total_contributed: f64,

    /// Market value of the equity book.
    pub equity_value: f64,

    /// Market value of the crypto book.
    pub crypto_value: f64,

    /// equity_value + crypto_value + uninvested cash.
    pub combined_value: f64,

    /// Cash floor from the replay (deposits − buys + sells, floored at 0).
    pub cash_remaining: f64,

    /// combined_value − total_contributed.
    pub unrealized_gain_loss: f64,

    /// Simplified return proxy: combined_value / total_contributed − 1.
    /// Not a true period-chained TWR; misstates returns when contribution
    /// timing is uneven. Kept as the experiment defined it.
    pub simple_return: f64,

    /// Money-weighted return (IRR) over the deposit stream plus terminal
    /// value. Best-effort estimate; never an error.
    pub money_weighted_return: f64,

    /// What the same deposit stream would be worth in the savings benchmark.
    pub savings_benchmark_value: f64,

    /// What the same deposit stream would be worth dollar-cost-averaged
    /// into the reference index.
    pub index_benchmark_value: f64,

    /// combined_value − savings_benchmark_value.
    pub delta_vs_savings: f64,

    /// combined_value − index_benchmark_value.
    pub delta_vs_index: f64,
}

/// Where a chart point came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartPointSource {
    /// Authoritative weekly point, one per distinct week_start.
    Weekly,
    /// Out-of-band intraday valuation merged in for a denser curve.
    Intraday,
}

/// A single chronological point comparing the portfolio against both
/// benchmarks, ready for charting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartPoint {
    pub date: NaiveDate,

    /// Cumulative contributions up to and including this date.
    pub contributed: f64,

    /// Savings benchmark value as of this date.
    pub savings_benchmark_value: f64,

    /// Index DCA benchmark value as of this date.
    pub index_benchmark_value: f64,

    /// Observed portfolio value, when one was captured (intraday points
    /// always carry one; weekly points do not).
    pub portfolio_value: Option<f64>,

    pub source: ChartPointSource,
}
