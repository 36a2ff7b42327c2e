use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A manually-captured point-in-time valuation, denser than the weekly
/// cadence. Append-only, capped at a rolling window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntradaySnapshot {
    pub captured_at: NaiveDateTime,

    /// Combined value of both books plus cash at capture time.
    pub total_value: f64,

    pub equity_value: f64,
    pub crypto_value: f64,
}

/// Recorded when a week is closed out: the contribution level and the
/// portfolio value at completion. Append-only, capped at a rolling window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekCompletion {
    pub week_start: NaiveDate,

    /// Cumulative contributions through this week.
    pub contributed: f64,

    /// Portfolio value when the week was closed.
    pub portfolio_value: f64,
}
