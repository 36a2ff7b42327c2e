use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Manually-refreshed snapshot of market prices, keyed by instrument.
///
/// There is no live feed: an external fetch step rewrites this file and
/// valuation reads whatever is latest. Instruments with no quote fall back
/// to their average cost at valuation time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketPriceSnapshot {
    /// Date the prices were captured. `None` only in the empty default,
    /// i.e. a tracker whose prices have never been refreshed; every
    /// refresh writes a dated snapshot.
    pub as_of: Option<NaiveDate>,

    /// instrument → price in the base currency.
    pub prices_by_instrument: HashMap<String, f64>,
}

impl MarketPriceSnapshot {
    pub fn new(as_of: NaiveDate, prices_by_instrument: HashMap<String, f64>) -> Self {
        Self {
            as_of: Some(as_of),
            prices_by_instrument,
        }
    }

    /// Look up a quote, case-normalized.
    #[must_use]
    pub fn price_of(&self, instrument_id: &str) -> Option<f64> {
        self.prices_by_instrument
            .get(&instrument_id.to_uppercase())
            .copied()
    }
}
