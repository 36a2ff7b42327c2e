use async_trait::async_trait;
use std::collections::HashMap;

use crate::errors::CoreError;

/// Interface to whatever fetches market quotes.
///
/// The core has no live feed of its own — prices arrive as manually
/// refreshed snapshots. Implementations live outside this crate (a broker
/// scraper, a public API client, a fixture in tests); the facade only
/// needs a batch of instrument → price in the base currency.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Human-readable name of this source (for logs/errors).
    fn name(&self) -> &str;

    /// Fetch current prices for the given instruments, in the base
    /// currency. Instruments the source cannot quote may be absent from
    /// the result; callers fall back to average cost for those.
    async fn fetch_prices(
        &self,
        instruments: &[String],
    ) -> Result<HashMap<String, f64>, CoreError>;
}
