use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::trade::AssetClass;

/// A currently-held instrument, derived from the trade ledger.
///
/// Never the source of truth: positions are recomputed by full replay or
/// advanced incrementally by the trade applier. Invariants: `quantity` is
/// never negative, and `avg_cost` is the quantity-weighted average purchase
/// price of the units still held — sells reduce quantity but never touch
/// the average cost of the remainder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Ticker or coin symbol, uppercased.
    pub instrument_id: String,

    pub asset_class: AssetClass,

    /// Shares or coin amount held. Quantized to 6 decimal places when
    /// persisted.
    pub quantity: Decimal,

    /// Weighted-average cost per unit. Quantized to 4 decimal places when
    /// persisted. For crypto this is in the base currency.
    pub avg_cost: Decimal,

    /// Currency of `avg_cost`.
    pub currency: String,
}

impl Position {
    /// Cost basis of the whole position (quantity × avg_cost).
    #[must_use]
    pub fn book_value(&self) -> Decimal {
        self.quantity * self.avg_cost
    }
}

/// Point-in-time view of everything held plus uninvested cash.
/// Derived wholesale from the two ledgers; never persisted as truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holdings {
    pub as_of: NaiveDate,

    /// Equity positions, sorted by instrument.
    pub positions: Vec<Position>,

    /// Crypto positions, sorted by symbol.
    pub crypto_positions: Vec<Position>,

    /// Deposits minus buy notional plus sell notional, floored at zero.
    pub cash_remaining: Decimal,
}

impl Holdings {
    /// All positions across both books.
    pub fn all_positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.iter().chain(self.crypto_positions.iter())
    }
}
