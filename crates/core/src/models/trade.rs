use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "buy"),
            TradeAction::Sell => write!(f, "sell"),
        }
    }
}

/// Which book a trade belongs to.
///
/// The two books keep separate ledgers and separate holdings mirrors, and
/// use different dust thresholds when a sell empties a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Equity,
    Crypto,
}

impl std::fmt::Display for AssetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetClass::Equity => write!(f, "equity"),
            AssetClass::Crypto => write!(f, "crypto"),
        }
    }
}

impl AssetClass {
    /// Below this remaining quantity a position counts as emptied and is
    /// dropped rather than kept as a zero row. Crypto needs a much finer
    /// threshold because coin amounts go to 8 decimal places.
    #[must_use]
    pub fn dust_threshold(&self) -> Decimal {
        match self {
            AssetClass::Equity => Decimal::new(1, 3),  // 0.001
            AssetClass::Crypto => Decimal::new(1, 8),  // 0.00000001
        }
    }
}

/// A single executed trade. Immutable once recorded; the weekly ledgers
/// are append-only.
///
/// Equities and crypto share one type with an explicit `asset_class` tag.
/// Crypto trades are always priced in the base currency, so their
/// `currency` field carries the base currency code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub action: TradeAction,
    pub asset_class: AssetClass,

    /// Ticker (e.g., "ABX.TO") or coin symbol (e.g., "BTC"), uppercased.
    pub instrument_id: String,

    /// Shares or coin amount. Always strictly positive.
    pub quantity: Decimal,

    /// Price per unit. Always strictly positive.
    pub unit_price: Decimal,

    /// Currency of `unit_price` (e.g., "CAD", "USD").
    pub currency: String,
}

impl Trade {
    pub fn new(
        action: TradeAction,
        asset_class: AssetClass,
        instrument_id: impl Into<String>,
        quantity: Decimal,
        unit_price: Decimal,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            action,
            asset_class,
            instrument_id: instrument_id.into().trim().to_uppercase(),
            quantity,
            unit_price,
            currency: currency.into().trim().to_uppercase(),
        }
    }

    /// Check the structural invariants: positive quantity and price,
    /// non-empty instrument.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.instrument_id.is_empty() {
            return Err(CoreError::ValidationError(
                "Trade instrument must not be empty".into(),
            ));
        }
        if self.quantity <= Decimal::ZERO {
            return Err(CoreError::ValidationError(format!(
                "Trade quantity for {} must be positive, got {}",
                self.instrument_id, self.quantity
            )));
        }
        if self.unit_price <= Decimal::ZERO {
            return Err(CoreError::ValidationError(format!(
                "Trade price for {} must be positive, got {}",
                self.instrument_id, self.unit_price
            )));
        }
        Ok(())
    }

    /// Cash moved by this trade (quantity × unit price), unsigned.
    #[must_use]
    pub fn notional(&self) -> Decimal {
        self.quantity * self.unit_price
    }
}
