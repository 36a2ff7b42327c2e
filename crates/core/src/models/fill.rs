use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::trade::{AssetClass, TradeAction};

/// A trade as planned before execution: direction, instrument, and size,
/// with no price yet. Produced outside the core (a human or a screener)
/// and already validated for affordability by the time it gets here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedTrade {
    pub action: TradeAction,
    pub asset_class: AssetClass,
    pub instrument_id: String,
    pub quantity: Decimal,
}

impl PlannedTrade {
    pub fn new(
        action: TradeAction,
        asset_class: AssetClass,
        instrument_id: impl Into<String>,
        quantity: Decimal,
    ) -> Self {
        Self {
            action,
            asset_class,
            instrument_id: instrument_id.into().trim().to_uppercase(),
            quantity,
        }
    }
}

/// One executed fill reported by the brokerage. A planned trade may be
/// split across several partial fills at different prices; reconciliation
/// blends them into one effective trade at the weighted-average fill price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub action: TradeAction,
    pub instrument_id: String,
    pub quantity: Decimal,
    pub fill_price: Decimal,
    pub currency: String,
}

impl Fill {
    pub fn new(
        action: TradeAction,
        instrument_id: impl Into<String>,
        quantity: Decimal,
        fill_price: Decimal,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            action,
            instrument_id: instrument_id.into().trim().to_uppercase(),
            quantity,
            fill_price,
            currency: currency.into().trim().to_uppercase(),
        }
    }
}
