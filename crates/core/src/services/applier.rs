use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::BTreeMap;

use crate::errors::CoreError;
use crate::models::position::Position;
use crate::models::trade::{Trade, TradeAction};

/// Decimal places kept for share/coin quantities.
pub const QUANTITY_DP: u32 = 6;

/// Decimal places kept for average cost.
pub const PRICE_DP: u32 = 4;

/// Round-half-up to the fixed quantity precision.
#[must_use]
pub fn round_quantity(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(QUANTITY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Round-half-up to the fixed price precision.
#[must_use]
pub fn round_price(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PRICE_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Applies one new trade to a pre-existing position map, incrementally.
///
/// This is the fast path behind the record-week flow: the position map is
/// loaded from the holdings mirror, advanced one trade at a time, and
/// persisted back. Quantities and costs are quantized here because these
/// values are written out and re-read many times; unquantized arithmetic
/// would accumulate drift across rewrites. Validation happens before any
/// mutation, so a rejected trade leaves the map untouched.
///
/// Pure over its inputs — the caller persists the map and serializes
/// concurrent writers.
pub struct ApplierService;

impl ApplierService {
    pub fn new() -> Self {
        Self
    }

    /// Apply a single trade to the position map under weighted-average-cost
    /// rules.
    ///
    /// Buy: blends into the running average cost; a buy into an existing
    /// position must match its currency (`CurrencyMismatch`).
    /// Sell: reduces quantity, never touches the remainder's average cost;
    /// selling more than held (or a never-held instrument) is `Oversell`.
    /// A position emptied below its asset class's dust threshold is removed.
    pub fn apply_trade(
        &self,
        positions: &mut BTreeMap<String, Position>,
        trade: &Trade,
    ) -> Result<(), CoreError> {
        trade.validate()?;

        match trade.action {
            TradeAction::Buy => self.apply_buy(positions, trade),
            TradeAction::Sell => self.apply_sell(positions, trade),
        }
    }

    /// Apply a batch of trades all-or-nothing: validates against a working
    /// copy, commits only if every trade applies cleanly.
    pub fn apply_trades(
        &self,
        positions: &mut BTreeMap<String, Position>,
        trades: &[Trade],
    ) -> Result<(), CoreError> {
        let mut working = positions.clone();
        for trade in trades {
            self.apply_trade(&mut working, trade)?;
        }
        *positions = working;
        Ok(())
    }

    fn apply_buy(
        &self,
        positions: &mut BTreeMap<String, Position>,
        trade: &Trade,
    ) -> Result<(), CoreError> {
        match positions.get_mut(&trade.instrument_id) {
            Some(position) => {
                if position.currency != trade.currency {
                    return Err(CoreError::CurrencyMismatch {
                        instrument: trade.instrument_id.clone(),
                        held: position.currency.clone(),
                        trade: trade.currency.clone(),
                    });
                }
                let new_quantity = position.quantity + trade.quantity;
                let new_cost = (position.quantity * position.avg_cost
                    + trade.quantity * trade.unit_price)
                    / new_quantity;
                position.quantity = round_quantity(new_quantity);
                position.avg_cost = round_price(new_cost);
            }
            None => {
                positions.insert(
                    trade.instrument_id.clone(),
                    Position {
                        instrument_id: trade.instrument_id.clone(),
                        asset_class: trade.asset_class,
                        quantity: round_quantity(trade.quantity),
                        avg_cost: round_price(trade.unit_price),
                        currency: trade.currency.clone(),
                    },
                );
            }
        }
        Ok(())
    }

    fn apply_sell(
        &self,
        positions: &mut BTreeMap<String, Position>,
        trade: &Trade,
    ) -> Result<(), CoreError> {
        let Some(position) = positions.get_mut(&trade.instrument_id) else {
            // Cannot sell what was never bought.
            return Err(CoreError::Oversell {
                instrument: trade.instrument_id.clone(),
                requested: trade.quantity,
                held: Decimal::ZERO,
            });
        };

        if trade.quantity > position.quantity {
            return Err(CoreError::Oversell {
                instrument: trade.instrument_id.clone(),
                requested: trade.quantity,
                held: position.quantity,
            });
        }

        position.quantity = round_quantity(position.quantity - trade.quantity);
        if position.quantity <= trade.asset_class.dust_threshold() {
            positions.remove(&trade.instrument_id);
        }
        Ok(())
    }
}

impl Default for ApplierService {
    fn default() -> Self {
        Self::new()
    }
}
