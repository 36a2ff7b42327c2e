use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::errors::CoreError;
use crate::models::entry::WeeklyEntry;
use crate::models::position::Position;
use crate::models::trade::{Trade, TradeAction};

/// Slack allowed when a sell nominally exceeds the held quantity.
/// Entries recorded by older tooling carry float-derived quantities, so a
/// sell of "everything" can overshoot the held amount by a hair.
const SELL_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 9); // 1e-9

/// Result of replaying a ledger: the surviving positions and the cash left
/// over after every deposit, buy, and sell.
#[derive(Debug, Clone)]
pub struct Replayed {
    /// instrument → position, sorted by instrument.
    pub positions: BTreeMap<String, Position>,

    /// Deposits − buy notional + sell notional, floored at zero.
    pub cash: Decimal,
}

/// Reconstructs positions from scratch by replaying an entire weekly
/// ledger in order.
///
/// This is the source of truth: the holdings mirror is just a denormalized
/// view of what this replay produces. Used for the dashboard's on-demand
/// holdings, mirror rebuilds, and validation. Pure over its inputs.
pub struct LedgerService;

impl LedgerService {
    pub fn new() -> Self {
        Self
    }

    /// Replay one asset class's ledger into positions and remaining cash.
    ///
    /// Entries must already be in ascending `week_start` order — the caller
    /// sorts. Trades within an entry apply in encounter order. A sell that
    /// exceeds the held quantity (beyond a 1e-9 slack) or names a never-held
    /// instrument fails the whole replay with `InsufficientPosition`.
    pub fn replay(&self, entries: &[WeeklyEntry]) -> Result<Replayed, CoreError> {
        let mut positions: BTreeMap<String, Position> = BTreeMap::new();
        let mut cash = Decimal::ZERO;

        for entry in entries {
            cash += entry.deposit_amount;
            for trade in &entry.trades {
                trade.validate()?;
                match trade.action {
                    TradeAction::Buy => {
                        cash -= trade.notional();
                        Self::replay_buy(&mut positions, trade);
                    }
                    TradeAction::Sell => {
                        cash += trade.notional();
                        Self::replay_sell(&mut positions, trade)?;
                    }
                }
            }
        }

        if cash < Decimal::ZERO {
            cash = Decimal::ZERO;
        }

        Ok(Replayed { positions, cash })
    }

    fn replay_buy(positions: &mut BTreeMap<String, Position>, trade: &Trade) {
        match positions.get_mut(&trade.instrument_id) {
            Some(position) => {
                let new_quantity = position.quantity + trade.quantity;
                position.avg_cost = (position.quantity * position.avg_cost
                    + trade.quantity * trade.unit_price)
                    / new_quantity;
                position.quantity = new_quantity;
            }
            None => {
                positions.insert(
                    trade.instrument_id.clone(),
                    Position {
                        instrument_id: trade.instrument_id.clone(),
                        asset_class: trade.asset_class,
                        quantity: trade.quantity,
                        avg_cost: trade.unit_price,
                        currency: trade.currency.clone(),
                    },
                );
            }
        }
    }

    fn replay_sell(
        positions: &mut BTreeMap<String, Position>,
        trade: &Trade,
    ) -> Result<(), CoreError> {
        let Some(position) = positions.get_mut(&trade.instrument_id) else {
            return Err(CoreError::InsufficientPosition {
                instrument: trade.instrument_id.clone(),
                requested: trade.quantity,
                held: Decimal::ZERO,
            });
        };

        if trade.quantity > position.quantity + SELL_TOLERANCE {
            return Err(CoreError::InsufficientPosition {
                instrument: trade.instrument_id.clone(),
                requested: trade.quantity,
                held: position.quantity,
            });
        }

        // Sells never change the remainder's average cost.
        position.quantity -= trade.quantity;
        if position.quantity < Decimal::ZERO {
            position.quantity = Decimal::ZERO; // within tolerance only
        }
        if position.quantity <= trade.asset_class.dust_threshold() {
            positions.remove(&trade.instrument_id);
        }
        Ok(())
    }
}

impl Default for LedgerService {
    fn default() -> Self {
        Self::new()
    }
}

/// Sort entries into the ascending week order the replay requires.
/// Stable, so same-week entries keep their recorded order.
pub fn sort_entries(entries: &mut [WeeklyEntry]) {
    entries.sort_by_key(|e| e.week_start);
}
