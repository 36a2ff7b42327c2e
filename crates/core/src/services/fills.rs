use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::errors::CoreError;
use crate::models::fill::{Fill, PlannedTrade};
use crate::models::trade::{Trade, TradeAction};

/// Reconciles executed brokerage fills against a planned trade list.
///
/// The brokerage may split one planned trade across several partial fills
/// at different prices. Reconciliation checks every plan is fully filled
/// and blends partial fills into one effective trade at the
/// quantity-weighted average fill price. Any discrepancy fails the whole
/// batch — nothing partially reconciles.
pub struct FillsService;

impl FillsService {
    pub fn new() -> Self {
        Self
    }

    /// Turn a plan plus its fills into effective trades, in plan order.
    pub fn reconcile(
        &self,
        planned: &[PlannedTrade],
        fills: &[Fill],
    ) -> Result<Vec<Trade>, CoreError> {
        // Group fills by (action, instrument).
        let mut by_key: HashMap<(TradeAction, &str), Vec<&Fill>> = HashMap::new();
        for fill in fills {
            by_key
                .entry((fill.action, fill.instrument_id.as_str()))
                .or_default()
                .push(fill);
        }

        let mut trades = Vec::with_capacity(planned.len());

        for plan in planned {
            let fills_here = by_key
                .remove(&(plan.action, plan.instrument_id.as_str()))
                .unwrap_or_default();
            if fills_here.is_empty() {
                return Err(CoreError::FillMismatch {
                    instrument: plan.instrument_id.clone(),
                    reason: format!("no fill provided for planned {}", plan.action),
                });
            }

            let total_quantity: Decimal = fills_here.iter().map(|f| f.quantity).sum();
            if total_quantity != plan.quantity {
                return Err(CoreError::FillMismatch {
                    instrument: plan.instrument_id.clone(),
                    reason: format!(
                        "fills total {} but plan is for {}",
                        total_quantity, plan.quantity
                    ),
                });
            }

            let currency = &fills_here[0].currency;
            if fills_here.iter().any(|f| &f.currency != currency) {
                return Err(CoreError::FillMismatch {
                    instrument: plan.instrument_id.clone(),
                    reason: "partial fills disagree on currency".into(),
                });
            }

            let weighted_notional: Decimal = fills_here
                .iter()
                .map(|f| f.quantity * f.fill_price)
                .sum();
            let avg_fill_price = weighted_notional / total_quantity;

            trades.push(Trade::new(
                plan.action,
                plan.asset_class,
                plan.instrument_id.clone(),
                plan.quantity,
                avg_fill_price,
                currency.clone(),
            ));
        }

        Ok(trades)
    }
}

impl Default for FillsService {
    fn default() -> Self {
        Self::new()
    }
}
