// ═══════════════════════════════════════════════════════════════════
// Ledger Tests — full replay (LedgerService) and the incremental
// weighted-average-cost applier (ApplierService)
// ═══════════════════════════════════════════════════════════════════

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

use tfsa_tracker_core::errors::CoreError;
use tfsa_tracker_core::models::entry::WeeklyEntry;
use tfsa_tracker_core::models::position::Position;
use tfsa_tracker_core::models::trade::{AssetClass, Trade, TradeAction};
use tfsa_tracker_core::services::applier::{round_price, round_quantity, ApplierService};
use tfsa_tracker_core::services::ledger::{sort_entries, LedgerService};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn equity_trade(action: TradeAction, instrument: &str, qty: Decimal, price: Decimal) -> Trade {
    Trade::new(action, AssetClass::Equity, instrument, qty, price, "CAD")
}

fn crypto_trade(action: TradeAction, symbol: &str, qty: Decimal, price: Decimal) -> Trade {
    Trade::new(action, AssetClass::Crypto, symbol, qty, price, "CAD")
}

fn entry(week: NaiveDate, deposit: Decimal, trades: Vec<Trade>) -> WeeklyEntry {
    WeeklyEntry::new(week, deposit, trades)
}

fn position(instrument: &str, qty: Decimal, avg_cost: Decimal, currency: &str) -> Position {
    Position {
        instrument_id: instrument.to_uppercase(),
        asset_class: AssetClass::Equity,
        quantity: qty,
        avg_cost,
        currency: currency.to_uppercase(),
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Full replay
// ═══════════════════════════════════════════════════════════════════

mod replay {
    use super::*;

    #[test]
    fn empty_ledger_is_empty_holdings_and_zero_cash() {
        let replayed = LedgerService::new().replay(&[]).unwrap();
        assert!(replayed.positions.is_empty());
        assert_eq!(replayed.cash, Decimal::ZERO);
    }

    #[test]
    fn deposit_only_weeks_accumulate_cash() {
        let entries = vec![
            entry(d(2025, 1, 5), dec!(10), vec![]),
            entry(d(2025, 1, 12), dec!(11), vec![]),
        ];
        let replayed = LedgerService::new().replay(&entries).unwrap();
        assert_eq!(replayed.cash, dec!(21));
    }

    #[test]
    fn buy_then_partial_sell_keeps_avg_cost() {
        // Worked example: week 1 deposits 10 and buys 1 AAA @ 10;
        // week 2 deposits 11 and sells 0.5 AAA @ 12.
        let entries = vec![
            entry(
                d(2025, 1, 5),
                dec!(10),
                vec![equity_trade(TradeAction::Buy, "AAA", dec!(1), dec!(10))],
            ),
            entry(
                d(2025, 1, 12),
                dec!(11),
                vec![equity_trade(TradeAction::Sell, "AAA", dec!(0.5), dec!(12))],
            ),
        ];
        let replayed = LedgerService::new().replay(&entries).unwrap();

        let aaa = &replayed.positions["AAA"];
        assert_eq!(aaa.quantity, dec!(0.5));
        assert_eq!(aaa.avg_cost, dec!(10));
        assert_eq!(aaa.currency, "CAD");
        // cash = 10 + 11 − 10 + 6 = 17
        assert_eq!(replayed.cash, dec!(17));
    }

    #[test]
    fn buys_blend_into_weighted_average() {
        let entries = vec![entry(
            d(2025, 1, 5),
            dec!(1000),
            vec![
                equity_trade(TradeAction::Buy, "BBB", dec!(2), dec!(100)),
                equity_trade(TradeAction::Buy, "BBB", dec!(2), dec!(200)),
            ],
        )];
        let replayed = LedgerService::new().replay(&entries).unwrap();
        let bbb = &replayed.positions["BBB"];
        assert_eq!(bbb.quantity, dec!(4));
        assert_eq!(bbb.avg_cost, dec!(150));
    }

    #[test]
    fn avg_cost_is_order_independent_for_pure_buys() {
        // Same multiset of (qty, price) pairs in different orders must
        // produce the same weighted mean.
        let lots = [
            (dec!(1), dec!(10)),
            (dec!(3), dec!(20)),
            (dec!(0.5), dec!(44)),
        ];
        let orderings: [[usize; 3]; 3] = [[0, 1, 2], [2, 0, 1], [1, 2, 0]];

        let mut costs = Vec::new();
        for order in orderings {
            let trades = order
                .iter()
                .map(|&i| equity_trade(TradeAction::Buy, "CCC", lots[i].0, lots[i].1))
                .collect();
            let entries = vec![entry(d(2025, 1, 5), dec!(1000), trades)];
            let replayed = LedgerService::new().replay(&entries).unwrap();
            costs.push(replayed.positions["CCC"].avg_cost);
        }

        // Expected simple quantity-weighted mean: (10 + 60 + 22) / 4.5
        let expected = dec!(92) / dec!(4.5);
        for cost in costs {
            assert!((cost - expected).abs() < dec!(0.000000001), "got {cost}");
        }
    }

    #[test]
    fn full_sell_removes_the_position() {
        let entries = vec![
            entry(
                d(2025, 1, 5),
                dec!(100),
                vec![equity_trade(TradeAction::Buy, "AAA", dec!(2), dec!(10))],
            ),
            entry(
                d(2025, 1, 12),
                dec!(0),
                vec![equity_trade(TradeAction::Sell, "AAA", dec!(2), dec!(15))],
            ),
        ];
        let replayed = LedgerService::new().replay(&entries).unwrap();
        assert!(!replayed.positions.contains_key("AAA"));
    }

    #[test]
    fn oversell_fails_with_insufficient_position() {
        let entries = vec![
            entry(
                d(2025, 1, 5),
                dec!(100),
                vec![equity_trade(TradeAction::Buy, "AAA", dec!(1), dec!(10))],
            ),
            entry(
                d(2025, 1, 12),
                dec!(0),
                vec![equity_trade(TradeAction::Sell, "AAA", dec!(2), dec!(15))],
            ),
        ];
        let err = LedgerService::new().replay(&entries).unwrap_err();
        match err {
            CoreError::InsufficientPosition {
                instrument,
                requested,
                held,
            } => {
                assert_eq!(instrument, "AAA");
                assert_eq!(requested, dec!(2));
                assert_eq!(held, dec!(1));
            }
            other => panic!("expected InsufficientPosition, got {other:?}"),
        }
    }

    #[test]
    fn selling_never_held_instrument_fails() {
        let entries = vec![entry(
            d(2025, 1, 5),
            dec!(100),
            vec![equity_trade(TradeAction::Sell, "GHOST", dec!(1), dec!(10))],
        )];
        let err = LedgerService::new().replay(&entries).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientPosition { held, .. } if held == Decimal::ZERO));
    }

    #[test]
    fn sell_within_tolerance_clears_the_position() {
        // A float-derived "sell everything" may overshoot by a hair.
        let entries = vec![
            entry(
                d(2025, 1, 5),
                dec!(100),
                vec![equity_trade(TradeAction::Buy, "AAA", dec!(1), dec!(10))],
            ),
            entry(
                d(2025, 1, 12),
                dec!(0),
                vec![equity_trade(
                    TradeAction::Sell,
                    "AAA",
                    dec!(1.0000000005),
                    dec!(10),
                )],
            ),
        ];
        let replayed = LedgerService::new().replay(&entries).unwrap();
        assert!(!replayed.positions.contains_key("AAA"));
    }

    #[test]
    fn equity_dust_is_dropped_at_milli_share() {
        let entries = vec![
            entry(
                d(2025, 1, 5),
                dec!(100),
                vec![equity_trade(TradeAction::Buy, "AAA", dec!(1), dec!(10))],
            ),
            entry(
                d(2025, 1, 12),
                dec!(0),
                vec![equity_trade(TradeAction::Sell, "AAA", dec!(0.9995), dec!(10))],
            ),
        ];
        let replayed = LedgerService::new().replay(&entries).unwrap();
        assert!(!replayed.positions.contains_key("AAA"));
    }

    #[test]
    fn crypto_keeps_sub_milli_positions() {
        // 1e-3 leftover is dust for equities but a real crypto position.
        let entries = vec![
            entry(
                d(2025, 1, 5),
                dec!(100),
                vec![crypto_trade(TradeAction::Buy, "BTC", dec!(0.002), dec!(93000))],
            ),
            entry(
                d(2025, 1, 12),
                dec!(0),
                vec![crypto_trade(TradeAction::Sell, "BTC", dec!(0.001), dec!(95000))],
            ),
        ];
        let replayed = LedgerService::new().replay(&entries).unwrap();
        assert_eq!(replayed.positions["BTC"].quantity, dec!(0.001));
    }

    #[test]
    fn cash_floors_at_zero() {
        // Buys funded beyond recorded deposits (e.g. partially-recorded
        // history) must not produce negative cash.
        let entries = vec![entry(
            d(2025, 1, 5),
            dec!(5),
            vec![equity_trade(TradeAction::Buy, "AAA", dec!(1), dec!(10))],
        )];
        let replayed = LedgerService::new().replay(&entries).unwrap();
        assert_eq!(replayed.cash, Decimal::ZERO);
    }

    #[test]
    fn sort_entries_orders_by_week_start() {
        let mut entries = vec![
            entry(d(2025, 1, 19), dec!(1), vec![]),
            entry(d(2025, 1, 5), dec!(2), vec![]),
            entry(d(2025, 1, 12), dec!(3), vec![]),
        ];
        sort_entries(&mut entries);
        let weeks: Vec<NaiveDate> = entries.iter().map(|e| e.week_start).collect();
        assert_eq!(weeks, vec![d(2025, 1, 5), d(2025, 1, 12), d(2025, 1, 19)]);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Incremental applier
// ═══════════════════════════════════════════════════════════════════

mod applier {
    use super::*;

    fn map_of(positions: Vec<Position>) -> BTreeMap<String, Position> {
        positions
            .into_iter()
            .map(|p| (p.instrument_id.clone(), p))
            .collect()
    }

    #[test]
    fn buy_into_existing_position_blends_cost() {
        // Worked example: {BBB, qty 2, avg 100, USD} + buy 2 @ 200 USD
        // → {BBB, qty 4, avg 150, USD}
        let mut positions = map_of(vec![position("BBB", dec!(2), dec!(100), "USD")]);
        let trade = Trade::new(
            TradeAction::Buy,
            AssetClass::Equity,
            "BBB",
            dec!(2),
            dec!(200),
            "USD",
        );
        ApplierService::new()
            .apply_trade(&mut positions, &trade)
            .unwrap();

        let bbb = &positions["BBB"];
        assert_eq!(bbb.quantity, dec!(4.000000));
        assert_eq!(bbb.avg_cost, dec!(150.0000));
    }

    #[test]
    fn buy_in_wrong_currency_is_rejected() {
        let mut positions = map_of(vec![position("BBB", dec!(2), dec!(100), "USD")]);
        let trade = Trade::new(
            TradeAction::Buy,
            AssetClass::Equity,
            "BBB",
            dec!(2),
            dec!(200),
            "CAD",
        );
        let err = ApplierService::new()
            .apply_trade(&mut positions, &trade)
            .unwrap_err();
        assert!(matches!(err, CoreError::CurrencyMismatch { .. }));
        // Nothing mutated.
        assert_eq!(positions["BBB"].quantity, dec!(2));
        assert_eq!(positions["BBB"].avg_cost, dec!(100));
    }

    #[test]
    fn buy_creates_new_position() {
        let mut positions = BTreeMap::new();
        let trade = equity_trade(TradeAction::Buy, "AAA", dec!(0.25), dec!(39.37));
        ApplierService::new()
            .apply_trade(&mut positions, &trade)
            .unwrap();
        let aaa = &positions["AAA"];
        assert_eq!(aaa.quantity, dec!(0.250000));
        assert_eq!(aaa.avg_cost, dec!(39.3700));
    }

    #[test]
    fn sell_reduces_quantity_and_keeps_avg_cost() {
        let mut positions = map_of(vec![position("AAA", dec!(1), dec!(10), "CAD")]);
        let trade = equity_trade(TradeAction::Sell, "AAA", dec!(0.5), dec!(12));
        ApplierService::new()
            .apply_trade(&mut positions, &trade)
            .unwrap();
        assert_eq!(positions["AAA"].quantity, dec!(0.5));
        assert_eq!(positions["AAA"].avg_cost, dec!(10));
    }

    #[test]
    fn full_sell_removes_the_row() {
        let mut positions = map_of(vec![position("AAA", dec!(1), dec!(10), "CAD")]);
        let trade = equity_trade(TradeAction::Sell, "AAA", dec!(1), dec!(12));
        ApplierService::new()
            .apply_trade(&mut positions, &trade)
            .unwrap();
        assert!(positions.is_empty());
    }

    #[test]
    fn oversell_is_rejected_without_partial_application() {
        let mut positions = map_of(vec![position("AAA", dec!(1), dec!(10), "CAD")]);
        let trade = equity_trade(TradeAction::Sell, "AAA", dec!(2), dec!(12));
        let err = ApplierService::new()
            .apply_trade(&mut positions, &trade)
            .unwrap_err();
        assert!(matches!(err, CoreError::Oversell { .. }));
        assert_eq!(positions["AAA"].quantity, dec!(1));
    }

    #[test]
    fn selling_unknown_instrument_is_oversell() {
        let mut positions = BTreeMap::new();
        let trade = equity_trade(TradeAction::Sell, "GHOST", dec!(1), dec!(12));
        let err = ApplierService::new()
            .apply_trade(&mut positions, &trade)
            .unwrap_err();
        assert!(matches!(err, CoreError::Oversell { held, .. } if held == Decimal::ZERO));
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        let mut positions = BTreeMap::new();
        let trade = equity_trade(TradeAction::Buy, "AAA", dec!(0), dec!(10));
        let err = ApplierService::new()
            .apply_trade(&mut positions, &trade)
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn quantities_are_quantized_half_up() {
        // 1/3 share at a price with sub-cent precision: both fields are
        // quantized to the persisted precision (6 dp / 4 dp, half-up).
        let mut positions = BTreeMap::new();
        let trade = equity_trade(
            TradeAction::Buy,
            "AAA",
            dec!(0.3333335),
            dec!(10.00005),
        );
        ApplierService::new()
            .apply_trade(&mut positions, &trade)
            .unwrap();
        let aaa = &positions["AAA"];
        assert_eq!(aaa.quantity, dec!(0.333334)); // half-up at 6 dp
        assert_eq!(aaa.avg_cost, dec!(10.0001)); // half-up at 4 dp
    }

    #[test]
    fn batch_apply_is_all_or_nothing() {
        let mut positions = map_of(vec![position("AAA", dec!(1), dec!(10), "CAD")]);
        let trades = vec![
            equity_trade(TradeAction::Buy, "BBB", dec!(1), dec!(20)),
            equity_trade(TradeAction::Sell, "AAA", dec!(5), dec!(12)), // oversell
        ];
        let err = ApplierService::new()
            .apply_trades(&mut positions, &trades)
            .unwrap_err();
        assert!(matches!(err, CoreError::Oversell { .. }));
        // First trade must not have leaked through.
        assert!(!positions.contains_key("BBB"));
        assert_eq!(positions.len(), 1);
    }

    #[test]
    fn rounding_helpers_round_half_up() {
        assert_eq!(round_quantity(dec!(0.0000005)), dec!(0.000001));
        assert_eq!(round_price(dec!(1.00005)), dec!(1.0001));
        assert_eq!(round_quantity(dec!(1.2)), dec!(1.2));
    }
}
