pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

use errors::CoreError;
use models::{
    benchmark::BenchmarkSeries,
    entry::WeeklyEntry,
    fill::{Fill, PlannedTrade},
    metrics::{ChartPoint, PerformanceMetrics},
    position::Holdings,
    price::MarketPriceSnapshot,
    snapshot::{IntradaySnapshot, WeekCompletion},
    trade::{AssetClass, Trade},
};
use providers::traits::PriceSource;
use services::{
    applier::{round_price, round_quantity, ApplierService},
    fills::FillsService,
    ledger::{sort_entries, LedgerService},
    metrics::MetricsService,
};
use storage::{
    entry_store::EntryStore, holdings_store::HoldingsStore, locks::PathLocks,
    market_store::MarketStore, paths::DataPaths, snapshot_store::SnapshotStore,
};

/// The experiment is denominated in Canadian dollars. Crypto trades and
/// crypto average costs are always priced in this currency.
pub const BASE_CURRENCY: &str = "CAD";

/// Main entry point for the weekly tracker core library.
///
/// Owns the file layout and the per-path lock registry; every mutation
/// goes through here so concurrent callers serialize correctly. All the
/// heavy lifting lives in the pure services — the facade wires them to
/// the flat-file state.
#[must_use]
pub struct TfsaTracker {
    paths: DataPaths,
    locks: PathLocks,
    ledger_service: LedgerService,
    applier_service: ApplierService,
    fills_service: FillsService,
    metrics_service: MetricsService,
}

impl std::fmt::Debug for TfsaTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TfsaTracker")
            .field("paths", &self.paths)
            .finish()
    }
}

impl TfsaTracker {
    /// Open a tracker over a file layout. Nothing is read until an
    /// operation needs it; missing files behave as empty state.
    pub fn open(paths: DataPaths) -> Self {
        Self {
            paths,
            locks: PathLocks::new(),
            ledger_service: LedgerService::new(),
            applier_service: ApplierService::new(),
            fills_service: FillsService::new(),
            metrics_service: MetricsService::new(),
        }
    }

    // ── Recording ───────────────────────────────────────────────────

    /// Record one week for an asset class: advance the holdings mirror by
    /// the executed trades (backing up the previous mirror), then append
    /// the entry to the ledger.
    ///
    /// All-or-nothing: a trade that fails validation (oversell, currency
    /// mismatch, non-positive quantity) leaves both files untouched.
    pub async fn record_week(
        &self,
        asset_class: AssetClass,
        week_start: NaiveDate,
        deposit_amount: Decimal,
        trades: Vec<Trade>,
        notes: Option<String>,
    ) -> Result<Uuid, CoreError> {
        if deposit_amount < Decimal::ZERO {
            return Err(CoreError::ValidationError(format!(
                "Weekly deposit must not be negative, got {deposit_amount}"
            )));
        }
        for trade in &trades {
            trade.validate()?;
            if trade.asset_class != asset_class {
                return Err(CoreError::ValidationError(format!(
                    "Trade {} is {} but this entry is for the {} book",
                    trade.instrument_id, trade.asset_class, asset_class
                )));
            }
            if trade.asset_class == AssetClass::Crypto && trade.currency != BASE_CURRENCY {
                return Err(CoreError::ValidationError(format!(
                    "Crypto trades are priced in {BASE_CURRENCY}, got {}",
                    trade.currency
                )));
            }
        }

        let holdings_path = self.paths.holdings_for(asset_class);
        let entries_path = self.paths.entries_for(asset_class);

        // Fixed acquisition order (holdings, then ledger) so two writers
        // can never deadlock against each other.
        let _holdings_guard = self.locks.lock(holdings_path).await;
        let _entries_guard = self.locks.lock(entries_path).await;

        let mut positions = HoldingsStore::load(holdings_path, asset_class)?;
        self.applier_service.apply_trades(&mut positions, &trades)?;
        HoldingsStore::save(holdings_path, &positions, asset_class)?;

        let entry = match notes {
            Some(notes) => WeeklyEntry::with_notes(week_start, deposit_amount, trades, notes),
            None => WeeklyEntry::new(week_start, deposit_amount, trades),
        };
        let id = entry.id;
        EntryStore::append(entries_path, entry)?;

        Ok(id)
    }

    /// Record a week from a trade plan plus the brokerage fills that
    /// executed it. Partial fills are blended into effective trades at
    /// the weighted-average fill price before the normal record path runs.
    pub async fn record_week_from_fills(
        &self,
        asset_class: AssetClass,
        week_start: NaiveDate,
        deposit_amount: Decimal,
        planned: &[PlannedTrade],
        fills: &[Fill],
        notes: Option<String>,
    ) -> Result<Uuid, CoreError> {
        let trades = self.fills_service.reconcile(planned, fills)?;
        self.record_week(asset_class, week_start, deposit_amount, trades, notes)
            .await
    }

    /// Undo the most recent week for an asset class: pop the ledger entry
    /// and roll the holdings mirror back.
    ///
    /// The mirror is rebuilt by replaying the remaining ledger, not
    /// restored from the newest backup — maintenance rebuilds also write
    /// backups, so the newest one is not necessarily the pre-entry state.
    pub async fn undo_last_week(&self, asset_class: AssetClass) -> Result<WeeklyEntry, CoreError> {
        let holdings_path = self.paths.holdings_for(asset_class);
        let entries_path = self.paths.entries_for(asset_class);

        let _holdings_guard = self.locks.lock(holdings_path).await;
        let _entries_guard = self.locks.lock(entries_path).await;

        let popped = EntryStore::pop_last(entries_path)?.ok_or_else(|| {
            CoreError::NothingToUndo(format!("{asset_class} ledger is empty"))
        })?;

        let mut entries = EntryStore::load(entries_path)?;
        sort_entries(&mut entries);
        let replayed = self.ledger_service.replay(&entries)?;
        let positions = quantized(replayed.positions);
        HoldingsStore::save(holdings_path, &positions, asset_class)?;

        Ok(popped)
    }

    // ── Holdings & Valuation ────────────────────────────────────────

    /// Reconstruct holdings as of a date by full replay of both ledgers.
    /// This is the source of truth the CSV mirrors denormalize.
    pub fn holdings(&self, as_of: NaiveDate) -> Result<Holdings, CoreError> {
        let equity = self.replay_book(AssetClass::Equity, as_of)?;
        let crypto = self.replay_book(AssetClass::Crypto, as_of)?;

        Ok(Holdings {
            as_of,
            positions: equity.positions.into_values().collect(),
            crypto_positions: crypto.positions.into_values().collect(),
            cash_remaining: equity.cash + crypto.cash,
        })
    }

    /// Throw away the holdings mirror and rewrite it from a full ledger
    /// replay. Validation path: if the mirror and the replay ever
    /// disagree, the replay wins.
    pub async fn rebuild_holdings_mirror(
        &self,
        asset_class: AssetClass,
    ) -> Result<(), CoreError> {
        let holdings_path = self.paths.holdings_for(asset_class);
        let _guard = self.locks.lock(holdings_path).await;

        let mut entries = EntryStore::load(self.paths.entries_for(asset_class))?;
        sort_entries(&mut entries);
        let replayed = self.ledger_service.replay(&entries)?;
        let positions = quantized(replayed.positions);
        HoldingsStore::save(holdings_path, &positions, asset_class)?;
        Ok(())
    }

    // ── Metrics & Series ────────────────────────────────────────────

    /// Aggregate performance snapshot as of a date.
    pub fn metrics(&self, as_of: NaiveDate) -> Result<PerformanceMetrics, CoreError> {
        let equity_entries = self.entries(AssetClass::Equity)?;
        let crypto_entries = self.entries(AssetClass::Crypto)?;
        let holdings = self.holdings(as_of)?;
        let prices = MarketStore::load_prices(&self.paths.price_snapshot)?;
        let benchmarks = MarketStore::load_benchmarks(&self.paths.benchmark)?;

        Ok(self.metrics_service.build_metrics(
            &equity_entries,
            &crypto_entries,
            &holdings,
            &prices,
            &benchmarks,
            as_of,
        ))
    }

    /// Chart-ready series: weekly comparison points plus any intraday
    /// snapshots, chronologically sorted.
    pub fn series(&self, as_of: NaiveDate) -> Result<Vec<ChartPoint>, CoreError> {
        let equity_entries = self.entries(AssetClass::Equity)?;
        let crypto_entries = self.entries(AssetClass::Crypto)?;
        let benchmarks = MarketStore::load_benchmarks(&self.paths.benchmark)?;
        let intraday = SnapshotStore::load_intraday(&self.paths.intraday_snapshots)?;

        Ok(self.metrics_service.build_series(
            &equity_entries,
            &crypto_entries,
            &benchmarks,
            &intraday,
            as_of,
        ))
    }

    // ── Prices & Benchmarks ─────────────────────────────────────────

    /// Fetch fresh quotes for every held instrument and rewrite the price
    /// snapshot. Returns the number of quotes written. Instruments the
    /// source cannot quote simply stay unquoted (valuation falls back to
    /// average cost).
    pub async fn refresh_prices(&self, source: &dyn PriceSource) -> Result<usize, CoreError> {
        let today = chrono::Local::now().date_naive();
        let holdings = self.holdings(today)?;
        let instruments: Vec<String> = holdings
            .all_positions()
            .map(|p| p.instrument_id.clone())
            .collect();

        let prices = source.fetch_prices(&instruments).await?;
        log::debug!(
            "{} quoted {}/{} instruments",
            source.name(),
            prices.len(),
            instruments.len()
        );
        let snapshot = MarketPriceSnapshot::new(today, prices);

        let _guard = self.locks.lock(&self.paths.price_snapshot).await;
        MarketStore::save_prices(&self.paths.price_snapshot, &snapshot)?;
        Ok(snapshot.prices_by_instrument.len())
    }

    /// Latest market price snapshot (empty if never refreshed).
    pub fn price_snapshot(&self) -> Result<MarketPriceSnapshot, CoreError> {
        MarketStore::load_prices(&self.paths.price_snapshot)
    }

    /// Benchmark reference data (defaults if never configured).
    pub fn benchmarks(&self) -> Result<BenchmarkSeries, CoreError> {
        MarketStore::load_benchmarks(&self.paths.benchmark)
    }

    /// Replace the benchmark reference data.
    pub async fn set_benchmarks(&self, series: &BenchmarkSeries) -> Result<(), CoreError> {
        let _guard = self.locks.lock(&self.paths.benchmark).await;
        MarketStore::save_benchmarks(&self.paths.benchmark, series)
    }

    // ── Snapshots ───────────────────────────────────────────────────

    /// Capture an out-of-band valuation right now and append it to the
    /// rolling intraday window.
    pub async fn capture_intraday_snapshot(&self) -> Result<IntradaySnapshot, CoreError> {
        let now = chrono::Local::now().naive_local();
        let holdings = self.holdings(now.date())?;
        let prices = MarketStore::load_prices(&self.paths.price_snapshot)?;

        let equity_value = self
            .metrics_service
            .market_value(&holdings.positions, &prices);
        let crypto_value = self
            .metrics_service
            .market_value(&holdings.crypto_positions, &prices);
        let snapshot = IntradaySnapshot {
            captured_at: now,
            total_value: equity_value
                + crypto_value
                + holdings.cash_remaining.to_f64().unwrap_or(0.0),
            equity_value,
            crypto_value,
        };

        let _guard = self.locks.lock(&self.paths.intraday_snapshots).await;
        SnapshotStore::append_intraday(&self.paths.intraday_snapshots, snapshot.clone())?;
        Ok(snapshot)
    }

    /// Close out a week: record the contribution level and portfolio
    /// value as of its start date in the rolling completion window.
    pub async fn complete_week(&self, week_start: NaiveDate) -> Result<WeekCompletion, CoreError> {
        let equity_entries = self.entries(AssetClass::Equity)?;
        let crypto_entries = self.entries(AssetClass::Crypto)?;
        let contributed: f64 = equity_entries
            .iter()
            .chain(crypto_entries.iter())
            .filter(|e| e.week_start <= week_start)
            .map(|e| e.deposit_amount.to_f64().unwrap_or(0.0))
            .sum();

        let holdings = self.holdings(week_start)?;
        let prices = MarketStore::load_prices(&self.paths.price_snapshot)?;
        let portfolio_value = self
            .metrics_service
            .market_value(&holdings.positions, &prices)
            + self
                .metrics_service
                .market_value(&holdings.crypto_positions, &prices)
            + holdings.cash_remaining.to_f64().unwrap_or(0.0);

        let completion = WeekCompletion {
            week_start,
            contributed,
            portfolio_value,
        };

        let _guard = self.locks.lock(&self.paths.week_completions).await;
        SnapshotStore::append_week_completion(&self.paths.week_completions, completion.clone())?;
        Ok(completion)
    }

    // ── Ledger Access & Export ──────────────────────────────────────

    /// All entries for an asset class, in ascending week order.
    pub fn entries(&self, asset_class: AssetClass) -> Result<Vec<WeeklyEntry>, CoreError> {
        let mut entries = EntryStore::load(self.paths.entries_for(asset_class))?;
        sort_entries(&mut entries);
        Ok(entries)
    }

    /// Export a ledger as a CSV string, one row per trade (deposit-only
    /// weeks get a single row with empty trade columns).
    /// Columns: week_start, deposit, action, instrument, quantity,
    /// unit_price, currency, notes
    pub fn export_entries_csv(&self, asset_class: AssetClass) -> Result<String, CoreError> {
        let entries = self.entries(asset_class)?;
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([
            "week_start",
            "deposit",
            "action",
            "instrument",
            "quantity",
            "unit_price",
            "currency",
            "notes",
        ])?;

        for entry in &entries {
            let week_start = entry.week_start.to_string();
            let deposit = entry.deposit_amount.to_string();
            let notes = entry.notes.as_deref().unwrap_or("");
            if entry.trades.is_empty() {
                writer.write_record([
                    week_start.as_str(),
                    deposit.as_str(),
                    "",
                    "",
                    "",
                    "",
                    "",
                    notes,
                ])?;
                continue;
            }
            for trade in &entry.trades {
                writer.write_record([
                    week_start.as_str(),
                    deposit.as_str(),
                    &trade.action.to_string(),
                    trade.instrument_id.as_str(),
                    &trade.quantity.to_string(),
                    &trade.unit_price.to_string(),
                    trade.currency.as_str(),
                    notes,
                ])?;
            }
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| CoreError::Serialization(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| CoreError::Serialization(e.to_string()))
    }

    // ── Internal ────────────────────────────────────────────────────

    fn replay_book(
        &self,
        asset_class: AssetClass,
        as_of: NaiveDate,
    ) -> Result<services::ledger::Replayed, CoreError> {
        let mut entries = EntryStore::load(self.paths.entries_for(asset_class))?;
        entries.retain(|e| e.week_start <= as_of);
        sort_entries(&mut entries);
        self.ledger_service.replay(&entries)
    }
}

/// Quantize replayed positions to the persisted precision before they go
/// into the CSV mirror.
fn quantized(
    positions: std::collections::BTreeMap<String, models::position::Position>,
) -> std::collections::BTreeMap<String, models::position::Position> {
    positions
        .into_iter()
        .map(|(id, mut p)| {
            p.quantity = round_quantity(p.quantity);
            p.avg_cost = round_price(p.avg_cost);
            (id, p)
        })
        .collect()
}

/// The Sunday a newly-recorded week should start on: today if it is a
/// Sunday, otherwise the next one.
#[must_use]
pub fn nearest_week_start(today: NaiveDate) -> NaiveDate {
    let days_until_sunday = (7 - today.weekday().num_days_from_sunday()) % 7;
    today + chrono::Duration::days(i64::from(days_until_sunday))
}
