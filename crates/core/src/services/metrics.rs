use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;

use crate::models::benchmark::BenchmarkSeries;
use crate::models::entry::WeeklyEntry;
use crate::models::metrics::{ChartPoint, ChartPointSource, PerformanceMetrics};
use crate::models::position::{Holdings, Position};
use crate::models::price::MarketPriceSnapshot;
use crate::models::snapshot::IntradaySnapshot;
use crate::services::benchmark::{BenchmarkService, CashFlow};
use crate::services::irr::solve_irr;

/// Combines holdings, prices, and benchmark reference data into the
/// aggregate performance snapshot and the chart-ready time series.
///
/// Everything here is recomputed on every read — nothing is cached or
/// persisted as authoritative.
pub struct MetricsService {
    benchmark_service: BenchmarkService,
}

impl MetricsService {
    pub fn new() -> Self {
        Self {
            benchmark_service: BenchmarkService::new(),
        }
    }

    /// Market value of a set of positions against the latest price
    /// snapshot. An instrument with no quote is valued at its average cost.
    #[must_use]
    pub fn market_value(&self, positions: &[Position], prices: &MarketPriceSnapshot) -> f64 {
        positions
            .iter()
            .map(|p| {
                let quantity = p.quantity.to_f64().unwrap_or(0.0);
                let unit = prices
                    .price_of(&p.instrument_id)
                    .unwrap_or_else(|| p.avg_cost.to_f64().unwrap_or(0.0));
                quantity * unit
            })
            .sum()
    }

    /// Build the full performance snapshot as of `as_of`.
    ///
    /// The return figure labelled `simple_return` is the experiment's
    /// `current / contributed − 1` proxy, not a period-chained TWR.
    #[must_use]
    pub fn build_metrics(
        &self,
        equity_entries: &[WeeklyEntry],
        crypto_entries: &[WeeklyEntry],
        holdings: &Holdings,
        prices: &MarketPriceSnapshot,
        benchmarks: &BenchmarkSeries,
        as_of: NaiveDate,
    ) -> PerformanceMetrics {
        let flows = deposit_flows(equity_entries, crypto_entries, as_of);
        let total_contributed: f64 = flows.iter().map(|(_, amount)| amount).sum();

        let equity_value = self.market_value(&holdings.positions, prices);
        let crypto_value = self.market_value(&holdings.crypto_positions, prices);
        let cash_remaining = holdings.cash_remaining.to_f64().unwrap_or(0.0);
        let combined_value = equity_value + crypto_value + cash_remaining;

        let simple_return = if total_contributed > 0.0 {
            combined_value / total_contributed - 1.0
        } else {
            0.0
        };

        // Deposits out, terminal value in.
        let mut irr_flows: Vec<CashFlow> =
            flows.iter().map(|(date, amount)| (*date, -amount)).collect();
        irr_flows.push((as_of, combined_value));
        let money_weighted_return = solve_irr(&irr_flows);

        let savings_benchmark_value =
            self.benchmark_service
                .savings_value(&flows, benchmarks.savings_apy, as_of);
        let index_benchmark_value =
            self.benchmark_service
                .index_dca_value(&flows, &benchmarks.index_levels, as_of);

        PerformanceMetrics {
            as_of,
            total_contributed,
            equity_value,
            crypto_value,
            combined_value,
            cash_remaining,
            unrealized_gain_loss: combined_value - total_contributed,
            simple_return,
            money_weighted_return,
            savings_benchmark_value,
            index_benchmark_value,
            delta_vs_savings: combined_value - savings_benchmark_value,
            delta_vs_index: combined_value - index_benchmark_value,
        }
    }

    /// Build the chart series: one authoritative point per distinct
    /// week-start across both ledgers, each carrying the cumulative
    /// contribution level and both benchmark values as of that date.
    ///
    /// Intraday snapshots are merged in as extra chronologically-sorted
    /// points — a denser curve without touching the weekly points.
    #[must_use]
    pub fn build_series(
        &self,
        equity_entries: &[WeeklyEntry],
        crypto_entries: &[WeeklyEntry],
        benchmarks: &BenchmarkSeries,
        intraday: &[IntradaySnapshot],
        as_of: NaiveDate,
    ) -> Vec<ChartPoint> {
        let flows = deposit_flows(equity_entries, crypto_entries, as_of);

        let mut week_starts: Vec<NaiveDate> = equity_entries
            .iter()
            .chain(crypto_entries.iter())
            .map(|e| e.week_start)
            .filter(|d| *d <= as_of)
            .collect();
        week_starts.sort();
        week_starts.dedup();

        let mut points: Vec<ChartPoint> = week_starts
            .into_iter()
            .map(|date| ChartPoint {
                date,
                contributed: contributed_through(&flows, date),
                savings_benchmark_value: self.benchmark_service.savings_value(
                    &flows,
                    benchmarks.savings_apy,
                    date,
                ),
                index_benchmark_value: self.benchmark_service.index_dca_value(
                    &flows,
                    &benchmarks.index_levels,
                    date,
                ),
                portfolio_value: None,
                source: ChartPointSource::Weekly,
            })
            .collect();

        for snapshot in intraday {
            let date = snapshot.captured_at.date();
            if date > as_of {
                continue;
            }
            points.push(ChartPoint {
                date,
                contributed: contributed_through(&flows, date),
                savings_benchmark_value: self.benchmark_service.savings_value(
                    &flows,
                    benchmarks.savings_apy,
                    date,
                ),
                index_benchmark_value: self.benchmark_service.index_dca_value(
                    &flows,
                    &benchmarks.index_levels,
                    date,
                ),
                portfolio_value: Some(snapshot.total_value),
                source: ChartPointSource::Intraday,
            });
        }

        // Stable sort: a weekly point stays ahead of an intraday point
        // captured the same day.
        points.sort_by_key(|p| p.date);
        points
    }
}

impl Default for MetricsService {
    fn default() -> Self {
        Self::new()
    }
}

/// Deposit stream across both books, dated and positive, up to `as_of`.
fn deposit_flows(
    equity_entries: &[WeeklyEntry],
    crypto_entries: &[WeeklyEntry],
    as_of: NaiveDate,
) -> Vec<CashFlow> {
    let mut flows: Vec<CashFlow> = equity_entries
        .iter()
        .chain(crypto_entries.iter())
        .filter(|e| e.week_start <= as_of)
        .map(|e| (e.week_start, e.deposit_amount.to_f64().unwrap_or(0.0)))
        .collect();
    flows.sort_by_key(|(date, _)| *date);
    flows
}

fn contributed_through(flows: &[CashFlow], date: NaiveDate) -> f64 {
    flows
        .iter()
        .filter(|(d, _)| *d <= date)
        .map(|(_, amount)| amount)
        .sum()
}
