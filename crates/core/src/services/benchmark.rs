use chrono::NaiveDate;

use crate::models::benchmark::IndexLevel;

/// A dated signed cash amount. Deposits are positive here; the IRR solver
/// uses its own signing convention.
pub type CashFlow = (NaiveDate, f64);

/// Values a stream of historical deposits under the two counterfactual
/// strategies the experiment is compared against.
///
/// Both functions are pure and deterministic: same flows, same reference
/// data, same date — same answer. Missing or zero reference levels degrade
/// that flow's contribution to zero rather than failing the computation.
pub struct BenchmarkService;

impl BenchmarkService {
    pub fn new() -> Self {
        Self
    }

    /// Value of the flows had each been parked in a daily-compounding
    /// savings account at `apy` from its own date until `as_of`.
    ///
    /// Flows dated after `as_of` contribute zero — never negative days.
    #[must_use]
    pub fn savings_value(&self, flows: &[CashFlow], apy: f64, as_of: NaiveDate) -> f64 {
        if flows.is_empty() {
            return 0.0;
        }
        let daily_rate = (1.0 + apy).powf(1.0 / 365.0) - 1.0;

        flows
            .iter()
            .map(|(date, amount)| {
                let days = (as_of - *date).num_days().max(0);
                amount * (1.0 + daily_rate).powi(days as i32)
            })
            .sum()
    }

    /// Value of the flows had each bought units of the reference index at
    /// the level nearest its date, all valued at the level nearest `as_of`.
    ///
    /// Flows dated after `as_of` are skipped. A flow whose nearest level is
    /// missing or non-positive buys zero units; if no usable level exists
    /// at `as_of` the whole result is zero.
    #[must_use]
    pub fn index_dca_value(
        &self,
        flows: &[CashFlow],
        levels: &[IndexLevel],
        as_of: NaiveDate,
    ) -> f64 {
        if flows.is_empty() {
            return 0.0;
        }
        let Some(valuation_level) = level_nearest(levels, as_of).filter(|l| *l > 0.0) else {
            return 0.0;
        };

        let units: f64 = flows
            .iter()
            .filter(|(date, _)| *date <= as_of)
            .map(|(date, amount)| match level_nearest(levels, *date) {
                Some(level) if level > 0.0 => amount / level,
                _ => 0.0,
            })
            .sum();

        units * valuation_level
    }
}

impl Default for BenchmarkService {
    fn default() -> Self {
        Self::new()
    }
}

/// Chronologically nearest reference level to `date`. The table is small
/// and dense, so a linear scan is fine. Exactly-equidistant neighbours
/// resolve to the earlier date.
fn level_nearest(levels: &[IndexLevel], date: NaiveDate) -> Option<f64> {
    let mut best: Option<&IndexLevel> = None;
    for candidate in levels {
        let dist = (candidate.date - date).num_days().abs();
        match best {
            None => best = Some(candidate),
            Some(current) => {
                let current_dist = (current.date - date).num_days().abs();
                if dist < current_dist
                    || (dist == current_dist && candidate.date < current.date)
                {
                    best = Some(candidate);
                }
            }
        }
    }
    best.map(|l| l.level)
}
