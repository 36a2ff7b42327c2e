use chrono::NaiveDate;

use super::benchmark::CashFlow;

/// Iteration budget for each of the two methods.
const MAX_ITERATIONS: usize = 50;

/// Converged when the net present value is this close to zero.
const NPV_TOLERANCE: f64 = 1e-6;

/// Converged when successive rate estimates move less than this.
const RATE_TOLERANCE: f64 = 1e-9;

/// Below this derivative magnitude the Newton step would blow up.
const MIN_DERIVATIVE: f64 = 1e-12;

/// Newton's starting guess.
const INITIAL_RATE: f64 = 0.10;

/// Bisection search interval.
const BISECT_LOW: f64 = -0.99;
const BISECT_HIGH: f64 = 2.0;

/// Solve for the money-weighted return: the discount rate that zeroes the
/// net present value of a signed cash-flow series (negative = deposit,
/// positive = terminal value).
///
/// Newton–Raphson first; if it fails to converge within the iteration
/// budget (or the slope flattens out), falls back to bisection over
/// [-0.99, 2.0] and returns the midpoint as a best-effort estimate. IRR is
/// inherently approximate for non-monotonic flow patterns, so this function
/// never fails — degenerate input (< 2 flows) simply returns 0.
#[must_use]
pub fn solve_irr(cashflows: &[CashFlow]) -> f64 {
    if cashflows.len() < 2 {
        return 0.0;
    }

    // Year fractions relative to the first flow.
    let t0 = cashflows
        .iter()
        .map(|(date, _)| *date)
        .min()
        .unwrap_or(cashflows[0].0);
    let flows: Vec<(f64, f64)> = cashflows
        .iter()
        .map(|(date, amount)| (year_fraction(t0, *date), *amount))
        .collect();

    if let Some(rate) = newton_raphson(&flows) {
        return rate;
    }
    bisect(&flows)
}

fn year_fraction(from: NaiveDate, to: NaiveDate) -> f64 {
    (to - from).num_days() as f64 / 365.0
}

fn npv(flows: &[(f64, f64)], rate: f64) -> f64 {
    flows
        .iter()
        .map(|(t, amount)| amount / (1.0 + rate).powf(*t))
        .sum()
}

fn npv_derivative(flows: &[(f64, f64)], rate: f64) -> f64 {
    flows
        .iter()
        .map(|(t, amount)| -t * amount / (1.0 + rate).powf(t + 1.0))
        .sum()
}

fn newton_raphson(flows: &[(f64, f64)]) -> Option<f64> {
    let mut rate = INITIAL_RATE;

    for _ in 0..MAX_ITERATIONS {
        let value = npv(flows, rate);
        if value.abs() < NPV_TOLERANCE {
            return Some(rate);
        }

        let derivative = npv_derivative(flows, rate);
        if derivative.abs() < MIN_DERIVATIVE {
            return None; // near-zero slope, the step would explode
        }

        let next = rate - value / derivative;
        if !next.is_finite() || next <= -1.0 {
            return None; // stepped outside the domain of (1+r)^t
        }
        if (next - rate).abs() < RATE_TOLERANCE {
            return Some(next);
        }
        rate = next;
    }

    None
}

/// Halve [-0.99, 2.0] on the sign of NPV at the midpoint. Exhausting the
/// budget returns the midpoint anyway — best available estimate.
fn bisect(flows: &[(f64, f64)]) -> f64 {
    let mut low = BISECT_LOW;
    let mut high = BISECT_HIGH;
    let mut mid = (low + high) / 2.0;

    for _ in 0..MAX_ITERATIONS {
        mid = (low + high) / 2.0;
        let value = npv(flows, mid);
        if value.abs() < NPV_TOLERANCE {
            return mid;
        }
        // NPV of a deposit-then-terminal-value series decreases in rate.
        if value > 0.0 {
            low = mid;
        } else {
            high = mid;
        }
    }

    mid
}
