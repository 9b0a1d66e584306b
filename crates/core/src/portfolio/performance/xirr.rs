use chrono::NaiveDate;
use log::debug;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

use crate::constants::DAYS_PER_YEAR;

const MAX_ITERATIONS: usize = 100;
const TOLERANCE: Decimal = dec!(0.0000001);
const DEFAULT_GUESS: Decimal = dec!(0.1);
// Floor for 1+rate before exponentiation; powd needs a positive base.
const MIN_RATE_BASE: Decimal = dec!(0.000001);

/// Annualized internal rate of return for a series of irregularly dated,
/// signed cash flows.
///
/// Newton-Raphson on `NPV(rate) = Σ cf_i / (1+rate)^t_i` with
/// `t_i = (date_i - date_0) / 365` and the analytic derivative
/// `Σ -t_i * cf_i / (1+rate)^(t_i+1)`. Converges when |NPV| or the rate
/// step drops under the tolerance; hitting the iteration cap returns the
/// last iterate as a best effort rather than an error.
///
/// Returns zero when the series is too short, mismatched, or has no sign
/// change — without both a positive and a negative flow no real root is
/// guaranteed and there is no meaningful annualized return.
pub fn xirr(dates: &[NaiveDate], cash_flows: &[Decimal], guess: Decimal) -> Decimal {
    if dates.len() != cash_flows.len() || dates.len() < 2 {
        return Decimal::ZERO;
    }
    let has_positive = cash_flows.iter().any(|cf| *cf > Decimal::ZERO);
    let has_negative = cash_flows.iter().any(|cf| *cf < Decimal::ZERO);
    if !has_positive || !has_negative {
        return Decimal::ZERO;
    }

    let first_date = dates[0];
    let year_fractions: Vec<Decimal> = dates
        .iter()
        .map(|date| Decimal::from((*date - first_date).num_days()) / Decimal::from(DAYS_PER_YEAR))
        .collect();

    let mut rate = guess;
    for iteration in 0..MAX_ITERATIONS {
        let base = (Decimal::ONE + rate).max(MIN_RATE_BASE);

        let mut npv = Decimal::ZERO;
        let mut derivative = Decimal::ZERO;
        for (cash_flow, t) in cash_flows.iter().zip(&year_fractions) {
            let Some(discount) = base.checked_powd(*t) else {
                return rate;
            };
            if discount.is_zero() {
                return rate;
            }
            let Some(discount_next) = base.checked_powd(*t + Decimal::ONE) else {
                return rate;
            };
            if discount_next.is_zero() {
                return rate;
            }
            npv += *cash_flow / discount;
            derivative += -*t * *cash_flow / discount_next;
        }

        if npv.abs() < TOLERANCE {
            debug!("XIRR converged on NPV after {} iterations: {}", iteration, rate);
            return rate;
        }
        if derivative.is_zero() {
            return rate;
        }
        let step = npv / derivative;
        rate -= step;
        if step.abs() < TOLERANCE {
            debug!("XIRR converged on step after {} iterations: {}", iteration, rate);
            return rate;
        }
    }
    rate
}

/// Portfolio-level convenience wrapper: opens with the starting capital as
/// an outflow, closes with the ending capital as an inflow, and lays the
/// interim flows (deposits positive, withdrawals negative) between them in
/// date order. Returns a percentage.
pub fn calc_xirr(
    start_date: NaiveDate,
    starting_capital: Decimal,
    end_date: NaiveDate,
    ending_capital: Decimal,
    interim_flows: &[(NaiveDate, Decimal)],
) -> Decimal {
    let mut flows: Vec<(NaiveDate, Decimal)> = Vec::with_capacity(interim_flows.len() + 2);
    flows.push((start_date, -starting_capital));
    flows.extend_from_slice(interim_flows);
    flows.push((end_date, ending_capital));
    flows.sort_by_key(|(date, _)| *date);

    let (dates, amounts): (Vec<NaiveDate>, Vec<Decimal>) = flows.into_iter().unzip();
    xirr(&dates, &amounts, DEFAULT_GUESS) * dec!(100)
}
