use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::errors::{Result, ValidationError};
use crate::ledger::{CapitalLedger, Month};
use crate::portfolio::metrics::realized_pl_by_close_month;
use crate::portfolio::valuation::MonthlyValuator;
use crate::trades::Trade;

use super::xirr::calc_xirr;

/// Annualized return of the portfolio over an arbitrary date range, as a
/// percentage.
///
/// Boundary capitals come from the valuator: the starting capital of the
/// range's first month opens the series, the final capital of its last
/// month (realized P&L of the supplied trades included) closes it, and the
/// ledger's capital change events dated within the range flow in between.
pub fn portfolio_xirr(
    ledger: &CapitalLedger,
    trades: &[Trade],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Decimal> {
    if start_date > end_date {
        return Err(ValidationError::InvalidInput(
            "Start date must be before end date".to_string(),
        )
        .into());
    }
    ledger.validate()?;

    let mut valuator = MonthlyValuator::new(ledger);
    for ((month, year), amount) in realized_pl_by_close_month(trades) {
        valuator.record_realized_pl(month, year, amount);
    }

    let start_snapshot = valuator.valuate_month(Month::from_date(start_date), start_date.year());
    let end_snapshot = valuator.valuate_month(Month::from_date(end_date), end_date.year());

    let interim_flows: Vec<(NaiveDate, Decimal)> = ledger
        .capital_changes()
        .iter()
        .filter(|event| event.date >= start_date && event.date <= end_date)
        .map(|event| (event.date, event.signed_amount()))
        .collect();

    Ok(calc_xirr(
        start_date,
        start_snapshot.starting_capital,
        end_date,
        end_snapshot.final_capital,
        &interim_flows,
    ))
}
