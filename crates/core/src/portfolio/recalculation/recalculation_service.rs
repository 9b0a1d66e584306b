use chrono::{Datelike, Local, NaiveDate};
use log::debug;
use rust_decimal::Decimal;
use std::collections::BTreeSet;

use crate::errors::Result;
use crate::ledger::{CapitalLedger, Month};
use crate::portfolio::metrics::{
    calculate_trade_metrics, close_month, derive_status, open_heat_contribution,
    realized_pl_by_close_month,
};
use crate::portfolio::valuation::{MonthlyPortfolioSnapshot, MonthlyValuator};
use crate::trades::Trade;

/// Fully re-derives every trade's metrics against the capital ledger,
/// stamping "today" from the local clock. The returned list is the only
/// authoritative artifact; derived fields must never be edited directly.
///
/// Callers invoke this explicitly after any mutation of trades, capital
/// events, or overrides — every derived field is order- and
/// history-dependent, so the whole list is recomputed, not just the
/// changed trade. The run is idempotent: prior derived fields are ignored
/// as inputs, so re-running on unchanged raw data reproduces identical
/// output.
pub fn recalculate(ledger: &CapitalLedger, trades: &[Trade]) -> Result<Vec<Trade>> {
    recalculate_as_of(ledger, trades, Local::now().date_naive())
}

/// `recalculate` with a pinned "today", for deterministic replays.
pub fn recalculate_as_of(
    ledger: &CapitalLedger,
    trades: &[Trade],
    as_of: NaiveDate,
) -> Result<Vec<Trade>> {
    run_pass(ledger, trades, as_of).map(|(trades, _)| trades)
}

/// Total portfolio percentage at risk across open and partial positions,
/// each against its own trade-month portfolio size.
pub fn total_open_heat(ledger: &CapitalLedger, trades: &[Trade]) -> Result<Decimal> {
    run_pass(ledger, trades, Local::now().date_naive()).map(|(_, heat)| heat)
}

/// The Jan..Dec capital picture for every year the ledger or the trades
/// touch, with the trades' complete realized P&L applied per close month.
pub fn monthly_snapshots(
    ledger: &CapitalLedger,
    trades: &[Trade],
) -> Result<Vec<MonthlyPortfolioSnapshot>> {
    ledger.validate()?;

    let mut valuator = MonthlyValuator::new(ledger);
    for ((month, year), amount) in realized_pl_by_close_month(trades) {
        valuator.record_realized_pl(month, year, amount);
    }

    let mut trade_years = BTreeSet::new();
    for trade in trades {
        trade_years.insert(trade.date.year());
        trade_years.extend(trade.exit_lots().iter().filter_map(|lot| lot.date.map(|d| d.year())));
    }
    Ok(valuator.all_monthly_snapshots(&trade_years))
}

/// One deterministic pass over the trade list in chronological order.
///
/// Each trade resolves its trade-month portfolio size through the shared
/// valuator (lazy per month, memoized for the pass), computes its derived
/// block, extends the running cumulative impact, and only then registers
/// its realized P&L under its close month — so later months value off the
/// P&L of earlier trades while no trade ever sees its own.
fn run_pass(
    ledger: &CapitalLedger,
    trades: &[Trade],
    as_of: NaiveDate,
) -> Result<(Vec<Trade>, Decimal)> {
    ledger.validate()?;

    let mut ordered: Vec<Trade> = trades.to_vec();
    ordered.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.number.cmp(&b.number)));

    let mut valuator = MonthlyValuator::new(ledger);
    let mut running_cumulative_pf_impact = Decimal::ZERO;
    let mut open_heat = Decimal::ZERO;

    for trade in &mut ordered {
        let snapshot = valuator.valuate_month(Month::from_date(trade.date), trade.date.year());
        let portfolio_size = snapshot.final_capital;

        let mut metrics = calculate_trade_metrics(trade, portfolio_size, as_of);
        running_cumulative_pf_impact += metrics.pf_impact_pct;
        metrics.cumulative_pf_impact_pct = running_cumulative_pf_impact;

        if let Some((month, year)) = close_month(trade) {
            valuator.record_realized_pl(month, year, metrics.realized_pl);
        }
        open_heat += open_heat_contribution(trade, portfolio_size);

        debug!(
            "Recalculated trade {} ({}): pf size {}, impact {}%, cumulative {}%",
            trade.number, trade.symbol, portfolio_size, metrics.pf_impact_pct,
            running_cumulative_pf_impact
        );

        trade.status = derive_status(trade.total_entry_qty(), metrics.exited_qty);
        trade.symbol = trade.symbol.to_uppercase();
        trade.metrics = metrics;
    }

    Ok((ordered, open_heat))
}
