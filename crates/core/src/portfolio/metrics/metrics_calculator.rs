use chrono::{Datelike, NaiveDate};
use log::warn;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use std::collections::HashMap;

use crate::constants::DECIMAL_PRECISION;
use crate::ledger::Month;
use crate::trades::{Trade, TradeLot, TradeMetrics, TradeSide, TradeStatus};

use super::fifo_matcher::match_fifo;

/// Computes the full derived block for one trade against the portfolio size
/// of its trade month. `as_of` stands in for "today" when open quantity is
/// still being held.
///
/// All metrics operate on the valid lots only (positive price and
/// quantity); missing or zero inputs degrade the affected metric to zero so
/// a half-filled trade form never fails a recalculation.
pub fn calculate_trade_metrics(
    trade: &Trade,
    portfolio_size: Decimal,
    as_of: NaiveDate,
) -> TradeMetrics {
    let entry_lots = trade.entry_lots();
    let exit_lots = trade.exit_lots();

    let total_entry_qty: Decimal = entry_lots.iter().map(|lot| lot.quantity).sum();
    let exited_qty: Decimal = exit_lots.iter().map(|lot| lot.quantity).sum();
    let open_qty = (total_entry_qty - exited_qty).max(Decimal::ZERO);
    if exited_qty > total_entry_qty {
        warn!(
            "Trade {}: exit quantity {} exceeds entry quantity {}; clamping open quantity to zero",
            trade.id, exited_qty, total_entry_qty
        );
    }

    let avg_entry_price = weighted_average_price(&entry_lots);
    let avg_exit_price = weighted_average_price(&exit_lots);
    let position_size = avg_entry_price * total_entry_qty;
    let status = derive_status(total_entry_qty, exited_qty);

    let stop_loss_pct = if trade.entry_price > Decimal::ZERO && trade.stop_loss > Decimal::ZERO {
        ((trade.entry_price - trade.stop_loss).abs() / trade.entry_price * dec!(100))
            .round_dp(DECIMAL_PRECISION)
    } else {
        Decimal::ZERO
    };

    let entry_pairs: Vec<(Decimal, Decimal)> =
        entry_lots.iter().map(|lot| (lot.price, lot.quantity)).collect();
    let exit_pairs: Vec<(Decimal, Decimal)> =
        exit_lots.iter().map(|lot| (lot.price, lot.quantity)).collect();
    let realized_pl =
        match_fifo(&entry_pairs, &exit_pairs, trade.side).round_dp(DECIMAL_PRECISION);

    TradeMetrics {
        avg_entry_price: avg_entry_price.round_dp(DECIMAL_PRECISION),
        position_size: position_size.round_dp(DECIMAL_PRECISION),
        allocation_pct: percent_of(position_size, portfolio_size),
        stop_loss_pct,
        open_qty,
        exited_qty,
        avg_exit_price: avg_exit_price.round_dp(DECIMAL_PRECISION),
        stock_move_pct: stock_move_pct(
            trade,
            status,
            avg_entry_price,
            avg_exit_price,
            exited_qty,
            open_qty,
        ),
        reward_risk: weighted_reward_risk(trade, status, avg_exit_price, exited_qty, open_qty),
        holding_days: holding_days(trade, as_of),
        realised_amount: (exited_qty * avg_exit_price).round_dp(DECIMAL_PRECISION),
        realized_pl,
        pf_impact_pct: percent_of(realized_pl, portfolio_size),
        // Filled by the orchestrator from its running sum.
        cumulative_pf_impact_pct: Decimal::ZERO,
    }
}

/// Status as dictated by the lots. The stored status field is display-only.
pub fn derive_status(total_entry_qty: Decimal, exited_qty: Decimal) -> TradeStatus {
    if exited_qty <= Decimal::ZERO {
        TradeStatus::Open
    } else if exited_qty >= total_entry_qty {
        TradeStatus::Closed
    } else {
        TradeStatus::Partial
    }
}

/// Percentage of portfolio value at risk on one open or partial position:
/// distance from the initial entry to the effective stop (trailing stop
/// when set, stop-loss otherwise) across the open quantity. A stop at or
/// above the entry risks nothing; missing inputs contribute zero.
pub fn open_heat_contribution(trade: &Trade, portfolio_size: Decimal) -> Decimal {
    let total_entry_qty = trade.total_entry_qty();
    let exited_qty = trade.total_exited_qty();
    if derive_status(total_entry_qty, exited_qty) == TradeStatus::Closed {
        return Decimal::ZERO;
    }

    let open_qty = (total_entry_qty - exited_qty).max(Decimal::ZERO);
    let effective_stop = if trade.trailing_stop > Decimal::ZERO {
        trade.trailing_stop
    } else {
        trade.stop_loss
    };
    if trade.entry_price <= Decimal::ZERO
        || effective_stop <= Decimal::ZERO
        || open_qty <= Decimal::ZERO
        || portfolio_size.is_zero()
    {
        return Decimal::ZERO;
    }
    if effective_stop >= trade.entry_price {
        return Decimal::ZERO;
    }

    let risk = (trade.entry_price - effective_stop) * open_qty;
    (risk.max(Decimal::ZERO) / portfolio_size * dec!(100)).round_dp(DECIMAL_PRECISION)
}

/// The (month, year) a trade's realized P&L lands in: the month of its
/// latest valid exit. None for a trade with no exits.
pub fn close_month(trade: &Trade) -> Option<(Month, i32)> {
    trade
        .exit_lots()
        .iter()
        .filter_map(|lot| lot.date)
        .max()
        .map(|date| (Month::from_date(date), date.year()))
}

/// Realized P&L of every trade, grouped by close month. Used by the bulk
/// reporting entry points, which need the complete picture up front rather
/// than the orchestrator's incremental registrations.
pub fn realized_pl_by_close_month(trades: &[Trade]) -> HashMap<(Month, i32), Decimal> {
    let mut by_month: HashMap<(Month, i32), Decimal> = HashMap::new();
    for trade in trades {
        let Some(key) = close_month(trade) else {
            continue;
        };
        let entry_pairs: Vec<(Decimal, Decimal)> = trade
            .entry_lots()
            .iter()
            .map(|lot| (lot.price, lot.quantity))
            .collect();
        let exit_pairs: Vec<(Decimal, Decimal)> = trade
            .exit_lots()
            .iter()
            .map(|lot| (lot.price, lot.quantity))
            .collect();
        let realized =
            match_fifo(&entry_pairs, &exit_pairs, trade.side).round_dp(DECIMAL_PRECISION);
        *by_month.entry(key).or_insert(Decimal::ZERO) += realized;
    }
    by_month
}

fn weighted_average_price(lots: &[TradeLot]) -> Decimal {
    let total_qty: Decimal = lots.iter().map(|lot| lot.quantity).sum();
    if total_qty.is_zero() {
        return Decimal::ZERO;
    }
    let weighted: Decimal = lots.iter().map(|lot| lot.price * lot.quantity).sum();
    weighted / total_qty
}

fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    (part / whole * dec!(100)).round_dp(DECIMAL_PRECISION)
}

/// Percentage move of the stock itself: against the market price while
/// open, against the exits once closed, and a quantity-weighted blend of
/// the two for partial positions. Negated for the short side.
fn stock_move_pct(
    trade: &Trade,
    status: TradeStatus,
    avg_entry: Decimal,
    avg_exit: Decimal,
    exited_qty: Decimal,
    open_qty: Decimal,
) -> Decimal {
    if avg_entry <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let total_qty = exited_qty + open_qty;
    if total_qty <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let hundred = dec!(100);
    let realized_move = (avg_exit - avg_entry) / avg_entry * hundred;
    let unrealized_move = (trade.market_price - avg_entry) / avg_entry * hundred;

    let value = match status {
        TradeStatus::Open => {
            if trade.market_price <= Decimal::ZERO {
                return Decimal::ZERO;
            }
            unrealized_move
        }
        TradeStatus::Closed => {
            if avg_exit <= Decimal::ZERO {
                return Decimal::ZERO;
            }
            realized_move
        }
        TradeStatus::Partial => {
            if trade.market_price <= Decimal::ZERO || avg_exit <= Decimal::ZERO {
                return Decimal::ZERO;
            }
            (realized_move * exited_qty + unrealized_move * open_qty) / total_qty
        }
    };

    let signed = match trade.side {
        TradeSide::Buy => value,
        TradeSide::Sell => -value,
    };
    signed.round_dp(DECIMAL_PRECISION)
}

/// Quantity-weighted mean of per-lot |reward/risk| ratios.
///
/// Risk is the distance from each entry lot to its effective stop: the
/// initial lot always risks to the plain stop-loss, pyramid lots to the
/// trailing stop when one is set. Reward mirrors the stock-move blend —
/// potential (target, else market price) while open, realized (average
/// exit) once closed, blended for partials.
fn weighted_reward_risk(
    trade: &Trade,
    status: TradeStatus,
    avg_exit: Decimal,
    exited_qty: Decimal,
    open_qty: Decimal,
) -> Decimal {
    let entry_lots = trade.entry_lots();
    if entry_lots.is_empty() {
        return Decimal::ZERO;
    }

    let reference_price = if trade.target > Decimal::ZERO {
        trade.target
    } else {
        trade.market_price
    };
    let total_qty = exited_qty + open_qty;
    let initial_present = trade.has_initial_lot();

    let mut weighted_sum = Decimal::ZERO;
    let mut weight = Decimal::ZERO;
    for (i, lot) in entry_lots.iter().enumerate() {
        let is_initial = initial_present && i == 0;
        let effective_stop = if is_initial || trade.trailing_stop <= Decimal::ZERO {
            trade.stop_loss
        } else {
            trade.trailing_stop
        };

        let realized_reward = if avg_exit > Decimal::ZERO {
            avg_exit - lot.price
        } else {
            Decimal::ZERO
        };
        let potential_reward = if reference_price > Decimal::ZERO {
            reference_price - lot.price
        } else {
            Decimal::ZERO
        };
        let reward = match status {
            TradeStatus::Open => potential_reward,
            TradeStatus::Closed => realized_reward,
            TradeStatus::Partial => {
                if total_qty <= Decimal::ZERO {
                    Decimal::ZERO
                } else {
                    (realized_reward * exited_qty + potential_reward * open_qty) / total_qty
                }
            }
        };

        let risk = (lot.price - effective_stop).abs();
        let ratio = if effective_stop <= Decimal::ZERO || risk.is_zero() {
            Decimal::ZERO
        } else {
            (reward / risk).abs()
        };
        weighted_sum += ratio * lot.quantity;
        weight += lot.quantity;
    }

    if weight.is_zero() {
        return Decimal::ZERO;
    }
    (weighted_sum / weight).round_dp(DECIMAL_PRECISION)
}

/// Quantity-weighted holding period in days.
///
/// One pseudo-leg per entry lot, oldest first; exits sorted by date close
/// the oldest legs first, splitting across legs when an exit outsizes the
/// leg in front. Open quantity runs to `as_of`. Every segment counts at
/// least one day. A positive-quantity lot without a date degrades the
/// whole metric to zero.
fn holding_days(trade: &Trade, as_of: NaiveDate) -> i64 {
    let entry_lots = trade.entry_lots();
    if entry_lots.is_empty() {
        return 0;
    }

    struct Leg {
        entry_date: NaiveDate,
        remaining: Decimal,
    }

    let mut legs = Vec::with_capacity(entry_lots.len());
    for lot in &entry_lots {
        match lot.date {
            Some(date) => legs.push(Leg {
                entry_date: date,
                remaining: lot.quantity,
            }),
            None => return 0,
        }
    }
    legs.sort_by_key(|leg| leg.entry_date);

    let mut exits = trade.exit_lots();
    if exits.iter().any(|lot| lot.date.is_none()) {
        return 0;
    }
    exits.sort_by_key(|lot| lot.date);

    let mut weighted_days = Decimal::ZERO;
    let mut total_qty = Decimal::ZERO;
    let mut leg_idx = 0;
    for exit in &exits {
        let Some(exit_date) = exit.date else {
            return 0;
        };
        let mut remaining = exit.quantity;
        while remaining > Decimal::ZERO && leg_idx < legs.len() {
            let leg = &mut legs[leg_idx];
            let matched = remaining.min(leg.remaining);
            weighted_days += Decimal::from(segment_days(leg.entry_date, exit_date)) * matched;
            total_qty += matched;
            leg.remaining -= matched;
            remaining -= matched;
            if leg.remaining <= Decimal::ZERO {
                leg_idx += 1;
            }
        }
        // Exit quantity beyond the last leg is the same excess the FIFO
        // matcher ignores.
    }
    for leg in &legs {
        if leg.remaining > Decimal::ZERO {
            weighted_days += Decimal::from(segment_days(leg.entry_date, as_of)) * leg.remaining;
            total_qty += leg.remaining;
        }
    }

    if total_qty.is_zero() {
        return 0;
    }
    (weighted_days / total_qty)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(0)
}

fn segment_days(entry: NaiveDate, end: NaiveDate) -> i64 {
    (end - entry).num_days().max(1)
}
