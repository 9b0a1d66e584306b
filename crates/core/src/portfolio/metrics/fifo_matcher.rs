use log::warn;
use rust_decimal::Decimal;
use std::collections::VecDeque;

use crate::trades::TradeSide;

/// Realized profit/loss from matching exit lots against entry lots
/// first-in-first-out.
///
/// Entry lots are consumed in the given order — oldest first, never sorted
/// by price. Each exit lot draws from the front of the remaining entry
/// queue; a matched quantity `q` against entry price `ep` and exit price
/// `xp` contributes `q*(xp-ep)` for Buy and `q*(ep-xp)` for Sell. Exit
/// quantity left over once the entry queue is exhausted is unmatched and
/// has no effect.
pub fn match_fifo(
    entry_lots: &[(Decimal, Decimal)],
    exit_lots: &[(Decimal, Decimal)],
    side: TradeSide,
) -> Decimal {
    let mut entries: VecDeque<(Decimal, Decimal)> = entry_lots
        .iter()
        .copied()
        .filter(|(_, qty)| *qty > Decimal::ZERO)
        .collect();

    let mut realized_pl = Decimal::ZERO;
    for &(exit_price, exit_qty) in exit_lots {
        let mut remaining = exit_qty;
        while remaining > Decimal::ZERO {
            let Some(front) = entries.front_mut() else {
                warn!(
                    "Exit quantity {} has no entry lots left to match; ignoring the excess",
                    remaining
                );
                break;
            };
            let (entry_price, available) = (front.0, front.1);
            let matched = remaining.min(available);
            realized_pl += match side {
                TradeSide::Buy => matched * (exit_price - entry_price),
                TradeSide::Sell => matched * (entry_price - exit_price),
            };
            front.1 = available - matched;
            remaining -= matched;
            if front.1 <= Decimal::ZERO {
                entries.pop_front();
            }
        }
    }
    realized_pl
}
