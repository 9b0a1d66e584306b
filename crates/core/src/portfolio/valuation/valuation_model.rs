//! Monthly portfolio valuation domain models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::Month;

/// The capital picture of one calendar month. Ephemeral: produced on demand
/// by the valuator and memoized only within a single calculation pass,
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPortfolioSnapshot {
    pub month: Month,
    pub year: i32,
    /// Override, yearly capital (January), or previous month's final capital.
    pub starting_capital: Decimal,
    /// Deposits minus withdrawals dated in this month.
    pub capital_changes_net: Decimal,
    pub revised_starting_capital: Decimal,
    /// Realized P&L of trades closing in this month, as known to the pass.
    pub realized_pl: Decimal,
    pub final_capital: Decimal,
}

impl MonthlyPortfolioSnapshot {
    pub fn empty(month: Month, year: i32) -> Self {
        Self {
            month,
            year,
            starting_capital: Decimal::ZERO,
            capital_changes_net: Decimal::ZERO,
            revised_starting_capital: Decimal::ZERO,
            realized_pl: Decimal::ZERO,
            final_capital: Decimal::ZERO,
        }
    }
}
