use crate::errors::Result;
use crate::ledger::{CapitalLedger, Month};
use crate::portfolio::valuation::MonthlyPortfolioSnapshot;

use log::debug;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

/// Resolves the capital picture of each calendar month for one calculation
/// pass.
///
/// A month's starting capital is, in order of precedence: the explicit
/// monthly override, the yearly starting capital (January only), or the
/// previous month's final capital. The chain is walked iteratively from
/// January — which anchors every year — so a lookup never crosses a year
/// boundary and never recurses.
///
/// The valuator memoizes every month it touches. The memo is valid for
/// exactly one pass: the orchestrator registers realized P&L per close
/// month as it walks the trade list, and a month valuated before a later
/// registration keeps the figure it was first computed with. That makes
/// the month sizes order-sensitive in exactly the way the recalculation
/// sequence expects, and free of fixed points (a trade never sees its own
/// P&L in its month size).
pub struct MonthlyValuator<'a> {
    ledger: &'a CapitalLedger,
    realized_pl: HashMap<(Month, i32), Decimal>,
    memo: HashMap<(Month, i32), MonthlyPortfolioSnapshot>,
}

impl<'a> MonthlyValuator<'a> {
    pub fn new(ledger: &'a CapitalLedger) -> Self {
        Self {
            ledger,
            realized_pl: HashMap::new(),
            memo: HashMap::new(),
        }
    }

    /// Adds realized P&L to the running figure for (month, year). Months
    /// already memoized are not revisited within the pass.
    pub fn record_realized_pl(&mut self, month: Month, year: i32, amount: Decimal) {
        *self
            .realized_pl
            .entry((month, year))
            .or_insert(Decimal::ZERO) += amount;
    }

    /// Valuates a month addressed by its boundary token. An unrecognizable
    /// token is a hard `InvalidMonth` error; absence of ledger data for the
    /// month simply yields zeros.
    pub fn valuate(&mut self, month: &str, year: i32) -> Result<MonthlyPortfolioSnapshot> {
        let month = Month::from_str(month)?;
        Ok(self.valuate_month(month, year))
    }

    /// Valuates a month, folding forward from January and memoizing every
    /// month along the way.
    pub fn valuate_month(&mut self, month: Month, year: i32) -> MonthlyPortfolioSnapshot {
        if let Some(snapshot) = self.memo.get(&(month, year)) {
            return snapshot.clone();
        }

        let mut prev_final = Decimal::ZERO;
        let mut snapshot = MonthlyPortfolioSnapshot::empty(month, year);
        for m in Month::ALL {
            snapshot = match self.memo.get(&(m, year)) {
                Some(cached) => cached.clone(),
                None => {
                    let computed = self.compute_month(m, year, prev_final);
                    self.memo.insert((m, year), computed.clone());
                    computed
                }
            };
            prev_final = snapshot.final_capital;
            if m == month {
                break;
            }
        }
        snapshot
    }

    fn compute_month(
        &self,
        month: Month,
        year: i32,
        prev_final: Decimal,
    ) -> MonthlyPortfolioSnapshot {
        let starting_capital = match self.ledger.monthly_override(month, year) {
            Some(amount) => amount,
            None if month == Month::Jan => self.ledger.yearly_starting_capital(year),
            None => prev_final,
        };
        let capital_changes_net = self.ledger.net_capital_change(month, year);
        let revised_starting_capital = starting_capital + capital_changes_net;
        let realized_pl = self
            .realized_pl
            .get(&(month, year))
            .copied()
            .unwrap_or(Decimal::ZERO);
        let final_capital = revised_starting_capital + realized_pl;

        debug!(
            "Valuated {} {}: starting {}, net changes {}, pl {}, final {}",
            month.as_str(),
            year,
            starting_capital,
            capital_changes_net,
            realized_pl,
            final_capital
        );

        MonthlyPortfolioSnapshot {
            month,
            year,
            starting_capital,
            capital_changes_net,
            revised_starting_capital,
            realized_pl,
            final_capital,
        }
    }

    /// Bulk-report entry point: Jan..Dec for every year present across the
    /// ledger's yearly capitals and capital changes plus the supplied trade
    /// years, all through the one shared memo.
    pub fn all_monthly_snapshots(
        &mut self,
        trade_years: &BTreeSet<i32>,
    ) -> Vec<MonthlyPortfolioSnapshot> {
        let mut years = self.ledger.years();
        years.extend(trade_years.iter().copied());

        let mut snapshots = Vec::with_capacity(years.len() * Month::ALL.len());
        for year in years {
            for month in Month::ALL {
                snapshots.push(self.valuate_month(month, year));
            }
        }
        snapshots
    }
}
