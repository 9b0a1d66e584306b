use chrono::{Datelike, NaiveDate, Utc};
use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::{Result, ValidationError};

use super::ledger_model::{
    CapitalChangeEvent, CashFlowKind, Month, MonthlyStartingCapitalOverride, YearlyStartingCapital,
};

/// The capital ledger: yearly starting capitals, monthly starting-capital
/// overrides, and dated deposit/withdrawal events.
///
/// Queries are pure data access — absence of data yields a default or None,
/// never an error. Mutations model the explicit user actions of the
/// surrounding application and stamp `updated_at` themselves.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CapitalLedger {
    yearly_capitals: Vec<YearlyStartingCapital>,
    monthly_overrides: Vec<MonthlyStartingCapitalOverride>,
    capital_changes: Vec<CapitalChangeEvent>,
}

impl CapitalLedger {
    pub fn new(
        yearly_capitals: Vec<YearlyStartingCapital>,
        monthly_overrides: Vec<MonthlyStartingCapitalOverride>,
        capital_changes: Vec<CapitalChangeEvent>,
    ) -> Self {
        Self {
            yearly_capitals,
            monthly_overrides,
            capital_changes,
        }
    }

    /// Checks data integrity of externally supplied collections: every
    /// override month token must normalize, every event amount must be
    /// positive. Calculation entry points run this before a pass so that
    /// corrupt data surfaces immediately instead of skewing results.
    pub fn validate(&self) -> Result<()> {
        for o in &self.monthly_overrides {
            Month::from_str(&o.month)?;
        }
        for event in &self.capital_changes {
            if event.amount <= Decimal::ZERO {
                return Err(ValidationError::InvalidInput(format!(
                    "Capital change {} has non-positive amount {}",
                    event.id, event.amount
                ))
                .into());
            }
        }
        Ok(())
    }

    // --- Queries ---

    /// Starting capital recorded for `year`; zero if absent.
    pub fn yearly_starting_capital(&self, year: i32) -> Decimal {
        self.yearly_capitals
            .iter()
            .find(|c| c.year == year)
            .map(|c| c.starting_capital)
            .unwrap_or(Decimal::ZERO)
    }

    /// Explicit starting-capital override for (month, year), if any.
    pub fn monthly_override(&self, month: Month, year: i32) -> Option<Decimal> {
        self.monthly_overrides
            .iter()
            .find(|o| {
                if o.year != year {
                    return false;
                }
                match Month::from_str(&o.month) {
                    Ok(m) => m == month,
                    Err(_) => {
                        warn!(
                            "Ignoring monthly override with unrecognized month token '{}' for {}",
                            o.month, o.year
                        );
                        false
                    }
                }
            })
            .map(|o| o.starting_capital)
    }

    /// Net capital change for the calendar month: deposits minus
    /// withdrawals whose date falls in (month, year).
    pub fn net_capital_change(&self, month: Month, year: i32) -> Decimal {
        self.capital_changes
            .iter()
            .filter(|e| e.date.year() == year && Month::from_date(e.date) == month)
            .map(|e| e.signed_amount())
            .sum()
    }

    /// Years present across yearly capitals and capital change events.
    pub fn years(&self) -> BTreeSet<i32> {
        let mut years: BTreeSet<i32> = self.yearly_capitals.iter().map(|c| c.year).collect();
        years.extend(self.capital_changes.iter().map(|e| e.date.year()));
        years
    }

    pub fn yearly_capitals(&self) -> &[YearlyStartingCapital] {
        &self.yearly_capitals
    }

    pub fn monthly_overrides(&self) -> &[MonthlyStartingCapitalOverride] {
        &self.monthly_overrides
    }

    pub fn capital_changes(&self) -> &[CapitalChangeEvent] {
        &self.capital_changes
    }

    // --- Mutations (explicit user actions) ---

    /// Creates or overwrites the starting capital for `year`.
    pub fn set_yearly_starting_capital(&mut self, year: i32, amount: Decimal) {
        let now = Utc::now();
        match self.yearly_capitals.iter_mut().find(|c| c.year == year) {
            Some(existing) => {
                existing.starting_capital = amount;
                existing.updated_at = now;
            }
            None => self.yearly_capitals.push(YearlyStartingCapital {
                year,
                starting_capital: amount,
                updated_at: now,
            }),
        }
    }

    /// Creates or overwrites the override for (month, year). The month token
    /// is normalized to its short name before storage.
    pub fn set_monthly_override(&mut self, month: &str, year: i32, amount: Decimal) -> Result<()> {
        let normalized = Month::from_str(month)?;
        let now = Utc::now();
        let existing = self.monthly_overrides.iter_mut().find(|o| {
            o.year == year && Month::from_str(&o.month).map(|m| m == normalized).unwrap_or(false)
        });
        match existing {
            Some(o) => {
                o.month = normalized.as_str().to_string();
                o.starting_capital = amount;
                o.updated_at = now;
            }
            None => self.monthly_overrides.push(MonthlyStartingCapitalOverride {
                month: normalized.as_str().to_string(),
                year,
                starting_capital: amount,
                updated_at: now,
            }),
        }
        Ok(())
    }

    /// Removes the override for (month, year); removing a missing override
    /// is a no-op.
    pub fn remove_monthly_override(&mut self, month: &str, year: i32) -> Result<()> {
        let normalized = Month::from_str(month)?;
        self.monthly_overrides.retain(|o| {
            o.year != year || Month::from_str(&o.month).map(|m| m != normalized).unwrap_or(true)
        });
        Ok(())
    }

    /// Records a deposit or withdrawal. The amount must be strictly
    /// positive; direction is carried by `kind`.
    pub fn add_capital_change(
        &mut self,
        date: NaiveDate,
        amount: Decimal,
        kind: CashFlowKind,
        description: &str,
    ) -> Result<&CapitalChangeEvent> {
        if amount <= Decimal::ZERO {
            return Err(ValidationError::InvalidInput(format!(
                "Capital change amount must be positive, got {}",
                amount
            ))
            .into());
        }
        self.capital_changes.push(CapitalChangeEvent {
            id: Uuid::new_v4().to_string(),
            date,
            amount,
            kind,
            description: description.to_string(),
            updated_at: Utc::now(),
        });
        match self.capital_changes.last() {
            Some(event) => Ok(event),
            None => Err(crate::errors::Error::Unexpected(
                "Capital change vanished after insertion".to_string(),
            )),
        }
    }

    /// Rewrites an existing event in place.
    pub fn update_capital_change(
        &mut self,
        id: &str,
        date: NaiveDate,
        amount: Decimal,
        kind: CashFlowKind,
        description: &str,
    ) -> Result<()> {
        if amount <= Decimal::ZERO {
            return Err(ValidationError::InvalidInput(format!(
                "Capital change amount must be positive, got {}",
                amount
            ))
            .into());
        }
        let event = self
            .capital_changes
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| {
                ValidationError::InvalidInput(format!("Unknown capital change id '{}'", id))
            })?;
        event.date = date;
        event.amount = amount;
        event.kind = kind;
        event.description = description.to_string();
        event.updated_at = Utc::now();
        Ok(())
    }

    /// Deletes an event; deleting a missing id is a no-op.
    pub fn remove_capital_change(&mut self, id: &str) {
        self.capital_changes.retain(|e| e.id != id);
    }
}
