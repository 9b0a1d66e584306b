use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::CalculatorError;

/// Calendar month, carried as its 3-letter short name at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Month {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

impl Month {
    /// January through December, in calendar order.
    pub const ALL: [Month; 12] = [
        Month::Jan,
        Month::Feb,
        Month::Mar,
        Month::Apr,
        Month::May,
        Month::Jun,
        Month::Jul,
        Month::Aug,
        Month::Sep,
        Month::Oct,
        Month::Nov,
        Month::Dec,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Month::Jan => "Jan",
            Month::Feb => "Feb",
            Month::Mar => "Mar",
            Month::Apr => "Apr",
            Month::May => "May",
            Month::Jun => "Jun",
            Month::Jul => "Jul",
            Month::Aug => "Aug",
            Month::Sep => "Sep",
            Month::Oct => "Oct",
            Month::Nov => "Nov",
            Month::Dec => "Dec",
        }
    }

    /// Calendar number, 1 through 12.
    pub fn number(&self) -> u32 {
        Month::ALL
            .iter()
            .position(|m| m == self)
            .map(|i| i as u32 + 1)
            .unwrap_or(1)
    }

    pub fn from_number(number: u32) -> Option<Month> {
        match number {
            1..=12 => Some(Month::ALL[(number - 1) as usize]),
            _ => None,
        }
    }

    pub fn from_date(date: NaiveDate) -> Month {
        Month::ALL[date.month0() as usize]
    }

    /// The preceding month within the same calendar year; None for January.
    pub fn prev(&self) -> Option<Month> {
        match Month::ALL.iter().position(|m| m == self) {
            Some(0) | None => None,
            Some(i) => Some(Month::ALL[i - 1]),
        }
    }
}

impl FromStr for Month {
    type Err = CalculatorError;

    /// Normalizes a month token to its 3-letter short name. Full English
    /// names and any casing are accepted; anything else is a hard error.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let token: String = s.trim().chars().take(3).collect::<String>().to_lowercase();
        match token.as_str() {
            "jan" => Ok(Month::Jan),
            "feb" => Ok(Month::Feb),
            "mar" => Ok(Month::Mar),
            "apr" => Ok(Month::Apr),
            "may" => Ok(Month::May),
            "jun" => Ok(Month::Jun),
            "jul" => Ok(Month::Jul),
            "aug" => Ok(Month::Aug),
            "sep" => Ok(Month::Sep),
            "oct" => Ok(Month::Oct),
            "nov" => Ok(Month::Nov),
            "dec" => Ok(Month::Dec),
            _ => Err(CalculatorError::InvalidMonth(s.trim().to_string())),
        }
    }
}

/// Direction of a capital change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CashFlowKind {
    Deposit,
    Withdrawal,
}

/// Explicit starting capital for a calendar year. One per year;
/// created or overwritten by explicit user action, never auto-deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct YearlyStartingCapital {
    pub year: i32,
    pub starting_capital: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// Explicit starting capital for a single (month, year). When present it
/// replaces whatever the valuator would otherwise derive for that month.
/// The month is kept as its boundary token and normalized inside the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStartingCapitalOverride {
    pub month: String,
    pub year: i32,
    pub starting_capital: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// A deposit into or withdrawal from the portfolio, grouped by the calendar
/// month containing `date`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CapitalChangeEvent {
    pub id: String,
    pub date: NaiveDate,
    /// Always positive; the direction is carried by `kind`.
    pub amount: Decimal,
    pub kind: CashFlowKind,
    pub description: String,
    pub updated_at: DateTime<Utc>,
}

impl CapitalChangeEvent {
    /// The event amount signed by direction: deposits positive,
    /// withdrawals negative.
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            CashFlowKind::Deposit => self.amount,
            CashFlowKind::Withdrawal => -self.amount,
        }
    }
}
