use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// Derived from the lots on every recalculation; the stored value is kept
/// for display but is not authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TradeStatus {
    Open,
    Closed,
    Partial,
}

impl Default for TradeStatus {
    fn default() -> Self {
        TradeStatus::Open
    }
}

/// A quantity of shares entered or exited at a single price on a single
/// date. A lot counts only when both price and quantity are positive;
/// anything else is an unfinished form row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeLot {
    pub price: Decimal,
    pub quantity: Decimal,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl TradeLot {
    pub fn is_valid(&self) -> bool {
        self.price > Decimal::ZERO && self.quantity > Decimal::ZERO
    }
}

/// Fields derived by the recalculation orchestrator. Never hand-edited;
/// fully recomputed whenever any trade, capital event, or override changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeMetrics {
    pub avg_entry_price: Decimal,
    pub position_size: Decimal,
    pub allocation_pct: Decimal,
    pub stop_loss_pct: Decimal,
    pub open_qty: Decimal,
    pub exited_qty: Decimal,
    pub avg_exit_price: Decimal,
    pub stock_move_pct: Decimal,
    pub reward_risk: Decimal,
    pub holding_days: i64,
    pub realised_amount: Decimal,
    pub realized_pl: Decimal,
    pub pf_impact_pct: Decimal,
    pub cumulative_pf_impact_pct: Decimal,
}

/// A journaled trade: one initial entry, up to two pyramid entries, up to
/// three exits, plus the stop/target levels the trader keyed in. Zero means
/// "not filled in" for price-like fields; metrics degrade to zero on
/// missing inputs rather than erroring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: String,
    /// Display trade number; breaks date ties in chronological ordering.
    pub number: String,
    /// Display name, normalized to uppercase by the orchestrator.
    pub symbol: String,
    /// Entry date of the initial lot.
    pub date: NaiveDate,
    pub side: TradeSide,
    #[serde(default)]
    pub status: TradeStatus,
    pub entry_price: Decimal,
    pub initial_qty: Decimal,
    #[serde(default)]
    pub pyramid1: Option<TradeLot>,
    #[serde(default)]
    pub pyramid2: Option<TradeLot>,
    #[serde(default)]
    pub exit1: Option<TradeLot>,
    #[serde(default)]
    pub exit2: Option<TradeLot>,
    #[serde(default)]
    pub exit3: Option<TradeLot>,
    #[serde(default)]
    pub stop_loss: Decimal,
    #[serde(default)]
    pub trailing_stop: Decimal,
    #[serde(default)]
    pub target: Decimal,
    /// Current market price keyed in by the user.
    #[serde(default)]
    pub market_price: Decimal,
    #[serde(default)]
    pub metrics: TradeMetrics,
}

impl Trade {
    /// Valid entry lots, oldest-first: the initial lot (dated by the trade
    /// date) followed by the pyramid lots in slot order.
    pub fn entry_lots(&self) -> Vec<TradeLot> {
        let mut lots = Vec::with_capacity(3);
        let initial = TradeLot {
            price: self.entry_price,
            quantity: self.initial_qty,
            date: Some(self.date),
        };
        if initial.is_valid() {
            lots.push(initial);
        }
        for pyramid in [&self.pyramid1, &self.pyramid2].into_iter().flatten() {
            if pyramid.is_valid() {
                lots.push(*pyramid);
            }
        }
        lots
    }

    /// Whether the initial entry lot is filled in; when it is, it leads
    /// `entry_lots()` and always risks to the plain stop-loss.
    pub fn has_initial_lot(&self) -> bool {
        self.entry_price > Decimal::ZERO && self.initial_qty > Decimal::ZERO
    }

    /// Valid exit lots in slot order.
    pub fn exit_lots(&self) -> Vec<TradeLot> {
        [&self.exit1, &self.exit2, &self.exit3]
            .into_iter()
            .flatten()
            .filter(|lot| lot.is_valid())
            .copied()
            .collect()
    }

    pub fn total_entry_qty(&self) -> Decimal {
        self.entry_lots().iter().map(|lot| lot.quantity).sum()
    }

    pub fn total_exited_qty(&self) -> Decimal {
        self.exit_lots().iter().map(|lot| lot.quantity).sum()
    }
}
