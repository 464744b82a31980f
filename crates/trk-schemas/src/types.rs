use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{OrderAction, OrderStatus, OrderType, PositionStatus, ResultType, TrendType};

pub type PortfolioId = i64;
pub type SymbolId = i64;
pub type OrderId = i64;
pub type PositionId = i64;

/// One trade instruction and its execution outcome.
///
/// Sent fields are set at creation; filled fields arrive with executions and
/// stay `None` until the order is at least partially executed.
/// `filled_amount <= sent_amount` always; cancelled is terminal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub symbol_id: SymbolId,
    pub portfolio_id: PortfolioId,
    /// Assigned by the reconciler; `None` until attached.
    pub position_id: Option<PositionId>,
    pub order_type: OrderType,
    pub action: OrderAction,
    pub status: OrderStatus,
    pub sent_stamp: DateTime<Utc>,
    pub sent_price_micros: i64,
    pub limit_price_micros: Option<i64>,
    pub sent_amount: i64,
    pub filled_stamp: Option<DateTime<Utc>>,
    pub filled_price_micros: Option<i64>,
    pub filled_amount: Option<i64>,
    pub fees_micros: Option<i64>,
}

impl Order {
    /// Whether this order contributes executed amount to its position:
    /// filled or partial status with the filled fields present.
    pub fn is_executed(&self) -> bool {
        self.status.has_amount()
            && self.filled_amount.is_some()
            && self.filled_stamp.is_some()
            && self.filled_price_micros.is_some()
    }
}

/// One open-to-close trade lifecycle for a (portfolio, symbol) pair.
///
/// All entry/exit fields are recomputed wholesale from the attached orders;
/// nothing here is patched incrementally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pub id: PositionId,
    pub portfolio_id: PortfolioId,
    /// May be unset before the first fill.
    pub symbol_id: Option<SymbolId>,
    pub trend: TrendType,
    pub status: PositionStatus,
    pub entry_stamp: Option<DateTime<Utc>>,
    pub entry_price_micros: Option<i64>,
    pub entry_amount: Option<i64>,
    pub entry_fees_micros: Option<i64>,
    pub exit_stamp: Option<DateTime<Utc>>,
    pub exit_price_micros: Option<i64>,
    pub exit_amount: Option<i64>,
    pub exit_fees_micros: Option<i64>,
    pub real_pnl_micros: i64,
    pub unreal_pnl_micros: i64,
    pub duration: Option<Duration>,
    pub result_type: ResultType,
    pub streak_group: Option<i64>,
    pub streak_index: Option<u32>,
}

impl Position {
    /// A fresh open position with nothing reconciled yet.
    pub fn new(id: PositionId, portfolio_id: PortfolioId) -> Self {
        Self {
            id,
            portfolio_id,
            symbol_id: None,
            trend: TrendType::Unknown,
            status: PositionStatus::Open,
            entry_stamp: None,
            entry_price_micros: None,
            entry_amount: None,
            entry_fees_micros: None,
            exit_stamp: None,
            exit_price_micros: None,
            exit_amount: None,
            exit_fees_micros: None,
            real_pnl_micros: 0,
            unreal_pnl_micros: 0,
            duration: None,
            result_type: ResultType::Unknown,
            streak_group: None,
            streak_index: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    pub fn is_closed(&self) -> bool {
        self.status == PositionStatus::Closed
    }

    /// Exit price minus entry price; 0 unless both are present.
    pub fn price_difference_micros(&self) -> i64 {
        match (self.exit_price_micros, self.entry_price_micros) {
            (Some(exit), Some(entry)) => exit - entry,
            _ => 0,
        }
    }

    /// Entry amount not yet matched by exits: entry − exit when both are
    /// present, the full entry amount when no exit exists, 0 otherwise.
    pub fn amount_difference(&self) -> i64 {
        match (self.entry_amount, self.exit_amount) {
            (Some(entry), Some(exit)) => entry - exit,
            (Some(entry), None) => entry,
            _ => 0,
        }
    }
}

/// One streak assignment for a closed position, produced by the streak
/// grouper and bulk-applied by the persistence layer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StreakAssignment {
    pub position_id: PositionId,
    /// Id of the first position in the run.
    pub streak_group: i64,
    /// 0-based index within the run.
    pub streak_index: u32,
}

/// Order event at the engine boundary.
///
/// Emitted by the surrounding web layer whenever an order is created or its
/// fill fields change. Money fields are integer micros.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEvent {
    pub order_id: OrderId,
    pub portfolio_id: PortfolioId,
    pub symbol_id: SymbolId,
    pub order_type: OrderType,
    pub action: OrderAction,
    pub status: OrderStatus,
    pub sent_stamp: DateTime<Utc>,
    pub sent_price_micros: i64,
    #[serde(default)]
    pub limit_price_micros: Option<i64>,
    pub sent_amount: i64,
    #[serde(default)]
    pub filled_stamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub filled_price_micros: Option<i64>,
    #[serde(default)]
    pub filled_amount: Option<i64>,
    #[serde(default)]
    pub fees_micros: Option<i64>,
}

impl OrderEvent {
    /// Materialize the event as an order record, not yet attached.
    pub fn into_order(self) -> Order {
        Order {
            id: self.order_id,
            symbol_id: self.symbol_id,
            portfolio_id: self.portfolio_id,
            position_id: None,
            order_type: self.order_type,
            action: self.action,
            status: self.status,
            sent_stamp: self.sent_stamp,
            sent_price_micros: self.sent_price_micros,
            limit_price_micros: self.limit_price_micros,
            sent_amount: self.sent_amount,
            filled_stamp: self.filled_stamp,
            filled_price_micros: self.filled_price_micros,
            filled_amount: self.filled_amount,
            fees_micros: self.fees_micros,
        }
    }
}
