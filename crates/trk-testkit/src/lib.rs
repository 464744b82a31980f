//! trk-testkit
//!
//! Test support for the track-record core: a deterministic in-memory
//! implementation of the engine's store traits plus order fixtures used by
//! scenario tests across crates. Not intended for production use.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use trk_reconcile::{classify, OrderStore, PositionStore};
use trk_schemas::{
    Order, OrderAction, OrderId, OrderStatus, OrderType, PortfolioId, Position, PositionId,
    PositionStatus, StreakAssignment, SymbolId,
};

/// In-memory order/position store backed by `BTreeMap`s (deterministic
/// iteration). Single-threaded by construction, which trivially satisfies
/// the single-writer-per-(portfolio,symbol) discipline the engine requires.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    orders: BTreeMap<OrderId, Order>,
    positions: BTreeMap<PositionId, Position>,
    next_position_id: PositionId,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            orders: BTreeMap::new(),
            positions: BTreeMap::new(),
            next_position_id: 1,
        }
    }

    pub fn order(&self, id: OrderId) -> Option<Order> {
        self.orders.get(&id).cloned()
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    /// Force-insert a position with its given id (fixture setup only).
    pub fn seed_position(&mut self, position: Position) {
        self.next_position_id = self.next_position_id.max(position.id + 1);
        self.positions.insert(position.id, position);
    }
}

impl OrderStore for MemoryStore {
    fn orders_for_position(&self, position_id: PositionId) -> Vec<Order> {
        self.orders
            .values()
            .filter(|o| o.position_id == Some(position_id))
            .cloned()
            .collect()
    }

    fn upsert_order(&mut self, order: &Order) {
        self.orders.insert(order.id, order.clone());
    }
}

impl PositionStore for MemoryStore {
    fn position(&self, id: PositionId) -> Option<Position> {
        self.positions.get(&id).cloned()
    }

    fn open_positions_for(&self, portfolio_id: PortfolioId, symbol_id: SymbolId) -> Vec<Position> {
        self.positions
            .values()
            .filter(|p| {
                p.status == PositionStatus::Open
                    && p.portfolio_id == portfolio_id
                    && p.symbol_id == Some(symbol_id)
            })
            .cloned()
            .collect()
    }

    fn closed_positions_for(&self, portfolio_id: PortfolioId) -> Vec<Position> {
        self.positions
            .values()
            .filter(|p| p.status == PositionStatus::Closed && p.portfolio_id == portfolio_id)
            .cloned()
            .collect()
    }

    fn insert_position(&mut self, mut position: Position) -> PositionId {
        let id = self.next_position_id;
        self.next_position_id += 1;
        position.id = id;
        self.positions.insert(id, position);
        id
    }

    fn update_position(&mut self, position: &Position) {
        self.positions.insert(position.id, position.clone());
    }

    fn apply_streaks(&mut self, assignments: &[StreakAssignment]) {
        for a in assignments {
            if let Some(p) = self.positions.get_mut(&a.position_id) {
                p.streak_group = Some(a.streak_group);
                p.streak_index = Some(a.streak_index);
            }
        }
    }
}

/// A pending market order, nothing filled yet.
pub fn pending_order(
    id: OrderId,
    portfolio_id: PortfolioId,
    symbol_id: SymbolId,
    action: OrderAction,
    sent_stamp: DateTime<Utc>,
    sent_price_micros: i64,
    sent_amount: i64,
) -> Order {
    Order {
        id,
        symbol_id,
        portfolio_id,
        position_id: None,
        order_type: OrderType::Market,
        action,
        status: OrderStatus::Pending,
        sent_stamp,
        sent_price_micros,
        limit_price_micros: None,
        sent_amount,
        filled_stamp: None,
        filled_price_micros: None,
        filled_amount: None,
        fees_micros: None,
    }
}

/// Report a fill on an order: sets the filled fields and re-derives the
/// status through the classifier.
pub fn report_fill(
    order: &mut Order,
    filled_stamp: DateTime<Utc>,
    filled_price_micros: i64,
    filled_amount: i64,
) {
    order.filled_stamp = Some(filled_stamp);
    order.filled_price_micros = Some(filled_price_micros);
    order.filled_amount = Some(filled_amount);
    order.status = classify(order.sent_amount, order.filled_amount, order.status);
}

/// A fully filled market order (sent and filled at the same stamp/price).
pub fn filled_order(
    id: OrderId,
    portfolio_id: PortfolioId,
    symbol_id: SymbolId,
    action: OrderAction,
    stamp: DateTime<Utc>,
    price_micros: i64,
    amount: i64,
) -> Order {
    let mut order = pending_order(id, portfolio_id, symbol_id, action, stamp, price_micros, amount);
    report_fill(&mut order, stamp, price_micros, amount);
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stamp(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, 0, 0).unwrap()
    }

    #[test]
    fn insert_position_assigns_increasing_ids() {
        let mut store = MemoryStore::new();
        let a = store.insert_position(Position::new(0, 1));
        let b = store.insert_position(Position::new(0, 1));
        assert!(b > a);
        assert_eq!(store.position(a).unwrap().id, a);
    }

    #[test]
    fn open_position_lookup_filters_on_pair_and_status() {
        let mut store = MemoryStore::new();
        let mut open = Position::new(0, 1);
        open.symbol_id = Some(3);
        let id = store.insert_position(open);

        let mut closed = Position::new(0, 1);
        closed.symbol_id = Some(3);
        closed.status = PositionStatus::Closed;
        store.insert_position(closed);

        let found = store.open_positions_for(1, 3);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, id);
        assert!(store.open_positions_for(1, 4).is_empty());
        assert!(store.open_positions_for(2, 3).is_empty());
    }

    #[test]
    fn report_fill_reclassifies() {
        let mut order = pending_order(1, 1, 3, OrderAction::Buy, stamp(9), 10_000_000, 100);
        report_fill(&mut order, stamp(10), 10_000_000, 40);
        assert_eq!(order.status, OrderStatus::Partial);
        report_fill(&mut order, stamp(11), 10_000_000, 100);
        assert_eq!(order.status, OrderStatus::Filled);
    }

    #[test]
    fn apply_streaks_updates_known_positions_only() {
        let mut store = MemoryStore::new();
        let mut p = Position::new(0, 1);
        p.status = PositionStatus::Closed;
        let id = store.insert_position(p);

        store.apply_streaks(&[
            StreakAssignment {
                position_id: id,
                streak_group: id,
                streak_index: 0,
            },
            StreakAssignment {
                position_id: 999,
                streak_group: 999,
                streak_index: 0,
            },
        ]);

        let p = store.position(id).unwrap();
        assert_eq!(p.streak_group, Some(id));
        assert_eq!(p.streak_index, Some(0));
    }
}
