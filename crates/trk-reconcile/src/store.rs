use trk_schemas::{Order, PortfolioId, Position, PositionId, StreakAssignment, SymbolId};

/// Narrow read/write surface over persisted orders.
///
/// The engine never composes queries; the persistence layer implements these
/// exact lookups (transactionally, with the single-writer guarantee per
/// (portfolio, symbol) key described in the position store).
pub trait OrderStore {
    /// All orders attached to a position, executed or not. The engine
    /// filters for executed orders itself.
    fn orders_for_position(&self, position_id: PositionId) -> Vec<Order>;

    /// Insert or replace an order record.
    fn upsert_order(&mut self, order: &Order);
}

/// Narrow read/write surface over persisted positions.
///
/// Implementations must serialize the open-position check-and-create per
/// (portfolio, symbol) key — e.g. a partial unique index on
/// (portfolio_id, symbol_id) where status is open, or a per-key lock held
/// across [`crate::attach`].
pub trait PositionStore {
    fn position(&self, id: PositionId) -> Option<Position>;

    /// Every open position for the pair. At most one may exist; the engine
    /// treats more than one as a fatal integrity violation.
    fn open_positions_for(&self, portfolio_id: PortfolioId, symbol_id: SymbolId) -> Vec<Position>;

    /// All closed positions of a portfolio, in any order — callers sort.
    fn closed_positions_for(&self, portfolio_id: PortfolioId) -> Vec<Position>;

    /// Persist a new position and return its assigned id (the `id` on the
    /// passed value is ignored).
    fn insert_position(&mut self, position: Position) -> PositionId;

    /// Replace a position record wholesale.
    fn update_position(&mut self, position: &Position);

    /// Bulk-apply streak assignments produced by the streak grouper.
    fn apply_streaks(&mut self, assignments: &[StreakAssignment]);
}
