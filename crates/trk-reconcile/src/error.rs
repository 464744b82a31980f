use trk_schemas::{OrderId, PortfolioId, PositionId, SymbolId};

/// Local validation failures surfaced synchronously to the caller.
/// None of these are retried internally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineError {
    /// An order's filled amount exceeds its sent amount. The surrounding
    /// layer should have rejected this before it reached the engine; we
    /// refuse to aggregate nonsense.
    InvalidOrderState {
        order_id: OrderId,
        sent_amount: i64,
        filled_amount: i64,
    },
    /// More than one open position exists for a (portfolio, symbol) pair —
    /// a data-integrity violation, never silently resolved by picking one.
    AmbiguousOpenPosition {
        portfolio_id: PortfolioId,
        symbol_id: SymbolId,
        count: usize,
    },
    /// A recompute was requested for a position id the store does not know.
    PositionNotFound { position_id: PositionId },
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidOrderState {
                order_id,
                sent_amount,
                filled_amount,
            } => write!(
                f,
                "order {order_id}: filled_amount {filled_amount} exceeds sent_amount {sent_amount}"
            ),
            Self::AmbiguousOpenPosition {
                portfolio_id,
                symbol_id,
                count,
            } => write!(
                f,
                "{count} open positions for portfolio {portfolio_id} symbol {symbol_id}, expected at most one"
            ),
            Self::PositionNotFound { position_id } => {
                write!(f, "position {position_id} not found")
            }
        }
    }
}

impl std::error::Error for EngineError {}
