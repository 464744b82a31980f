//! trk-reconcile
//!
//! Order classification and position reconciliation:
//! - `classify` derives an order's lifecycle status from sent vs. filled amounts
//! - `side_stats` folds a position's executed orders into per-action aggregates
//! - `attach` binds an order to the single open position of its
//!   (portfolio, symbol) pair, creating one when none exists
//! - `recompute` rebuilds a position's entry/exit fields, PnL, duration,
//!   trend and result classification from its attached orders
//!
//! Pure deterministic logic; "now" is always an explicit parameter and the
//! only side effects go through the narrow store traits.

mod classify;
mod engine;
mod error;
mod sides;
mod store;

pub use classify::classify;
pub use engine::{attach, recompute, update_status, validate_order};
pub use error::EngineError;
pub use sides::{side_stats, ActionGroup};
pub use store::{OrderStore, PositionStore};
