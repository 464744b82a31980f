//! trk-schemas
//!
//! Shared domain types for the track-record core:
//! - Order/position/portfolio enums with text representations (db columns)
//! - `Order` and `Position` records
//! - `OrderEvent` wire input (the boundary with the surrounding web layer)
//! - Integer-micros money scale and overflow-safe arithmetic helpers
//!
//! Money (prices, fees, PnL) is always integer micros; amounts are plain
//! `i64` units. No `f64` appears on any engine surface.

mod enums;
mod types;

pub use enums::{
    EnumParseError, OrderAction, OrderStatus, OrderType, PositionStatus, ResultType, TrendType,
};
pub use types::{
    Order, OrderEvent, OrderId, PortfolioId, Position, PositionId, StreakAssignment, SymbolId,
};

/// Price/cash scale: micros (1e-6).
pub const MICROS_SCALE: i64 = 1_000_000;

/// Widened amount × price product (micros).
pub fn mul_amount_price_micros(amount: i64, price_micros: i64) -> i128 {
    (amount as i128) * (price_micros as i128)
}

pub fn i128_to_i64_clamp(x: i128) -> i64 {
    if x > i64::MAX as i128 {
        i64::MAX
    } else if x < i64::MIN as i128 {
        i64::MIN
    } else {
        x as i64
    }
}
