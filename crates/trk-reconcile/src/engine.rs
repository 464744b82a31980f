use chrono::{DateTime, Utc};

use trk_schemas::{
    i128_to_i64_clamp, mul_amount_price_micros, Order, OrderAction, Position, PositionId,
    PositionStatus, ResultType, TrendType,
};

use crate::error::EngineError;
use crate::sides::side_stats;
use crate::store::{OrderStore, PositionStore};

/// Reject orders whose filled amount exceeds their sent amount before any
/// aggregation runs on them.
pub fn validate_order(order: &Order) -> Result<(), EngineError> {
    if let Some(filled) = order.filled_amount {
        if filled > order.sent_amount {
            return Err(EngineError::InvalidOrderState {
                order_id: order.id,
                sent_amount: order.sent_amount,
                filled_amount: filled,
            });
        }
    }
    Ok(())
}

/// Attach an order to the single open position of its (portfolio, symbol)
/// pair, creating a new one seeded from the order's sent values when none
/// exists. Returns the position id and records it on the order.
///
/// More than one open position for the pair is a data-integrity violation
/// and surfaces as [`EngineError::AmbiguousOpenPosition`] — it is never
/// resolved by silently picking one.
pub fn attach(
    store: &mut impl PositionStore,
    order: &mut Order,
) -> Result<PositionId, EngineError> {
    validate_order(order)?;

    let open = store.open_positions_for(order.portfolio_id, order.symbol_id);
    let position_id = match open.len() {
        0 => {
            let mut position = Position::new(0, order.portfolio_id);
            position.symbol_id = Some(order.symbol_id);
            position.entry_stamp = Some(order.sent_stamp);
            position.entry_price_micros = Some(order.sent_price_micros);
            position.entry_amount = Some(order.sent_amount);
            store.insert_position(position)
        }
        1 => open[0].id,
        count => {
            return Err(EngineError::AmbiguousOpenPosition {
                portfolio_id: order.portfolio_id,
                symbol_id: order.symbol_id,
                count,
            })
        }
    };

    order.position_id = Some(position_id);
    Ok(position_id)
}

/// Rebuild a position's derived fields from its attached orders.
///
/// The executed orders are folded into per-action aggregates; the group with
/// the earliest fill is the entry side, the other (if present) the exit
/// side. Zero executed orders is not an error: all entry/exit fields are
/// cleared and the position is open.
///
/// Pure — `now` is only used for the open-position duration and nothing is
/// persisted here.
pub fn recompute(
    position: &Position,
    orders: &[Order],
    now: DateTime<Utc>,
) -> Result<Position, EngineError> {
    for order in orders {
        validate_order(order)?;
    }

    let groups = side_stats(orders);
    let entry = groups.first();
    let exit = groups.get(1);

    let mut snap = position.clone();
    snap.trend = TrendType::Unknown;
    snap.duration = None;

    match entry {
        Some(g) => {
            snap.entry_stamp = Some(g.first_stamp);
            snap.entry_price_micros = Some(g.avg_price_micros);
            snap.entry_amount = Some(g.total_amount);
            snap.entry_fees_micros = Some(g.total_fees_micros);
        }
        None => {
            snap.entry_stamp = None;
            snap.entry_price_micros = None;
            snap.entry_amount = None;
            snap.entry_fees_micros = None;
        }
    }

    match exit {
        Some(g) => {
            snap.exit_stamp = Some(g.last_stamp);
            snap.exit_price_micros = Some(g.avg_price_micros);
            snap.exit_amount = Some(g.total_amount);
            snap.exit_fees_micros = Some(g.total_fees_micros);
        }
        None => {
            snap.exit_stamp = None;
            snap.exit_price_micros = None;
            snap.exit_amount = None;
            snap.exit_fees_micros = None;
        }
    }

    snap.trend = match entry.map(|g| g.action) {
        Some(OrderAction::Buy) => TrendType::Long,
        Some(OrderAction::Sell) => TrendType::Short,
        None => TrendType::Unknown,
    };

    snap.status = if snap.exit_amount.is_some() && snap.entry_amount == snap.exit_amount {
        PositionStatus::Closed
    } else {
        PositionStatus::Open
    };

    snap.duration = match snap.status {
        PositionStatus::Closed => match (snap.exit_stamp, snap.entry_stamp) {
            (Some(exit), Some(entry)) => Some(exit - entry),
            _ => None,
        },
        PositionStatus::Open => snap.entry_stamp.map(|entry| now - entry),
    };

    // realized: locked in by the exited amount, signed by price direction
    snap.real_pnl_micros = match snap.exit_amount {
        Some(exit_amount) => i128_to_i64_clamp(mul_amount_price_micros(
            exit_amount,
            snap.price_difference_micros(),
        )),
        None => 0,
    };

    // unrealized: entry price stands in for current value on the unmatched
    // amount; there is no mark-to-market feed
    snap.unreal_pnl_micros = match snap.entry_price_micros {
        Some(entry_price) => {
            i128_to_i64_clamp(mul_amount_price_micros(snap.amount_difference(), entry_price))
        }
        None => 0,
    };

    snap.result_type = if snap.status != PositionStatus::Closed {
        ResultType::Unknown
    } else if snap.real_pnl_micros > 0 {
        ResultType::Win
    } else if snap.real_pnl_micros < 0 {
        ResultType::Loss
    } else {
        ResultType::Wash
    };

    Ok(snap)
}

/// Fetch a position's orders, recompute it, and persist the result.
pub fn update_status<S>(
    store: &mut S,
    position_id: PositionId,
    now: DateTime<Utc>,
) -> Result<Position, EngineError>
where
    S: OrderStore + PositionStore,
{
    let position = store
        .position(position_id)
        .ok_or(EngineError::PositionNotFound { position_id })?;
    let orders = store.orders_for_position(position_id);
    let snap = recompute(&position, &orders, now)?;
    store.update_position(&snap);
    Ok(snap)
}
