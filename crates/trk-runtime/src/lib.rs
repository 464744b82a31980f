//! trk-runtime
//!
//! Ties the engine crates together into the per-event pipeline: an incoming
//! order event is classified, attached to its position, the position is
//! recomputed, and the portfolio's streaks and summary statistics are
//! refreshed. One event in, one consistent portfolio snapshot out.
//!
//! The pipeline is generic over the store traits so the same code path runs
//! against the in-memory test store and the database-backed store.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use trk_reconcile::{attach, classify, update_status, OrderStore, PositionStore};
use trk_schemas::{OrderEvent, Position, PositionId};
use trk_stats::{regroup, summarize, PortfolioStats};

/// Result of applying one order event: the recomputed position snapshot and
/// the portfolio statistics refreshed over all closed positions.
#[derive(Clone, Debug)]
pub struct EventOutcome {
    pub position_id: PositionId,
    pub position: Position,
    pub stats: PortfolioStats,
}

/// Apply one order event end to end.
///
/// Steps, in order: derive the order's lifecycle status from its amounts,
/// attach it to the single open position of its (portfolio, symbol) pair,
/// persist the order, recompute the position wholesale from its attached
/// orders, then re-run streak grouping and the summary statistics over the
/// portfolio's closed positions. Replaying the same event is a no-op beyond
/// the first application.
pub fn apply_order_event<S>(
    store: &mut S,
    event: OrderEvent,
    now: DateTime<Utc>,
) -> Result<EventOutcome>
where
    S: OrderStore + PositionStore,
{
    let order_id = event.order_id;
    let portfolio_id = event.portfolio_id;

    let mut order = event.into_order();
    order.status = classify(order.sent_amount, order.filled_amount, order.status);
    debug!(
        order_id,
        portfolio_id,
        symbol_id = order.symbol_id,
        status = order.status.as_str(),
        "classified order event"
    );

    let position_id = attach(store, &mut order)
        .with_context(|| format!("failed to attach order {order_id}"))?;
    store.upsert_order(&order);

    let position = update_status(store, position_id, now)
        .with_context(|| format!("failed to recompute position {position_id}"))?;

    let closed = store.closed_positions_for(portfolio_id);
    let assignments = regroup(&closed);
    store.apply_streaks(&assignments);
    let stats = summarize(&closed);

    // the grouper may have just assigned this position's streak columns;
    // return the stored row, not the pre-streak snapshot
    let position = store.position(position_id).unwrap_or(position);

    info!(
        order_id,
        portfolio_id,
        position_id,
        position_status = position.status.as_str(),
        result = position.result_type.as_str(),
        real_pnl_micros = position.real_pnl_micros,
        total_trades = stats.total_trades,
        "applied order event"
    );

    Ok(EventOutcome {
        position_id,
        position,
        stats,
    })
}

/// Load `.env.local` if present and install the fmt tracing subscriber.
/// Silent when the file does not exist; production injects env vars directly.
pub fn bootstrap() {
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
