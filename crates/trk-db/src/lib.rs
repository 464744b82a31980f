//! trk-db
//!
//! PostgreSQL persistence for orders, positions and portfolio statistics.
//! Thin async query layer over sqlx; no business logic lives here — the
//! engine crates compute, this crate reads and writes rows.
//!
//! Money columns are bigint micros, enum columns are lowercase text, and
//! durations are stored as bigint microseconds. A partial unique index on
//! (portfolio_id, symbol_id) where position_status = 'open' enforces the
//! single-open-position invariant at the storage layer.

use anyhow::{Context, Result};
use chrono::Duration;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

use trk_schemas::{Order, PortfolioId, Position, PositionId, StreakAssignment, SymbolId};
use trk_stats::PortfolioStats;

pub const ENV_DB_URL: &str = "TRK_DATABASE_URL";

/// Connect to Postgres using TRK_DATABASE_URL.
pub async fn connect_from_env() -> Result<PgPool> {
    let url =
        std::env::var(ENV_DB_URL).with_context(|| format!("missing env var {ENV_DB_URL}"))?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .context("failed to connect to Postgres")?;

    Ok(pool)
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

/// Simple status query (connectivity + schema presence).
pub async fn status(pool: &PgPool) -> Result<DbStatus> {
    let (one,): (i32,) = sqlx::query_as::<_, (i32,)>("select 1")
        .fetch_one(pool)
        .await
        .context("status connectivity query failed")?;
    let ok = one == 1;

    let (exists,): (bool,) = sqlx::query_as::<_, (bool,)>(
        r#"
        select exists (
            select 1
            from information_schema.tables
            where table_schema='public' and table_name='positions'
        )
        "#,
    )
    .fetch_one(pool)
    .await
    .context("status table-exists query failed")?;

    Ok(DbStatus { ok, has_positions_table: exists })
}

#[derive(Debug, Clone)]
pub struct DbStatus {
    pub ok: bool,
    pub has_positions_table: bool,
}

// --- orders ---------------------------------------------------------------

const ORDER_COLUMNS: &str = r#"
  order_id,
  symbol_id,
  portfolio_id,
  position_id,
  order_type,
  order_action,
  order_status,
  sent_stamp,
  sent_price_micros,
  limit_price_micros,
  sent_amount,
  filled_stamp,
  filled_price_micros,
  filled_amount,
  fees_micros
"#;

fn order_from_row(row: &sqlx::postgres::PgRow) -> Result<Order> {
    Ok(Order {
        id: row.try_get("order_id")?,
        symbol_id: row.try_get("symbol_id")?,
        portfolio_id: row.try_get("portfolio_id")?,
        position_id: row.try_get("position_id")?,
        order_type: row.try_get::<String, _>("order_type")?.parse()?,
        action: row.try_get::<String, _>("order_action")?.parse()?,
        status: row.try_get::<String, _>("order_status")?.parse()?,
        sent_stamp: row.try_get("sent_stamp")?,
        sent_price_micros: row.try_get("sent_price_micros")?,
        limit_price_micros: row.try_get("limit_price_micros")?,
        sent_amount: row.try_get("sent_amount")?,
        filled_stamp: row.try_get("filled_stamp")?,
        filled_price_micros: row.try_get("filled_price_micros")?,
        filled_amount: row.try_get("filled_amount")?,
        fees_micros: row.try_get("fees_micros")?,
    })
}

/// Insert or replace an order row wholesale, keyed on order_id.
pub async fn upsert_order(pool: &PgPool, order: &Order) -> Result<()> {
    sqlx::query(
        r#"
        insert into orders (
          order_id, symbol_id, portfolio_id, position_id,
          order_type, order_action, order_status,
          sent_stamp, sent_price_micros, limit_price_micros, sent_amount,
          filled_stamp, filled_price_micros, filled_amount, fees_micros
        ) values (
          $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15
        )
        on conflict (order_id) do update set
          position_id = excluded.position_id,
          order_status = excluded.order_status,
          filled_stamp = excluded.filled_stamp,
          filled_price_micros = excluded.filled_price_micros,
          filled_amount = excluded.filled_amount,
          fees_micros = excluded.fees_micros
        "#,
    )
    .bind(order.id)
    .bind(order.symbol_id)
    .bind(order.portfolio_id)
    .bind(order.position_id)
    .bind(order.order_type.as_str())
    .bind(order.action.as_str())
    .bind(order.status.as_str())
    .bind(order.sent_stamp)
    .bind(order.sent_price_micros)
    .bind(order.limit_price_micros)
    .bind(order.sent_amount)
    .bind(order.filled_stamp)
    .bind(order.filled_price_micros)
    .bind(order.filled_amount)
    .bind(order.fees_micros)
    .execute(pool)
    .await
    .context("upsert_order failed")?;

    Ok(())
}

/// All orders attached to a position, oldest sent first.
pub async fn orders_for_position(pool: &PgPool, position_id: PositionId) -> Result<Vec<Order>> {
    let rows = sqlx::query(&format!(
        r#"
        select {ORDER_COLUMNS}
        from orders
        where position_id = $1
        order by sent_stamp, order_id
        "#
    ))
    .bind(position_id)
    .fetch_all(pool)
    .await
    .context("orders_for_position failed")?;

    rows.iter().map(order_from_row).collect()
}

// --- positions ------------------------------------------------------------

const POSITION_COLUMNS: &str = r#"
  position_id,
  portfolio_id,
  symbol_id,
  trend_type,
  position_status,
  entry_stamp,
  entry_price_micros,
  entry_amount,
  entry_fees_micros,
  exit_stamp,
  exit_price_micros,
  exit_amount,
  exit_fees_micros,
  real_pnl_micros,
  unreal_pnl_micros,
  duration_micros,
  result_type,
  streak_group,
  streak_index
"#;

fn position_from_row(row: &sqlx::postgres::PgRow) -> Result<Position> {
    Ok(Position {
        id: row.try_get("position_id")?,
        portfolio_id: row.try_get("portfolio_id")?,
        symbol_id: row.try_get("symbol_id")?,
        trend: row.try_get::<String, _>("trend_type")?.parse()?,
        status: row.try_get::<String, _>("position_status")?.parse()?,
        entry_stamp: row.try_get("entry_stamp")?,
        entry_price_micros: row.try_get("entry_price_micros")?,
        entry_amount: row.try_get("entry_amount")?,
        entry_fees_micros: row.try_get("entry_fees_micros")?,
        exit_stamp: row.try_get("exit_stamp")?,
        exit_price_micros: row.try_get("exit_price_micros")?,
        exit_amount: row.try_get("exit_amount")?,
        exit_fees_micros: row.try_get("exit_fees_micros")?,
        real_pnl_micros: row.try_get("real_pnl_micros")?,
        unreal_pnl_micros: row.try_get("unreal_pnl_micros")?,
        duration: row
            .try_get::<Option<i64>, _>("duration_micros")?
            .map(Duration::microseconds),
        result_type: row.try_get::<String, _>("result_type")?.parse()?,
        streak_group: row.try_get("streak_group")?,
        streak_index: row
            .try_get::<Option<i32>, _>("streak_index")?
            .map(|i| i as u32),
    })
}

pub async fn fetch_position(pool: &PgPool, position_id: PositionId) -> Result<Option<Position>> {
    let row = sqlx::query(&format!(
        r#"
        select {POSITION_COLUMNS}
        from positions
        where position_id = $1
        "#
    ))
    .bind(position_id)
    .fetch_optional(pool)
    .await
    .context("fetch_position failed")?;

    row.as_ref().map(position_from_row).transpose()
}

/// Every open position for the pair. The partial unique index guarantees at
/// most one row, but the caller still treats more as an integrity violation.
pub async fn open_positions_for(
    pool: &PgPool,
    portfolio_id: PortfolioId,
    symbol_id: SymbolId,
) -> Result<Vec<Position>> {
    let rows = sqlx::query(&format!(
        r#"
        select {POSITION_COLUMNS}
        from positions
        where portfolio_id = $1
          and symbol_id = $2
          and position_status = 'open'
        order by position_id
        "#
    ))
    .bind(portfolio_id)
    .bind(symbol_id)
    .fetch_all(pool)
    .await
    .context("open_positions_for failed")?;

    rows.iter().map(position_from_row).collect()
}

/// All closed positions of a portfolio; the streak grouper sorts these
/// itself, so no ordering guarantee is needed here.
pub async fn closed_positions_for(
    pool: &PgPool,
    portfolio_id: PortfolioId,
) -> Result<Vec<Position>> {
    let rows = sqlx::query(&format!(
        r#"
        select {POSITION_COLUMNS}
        from positions
        where portfolio_id = $1
          and position_status = 'closed'
        "#
    ))
    .bind(portfolio_id)
    .fetch_all(pool)
    .await
    .context("closed_positions_for failed")?;

    rows.iter().map(position_from_row).collect()
}

/// Insert a new position row and return its generated id.
pub async fn insert_position(pool: &PgPool, position: &Position) -> Result<PositionId> {
    let (id,): (i64,) = sqlx::query_as::<_, (i64,)>(
        r#"
        insert into positions (
          portfolio_id, symbol_id, trend_type, position_status,
          entry_stamp, entry_price_micros, entry_amount, entry_fees_micros,
          exit_stamp, exit_price_micros, exit_amount, exit_fees_micros,
          real_pnl_micros, unreal_pnl_micros, duration_micros, result_type,
          streak_group, streak_index
        ) values (
          $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18
        )
        returning position_id
        "#,
    )
    .bind(position.portfolio_id)
    .bind(position.symbol_id)
    .bind(position.trend.as_str())
    .bind(position.status.as_str())
    .bind(position.entry_stamp)
    .bind(position.entry_price_micros)
    .bind(position.entry_amount)
    .bind(position.entry_fees_micros)
    .bind(position.exit_stamp)
    .bind(position.exit_price_micros)
    .bind(position.exit_amount)
    .bind(position.exit_fees_micros)
    .bind(position.real_pnl_micros)
    .bind(position.unreal_pnl_micros)
    .bind(position.duration.and_then(|d| d.num_microseconds()))
    .bind(position.result_type.as_str())
    .bind(position.streak_group)
    .bind(position.streak_index.map(|i| i as i32))
    .fetch_one(pool)
    .await
    .context("insert_position failed")?;

    Ok(id)
}

/// Replace a position row wholesale, except the streak columns — those are
/// owned by [`update_streaks`] and left untouched here.
pub async fn update_position(pool: &PgPool, position: &Position) -> Result<()> {
    sqlx::query(
        r#"
        update positions set
          symbol_id = $2,
          trend_type = $3,
          position_status = $4,
          entry_stamp = $5,
          entry_price_micros = $6,
          entry_amount = $7,
          entry_fees_micros = $8,
          exit_stamp = $9,
          exit_price_micros = $10,
          exit_amount = $11,
          exit_fees_micros = $12,
          real_pnl_micros = $13,
          unreal_pnl_micros = $14,
          duration_micros = $15,
          result_type = $16
        where position_id = $1
        "#,
    )
    .bind(position.id)
    .bind(position.symbol_id)
    .bind(position.trend.as_str())
    .bind(position.status.as_str())
    .bind(position.entry_stamp)
    .bind(position.entry_price_micros)
    .bind(position.entry_amount)
    .bind(position.entry_fees_micros)
    .bind(position.exit_stamp)
    .bind(position.exit_price_micros)
    .bind(position.exit_amount)
    .bind(position.exit_fees_micros)
    .bind(position.real_pnl_micros)
    .bind(position.unreal_pnl_micros)
    .bind(position.duration.and_then(|d| d.num_microseconds()))
    .bind(position.result_type.as_str())
    .execute(pool)
    .await
    .context("update_position failed")?;

    Ok(())
}

/// Bulk-apply streak assignments in one statement via unnest.
pub async fn update_streaks(pool: &PgPool, assignments: &[StreakAssignment]) -> Result<()> {
    if assignments.is_empty() {
        return Ok(());
    }

    let ids: Vec<i64> = assignments.iter().map(|a| a.position_id).collect();
    let groups: Vec<i64> = assignments.iter().map(|a| a.streak_group).collect();
    let indexes: Vec<i32> = assignments.iter().map(|a| a.streak_index as i32).collect();

    sqlx::query(
        r#"
        update positions p set
          streak_group = s.streak_group,
          streak_index = s.streak_index
        from unnest($1::bigint[], $2::bigint[], $3::int[])
          as s(position_id, streak_group, streak_index)
        where p.position_id = s.position_id
        "#,
    )
    .bind(&ids)
    .bind(&groups)
    .bind(&indexes)
    .execute(pool)
    .await
    .context("update_streaks failed")?;

    Ok(())
}

// --- portfolios -----------------------------------------------------------

/// Replace a portfolio's derived statistics columns wholesale.
pub async fn update_portfolio_stats(
    pool: &PgPool,
    portfolio_id: PortfolioId,
    stats: &PortfolioStats,
) -> Result<()> {
    sqlx::query(
        r#"
        update portfolios set
          total_wins = $2,
          total_losses = $3,
          total_washes = $4,
          total_trades = $5,
          win_ratio_micros = $6,
          avg_profit_micros = $7,
          min_profit_micros = $8,
          max_profit_micros = $9,
          avg_loss_micros = $10,
          min_loss_micros = $11,
          max_loss_micros = $12,
          avg_win_duration_micros = $13,
          shortest_win_duration_micros = $14,
          largest_win_duration_micros = $15,
          avg_loss_duration_micros = $16,
          shortest_loss_duration_micros = $17,
          largest_loss_duration_micros = $18,
          avg_wash_duration_micros = $19,
          shortest_wash_duration_micros = $20,
          largest_wash_duration_micros = $21,
          largest_win_streak = $22,
          largest_loss_streak = $23,
          largest_wash_streak = $24,
          stats_updated_at = now()
        where portfolio_id = $1
        "#,
    )
    .bind(portfolio_id)
    .bind(stats.total_wins as i32)
    .bind(stats.total_losses as i32)
    .bind(stats.total_washes as i32)
    .bind(stats.total_trades as i32)
    .bind(stats.win_ratio_micros)
    .bind(stats.wins.avg_pnl_micros)
    .bind(stats.wins.min_pnl_micros)
    .bind(stats.wins.max_pnl_micros)
    .bind(stats.losses.avg_pnl_micros)
    .bind(stats.losses.min_pnl_micros)
    .bind(stats.losses.max_pnl_micros)
    .bind(stats.wins.avg_duration.and_then(|d| d.num_microseconds()))
    .bind(stats.wins.min_duration.and_then(|d| d.num_microseconds()))
    .bind(stats.wins.max_duration.and_then(|d| d.num_microseconds()))
    .bind(stats.losses.avg_duration.and_then(|d| d.num_microseconds()))
    .bind(stats.losses.min_duration.and_then(|d| d.num_microseconds()))
    .bind(stats.losses.max_duration.and_then(|d| d.num_microseconds()))
    .bind(stats.washes.avg_duration.and_then(|d| d.num_microseconds()))
    .bind(stats.washes.min_duration.and_then(|d| d.num_microseconds()))
    .bind(stats.washes.max_duration.and_then(|d| d.num_microseconds()))
    .bind(stats.streaks.largest_win_streak as i32)
    .bind(stats.streaks.largest_loss_streak as i32)
    .bind(stats.streaks.largest_wash_streak as i32)
    .execute(pool)
    .await
    .context("update_portfolio_stats failed")?;

    Ok(())
}
