use chrono::Duration;

use trk_schemas::{i128_to_i64_clamp, Position, ResultType, MICROS_SCALE};

use crate::streaks::{streak_extremes, StreakExtremes};

/// Aggregates for one result-type partition of a portfolio's closed
/// positions. The win bucket's PnL fields are the portfolio's profit
/// amounts, the loss bucket's its loss amounts.
///
/// All statistics are `None` when the partition is empty — never a fake
/// zero, and never a division by zero.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResultBucket {
    pub count: u32,
    pub avg_pnl_micros: Option<i64>,
    pub min_pnl_micros: Option<i64>,
    pub max_pnl_micros: Option<i64>,
    pub avg_duration: Option<Duration>,
    pub min_duration: Option<Duration>,
    pub max_duration: Option<Duration>,
}

/// Portfolio summary statistics, recomputed wholesale from the closed
/// positions on every trade event. Replaces prior derived values entirely —
/// nothing is incrementally patched, so drift cannot accumulate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PortfolioStats {
    pub total_wins: u32,
    pub total_losses: u32,
    pub total_washes: u32,
    pub total_trades: u32,
    /// wins / total_trades in micros (0..=1_000_000); 0 when no trades.
    pub win_ratio_micros: i64,
    pub wins: ResultBucket,
    pub losses: ResultBucket,
    pub washes: ResultBucket,
    pub streaks: StreakExtremes,
}

fn bucket(positions: &[&Position]) -> ResultBucket {
    if positions.is_empty() {
        return ResultBucket::default();
    }

    let count = positions.len() as u32;

    let mut pnl_sum: i128 = 0;
    let mut pnl_min = i64::MAX;
    let mut pnl_max = i64::MIN;
    for p in positions {
        pnl_sum += p.real_pnl_micros as i128;
        pnl_min = pnl_min.min(p.real_pnl_micros);
        pnl_max = pnl_max.max(p.real_pnl_micros);
    }

    let durations: Vec<Duration> = positions.iter().filter_map(|p| p.duration).collect();
    let (avg_duration, min_duration, max_duration) = if durations.is_empty() {
        (None, None, None)
    } else {
        let total_us: i128 = durations
            .iter()
            .map(|d| d.num_microseconds().unwrap_or(i64::MAX) as i128)
            .sum();
        let avg = Duration::microseconds(i128_to_i64_clamp(total_us / durations.len() as i128));
        (
            Some(avg),
            durations.iter().min().copied(),
            durations.iter().max().copied(),
        )
    };

    ResultBucket {
        count,
        avg_pnl_micros: Some(i128_to_i64_clamp(pnl_sum / count as i128)),
        min_pnl_micros: Some(pnl_min),
        max_pnl_micros: Some(pnl_max),
        avg_duration,
        min_duration,
        max_duration,
    }
}

/// Compute a portfolio's summary statistics over its closed positions.
///
/// Idempotent: calling it twice with no intervening position changes yields
/// identical results. Open positions in the input are ignored defensively.
pub fn summarize(positions: &[Position]) -> PortfolioStats {
    let closed: Vec<&Position> = positions.iter().filter(|p| p.is_closed()).collect();

    let wins: Vec<&Position> = closed
        .iter()
        .copied()
        .filter(|p| p.result_type == ResultType::Win)
        .collect();
    let losses: Vec<&Position> = closed
        .iter()
        .copied()
        .filter(|p| p.result_type == ResultType::Loss)
        .collect();
    let washes: Vec<&Position> = closed
        .iter()
        .copied()
        .filter(|p| p.result_type == ResultType::Wash)
        .collect();

    let total_wins = wins.len() as u32;
    let total_losses = losses.len() as u32;
    let total_washes = washes.len() as u32;
    let total_trades = total_wins + total_losses + total_washes;

    let win_ratio_micros = if total_trades == 0 {
        0
    } else {
        (total_wins as i64 * MICROS_SCALE) / total_trades as i64
    };

    PortfolioStats {
        total_wins,
        total_losses,
        total_washes,
        total_trades,
        win_ratio_micros,
        wins: bucket(&wins),
        losses: bucket(&losses),
        washes: bucket(&washes),
        streaks: streak_extremes(positions),
    }
}
