//! trk-stats
//!
//! Portfolio-level derived statistics over closed positions:
//! - `regroup` partitions closed positions, ordered by exit time, into
//!   contiguous runs of the same result type (streaks)
//! - `summarize` recomputes the portfolio's summary statistics wholesale
//!
//! Both passes are deterministic, idempotent, and operate on data already
//! fetched by the caller — no queries, no IO, no ambient time.

mod streaks;
mod summary;

pub use streaks::{regroup, streak_extremes, StreakExtremes};
pub use summary::{summarize, PortfolioStats, ResultBucket};
