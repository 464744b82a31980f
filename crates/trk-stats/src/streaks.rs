use trk_schemas::{Position, ResultType, StreakAssignment};

/// Longest run length per result type, surfaced on the portfolio row.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StreakExtremes {
    pub largest_win_streak: u32,
    pub largest_loss_streak: u32,
    pub largest_wash_streak: u32,
}

/// Closed positions in canonical streak order:
/// (exit stamp, entry stamp, position id) ascending.
///
/// The position-id tie-break keeps grouping reproducible even when two
/// positions share identical exit and entry stamps; grouping never depends
/// on storage order. Non-closed inputs are ignored defensively.
fn sorted_closed(positions: &[Position]) -> Vec<&Position> {
    let mut closed: Vec<&Position> = positions.iter().filter(|p| p.is_closed()).collect();
    closed.sort_by_key(|p| (p.exit_stamp, p.entry_stamp, p.id));
    closed
}

/// Partition a portfolio's closed positions into contiguous runs of the same
/// result type and assign each a streak group and a 0-based index within it.
///
/// The group identifier is the id of the run's first position. Linear time,
/// single pass, no backtracking; running it twice on the same set yields
/// identical assignments.
pub fn regroup(positions: &[Position]) -> Vec<StreakAssignment> {
    let mut assignments = Vec::new();

    let mut run_result: Option<ResultType> = None;
    let mut run_group = 0i64;
    let mut run_index = 0u32;

    for position in sorted_closed(positions) {
        if run_result == Some(position.result_type) {
            run_index += 1;
        } else {
            run_result = Some(position.result_type);
            run_group = position.id;
            run_index = 0;
        }
        assignments.push(StreakAssignment {
            position_id: position.id,
            streak_group: run_group,
            streak_index: run_index,
        });
    }

    assignments
}

/// Longest win/loss/wash run over the same canonical ordering `regroup` uses.
pub fn streak_extremes(positions: &[Position]) -> StreakExtremes {
    let mut extremes = StreakExtremes::default();

    let mut run_result: Option<ResultType> = None;
    let mut run_len = 0u32;

    for position in sorted_closed(positions) {
        if run_result == Some(position.result_type) {
            run_len += 1;
        } else {
            run_result = Some(position.result_type);
            run_len = 1;
        }
        match position.result_type {
            ResultType::Win => {
                extremes.largest_win_streak = extremes.largest_win_streak.max(run_len)
            }
            ResultType::Loss => {
                extremes.largest_loss_streak = extremes.largest_loss_streak.max(run_len)
            }
            ResultType::Wash => {
                extremes.largest_wash_streak = extremes.largest_wash_streak.max(run_len)
            }
            ResultType::Unknown => {}
        }
    }

    extremes
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use trk_schemas::{PositionStatus, ResultType};

    fn stamp(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 12, 0, 0).unwrap()
    }

    fn closed(id: i64, exit_day: u32, result: ResultType) -> Position {
        let mut p = Position::new(id, 1);
        p.status = PositionStatus::Closed;
        p.result_type = result;
        p.entry_stamp = Some(stamp(exit_day) - chrono::Duration::hours(4));
        p.exit_stamp = Some(stamp(exit_day));
        p
    }

    #[test]
    fn runs_break_on_result_type_change() {
        let positions = vec![
            closed(1, 1, ResultType::Win),
            closed(2, 2, ResultType::Win),
            closed(3, 3, ResultType::Loss),
        ];
        let a = regroup(&positions);
        assert_eq!(a.len(), 3);

        assert_eq!((a[0].streak_group, a[0].streak_index), (1, 0));
        assert_eq!((a[1].streak_group, a[1].streak_index), (1, 1));
        assert_eq!((a[2].streak_group, a[2].streak_index), (3, 0));
    }

    #[test]
    fn same_result_type_in_nonadjacent_runs_gets_distinct_groups() {
        let positions = vec![
            closed(1, 1, ResultType::Win),
            closed(2, 2, ResultType::Loss),
            closed(3, 3, ResultType::Win),
        ];
        let a = regroup(&positions);
        assert_eq!(a[0].streak_group, 1);
        assert_eq!(a[1].streak_group, 2);
        assert_eq!(a[2].streak_group, 3);
        assert_eq!(a[2].streak_index, 0);
    }

    #[test]
    fn ordering_follows_exit_stamp_not_input_order() {
        let positions = vec![
            closed(3, 3, ResultType::Loss),
            closed(1, 1, ResultType::Win),
            closed(2, 2, ResultType::Win),
        ];
        let a = regroup(&positions);
        assert_eq!(a[0].position_id, 1);
        assert_eq!(a[1].position_id, 2);
        assert_eq!(a[2].position_id, 3);
        assert_eq!(a[1].streak_index, 1);
    }

    #[test]
    fn identical_stamps_tie_break_on_position_id() {
        let a1 = closed(7, 1, ResultType::Win);
        let mut a2 = closed(4, 1, ResultType::Win);
        // identical exit and entry stamps
        a2.entry_stamp = a1.entry_stamp;
        a2.exit_stamp = a1.exit_stamp;

        let forward = regroup(&[a1.clone(), a2.clone()]);
        let reversed = regroup(&[a2, a1]);
        assert_eq!(forward, reversed);
        assert_eq!(forward[0].position_id, 4);
        assert_eq!(forward[0].streak_group, 4);
        assert_eq!(forward[1].streak_index, 1);
    }

    #[test]
    fn regroup_is_deterministic() {
        let positions = vec![
            closed(1, 1, ResultType::Win),
            closed(2, 2, ResultType::Wash),
            closed(3, 3, ResultType::Wash),
            closed(4, 4, ResultType::Loss),
        ];
        assert_eq!(regroup(&positions), regroup(&positions));
    }

    #[test]
    fn open_positions_are_ignored() {
        let mut open = closed(9, 5, ResultType::Unknown);
        open.status = PositionStatus::Open;
        let positions = vec![closed(1, 1, ResultType::Win), open];
        assert_eq!(regroup(&positions).len(), 1);
    }

    #[test]
    fn extremes_track_longest_run_per_result() {
        let positions = vec![
            closed(1, 1, ResultType::Win),
            closed(2, 2, ResultType::Win),
            closed(3, 3, ResultType::Loss),
            closed(4, 4, ResultType::Win),
            closed(5, 5, ResultType::Win),
            closed(6, 6, ResultType::Win),
            closed(7, 7, ResultType::Wash),
        ];
        let e = streak_extremes(&positions);
        assert_eq!(e.largest_win_streak, 3);
        assert_eq!(e.largest_loss_streak, 1);
        assert_eq!(e.largest_wash_streak, 1);
    }

    #[test]
    fn no_closed_positions_yield_empty_output() {
        assert!(regroup(&[]).is_empty());
        assert_eq!(streak_extremes(&[]), StreakExtremes::default());
    }
}
