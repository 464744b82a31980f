use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use trk_schemas::{i128_to_i64_clamp, Order, OrderAction};

/// Aggregate over one action side (buy or sell) of a position's executed
/// orders. The side whose first fill is earliest is the position's entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionGroup {
    pub action: OrderAction,
    pub order_count: u32,
    /// Earliest filled stamp in the group.
    pub first_stamp: DateTime<Utc>,
    /// Latest filled stamp in the group.
    pub last_stamp: DateTime<Utc>,
    /// Unweighted mean of the group's filled prices (micros).
    pub avg_price_micros: i64,
    /// Summed filled amount.
    pub total_amount: i64,
    /// Summed fees (micros); orders without fees contribute 0.
    pub total_fees_micros: i64,
}

struct Acc {
    count: u32,
    first_stamp: DateTime<Utc>,
    last_stamp: DateTime<Utc>,
    price_sum_micros: i128,
    amount_sum: i64,
    fees_sum_micros: i64,
}

/// Fold a position's orders into per-action aggregates.
///
/// Only executed orders count: filled or partial status with the filled
/// fields present. Cancelled and pending orders are excluded entirely.
///
/// Groups are returned ordered by earliest fill; on an exact first-stamp tie
/// buys precede sells so the ordering stays deterministic. A position has at
/// most two groups (the entry action and its opposite).
pub fn side_stats(orders: &[Order]) -> Vec<ActionGroup> {
    let mut accs: BTreeMap<OrderAction, Acc> = BTreeMap::new();

    for order in orders.iter().filter(|o| o.is_executed()) {
        // is_executed guarantees the filled fields are present
        let stamp = order.filled_stamp.unwrap();
        let price = order.filled_price_micros.unwrap();
        let amount = order.filled_amount.unwrap();
        let fees = order.fees_micros.unwrap_or(0);

        accs.entry(order.action)
            .and_modify(|acc| {
                acc.count += 1;
                acc.first_stamp = acc.first_stamp.min(stamp);
                acc.last_stamp = acc.last_stamp.max(stamp);
                acc.price_sum_micros += price as i128;
                acc.amount_sum = acc.amount_sum.saturating_add(amount);
                acc.fees_sum_micros = acc.fees_sum_micros.saturating_add(fees);
            })
            .or_insert(Acc {
                count: 1,
                first_stamp: stamp,
                last_stamp: stamp,
                price_sum_micros: price as i128,
                amount_sum: amount,
                fees_sum_micros: fees,
            });
    }

    let mut groups: Vec<ActionGroup> = accs
        .into_iter()
        .map(|(action, acc)| ActionGroup {
            action,
            order_count: acc.count,
            first_stamp: acc.first_stamp,
            last_stamp: acc.last_stamp,
            avg_price_micros: i128_to_i64_clamp(acc.price_sum_micros / acc.count as i128),
            total_amount: acc.amount_sum,
            total_fees_micros: acc.fees_sum_micros,
        })
        .collect();

    // entry side first; BTreeMap iteration already puts Buy before Sell,
    // so a stable sort on first_stamp keeps buys ahead on exact ties
    groups.sort_by_key(|g| g.first_stamp);
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use trk_schemas::{OrderStatus, OrderType};

    fn stamp(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, 0, 0).unwrap()
    }

    fn executed(
        id: i64,
        action: OrderAction,
        status: OrderStatus,
        filled_at: DateTime<Utc>,
        price_micros: i64,
        amount: i64,
        fees_micros: Option<i64>,
    ) -> Order {
        Order {
            id,
            symbol_id: 3,
            portfolio_id: 1,
            position_id: Some(10),
            order_type: OrderType::Market,
            action,
            status,
            sent_stamp: filled_at,
            sent_price_micros: price_micros,
            limit_price_micros: None,
            sent_amount: amount,
            filled_stamp: Some(filled_at),
            filled_price_micros: Some(price_micros),
            filled_amount: Some(amount),
            fees_micros,
        }
    }

    #[test]
    fn groups_by_action_with_entry_side_first() {
        let orders = vec![
            executed(2, OrderAction::Sell, OrderStatus::Filled, stamp(15), 12_000_000, 100, None),
            executed(1, OrderAction::Buy, OrderStatus::Filled, stamp(9), 10_000_000, 100, None),
        ];
        let groups = side_stats(&orders);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].action, OrderAction::Buy);
        assert_eq!(groups[1].action, OrderAction::Sell);
        assert_eq!(groups[0].first_stamp, stamp(9));
        assert_eq!(groups[1].last_stamp, stamp(15));
    }

    #[test]
    fn averages_prices_and_sums_amounts_and_fees() {
        let orders = vec![
            executed(1, OrderAction::Buy, OrderStatus::Filled, stamp(9), 10_000_000, 60, Some(500_000)),
            executed(2, OrderAction::Buy, OrderStatus::Filled, stamp(10), 11_000_000, 40, Some(250_000)),
        ];
        let groups = side_stats(&orders);
        assert_eq!(groups.len(), 1);
        let g = &groups[0];
        assert_eq!(g.order_count, 2);
        assert_eq!(g.avg_price_micros, 10_500_000);
        assert_eq!(g.total_amount, 100);
        assert_eq!(g.total_fees_micros, 750_000);
        assert_eq!(g.first_stamp, stamp(9));
        assert_eq!(g.last_stamp, stamp(10));
    }

    #[test]
    fn cancelled_and_pending_orders_are_excluded() {
        let mut cancelled =
            executed(1, OrderAction::Buy, OrderStatus::Cancelled, stamp(9), 10_000_000, 60, None);
        cancelled.status = OrderStatus::Cancelled;
        let mut pending =
            executed(2, OrderAction::Buy, OrderStatus::Pending, stamp(9), 10_000_000, 60, None);
        pending.filled_stamp = None;
        pending.filled_price_micros = None;
        pending.filled_amount = None;

        assert!(side_stats(&[cancelled, pending]).is_empty());
    }

    #[test]
    fn partial_orders_count_toward_the_aggregate() {
        let mut partial =
            executed(1, OrderAction::Buy, OrderStatus::Partial, stamp(9), 10_000_000, 40, None);
        partial.sent_amount = 100;
        let groups = side_stats(&[partial]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].total_amount, 40);
    }

    #[test]
    fn buy_precedes_sell_on_exact_first_stamp_tie() {
        let orders = vec![
            executed(2, OrderAction::Sell, OrderStatus::Filled, stamp(9), 12_000_000, 50, None),
            executed(1, OrderAction::Buy, OrderStatus::Filled, stamp(9), 10_000_000, 50, None),
        ];
        let groups = side_stats(&orders);
        assert_eq!(groups[0].action, OrderAction::Buy);
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(side_stats(&[]).is_empty());
    }
}
