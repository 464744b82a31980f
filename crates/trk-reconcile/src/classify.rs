use trk_schemas::OrderStatus;

/// Derive an order's lifecycle status from its sent vs. filled amounts.
///
/// Priority order, first match wins:
/// 1. cancelled is terminal and never changes
/// 2. no fill reported with a positive sent amount => pending
/// 3. 0 < filled < sent => partial
/// 4. filled == sent => filled
///
/// Any other shape (e.g. a reported fill of zero) leaves the current status
/// unchanged. Pure and idempotent; does not touch `position_id`.
pub fn classify(sent_amount: i64, filled_amount: Option<i64>, current: OrderStatus) -> OrderStatus {
    if current.is_terminal() {
        return current;
    }
    match filled_amount {
        None if sent_amount > 0 => OrderStatus::Pending,
        Some(filled) if filled > 0 && filled < sent_amount => OrderStatus::Partial,
        Some(filled) if filled == sent_amount => OrderStatus::Filled,
        _ => current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unfilled_order_is_pending() {
        assert_eq!(
            classify(100, None, OrderStatus::Pending),
            OrderStatus::Pending
        );
        assert_eq!(
            classify(100, None, OrderStatus::Filled),
            OrderStatus::Pending
        );
    }

    #[test]
    fn partial_fill_is_partial() {
        assert_eq!(
            classify(100, Some(40), OrderStatus::Pending),
            OrderStatus::Partial
        );
    }

    #[test]
    fn complete_fill_is_filled() {
        assert_eq!(
            classify(100, Some(100), OrderStatus::Partial),
            OrderStatus::Filled
        );
    }

    #[test]
    fn cancelled_is_terminal() {
        assert_eq!(
            classify(100, Some(100), OrderStatus::Cancelled),
            OrderStatus::Cancelled
        );
        assert_eq!(classify(100, None, OrderStatus::Cancelled), OrderStatus::Cancelled);
    }

    #[test]
    fn zero_fill_leaves_status_unchanged() {
        assert_eq!(
            classify(100, Some(0), OrderStatus::Pending),
            OrderStatus::Pending
        );
    }

    #[test]
    fn classify_is_idempotent_on_filled_orders() {
        let once = classify(100, Some(100), OrderStatus::Pending);
        assert_eq!(once, OrderStatus::Filled);
        assert_eq!(classify(100, Some(100), once), OrderStatus::Filled);
    }
}
