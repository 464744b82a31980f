use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Failed to parse an enum from its db text representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumParseError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for EnumParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} value: {:?}", self.kind, self.value)
    }
}

impl std::error::Error for EnumParseError {}

/// Order instruction type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderType {
    Market,
    Limit,
    Stop,
    StopLimit,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "market",
            OrderType::Limit => "limit",
            OrderType::Stop => "stop",
            OrderType::StopLimit => "stop-limit",
        }
    }
}

impl FromStr for OrderType {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "market" => Ok(OrderType::Market),
            "limit" => Ok(OrderType::Limit),
            "stop" => Ok(OrderType::Stop),
            "stop-limit" => Ok(OrderType::StopLimit),
            _ => Err(EnumParseError {
                kind: "order_type",
                value: s.to_string(),
            }),
        }
    }
}

/// BUY or SELL.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderAction {
    Buy,
    Sell,
}

impl OrderAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderAction::Buy => "buy",
            OrderAction::Sell => "sell",
        }
    }

    /// The closing action for an entry opened with `self`.
    pub fn opposite(&self) -> OrderAction {
        match self {
            OrderAction::Buy => OrderAction::Sell,
            OrderAction::Sell => OrderAction::Buy,
        }
    }
}

impl FromStr for OrderAction {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(OrderAction::Buy),
            "sell" => Ok(OrderAction::Sell),
            _ => Err(EnumParseError {
                kind: "order_action",
                value: s.to_string(),
            }),
        }
    }
}

/// Order lifecycle status, derived from sent vs. filled amounts.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Partial,
    Filled,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Partial => "partial",
            OrderStatus::Filled => "filled",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// An order contributes executed amount iff it is filled or partial.
    pub fn has_amount(&self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Partial)
    }

    /// Cancelled orders never change status again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled)
    }
}

impl FromStr for OrderStatus {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "partial" => Ok(OrderStatus::Partial),
            "filled" => Ok(OrderStatus::Filled),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(EnumParseError {
                kind: "order_status",
                value: s.to_string(),
            }),
        }
    }
}

/// Position direction, derived from the entry action.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendType {
    Unknown,
    Long,
    Short,
}

impl TrendType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendType::Unknown => "unknown",
            TrendType::Long => "long",
            TrendType::Short => "short",
        }
    }
}

impl FromStr for TrendType {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unknown" => Ok(TrendType::Unknown),
            "long" => Ok(TrendType::Long),
            "short" => Ok(TrendType::Short),
            _ => Err(EnumParseError {
                kind: "trend_type",
                value: s.to_string(),
            }),
        }
    }
}

/// Open/closed state of a position.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionStatus {
    Open,
    Closed,
}

impl PositionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionStatus::Open => "open",
            PositionStatus::Closed => "closed",
        }
    }
}

impl FromStr for PositionStatus {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(PositionStatus::Open),
            "closed" => Ok(PositionStatus::Closed),
            _ => Err(EnumParseError {
                kind: "position_status",
                value: s.to_string(),
            }),
        }
    }
}

/// Outcome classification of a closed position.
/// `Unknown` for every position that is not closed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    Unknown,
    Win,
    Loss,
    Wash,
}

impl ResultType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultType::Unknown => "unknown",
            ResultType::Win => "win",
            ResultType::Loss => "loss",
            ResultType::Wash => "wash",
        }
    }
}

impl FromStr for ResultType {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unknown" => Ok(ResultType::Unknown),
            "win" => Ok(ResultType::Win),
            "loss" => Ok(ResultType::Loss),
            "wash" => Ok(ResultType::Wash),
            _ => Err(EnumParseError {
                kind: "result_type",
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_round_trip_for_every_variant() {
        for v in [
            OrderType::Market,
            OrderType::Limit,
            OrderType::Stop,
            OrderType::StopLimit,
        ] {
            assert_eq!(v.as_str().parse::<OrderType>().unwrap(), v);
        }
        for v in [OrderAction::Buy, OrderAction::Sell] {
            assert_eq!(v.as_str().parse::<OrderAction>().unwrap(), v);
        }
        for v in [
            OrderStatus::Pending,
            OrderStatus::Partial,
            OrderStatus::Filled,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(v.as_str().parse::<OrderStatus>().unwrap(), v);
        }
        for v in [TrendType::Unknown, TrendType::Long, TrendType::Short] {
            assert_eq!(v.as_str().parse::<TrendType>().unwrap(), v);
        }
        for v in [PositionStatus::Open, PositionStatus::Closed] {
            assert_eq!(v.as_str().parse::<PositionStatus>().unwrap(), v);
        }
        for v in [
            ResultType::Unknown,
            ResultType::Win,
            ResultType::Loss,
            ResultType::Wash,
        ] {
            assert_eq!(v.as_str().parse::<ResultType>().unwrap(), v);
        }
    }

    #[test]
    fn unknown_text_is_rejected() {
        let err = "shorted".parse::<TrendType>().unwrap_err();
        assert_eq!(err.kind, "trend_type");
        assert_eq!(err.value, "shorted");
    }

    #[test]
    fn stop_limit_uses_hyphenated_text() {
        assert_eq!(OrderType::StopLimit.as_str(), "stop-limit");
    }

    #[test]
    fn has_amount_only_for_filled_and_partial() {
        assert!(OrderStatus::Filled.has_amount());
        assert!(OrderStatus::Partial.has_amount());
        assert!(!OrderStatus::Pending.has_amount());
        assert!(!OrderStatus::Cancelled.has_amount());
    }

    #[test]
    fn opposite_action_flips() {
        assert_eq!(OrderAction::Buy.opposite(), OrderAction::Sell);
        assert_eq!(OrderAction::Sell.opposite(), OrderAction::Buy);
    }
}
