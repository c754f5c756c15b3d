//! Order status and its transition rules.

use serde::{Deserialize, Serialize};

/// Error returned when an order status change is not permitted.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cannot change order status from {from} to {to}")]
pub struct StatusError {
    /// Current status.
    pub from: OrderStatus,
    /// Requested status.
    pub to: OrderStatus,
}

/// Lifecycle status of an order.
///
/// ```text
/// PENDING ──> PROCESSING ──> SHIPPED ──> DELIVERED
///    │             │
///    └──────┬──────┘
///           v
///       CANCELLED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.order_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Statuses reachable from `self` in one step.
    #[must_use]
    pub const fn next_statuses(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Processing, Self::Cancelled],
            Self::Processing => &[Self::Shipped, Self::Cancelled],
            Self::Shipped => &[Self::Delivered],
            Self::Delivered | Self::Cancelled => &[],
        }
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        self.next_statuses().is_empty()
    }

    /// Whether the customer may still cancel.
    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }

    /// Check a transition to `to`.
    ///
    /// Re-applying the current status is accepted as a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StatusError`] if `to` is not reachable from `self`.
    pub fn transition_to(self, to: Self) -> Result<Self, StatusError> {
        if self == to || self.next_statuses().contains(&to) {
            Ok(to)
        } else {
            Err(StatusError { from: self, to })
        }
    }

    /// The wire/database name of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        assert!(OrderStatus::Pending.transition_to(OrderStatus::Processing).is_ok());
        assert!(OrderStatus::Processing.transition_to(OrderStatus::Shipped).is_ok());
        assert!(OrderStatus::Shipped.transition_to(OrderStatus::Delivered).is_ok());
    }

    #[test]
    fn test_cancellation() {
        assert!(OrderStatus::Pending.transition_to(OrderStatus::Cancelled).is_ok());
        assert!(OrderStatus::Processing.transition_to(OrderStatus::Cancelled).is_ok());
        assert!(OrderStatus::Shipped.transition_to(OrderStatus::Cancelled).is_err());
        assert!(!OrderStatus::Shipped.is_cancellable());
    }

    #[test]
    fn test_skipping_and_reversing_rejected() {
        let err = OrderStatus::Pending
            .transition_to(OrderStatus::Delivered)
            .unwrap_err();
        assert_eq!(err.from, OrderStatus::Pending);
        assert_eq!(err.to, OrderStatus::Delivered);
        assert_eq!(
            err.to_string(),
            "cannot change order status from PENDING to DELIVERED"
        );

        assert!(OrderStatus::Shipped.transition_to(OrderStatus::Pending).is_err());
    }

    #[test]
    fn test_terminal_states() {
        for terminal in [OrderStatus::Delivered, OrderStatus::Cancelled] {
            assert!(terminal.is_terminal());
            for to in OrderStatus::ALL {
                if to != terminal {
                    assert!(terminal.transition_to(to).is_err());
                }
            }
        }
    }

    #[test]
    fn test_same_status_is_noop() {
        for status in OrderStatus::ALL {
            assert_eq!(status.transition_to(status), Ok(status));
        }
    }

    #[test]
    fn test_from_str_roundtrip() {
        for status in OrderStatus::ALL {
            assert_eq!(status.to_string().parse::<OrderStatus>().unwrap(), status);
        }
        assert_eq!("shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert!("COMPLETED".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_serde_uses_screaming_case() {
        let json = serde_json::to_string(&OrderStatus::Processing).unwrap();
        assert_eq!(json, "\"PROCESSING\"");
        let parsed: OrderStatus = serde_json::from_str("\"CANCELLED\"").unwrap();
        assert_eq!(parsed, OrderStatus::Cancelled);
    }
}
