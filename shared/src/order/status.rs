//! Order lifecycle status

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of an order
///
/// `pending → confirmed → preparing → ready → assigned → picked_up → en_route → delivered`,
/// with `cancelled` reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Assigned,
    PickedUp,
    EnRoute,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 9] = [
        Self::Pending,
        Self::Confirmed,
        Self::Preparing,
        Self::Ready,
        Self::Assigned,
        Self::PickedUp,
        Self::EnRoute,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Statuses a courier is actively working on
    pub const ACTIVE_DELIVERY: [OrderStatus; 3] = [Self::Assigned, Self::PickedUp, Self::EnRoute];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::Assigned => "assigned",
            Self::PickedUp => "picked_up",
            Self::EnRoute => "en_route",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// `delivered` and `cancelled` accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// The order is with the courier and heading to the customer
    pub fn is_out_for_delivery(&self) -> bool {
        matches!(self, Self::PickedUp | Self::EnRoute)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a status
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display_round_trip() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert_eq!("PICKED_UP".parse::<OrderStatus>().unwrap(), OrderStatus::PickedUp);
    }

    #[test]
    fn test_unknown_status() {
        let err = "shipped".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.to_string(), "unknown order status 'shipped'");
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&OrderStatus::EnRoute).unwrap();
        assert_eq!(json, "\"en_route\"");
    }

    #[test]
    fn test_terminal() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::EnRoute.is_terminal());
    }
}
