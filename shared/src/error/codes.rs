//! Unified error codes for the dispatch engine
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Order lifecycle errors
//! - 5xxx: Payment arithmetic errors
//! - 6xxx: Dispatch errors
//! - 7xxx: Location / routing errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so that clients can switch on
/// them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Status transition rejected by the lifecycle rules
    InvalidTransition = 4002,
    /// Order is not in a state that allows courier assignment
    OrderNotAssignable = 4003,
    /// Courier already holds an active delivery
    CourierBusy = 4004,
    /// Delivery code missing from the request
    DeliveryCodeRequired = 4005,
    /// No delivery code has been issued for the order
    DeliveryCodeNotIssued = 4006,
    /// Submitted delivery code does not match
    DeliveryCodeInvalid = 4007,
    /// Order has no items
    OrderEmpty = 4008,
    /// Order item failed validation
    OrderItemInvalid = 4009,
    /// Delivery address failed validation
    DeliveryAddressInvalid = 4010,
    /// Order is already delivered or cancelled
    OrderAlreadyFinalized = 4011,

    // ==================== 5xxx: Payment ====================
    /// Item subtotal does not equal price x quantity
    ItemSubtotalMismatch = 5001,
    /// Order subtotal does not equal the sum of item subtotals
    SubtotalMismatch = 5002,
    /// Order total does not equal its components
    TotalMismatch = 5003,
    /// Amount is negative, zero or not finite
    InvalidAmount = 5004,

    // ==================== 6xxx: Dispatch ====================
    /// Navigation requested for an order in a non-navigable status
    NavigationNotApplicable = 6001,
    /// Courier position missing or unparseable
    CourierLocationRequired = 6002,

    // ==================== 7xxx: Location ====================
    /// Restaurant coordinates could not be resolved
    RestaurantLocationUnavailable = 7001,
    /// Customer coordinates could not be resolved
    CustomerLocationUnavailable = 7002,
    /// Routing provider returned no route
    NoRouteFound = 7003,
    /// Geocoding returned no usable result
    GeocodeFailed = 7004,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Row store error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Upstream request timed out
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
    /// Mapping provider not configured or unreachable
    UpstreamUnavailable = 9006,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::InvalidTransition => "Invalid status transition",
            ErrorCode::OrderNotAssignable => "Order is not ready for delivery assignment",
            ErrorCode::CourierBusy => "Courier already has an active delivery",
            ErrorCode::DeliveryCodeRequired => "Delivery code is required",
            ErrorCode::DeliveryCodeNotIssued => "No delivery code has been issued for this order",
            ErrorCode::DeliveryCodeInvalid => "Invalid delivery code",
            ErrorCode::OrderEmpty => "Order must contain at least one item",
            ErrorCode::OrderItemInvalid => "Order item is invalid",
            ErrorCode::DeliveryAddressInvalid => "Delivery address is invalid",
            ErrorCode::OrderAlreadyFinalized => {
                "Cannot cancel order that is already delivered or cancelled"
            }

            // Payment
            ErrorCode::ItemSubtotalMismatch => "Item subtotal does not match price x quantity",
            ErrorCode::SubtotalMismatch => "Subtotal does not match sum of item subtotals",
            ErrorCode::TotalMismatch => "Total amount calculation mismatch",
            ErrorCode::InvalidAmount => "Invalid amount",

            // Dispatch
            ErrorCode::NavigationNotApplicable => "Navigation not applicable",
            ErrorCode::CourierLocationRequired => "Courier location is required",

            // Location
            ErrorCode::RestaurantLocationUnavailable => "Restaurant location not available",
            ErrorCode::CustomerLocationUnavailable => "Customer location not geocoded",
            ErrorCode::NoRouteFound => "No route found",
            ErrorCode::GeocodeFailed => "Address could not be geocoded",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::UpstreamUnavailable => "Mapping provider unavailable",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error returned when a u16 does not name a known [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::InvalidTransition),
            4003 => Ok(ErrorCode::OrderNotAssignable),
            4004 => Ok(ErrorCode::CourierBusy),
            4005 => Ok(ErrorCode::DeliveryCodeRequired),
            4006 => Ok(ErrorCode::DeliveryCodeNotIssued),
            4007 => Ok(ErrorCode::DeliveryCodeInvalid),
            4008 => Ok(ErrorCode::OrderEmpty),
            4009 => Ok(ErrorCode::OrderItemInvalid),
            4010 => Ok(ErrorCode::DeliveryAddressInvalid),
            4011 => Ok(ErrorCode::OrderAlreadyFinalized),

            // Payment
            5001 => Ok(ErrorCode::ItemSubtotalMismatch),
            5002 => Ok(ErrorCode::SubtotalMismatch),
            5003 => Ok(ErrorCode::TotalMismatch),
            5004 => Ok(ErrorCode::InvalidAmount),

            // Dispatch
            6001 => Ok(ErrorCode::NavigationNotApplicable),
            6002 => Ok(ErrorCode::CourierLocationRequired),

            // Location
            7001 => Ok(ErrorCode::RestaurantLocationUnavailable),
            7002 => Ok(ErrorCode::CustomerLocationUnavailable),
            7003 => Ok(ErrorCode::NoRouteFound),
            7004 => Ok(ErrorCode::GeocodeFailed),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),
            9006 => Ok(ErrorCode::UpstreamUnavailable),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::OrderNotFound.code(), 4001);
        assert_eq!(ErrorCode::InvalidTransition.code(), 4002);
        assert_eq!(ErrorCode::TotalMismatch.code(), 5003);
        assert_eq!(ErrorCode::NavigationNotApplicable.code(), 6001);
        assert_eq!(ErrorCode::NoRouteFound.code(), 7003);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
    }

    #[test]
    fn test_try_from_valid() {
        assert_eq!(ErrorCode::try_from(2), Ok(ErrorCode::ValidationFailed));
        assert_eq!(ErrorCode::try_from(4007), Ok(ErrorCode::DeliveryCodeInvalid));
        assert_eq!(
            ErrorCode::try_from(7001),
            Ok(ErrorCode::RestaurantLocationUnavailable)
        );
        assert_eq!(ErrorCode::try_from(9006), Ok(ErrorCode::UpstreamUnavailable));
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(0), Err(InvalidErrorCode(0)));
        assert_eq!(ErrorCode::try_from(4), Err(InvalidErrorCode(4)));
        assert_eq!(ErrorCode::try_from(1001), Err(InvalidErrorCode(1001)));
        assert_eq!(ErrorCode::try_from(10000), Err(InvalidErrorCode(10000)));
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_string(&ErrorCode::OrderNotFound).unwrap();
        assert_eq!(json, "4001");
    }

    #[test]
    fn test_deserialize_invalid() {
        let result: Result<ErrorCode, _> = serde_json::from_str("1234");
        assert!(result.is_err());
    }

    #[test]
    fn test_location_messages() {
        assert_eq!(
            ErrorCode::RestaurantLocationUnavailable.message(),
            "Restaurant location not available"
        );
        assert_eq!(
            ErrorCode::CustomerLocationUnavailable.message(),
            "Customer location not geocoded"
        );
        assert_eq!(ErrorCode::NoRouteFound.message(), "No route found");
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorCode::DeliveryCodeInvalid.to_string(), "4007");
        assert_eq!(InvalidErrorCode(42).to_string(), "invalid error code: 42");
    }
}
