//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // 404 Not Found
            Self::NotFound | Self::OrderNotFound | Self::NoRouteFound => StatusCode::NOT_FOUND,

            // 422 Unprocessable Entity (malformed or inconsistent create payload)
            Self::ValidationFailed
            | Self::InvalidFormat
            | Self::RequiredField
            | Self::ValueOutOfRange
            | Self::OrderEmpty
            | Self::OrderItemInvalid
            | Self::DeliveryAddressInvalid
            | Self::ItemSubtotalMismatch
            | Self::SubtotalMismatch
            | Self::TotalMismatch
            | Self::InvalidAmount => StatusCode::UNPROCESSABLE_ENTITY,

            // 503 Service Unavailable (transient errors, client can retry)
            Self::NetworkError | Self::TimeoutError | Self::UpstreamUnavailable => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            // 500 Internal Server Error
            Self::InternalError | Self::DatabaseError | Self::ConfigError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            // 400 Bad Request (transitions, dispatch preconditions, missing input)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
