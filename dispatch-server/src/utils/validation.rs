//! Input validation helpers
//!
//! Centralized text length constants and validation functions. Lengths are
//! counted in characters, not bytes.

use shared::error::{AppError, ErrorCode};

// ── Text length limits ──────────────────────────────────────────────

/// Menu item name on an order line
pub const MAX_ITEM_NAME_LEN: usize = 100;

/// Per-item special instructions, address instructions
pub const MAX_INSTRUCTIONS_LEN: usize = 500;

/// Free-text order notes
pub const MAX_NOTES_LEN: usize = 1000;

/// Address parts: (min, max)
pub const STREET_LEN: (usize, usize) = (1, 200);
pub const CITY_LEN: (usize, usize) = (1, 100);
pub const STATE_LEN: (usize, usize) = (2, 50);
pub const ZIP_CODE_LEN: (usize, usize) = (5, 10);

// ── Amount limits ───────────────────────────────────────────────────

/// Maximum price per item
pub const MAX_PRICE: f64 = 1_000_000.0;

/// Maximum quantity per item
pub const MAX_QUANTITY: i32 = 9999;

/// Maximum for any order-level amount (subtotal, fees, total)
pub const MAX_AMOUNT: f64 = 1_000_000.0;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-blank and within `[min, max]` chars.
pub fn validate_text_range(
    value: &str,
    field: &str,
    (min, max): (usize, usize),
    code: ErrorCode,
) -> Result<(), AppError> {
    let len = value.trim().chars().count();
    if len == 0 {
        return Err(AppError::with_message(code, format!("{field} must not be empty"))
            .with_detail("field", field));
    }
    if len < min || len > max {
        return Err(AppError::with_message(
            code,
            format!("{field} must be between {min} and {max} characters ({len} given)"),
        )
        .with_detail("field", field));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
    code: ErrorCode,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.chars().count() > max_len
    {
        return Err(AppError::with_message(
            code,
            format!("{field} is too long ({} chars, max {max_len})", v.chars().count()),
        )
        .with_detail("field", field));
    }
    Ok(())
}

/// Validate that an amount is finite and strictly positive
pub fn validate_positive(value: f64, field: &str) -> Result<(), AppError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(AppError::with_message(
            ErrorCode::InvalidAmount,
            format!("{field} must be greater than 0"),
        )
        .with_detail("field", field));
    }
    Ok(())
}

/// Validate that an amount is finite and not negative
pub fn validate_non_negative(value: f64, field: &str) -> Result<(), AppError> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::with_message(
            ErrorCode::InvalidAmount,
            format!("{field} must not be negative"),
        )
        .with_detail("field", field));
    }
    Ok(())
}

/// Validate that an amount does not exceed `max`
pub fn validate_at_most(value: f64, field: &str, max: f64) -> Result<(), AppError> {
    if value > max {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("{field} exceeds maximum allowed ({max}), got {value}"),
        )
        .with_detail("field", field));
    }
    Ok(())
}
