//! Hard validation of order placement payloads
//!
//! Unlike stored rows, creation input is never corrected: any arithmetic
//! disagreement is rejected with 422. Prices, quantities and amounts are
//! bounded before any `Decimal` arithmetic runs, so the sums below cannot
//! overflow.

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::order::money::{money_eq, round_money, to_decimal, to_f64};
use shared::order::{DeliveryAddress, OrderCreate, OrderItem};

use crate::utils::validation::{
    CITY_LEN, MAX_AMOUNT, MAX_INSTRUCTIONS_LEN, MAX_ITEM_NAME_LEN, MAX_NOTES_LEN, MAX_PRICE,
    MAX_QUANTITY, STATE_LEN, STREET_LEN, ZIP_CODE_LEN, validate_at_most, validate_non_negative,
    validate_optional_text, validate_positive, validate_text_range,
};

fn validate_item(index: usize, item: &OrderItem) -> Result<(), AppError> {
    let field = |name: &str| format!("order_items[{index}].{name}");

    validate_text_range(
        &item.item_name,
        &field("item_name"),
        (1, MAX_ITEM_NAME_LEN),
        ErrorCode::OrderItemInvalid,
    )?;
    validate_positive(item.price, &field("price"))?;
    validate_at_most(item.price, &field("price"), MAX_PRICE)?;
    if item.quantity <= 0 {
        return Err(AppError::with_message(
            ErrorCode::OrderItemInvalid,
            format!("{} must be greater than 0", field("quantity")),
        )
        .with_detail("field", field("quantity")));
    }
    if item.quantity > MAX_QUANTITY {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!(
                "{} exceeds maximum allowed ({MAX_QUANTITY}), got {}",
                field("quantity"),
                item.quantity
            ),
        )
        .with_detail("field", field("quantity")));
    }
    validate_positive(item.subtotal, &field("subtotal"))?;
    validate_at_most(item.subtotal, &field("subtotal"), MAX_AMOUNT)?;
    validate_optional_text(
        &item.special_instructions,
        &field("special_instructions"),
        MAX_INSTRUCTIONS_LEN,
        ErrorCode::OrderItemInvalid,
    )?;

    let expected = round_money(to_decimal(item.price) * Decimal::from(item.quantity));
    if !money_eq(to_decimal(item.subtotal), expected) {
        return Err(AppError::with_message(
            ErrorCode::ItemSubtotalMismatch,
            format!(
                "Item subtotal {} does not match price x quantity {}",
                item.subtotal,
                to_f64(expected)
            ),
        )
        .with_detail("field", field("subtotal")));
    }
    Ok(())
}

fn validate_address(address: &DeliveryAddress) -> Result<(), AppError> {
    let code = ErrorCode::DeliveryAddressInvalid;
    validate_text_range(&address.street, "delivery_address.street", STREET_LEN, code)?;
    validate_text_range(&address.city, "delivery_address.city", CITY_LEN, code)?;
    validate_text_range(&address.state, "delivery_address.state", STATE_LEN, code)?;
    validate_text_range(&address.zip_code, "delivery_address.zip_code", ZIP_CODE_LEN, code)?;
    validate_optional_text(
        &address.instructions,
        "delivery_address.instructions",
        MAX_INSTRUCTIONS_LEN,
        code,
    )
}

/// Validate a placement payload, field limits first, then arithmetic
pub fn validate_order_create(order: &OrderCreate) -> Result<(), AppError> {
    if order.user_id.trim().is_empty() {
        return Err(AppError::with_message(ErrorCode::RequiredField, "user_id must not be empty")
            .with_detail("field", "user_id"));
    }
    if order.order_items.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty).with_detail("field", "order_items"));
    }
    for (index, item) in order.order_items.iter().enumerate() {
        validate_item(index, item)?;
    }
    validate_address(&order.delivery_address)?;
    validate_optional_text(&order.notes, "notes", MAX_NOTES_LEN, ErrorCode::ValidationFailed)?;

    validate_positive(order.subtotal, "subtotal")?;
    validate_non_negative(order.tax_amount, "tax_amount")?;
    validate_non_negative(order.delivery_fee, "delivery_fee")?;
    validate_non_negative(order.tip_amount, "tip_amount")?;
    validate_non_negative(order.discount_amount, "discount_amount")?;
    validate_positive(order.total_amount, "total_amount")?;
    for (value, field) in [
        (order.subtotal, "subtotal"),
        (order.tax_amount, "tax_amount"),
        (order.delivery_fee, "delivery_fee"),
        (order.tip_amount, "tip_amount"),
        (order.discount_amount, "discount_amount"),
        (order.total_amount, "total_amount"),
    ] {
        validate_at_most(value, field, MAX_AMOUNT)?;
    }

    let items_sum = round_money(
        order
            .order_items
            .iter()
            .map(|item| to_decimal(item.subtotal))
            .sum(),
    );
    if !money_eq(to_decimal(order.subtotal), items_sum) {
        return Err(AppError::with_message(
            ErrorCode::SubtotalMismatch,
            format!(
                "Subtotal {} does not match sum of item subtotals {}",
                order.subtotal,
                to_f64(items_sum)
            ),
        )
        .with_detail("field", "subtotal"));
    }

    let expected_total = round_money(
        to_decimal(order.subtotal) + to_decimal(order.tax_amount) + to_decimal(order.delivery_fee)
            + to_decimal(order.tip_amount)
            - to_decimal(order.discount_amount),
    );
    if !money_eq(to_decimal(order.total_amount), expected_total) {
        return Err(AppError::with_message(
            ErrorCode::TotalMismatch,
            format!(
                "Total amount calculation mismatch. Expected: {}, Got: {}",
                to_f64(expected_total),
                order.total_amount
            ),
        )
        .with_detail("field", "total_amount"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn payload() -> Value {
        json!({
            "user_id": "u-1",
            "restaurant_id": 7,
            "order_items": [
                {"item_id": 1, "item_name": "Burrito", "price": 12.5, "quantity": 2, "subtotal": 25.0}
            ],
            "delivery_address": {"street": "500 Congress Ave", "city": "Austin", "state": "TX", "zip_code": "78701"},
            "subtotal": 25.0,
            "tax_amount": 2.0,
            "delivery_fee": 3.5,
            "tip_amount": 1.0,
            "discount_amount": 0.0,
            "total_amount": 31.5,
        })
    }

    fn create(value: Value) -> OrderCreate {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_valid_payload() {
        assert!(validate_order_create(&create(payload())).is_ok());
    }

    #[test]
    fn test_total_mismatch_rejected() {
        let mut body = payload();
        body["total_amount"] = json!(40.0);
        let err = validate_order_create(&create(body)).unwrap_err();
        assert_eq!(err.code, ErrorCode::TotalMismatch);
        assert_eq!(err.http_status().as_u16(), 422);
        assert_eq!(
            err.message,
            "Total amount calculation mismatch. Expected: 31.5, Got: 40"
        );
    }

    #[test]
    fn test_total_within_tolerance_accepted() {
        let mut body = payload();
        body["total_amount"] = json!(31.51);
        assert!(validate_order_create(&create(body)).is_ok());
    }

    #[test]
    fn test_item_subtotal_mismatch() {
        let mut body = payload();
        body["order_items"][0]["subtotal"] = json!(24.0);
        body["subtotal"] = json!(24.0);
        body["total_amount"] = json!(30.5);
        let err = validate_order_create(&create(body)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ItemSubtotalMismatch);
    }

    #[test]
    fn test_subtotal_mismatch() {
        let mut body = payload();
        body["subtotal"] = json!(20.0);
        body["total_amount"] = json!(26.5);
        let err = validate_order_create(&create(body)).unwrap_err();
        assert_eq!(err.code, ErrorCode::SubtotalMismatch);
    }

    #[test]
    fn test_empty_items() {
        let mut body = payload();
        body["order_items"] = json!([]);
        let err = validate_order_create(&create(body)).unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderEmpty);
    }

    #[test]
    fn test_huge_amounts_rejected_before_arithmetic() {
        let mut body = payload();
        body["order_items"][0]["price"] = json!(1e20);
        body["order_items"][0]["quantity"] = json!(2_000_000_000);
        body["order_items"][0]["subtotal"] = json!(2e29);
        let err = validate_order_create(&create(body)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);
        assert_eq!(err.http_status().as_u16(), 422);
        assert_eq!(err.details.unwrap()["field"], "order_items[0].price");

        let mut body = payload();
        body["order_items"][0]["quantity"] = json!(10_000);
        let err = validate_order_create(&create(body)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);

        let mut body = payload();
        body["tip_amount"] = json!(1e30);
        let err = validate_order_create(&create(body)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);
        assert_eq!(err.details.unwrap()["field"], "tip_amount");
    }

    #[test]
    fn test_field_limits() {
        let mut body = payload();
        body["delivery_address"]["zip_code"] = json!("123");
        assert_eq!(
            validate_order_create(&create(body)).unwrap_err().code,
            ErrorCode::DeliveryAddressInvalid
        );

        let mut body = payload();
        body["order_items"][0]["quantity"] = json!(0);
        assert_eq!(
            validate_order_create(&create(body)).unwrap_err().code,
            ErrorCode::OrderItemInvalid
        );

        let mut body = payload();
        body["tip_amount"] = json!(-1.0);
        assert_eq!(
            validate_order_create(&create(body)).unwrap_err().code,
            ErrorCode::InvalidAmount
        );

        let mut body = payload();
        body["notes"] = json!("n".repeat(1001));
        assert_eq!(
            validate_order_create(&create(body)).unwrap_err().code,
            ErrorCode::ValidationFailed
        );
    }
}
