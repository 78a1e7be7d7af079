//! Order data model
//!
//! [`Order`] is the typed view of a stored order row. Rows enter the system as
//! [`OrderRow`] (a JSON object) only at the store boundary; readers go through
//! [`Order::from_row`] which parses leniently and completes partial addresses.

use super::status::OrderStatus;
use crate::geo::Coordinates;
use crate::parse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A raw order row as stored by the row store
pub type OrderRow = Map<String, Value>;

/// A line item of an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub item_id: i64,
    pub item_name: String,
    pub price: f64,
    pub quantity: i32,
    pub subtotal: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
}

impl OrderItem {
    /// Lenient read of a stored item. Non-objects are skipped (`None`).
    ///
    /// A missing subtotal falls back to `price × quantity`; a missing
    /// quantity counts as 1.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let price = parse::number(obj.get("price")).unwrap_or(0.0);
        let quantity = parse::integer(obj.get("quantity"))
            .and_then(|q| i32::try_from(q).ok())
            .unwrap_or(1);
        let subtotal =
            parse::number(obj.get("subtotal")).unwrap_or(price * f64::from(quantity));
        Some(Self {
            item_id: parse::integer(obj.get("item_id")).unwrap_or_default(),
            item_name: parse::text(obj.get("item_name")).unwrap_or_default(),
            price,
            quantity,
            subtotal,
            special_instructions: parse::text(obj.get("special_instructions")),
        })
    }
}

/// Where the order goes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl DeliveryAddress {
    /// Complete a possibly partial stored address; missing parts become `""`.
    ///
    /// A bare string is taken as the street line.
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Object(obj)) => {
                let part = |key: &str| parse::text(obj.get(key)).unwrap_or_default();
                Self {
                    street: part("street"),
                    city: part("city"),
                    state: part("state"),
                    zip_code: part("zip_code"),
                    instructions: parse::text(obj.get("instructions")),
                }
            }
            Some(Value::String(line)) => Self {
                street: line.trim().to_string(),
                ..Self::default()
            },
            _ => Self::default(),
        }
    }

    /// `"<street>, <city>, <state> <zip>"`, skipping empty parts
    pub fn formatted(&self) -> String {
        let region = [self.state.trim(), self.zip_code.trim()]
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        [self.street.trim(), self.city.trim(), region.as_str()]
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn is_blank(&self) -> bool {
        self.formatted().is_empty()
    }
}

/// Typed order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub user_id: String,
    pub restaurant_id: i64,
    pub order_items: Vec<OrderItem>,
    pub delivery_address: DeliveryAddress,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub notes: Option<String>,
    pub subtotal: f64,
    pub tax_amount: f64,
    pub delivery_fee: f64,
    pub tip_amount: f64,
    pub discount_amount: f64,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub delivery_user_id: Option<String>,
    pub estimated_pickup_time: Option<DateTime<Utc>>,
    pub actual_pickup_time: Option<DateTime<Utc>>,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    pub actual_delivery_time: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub delivery_code: Option<String>,
    #[serde(default)]
    pub delivery_code_used: bool,
}

/// Stored row could not be read as an order
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("order row is missing '{0}'")]
    MissingField(&'static str),

    #[error("order row has unknown status '{0}'")]
    InvalidStatus(String),
}

impl Order {
    /// Build a typed order from a stored row.
    ///
    /// Only `order_id` and `status` are mandatory; everything else is read
    /// leniently (see [`crate::parse`]).
    pub fn from_row(row: &OrderRow) -> Result<Self, RowError> {
        let order_id = parse::text(row.get("order_id")).ok_or(RowError::MissingField("order_id"))?;
        let raw_status = parse::text(row.get("status")).ok_or(RowError::MissingField("status"))?;
        let status = raw_status
            .parse::<OrderStatus>()
            .map_err(|_| RowError::InvalidStatus(raw_status))?;

        let money = |key: &str| parse::number(row.get(key)).unwrap_or(0.0);
        let order_items = row
            .get("order_items")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(OrderItem::from_value).collect())
            .unwrap_or_default();

        Ok(Self {
            order_id,
            user_id: parse::text(row.get("user_id")).unwrap_or_default(),
            restaurant_id: parse::integer(row.get("restaurant_id")).unwrap_or_default(),
            order_items,
            delivery_address: DeliveryAddress::from_value(row.get("delivery_address")),
            latitude: parse::number(row.get("latitude")),
            longitude: parse::number(row.get("longitude")),
            notes: parse::text(row.get("notes")),
            subtotal: money("subtotal"),
            tax_amount: money("tax_amount"),
            delivery_fee: money("delivery_fee"),
            tip_amount: money("tip_amount"),
            discount_amount: money("discount_amount"),
            total_amount: money("total_amount"),
            status,
            delivery_user_id: parse::text(row.get("delivery_user_id")),
            estimated_pickup_time: parse::timestamp(row.get("estimated_pickup_time")),
            actual_pickup_time: parse::timestamp(row.get("actual_pickup_time")),
            estimated_delivery_time: parse::timestamp(row.get("estimated_delivery_time")),
            actual_delivery_time: parse::timestamp(row.get("actual_delivery_time")),
            created_at: parse::timestamp(row.get("created_at")),
            updated_at: parse::timestamp(row.get("updated_at")),
            delivery_code: parse::text(row.get("delivery_code")),
            delivery_code_used: parse::flag(row.get("delivery_code_used")),
        })
    }

    /// Serialize into the stored row shape
    pub fn to_row(&self) -> OrderRow {
        match serde_json::to_value(self) {
            Ok(Value::Object(row)) => row,
            _ => OrderRow::new(),
        }
    }

    /// Stored delivery coordinates, if both halves are present
    pub fn coordinates(&self) -> Option<Coordinates> {
        Some(Coordinates::new(self.latitude?, self.longitude?))
    }
}
