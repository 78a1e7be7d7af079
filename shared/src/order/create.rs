//! Order placement payload

use super::model::{DeliveryAddress, Order, OrderItem};
use super::status::OrderStatus;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /orders`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCreate {
    pub user_id: String,
    pub restaurant_id: i64,
    pub order_items: Vec<OrderItem>,
    pub delivery_address: DeliveryAddress,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    pub subtotal: f64,
    #[serde(default)]
    pub tax_amount: f64,
    #[serde(default)]
    pub delivery_fee: f64,
    #[serde(default)]
    pub tip_amount: f64,
    #[serde(default)]
    pub discount_amount: f64,
    pub total_amount: f64,
}

/// Pickup / delivery estimates stamped at placement
#[derive(Debug, Clone, Copy)]
pub struct PlacementEstimates {
    pub pickup: Duration,
    pub delivery: Duration,
}

impl Default for PlacementEstimates {
    fn default() -> Self {
        Self {
            pickup: Duration::minutes(30),
            delivery: Duration::minutes(60),
        }
    }
}

impl OrderCreate {
    /// Turn a validated payload into a fresh `pending` order
    pub fn into_order(
        self,
        order_id: String,
        now: DateTime<Utc>,
        estimates: PlacementEstimates,
    ) -> Order {
        Order {
            order_id,
            user_id: self.user_id,
            restaurant_id: self.restaurant_id,
            order_items: self.order_items,
            delivery_address: self.delivery_address,
            latitude: self.latitude,
            longitude: self.longitude,
            notes: self.notes,
            subtotal: self.subtotal,
            tax_amount: self.tax_amount,
            delivery_fee: self.delivery_fee,
            tip_amount: self.tip_amount,
            discount_amount: self.discount_amount,
            total_amount: self.total_amount,
            status: OrderStatus::Pending,
            delivery_user_id: None,
            estimated_pickup_time: Some(now + estimates.pickup),
            actual_pickup_time: None,
            estimated_delivery_time: Some(now + estimates.delivery),
            actual_delivery_time: None,
            created_at: Some(now),
            updated_at: Some(now),
            delivery_code: None,
            delivery_code_used: false,
        }
    }
}
