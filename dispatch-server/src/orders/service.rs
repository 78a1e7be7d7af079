//! Order service
//!
//! Placement, reads and status changes over an [`OrderStore`]. Every row read
//! back from the store is sanitized and converted to [`Order`] here, so callers
//! never see raw rows.

use chrono::Utc;
use shared::error::{AppError, ErrorCode};
use shared::order::{Order, OrderCreate, OrderStatus, PlacementEstimates};
use std::sync::Arc;
use uuid::Uuid;

use super::state_machine::{
    DeliveryCodes, RandomCodes, TransitionSource, check_transition, transition_patch,
};
use super::validation::validate_order_create;
use crate::core::error::ServiceResult;
use crate::db::{OrderQuery, OrderStore, Row};
use crate::sanitizer::{SanitizationCounters, Sanitizer};

#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn OrderStore>,
    sanitizer: Sanitizer,
    codes: Arc<dyn DeliveryCodes>,
    estimates: PlacementEstimates,
}

impl OrderService {
    pub fn new(store: Arc<dyn OrderStore>, sanitizer: Sanitizer, estimates: PlacementEstimates) -> Self {
        Self {
            store,
            sanitizer,
            codes: Arc::new(RandomCodes),
            estimates,
        }
    }

    /// Replace the delivery code generator
    pub fn with_codes(mut self, codes: Arc<dyn DeliveryCodes>) -> Self {
        self.codes = codes;
        self
    }

    pub fn store(&self) -> &Arc<dyn OrderStore> {
        &self.store
    }

    pub fn sanitization_counters(&self) -> SanitizationCounters {
        self.sanitizer.counters()
    }

    /// Sanitize a stored row and read it as an order
    fn read(&self, row: Row) -> ServiceResult<Order> {
        let row = self.sanitizer.sanitize(row);
        Order::from_row(&row).map_err(|e| {
            tracing::error!(error = %e, order_id = ?row.get("order_id"), "Unreadable order row");
            AppError::internal("Stored order could not be read").into()
        })
    }

    /// Place a new `pending` order
    pub async fn place(&self, create: OrderCreate) -> ServiceResult<Order> {
        validate_order_create(&create)?;

        let order_id = Uuid::new_v4().to_string();
        let order = create.into_order(order_id, Utc::now(), self.estimates);
        let stored = self.store.insert_order(order.to_row()).await?;

        let order = Order::from_row(&stored).map_err(|e| {
            tracing::error!(error = %e, "Store returned an unreadable order after insert");
            AppError::internal("Stored order could not be read")
        })?;
        tracing::info!(
            order_id = %order.order_id,
            user_id = %order.user_id,
            restaurant_id = order.restaurant_id,
            total_amount = order.total_amount,
            "Order placed"
        );
        Ok(order)
    }

    pub async fn get(&self, order_id: &str) -> ServiceResult<Order> {
        let row = self
            .store
            .find_order(order_id)
            .await?
            .ok_or_else(|| AppError::order_not_found(order_id))?;
        self.read(row)
    }

    /// List orders; rows that cannot be read as orders are skipped
    pub async fn list(&self, query: &OrderQuery) -> ServiceResult<Vec<Order>> {
        let rows = self.store.list_orders(query).await?;
        let orders = self
            .sanitizer
            .sanitize_all(rows)
            .into_iter()
            .filter_map(|row| match Order::from_row(&row) {
                Ok(order) => Some(order),
                Err(e) => {
                    tracing::warn!(error = %e, order_id = ?row.get("order_id"), "Skipping unreadable order row");
                    None
                }
            })
            .collect();
        Ok(orders)
    }

    /// Move `order` to `to`, writing `extra` columns in the same patch
    pub async fn transition(
        &self,
        order: &Order,
        to: OrderStatus,
        source: TransitionSource,
        extra: Row,
    ) -> ServiceResult<Order> {
        check_transition(order.status, to, source).map_err(AppError::from)?;

        let mut patch = transition_patch(order, to, Utc::now(), self.codes.as_ref());
        patch.extend(extra);

        let row = self
            .store
            .update_order(&order.order_id, patch)
            .await?
            .ok_or_else(|| AppError::order_not_found(&order.order_id))?;

        tracing::info!(
            order_id = %order.order_id,
            from = %order.status,
            to = %to,
            "Order status changed"
        );
        self.read(row)
    }

    /// Generic status update (`delivered` is never reachable this way)
    pub async fn update_status(&self, order_id: &str, new_status: OrderStatus) -> ServiceResult<Order> {
        let order = self.get(order_id).await?;
        self.transition(&order, new_status, TransitionSource::StatusUpdate, Row::new())
            .await
    }

    pub async fn cancel(&self, order_id: &str) -> ServiceResult<Order> {
        let order = self.get(order_id).await?;
        if order.status.is_terminal() {
            return Err(AppError::new(ErrorCode::OrderAlreadyFinalized)
                .with_detail("status", order.status.as_str())
                .into());
        }
        self.transition(&order, OrderStatus::Cancelled, TransitionSource::StatusUpdate, Row::new())
            .await
    }
}
