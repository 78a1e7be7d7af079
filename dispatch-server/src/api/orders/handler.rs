//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::order::{Order, OrderCreate, OrderStatus};
use shared::parse;

use crate::core::ServerState;
use crate::db::OrderQuery;
use crate::sanitizer::SanitizationCounters;

const ADMIN_PAGE: usize = 1000;
const USER_PAGE: usize = 20;
const RESTAURANT_PAGE: usize = 50;
const COURIER_PAGE: usize = 20;

/// `?limit&offset`
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// `?status_filter&limit&offset`
#[derive(Debug, Deserialize)]
pub struct FilteredPageQuery {
    pub status_filter: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateQuery {
    pub new_status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssignQuery {
    pub delivery_user_id: Option<String>,
}

/// Body of `POST /orders/{id}/verify-delivery`; the code may arrive as a number
#[derive(Debug, Deserialize)]
pub struct VerifyDeliveryRequest {
    #[serde(default)]
    pub delivery_code: Option<Value>,
}

fn parse_status(raw: &str, field: &str) -> AppResult<OrderStatus> {
    raw.parse::<OrderStatus>().map_err(|e| {
        AppError::with_message(ErrorCode::ValidationFailed, e.to_string()).with_detail("field", field)
    })
}

fn status_filter(raw: Option<&str>) -> AppResult<Option<OrderStatus>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => parse_status(raw, "status_filter").map(Some),
        None => Ok(None),
    }
}

/// Place an order
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<Value>,
) -> AppResult<(StatusCode, Json<Order>)> {
    let create: OrderCreate =
        serde_json::from_value(payload).map_err(|e| AppError::validation(e.to_string()))?;
    let order = state.orders.place(create).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// List all orders (admin)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Vec<Order>>> {
    let q = OrderQuery::new().page(query.limit.unwrap_or(ADMIN_PAGE), query.offset.unwrap_or(0));
    Ok(Json(state.orders.list(&q).await?))
}

pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    Ok(Json(state.orders.get(&id).await?))
}

pub async fn list_by_user(
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Vec<Order>>> {
    let q = OrderQuery::new()
        .user(user_id)
        .page(query.limit.unwrap_or(USER_PAGE), query.offset.unwrap_or(0));
    Ok(Json(state.orders.list(&q).await?))
}

pub async fn list_by_restaurant(
    State(state): State<ServerState>,
    Path(restaurant_id): Path<i64>,
    Query(query): Query<FilteredPageQuery>,
) -> AppResult<Json<Vec<Order>>> {
    let q = OrderQuery::new()
        .restaurant(restaurant_id)
        .status_opt(status_filter(query.status_filter.as_deref())?)
        .page(query.limit.unwrap_or(RESTAURANT_PAGE), query.offset.unwrap_or(0));
    Ok(Json(state.orders.list(&q).await?))
}

pub async fn list_by_courier(
    State(state): State<ServerState>,
    Path(delivery_user_id): Path<String>,
    Query(query): Query<FilteredPageQuery>,
) -> AppResult<Json<Vec<Order>>> {
    let q = OrderQuery::new()
        .courier(delivery_user_id)
        .status_opt(status_filter(query.status_filter.as_deref())?)
        .page(query.limit.unwrap_or(COURIER_PAGE), query.offset.unwrap_or(0));
    Ok(Json(state.orders.list(&q).await?))
}

pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Query(query): Query<StatusUpdateQuery>,
) -> AppResult<Json<Order>> {
    let raw = query
        .new_status
        .ok_or_else(|| AppError::with_message(ErrorCode::RequiredField, "new_status is required"))?;
    let new_status = parse_status(raw.trim(), "new_status")?;
    Ok(Json(state.orders.update_status(&id, new_status).await?))
}

pub async fn assign_delivery(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Query(query): Query<AssignQuery>,
) -> AppResult<Json<Order>> {
    let courier = query.delivery_user_id.unwrap_or_default();
    Ok(Json(state.dispatch.assign(&id, &courier).await?))
}

pub async fn verify_delivery(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(body): Json<VerifyDeliveryRequest>,
) -> AppResult<Json<Order>> {
    let code = parse::text(body.delivery_code.as_ref());
    Ok(Json(state.dispatch.verify_delivery(&id, code.as_deref()).await?))
}

/// Cancel an order
pub async fn cancel(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let order = state.orders.cancel(&id).await?;
    Ok(Json(json!({
        "message": "Order cancelled successfully",
        "order_id": order.order_id.clone(),
        "order": order,
    })))
}

pub async fn sanitization_metrics(State(state): State<ServerState>) -> Json<SanitizationCounters> {
    Json(state.orders.sanitization_counters())
}
