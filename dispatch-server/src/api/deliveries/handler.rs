//! Delivery API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::Value;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::geo::Coordinates;
use shared::parse;

use crate::core::ServerState;
use crate::dispatch::{Navigation, ReadyDelivery};

/// Courier position for the ready listing
///
/// Kept as raw text so that garbage values get the same error as missing ones.
#[derive(Debug, Deserialize)]
pub struct CourierPosition {
    #[serde(alias = "latitude")]
    pub lat: Option<String>,
    #[serde(alias = "longitude")]
    pub lng: Option<String>,
}

/// Courier position for navigation
#[derive(Debug, Deserialize)]
pub struct DriverPosition {
    #[serde(alias = "driver_latitude")]
    pub driver_lat: Option<String>,
    #[serde(alias = "driver_longitude")]
    pub driver_lng: Option<String>,
}

fn courier_coordinates(lat: Option<String>, lng: Option<String>) -> AppResult<Coordinates> {
    parse::coordinates(
        lat.map(Value::String).as_ref(),
        lng.map(Value::String).as_ref(),
    )
    .ok_or_else(|| AppError::new(ErrorCode::CourierLocationRequired))
}

pub async fn list_ready(
    State(state): State<ServerState>,
    Query(position): Query<CourierPosition>,
) -> AppResult<Json<Vec<ReadyDelivery>>> {
    let courier = courier_coordinates(position.lat, position.lng)?;
    Ok(Json(state.dispatch.list_ready(courier).await?))
}

pub async fn navigation(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Query(position): Query<DriverPosition>,
) -> AppResult<Json<Navigation>> {
    let driver = courier_coordinates(position.driver_lat, position.driver_lng)?;
    Ok(Json(state.dispatch.navigation(&id, driver).await?))
}
