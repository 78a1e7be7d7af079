//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`orders`] - 订单接口
//! - [`deliveries`] - 骑手调度接口

pub mod deliveries;
pub mod health;
pub mod orders;

use axum::Router;
use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::core::{Config, ServerState};

fn cors_layer(config: &Config) -> CorsLayer {
    let origin = config.cors_allowed_origin.trim();
    if origin == "*" {
        return CorsLayer::permissive();
    }
    match origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(_) => {
            tracing::warn!(origin = %origin, "Invalid CORS_ALLOWED_ORIGIN; allowing any origin");
            CorsLayer::permissive()
        }
    }
}

/// Build the Axum router (without state)
pub fn build_app(config: &Config) -> Router<ServerState> {
    Router::<ServerState>::new()
        .merge(health::router())
        .merge(orders::router())
        .merge(deliveries::router())
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
}
