//! Delivery API Module
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /deliveries/ready | GET | 可接订单 (按骑手位置标注道路距离) |
//! | /deliveries/active/{id}/navigation | GET | 当前配送段导航 |

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

/// Delivery router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/deliveries", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/ready", get(handler::list_ready))
        .route("/active/{id}/navigation", get(handler::navigation))
}
