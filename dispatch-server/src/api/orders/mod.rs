//! Order API Module
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /orders | POST | 下单 |
//! | /orders | GET | 全部订单 (管理端) |
//! | /orders/sanitization-metrics | GET | 金额清洗计数 |
//! | /orders/user/{user_id} | GET | 用户订单 |
//! | /orders/restaurant/{restaurant_id} | GET | 餐厅订单 |
//! | /orders/delivery-user/{delivery_user_id} | GET | 骑手订单 |
//! | /orders/{id} | GET | 订单详情 |
//! | /orders/{id} | DELETE | 取消订单 |
//! | /orders/{id}/status | PATCH | 状态变更 |
//! | /orders/{id}/assign-delivery | PATCH | 指派骑手 |
//! | /orders/{id}/verify-delivery | POST | 验证收货码 |

mod handler;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create).get(handler::list))
        .route("/sanitization-metrics", get(handler::sanitization_metrics))
        .route("/user/{user_id}", get(handler::list_by_user))
        .route("/restaurant/{restaurant_id}", get(handler::list_by_restaurant))
        .route("/delivery-user/{delivery_user_id}", get(handler::list_by_courier))
        .route("/{id}", get(handler::get_by_id).delete(handler::cancel))
        .route("/{id}/status", patch(handler::update_status))
        .route("/{id}/assign-delivery", patch(handler::assign_delivery))
        .route("/{id}/verify-delivery", post(handler::verify_delivery))
}
