//! Order domain types
//!
//! - [`Order`]: typed order, built from stored rows via [`Order::from_row`]
//! - [`OrderStatus`]: lifecycle states
//! - [`OrderCreate`]: placement payload
//! - [`money`]: decimal helpers shared by validation and sanitization

pub mod create;
pub mod model;
pub mod money;
pub mod status;

pub use create::{OrderCreate, PlacementEstimates};
pub use model::{DeliveryAddress, Order, OrderItem, OrderRow, RowError};
pub use status::{OrderStatus, UnknownStatus};
