//! Order lifecycle
//!
//! - **state_machine**: permitted transitions and the columns each one writes
//! - **validation**: hard checks on placement payloads
//! - **service**: `OrderService`, placement / reads / status changes
//!
//! # Data Flow
//!
//! ```text
//! POST /orders → validate → OrderStore::insert_order
//! read paths   → OrderStore → Sanitizer → Order::from_row
//! PATCH status → check_transition → transition_patch → OrderStore::update_order
//! ```

pub mod service;
pub mod state_machine;
pub mod validation;

pub use service::OrderService;
pub use state_machine::{
    DeliveryCodes, RandomCodes, TransitionError, TransitionSource, check_transition,
};
