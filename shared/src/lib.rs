//! Shared types for the dispatch engine
//!
//! Types used by the server and by its clients: error codes and the response
//! envelope, the order model, geographic primitives and lenient row parsing.

pub mod error;
pub mod geo;
pub mod order;
pub mod parse;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use geo::Coordinates;
pub use http;
pub use serde::{Deserialize, Serialize};
