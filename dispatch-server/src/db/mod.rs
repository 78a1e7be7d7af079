//! Row store access
//!
//! The engine never talks to a database directly; it goes through
//! [`OrderStore`], a thin row-query interface (select / insert / update /
//! filter). Two implementations:
//!
//! | Store | Used for |
//! |-------|----------|
//! | [`PostgrestStore`] | Supabase / PostgREST over HTTP |
//! | [`MemoryStore`] | development without a backend, tests |
//!
//! Rows cross this boundary as JSON objects ([`Row`]); callers convert them
//! into typed values immediately.

pub mod memory;
pub mod postgrest;

pub use memory::MemoryStore;
pub use postgrest::PostgrestStore;

use async_trait::async_trait;
use serde_json::{Map, Value};
use shared::geo::Coordinates;
use shared::order::OrderStatus;
use shared::parse;
use thiserror::Error;

/// A raw row from any table
pub type Row = Map<String, Value>;

/// Store error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Row store request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Row store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected row store response: {0}")]
    Decode(String),

    #[error("Row store error: {0}")]
    Backend(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Filter for order listings; results are always `created_at` descending
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderQuery {
    pub statuses: Vec<OrderStatus>,
    pub user_id: Option<String>,
    pub restaurant_id: Option<i64>,
    pub delivery_user_id: Option<String>,
    /// Only orders without a courier
    pub unassigned: bool,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl OrderQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: OrderStatus) -> Self {
        self.statuses = vec![status];
        self
    }

    pub fn statuses(mut self, statuses: &[OrderStatus]) -> Self {
        self.statuses = statuses.to_vec();
        self
    }

    /// Optional single-status filter, as exposed by `?status_filter=`
    pub fn status_opt(self, status: Option<OrderStatus>) -> Self {
        match status {
            Some(s) => self.status(s),
            None => self,
        }
    }

    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn restaurant(mut self, restaurant_id: i64) -> Self {
        self.restaurant_id = Some(restaurant_id);
        self
    }

    pub fn courier(mut self, delivery_user_id: impl Into<String>) -> Self {
        self.delivery_user_id = Some(delivery_user_id.into());
        self
    }

    pub fn unassigned(mut self) -> Self {
        self.unassigned = true;
        self
    }

    pub fn page(mut self, limit: usize, offset: usize) -> Self {
        self.limit = Some(limit);
        self.offset = offset;
        self
    }

    /// Whether a row satisfies every filter (used by [`MemoryStore`])
    pub fn matches(&self, row: &Row) -> bool {
        if !self.statuses.is_empty() {
            let status = parse::text(row.get("status")).and_then(|s| s.parse::<OrderStatus>().ok());
            if !status.is_some_and(|s| self.statuses.contains(&s)) {
                return false;
            }
        }
        if let Some(user_id) = &self.user_id
            && parse::text(row.get("user_id")).as_ref() != Some(user_id)
        {
            return false;
        }
        if let Some(restaurant_id) = self.restaurant_id
            && parse::integer(row.get("restaurant_id")) != Some(restaurant_id)
        {
            return false;
        }
        let courier = parse::text(row.get("delivery_user_id"));
        if let Some(delivery_user_id) = &self.delivery_user_id
            && courier.as_ref() != Some(delivery_user_id)
        {
            return false;
        }
        !(self.unassigned && courier.is_some())
    }
}

/// Read-only restaurant record
#[derive(Debug, Clone, PartialEq)]
pub struct Restaurant {
    pub id: i64,
    pub name: Option<String>,
    pub address: Option<String>,
    pub coordinates: Option<Coordinates>,
}

impl Restaurant {
    /// Lenient read of a `restaurants` row; rows without an id are skipped
    pub fn from_row(row: &Row) -> Option<Self> {
        Some(Self {
            id: parse::integer(row.get("id"))?,
            name: parse::text(row.get("name")),
            address: parse::text(row.get("address")),
            coordinates: parse::coordinates(row.get("latitude"), row.get("longitude")),
        })
    }
}

/// Row-query interface to the persistence collaborator
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert an order row, returning the stored representation
    async fn insert_order(&self, row: Row) -> StoreResult<Row>;

    async fn find_order(&self, order_id: &str) -> StoreResult<Option<Row>>;

    /// Patch the given columns; `None` when the order does not exist
    async fn update_order(&self, order_id: &str, patch: Row) -> StoreResult<Option<Row>>;

    async fn list_orders(&self, query: &OrderQuery) -> StoreResult<Vec<Row>>;

    async fn find_restaurants(&self, ids: &[i64]) -> StoreResult<Vec<Restaurant>>;

    /// Saved profile coordinates of a user, if both halves parse
    async fn find_user_location(&self, user_id: &str) -> StoreResult<Option<Coordinates>>;
}
