//! In-memory row store
//!
//! Same semantics as the PostgREST store, held in process. Used when no
//! store URL is configured in development, and by tests.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use shared::geo::Coordinates;
use shared::parse;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{OrderQuery, OrderStore, Restaurant, Row, StoreError, StoreResult};

#[derive(Debug, Default)]
pub struct MemoryStore {
    orders: RwLock<Vec<Row>>,
    restaurants: RwLock<HashMap<i64, Row>>,
    users: RwLock<HashMap<String, Row>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a `restaurants` row (must carry an `id`)
    pub fn put_restaurant(&self, row: Value) {
        if let Value::Object(row) = row
            && let Some(id) = parse::integer(row.get("id"))
        {
            self.restaurants.write().insert(id, row);
        }
    }

    /// Seed a `users` row (must carry an `id`)
    pub fn put_user(&self, row: Value) {
        if let Value::Object(row) = row
            && let Some(id) = parse::text(row.get("id"))
        {
            self.users.write().insert(id, row);
        }
    }

    /// Seed an order row as-is, bypassing validation (legacy data)
    pub fn put_order(&self, row: Value) {
        if let Value::Object(row) = row {
            self.orders.write().push(row);
        }
    }

    /// Simulate a backend outage: every call fails while set
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("memory store marked unavailable".into()));
        }
        Ok(())
    }
}

fn order_id(row: &Row) -> Option<String> {
    parse::text(row.get("order_id"))
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, row: Row) -> StoreResult<Row> {
        self.check_available()?;
        let Some(id) = order_id(&row) else {
            return Err(StoreError::Backend("order row has no order_id".into()));
        };
        let mut orders = self.orders.write();
        if orders.iter().any(|r| order_id(r).as_ref() == Some(&id)) {
            return Err(StoreError::Backend(format!("duplicate order_id {id}")));
        }
        orders.push(row.clone());
        Ok(row)
    }

    async fn find_order(&self, id: &str) -> StoreResult<Option<Row>> {
        self.check_available()?;
        Ok(self
            .orders
            .read()
            .iter()
            .find(|r| order_id(r).as_deref() == Some(id))
            .cloned())
    }

    async fn update_order(&self, id: &str, patch: Row) -> StoreResult<Option<Row>> {
        self.check_available()?;
        let mut orders = self.orders.write();
        let Some(row) = orders.iter_mut().find(|r| order_id(r).as_deref() == Some(id)) else {
            return Ok(None);
        };
        for (key, value) in patch {
            row.insert(key, value);
        }
        Ok(Some(row.clone()))
    }

    async fn list_orders(&self, query: &OrderQuery) -> StoreResult<Vec<Row>> {
        self.check_available()?;
        let orders = self.orders.read();
        // newest first; ties keep the most recent insert first
        let mut matched: Vec<(usize, &Row)> = orders
            .iter()
            .enumerate()
            .filter(|(_, row)| query.matches(row))
            .collect();
        matched.sort_by(|(ia, a), (ib, b)| {
            let ta = parse::timestamp(a.get("created_at"));
            let tb = parse::timestamp(b.get("created_at"));
            tb.cmp(&ta).then(ib.cmp(ia))
        });
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(matched
            .into_iter()
            .skip(query.offset)
            .take(limit)
            .map(|(_, row)| row.clone())
            .collect())
    }

    async fn find_restaurants(&self, ids: &[i64]) -> StoreResult<Vec<Restaurant>> {
        self.check_available()?;
        let restaurants = self.restaurants.read();
        Ok(ids
            .iter()
            .filter_map(|id| restaurants.get(id))
            .filter_map(Restaurant::from_row)
            .collect())
    }

    async fn find_user_location(&self, user_id: &str) -> StoreResult<Option<Coordinates>> {
        self.check_available()?;
        Ok(self
            .users
            .read()
            .get(user_id)
            .and_then(|row| parse::coordinates(row.get("latitude"), row.get("longitude"))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared::order::OrderStatus;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_update_merges_patch() {
        let store = MemoryStore::new();
        store
            .insert_order(row(json!({"order_id": "o-1", "status": "pending", "notes": "x"})))
            .await
            .unwrap();

        let updated = store
            .update_order("o-1", row(json!({"status": "confirmed"})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["status"], "confirmed");
        assert_eq!(updated["notes"], "x");

        assert!(store.update_order("missing", Row::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_orders_newest_first_with_paging() {
        let store = MemoryStore::new();
        store.put_order(json!({"order_id": "a", "status": "ready", "created_at": "2024-01-01T10:00:00Z"}));
        store.put_order(json!({"order_id": "b", "status": "ready", "created_at": "2024-01-01T12:00:00Z"}));
        store.put_order(json!({"order_id": "c", "status": "pending", "created_at": "2024-01-01T11:00:00Z"}));

        let all = store.list_orders(&OrderQuery::new()).await.unwrap();
        let ids: Vec<_> = all.iter().map(|r| r["order_id"].as_str().unwrap()).collect();
        assert_eq!(ids, ["b", "c", "a"]);

        let ready = store
            .list_orders(&OrderQuery::new().status(OrderStatus::Ready).page(1, 1))
            .await
            .unwrap();
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0]["order_id"], "a");
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let store = MemoryStore::new();
        store.insert_order(row(json!({"order_id": "o-1"}))).await.unwrap();
        assert!(store.insert_order(row(json!({"order_id": "o-1"}))).await.is_err());
    }

    #[tokio::test]
    async fn test_user_location_needs_both_halves() {
        let store = MemoryStore::new();
        store.put_user(json!({"id": "u-1", "latitude": "30.1", "longitude": "-97.7"}));
        store.put_user(json!({"id": "u-2", "latitude": "", "longitude": "-97.7"}));

        assert!(store.find_user_location("u-1").await.unwrap().is_some());
        assert!(store.find_user_location("u-2").await.unwrap().is_none());
        assert!(store.find_user_location("u-3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unavailable_store_fails() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(store.find_order("o-1").await.is_err());
    }
}
