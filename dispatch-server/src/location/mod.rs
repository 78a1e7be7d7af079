//! Location resolution
//!
//! Best-available coordinates for restaurants and customers, tried through an
//! ordered list of sources. Resolution never fails: upstream errors are
//! logged and the chain continues, and a chain with nothing left yields
//! `None`.
//!
//! | Chain | Sources, in order |
//! |-------|-------------------|
//! | restaurant | stored lat/lng → geocode of restaurant address |
//! | customer | order lat/lng → geocode of delivery address → user profile lat/lng |
//!
//! A customer with a delivery address that fails to geocode does not fall
//! through to the profile; the address is authoritative once present.

use futures::future::join_all;
use shared::geo::Coordinates;
use shared::order::Order;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::{OrderStore, Restaurant};
use crate::mapping::MappingProvider;

/// Outcome of trying one source
#[derive(Debug, Clone, Copy, PartialEq)]
enum Step {
    Found(Coordinates),
    /// Source had nothing; try the next one
    Next,
    /// Source was authoritative but unusable; give up
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RestaurantSource {
    Stored,
    GeocodedAddress,
}

const RESTAURANT_CHAIN: [RestaurantSource; 2] =
    [RestaurantSource::Stored, RestaurantSource::GeocodedAddress];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CustomerSource {
    OrderCoordinates,
    DeliveryAddress,
    UserProfile,
}

const CUSTOMER_CHAIN: [CustomerSource; 3] = [
    CustomerSource::OrderCoordinates,
    CustomerSource::DeliveryAddress,
    CustomerSource::UserProfile,
];

/// A restaurant together with its resolved position
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRestaurant {
    pub restaurant: Restaurant,
    pub coordinates: Option<Coordinates>,
}

#[derive(Clone)]
pub struct LocationResolver {
    store: Arc<dyn OrderStore>,
    provider: Arc<dyn MappingProvider>,
}

impl LocationResolver {
    pub fn new(store: Arc<dyn OrderStore>, provider: Arc<dyn MappingProvider>) -> Self {
        Self { store, provider }
    }

    async fn geocode(&self, address: &str) -> Option<Coordinates> {
        match self.provider.geocode(address).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(address = %address, error = %e, "Geocoding failed");
                None
            }
        }
    }

    /// Resolve a restaurant's coordinates
    pub async fn restaurant(&self, restaurant: &Restaurant) -> Option<Coordinates> {
        for source in RESTAURANT_CHAIN {
            let step = match source {
                RestaurantSource::Stored => match restaurant.coordinates {
                    Some(c) => Step::Found(c),
                    None => Step::Next,
                },
                RestaurantSource::GeocodedAddress => match restaurant.address.as_deref() {
                    Some(address) => match self.geocode(address).await {
                        Some(c) => Step::Found(c),
                        None => Step::Next,
                    },
                    None => Step::Next,
                },
            };
            match step {
                Step::Found(c) => return Some(c),
                Step::Next => continue,
                Step::Stop => return None,
            }
        }
        tracing::debug!(restaurant_id = restaurant.id, "Restaurant location unresolved");
        None
    }

    /// Load and resolve a set of restaurants, each id once.
    ///
    /// Ids the store does not know are absent from the result.
    pub async fn restaurants(&self, ids: &[i64]) -> HashMap<i64, ResolvedRestaurant> {
        let mut unique = ids.to_vec();
        unique.sort_unstable();
        unique.dedup();

        let rows = match self.store.find_restaurants(&unique).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load restaurants; treating as unresolved");
                return HashMap::new();
            }
        };

        let resolved = join_all(rows.into_iter().map(|restaurant| async move {
            let coordinates = self.restaurant(&restaurant).await;
            ResolvedRestaurant {
                restaurant,
                coordinates,
            }
        }))
        .await;

        resolved
            .into_iter()
            .map(|r| (r.restaurant.id, r))
            .collect()
    }

    /// Resolve one restaurant by id
    pub async fn restaurant_by_id(&self, id: i64) -> Option<ResolvedRestaurant> {
        self.restaurants(&[id]).await.remove(&id)
    }

    /// Resolve the customer drop-off point for an order
    pub async fn customer(&self, order: &Order) -> Option<Coordinates> {
        for source in CUSTOMER_CHAIN {
            let step = match source {
                CustomerSource::OrderCoordinates => match order.coordinates() {
                    Some(c) => Step::Found(c),
                    None => Step::Next,
                },
                CustomerSource::DeliveryAddress => {
                    let address = order.delivery_address.formatted();
                    if address.is_empty() {
                        Step::Next
                    } else {
                        match self.geocode(&address).await {
                            Some(c) => Step::Found(c),
                            None => Step::Stop,
                        }
                    }
                }
                CustomerSource::UserProfile => {
                    match self.store.find_user_location(&order.user_id).await {
                        Ok(Some(c)) => Step::Found(c),
                        Ok(None) => Step::Next,
                        Err(e) => {
                            tracing::warn!(user_id = %order.user_id, error = %e, "Failed to load user profile location");
                            Step::Next
                        }
                    }
                }
            };
            match step {
                Step::Found(c) => return Some(c),
                Step::Next => continue,
                Step::Stop => break,
            }
        }
        tracing::debug!(order_id = %order.order_id, "Customer location unresolved");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::mapping::{MatrixRow, ProviderError, ProviderResult, Route};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    /// Geocoder with canned answers; records every lookup
    #[derive(Default)]
    struct FakeGeocoder {
        answers: HashMap<String, Coordinates>,
        fail: bool,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MappingProvider for FakeGeocoder {
        async fn geocode(&self, address: &str) -> ProviderResult<Option<Coordinates>> {
            self.calls.lock().push(address.to_string());
            if self.fail {
                return Err(ProviderError::Timeout);
            }
            Ok(self.answers.get(address).copied())
        }

        async fn matrix(&self, _: Coordinates, d: &[Coordinates]) -> ProviderResult<MatrixRow> {
            Ok(MatrixRow::unreachable(d.len()))
        }

        async fn directions(&self, _: Coordinates, _: Coordinates) -> ProviderResult<Vec<Route>> {
            Ok(Vec::new())
        }
    }

    fn order(value: serde_json::Value) -> Order {
        Order::from_row(value.as_object().unwrap()).unwrap()
    }

    fn resolver(store: MemoryStore, geocoder: FakeGeocoder) -> (LocationResolver, Arc<FakeGeocoder>) {
        let geocoder = Arc::new(geocoder);
        (
            LocationResolver::new(Arc::new(store), geocoder.clone()),
            geocoder,
        )
    }

    #[tokio::test]
    async fn test_restaurant_prefers_stored_coordinates() {
        let (resolver, geocoder) = resolver(MemoryStore::new(), FakeGeocoder::default());
        let r = Restaurant {
            id: 1,
            name: None,
            address: Some("1 Main St".into()),
            coordinates: Some(Coordinates::new(1.0, 2.0)),
        };
        assert_eq!(resolver.restaurant(&r).await, Some(Coordinates::new(1.0, 2.0)));
        assert!(geocoder.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_restaurant_falls_back_to_geocode() {
        let mut geocoder = FakeGeocoder::default();
        geocoder
            .answers
            .insert("1 Main St".into(), Coordinates::new(5.0, 6.0));
        let store = MemoryStore::new();
        store.put_restaurant(json!({"id": 4, "address": "1 Main St", "latitude": "", "longitude": ""}));
        let (resolver, _) = resolver(store, geocoder);

        let resolved = resolver.restaurant_by_id(4).await.unwrap();
        assert_eq!(resolved.coordinates, Some(Coordinates::new(5.0, 6.0)));
    }

    #[tokio::test]
    async fn test_restaurant_unresolved_when_geocode_errors() {
        let geocoder = FakeGeocoder {
            fail: true,
            ..Default::default()
        };
        let (resolver, _) = resolver(MemoryStore::new(), geocoder);
        let r = Restaurant {
            id: 1,
            name: None,
            address: Some("nowhere".into()),
            coordinates: None,
        };
        assert_eq!(resolver.restaurant(&r).await, None);
    }

    #[tokio::test]
    async fn test_customer_uses_order_coordinates_first() {
        let (resolver, geocoder) = resolver(MemoryStore::new(), FakeGeocoder::default());
        let o = order(json!({
            "order_id": "o-1", "status": "picked_up", "user_id": "u-1",
            "latitude": 30.0, "longitude": "-97.0",
            "delivery_address": {"street": "1 Main St"},
        }));
        assert_eq!(resolver.customer(&o).await, Some(Coordinates::new(30.0, -97.0)));
        assert!(geocoder.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_customer_geocodes_address() {
        let mut geocoder = FakeGeocoder::default();
        geocoder.answers.insert(
            "500 Congress Ave, Austin, TX 78701".into(),
            Coordinates::new(30.27, -97.74),
        );
        let (resolver, _) = resolver(MemoryStore::new(), geocoder);
        let o = order(json!({
            "order_id": "o-1", "status": "picked_up", "user_id": "u-1",
            "delivery_address": {"street": "500 Congress Ave", "city": "Austin", "state": "TX", "zip_code": "78701"},
        }));
        assert_eq!(resolver.customer(&o).await, Some(Coordinates::new(30.27, -97.74)));
    }

    #[tokio::test]
    async fn test_customer_address_failure_does_not_fall_back_to_profile() {
        let store = MemoryStore::new();
        store.put_user(json!({"id": "u-1", "latitude": 1.0, "longitude": 1.0}));
        let (resolver, geocoder) = resolver(store, FakeGeocoder::default());
        let o = order(json!({
            "order_id": "o-1", "status": "en_route", "user_id": "u-1",
            "delivery_address": {"street": "Unknown Rd"},
        }));
        assert_eq!(resolver.customer(&o).await, None);
        assert_eq!(geocoder.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_customer_without_address_uses_profile() {
        let store = MemoryStore::new();
        store.put_user(json!({"id": "u-1", "latitude": "12.5", "longitude": "-3.25"}));
        let (resolver, geocoder) = resolver(store, FakeGeocoder::default());
        let o = order(json!({"order_id": "o-1", "status": "en_route", "user_id": "u-1"}));
        assert_eq!(resolver.customer(&o).await, Some(Coordinates::new(12.5, -3.25)));
        assert!(geocoder.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_customer_nothing_available() {
        let (resolver, _) = resolver(MemoryStore::new(), FakeGeocoder::default());
        let o = order(json!({"order_id": "o-1", "status": "en_route", "user_id": "u-9"}));
        assert_eq!(resolver.customer(&o).await, None);
    }
}
