//! Delivery dispatch
//!
//! Courier-facing operations: ready-order listing with road reachability,
//! courier assignment, delivery code verification and turn-by-turn navigation.
//!
//! Assignment is check-then-write with no lock or compare-and-set: two couriers
//! assigning the same order concurrently both pass the status check and the
//! later write wins.

use serde::Serialize;
use serde_json::json;
use shared::error::{AppError, ErrorCode};
use shared::geo::Coordinates;
use shared::order::{Order, OrderStatus};

use crate::core::error::ServiceResult;
use crate::db::{OrderQuery, Restaurant, Row};
use crate::location::LocationResolver;
use crate::mapping::ProviderError;
use crate::orders::{OrderService, TransitionError, TransitionSource};
use crate::routing::{Reachability, RouteEngine, RouteSummary};

/// Dispatch business rules
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchConfig {
    /// A courier may hold at most one order in `assigned` / `picked_up` / `en_route`
    pub enforce_single_active_delivery: bool,
}

/// Restaurant block embedded in listings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestaurantSummary {
    pub id: i64,
    pub name: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl RestaurantSummary {
    fn new(restaurant: &Restaurant, coordinates: Option<Coordinates>) -> Self {
        Self {
            id: restaurant.id,
            name: restaurant.name.clone(),
            address: restaurant.address.clone(),
            latitude: coordinates.map(|c| c.latitude),
            longitude: coordinates.map(|c| c.longitude),
        }
    }
}

/// A ready order as listed to couriers
#[derive(Debug, Clone, Serialize)]
pub struct ReadyDelivery {
    #[serde(flatten)]
    pub order: Order,
    pub restaurant: Option<RestaurantSummary>,
    #[serde(flatten)]
    pub reachability: Reachability,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteType {
    ToRestaurant,
    ToCustomer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Destination {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
}

/// Navigation response
#[derive(Debug, Clone, Serialize)]
pub struct Navigation {
    pub order_id: String,
    pub status: OrderStatus,
    pub route_type: RouteType,
    pub origin: Coordinates,
    pub destination: Destination,
    pub route: RouteSummary,
}

#[derive(Clone)]
pub struct DispatchService {
    orders: OrderService,
    resolver: LocationResolver,
    routes: RouteEngine,
    config: DispatchConfig,
}

impl DispatchService {
    pub fn new(
        orders: OrderService,
        resolver: LocationResolver,
        routes: RouteEngine,
        config: DispatchConfig,
    ) -> Self {
        Self {
            orders,
            resolver,
            routes,
            config,
        }
    }

    /// Ready, unassigned orders annotated with road cost from `courier`.
    ///
    /// Each distinct restaurant is resolved once; orders keep store order.
    pub async fn list_ready(&self, courier: Coordinates) -> ServiceResult<Vec<ReadyDelivery>> {
        let query = OrderQuery::new().status(OrderStatus::Ready).unassigned();
        let orders = self.orders.list(&query).await?;
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = orders.iter().map(|o| o.restaurant_id).collect();
        let restaurants = self.resolver.restaurants(&ids).await;

        let mut destinations: Vec<(i64, Coordinates)> = restaurants
            .values()
            .filter_map(|r| r.coordinates.map(|c| (r.restaurant.id, c)))
            .collect();
        destinations.sort_unstable_by_key(|(id, _)| *id);
        let costs = self.routes.costs_from(courier, &destinations).await;

        tracing::debug!(
            orders = orders.len(),
            restaurants = restaurants.len(),
            routable = destinations.len(),
            "Listed ready deliveries"
        );

        Ok(orders
            .into_iter()
            .map(|order| {
                let id = order.restaurant_id;
                ReadyDelivery {
                    restaurant: restaurants
                        .get(&id)
                        .map(|r| RestaurantSummary::new(&r.restaurant, r.coordinates)),
                    reachability: costs.get(&id).copied().unwrap_or_default().into(),
                    order,
                }
            })
            .collect())
    }

    /// Give an order to a courier and move it to `assigned`
    pub async fn assign(&self, order_id: &str, delivery_user_id: &str) -> ServiceResult<Order> {
        let delivery_user_id = delivery_user_id.trim();
        if delivery_user_id.is_empty() {
            return Err(AppError::with_message(
                ErrorCode::RequiredField,
                "delivery_user_id is required",
            )
            .into());
        }

        let order = self.orders.get(order_id).await?;
        if !matches!(order.status, OrderStatus::Ready | OrderStatus::Confirmed) {
            return Err(AppError::new(ErrorCode::OrderNotAssignable)
                .with_detail("status", order.status.as_str())
                .into());
        }

        if self.config.enforce_single_active_delivery {
            let query = OrderQuery::new()
                .courier(delivery_user_id)
                .statuses(&OrderStatus::ACTIVE_DELIVERY);
            let active = self.orders.list(&query).await?;
            if let Some(held) = active.iter().find(|o| o.order_id != order.order_id) {
                return Err(AppError::new(ErrorCode::CourierBusy)
                    .with_detail("delivery_user_id", delivery_user_id)
                    .with_detail("active_order_id", held.order_id.as_str())
                    .into());
            }
        }

        let mut extra = Row::new();
        extra.insert("delivery_user_id".into(), json!(delivery_user_id));
        let assigned = self
            .orders
            .transition(&order, OrderStatus::Assigned, TransitionSource::StatusUpdate, extra)
            .await?;
        tracing::info!(order_id = %order_id, delivery_user_id = %delivery_user_id, "Courier assigned");
        Ok(assigned)
    }

    /// Check the customer's code and complete the delivery
    pub async fn verify_delivery(&self, order_id: &str, code: Option<&str>) -> ServiceResult<Order> {
        let submitted = code.map(str::trim).unwrap_or_default();
        if submitted.is_empty() {
            return Err(AppError::new(ErrorCode::DeliveryCodeRequired).into());
        }

        let order = self.orders.get(order_id).await?;
        if !order.status.is_out_for_delivery() {
            return Err(AppError::from(TransitionError {
                from: order.status,
                to: OrderStatus::Delivered,
            })
            .into());
        }

        let Some(expected) = order.delivery_code.as_deref().map(str::trim) else {
            return Err(AppError::new(ErrorCode::DeliveryCodeNotIssued).into());
        };
        if submitted != expected {
            tracing::warn!(order_id = %order_id, "Delivery code mismatch");
            return Err(AppError::new(ErrorCode::DeliveryCodeInvalid).into());
        }

        let delivered = self
            .orders
            .transition(&order, OrderStatus::Delivered, TransitionSource::DeliveryVerification, Row::new())
            .await?;
        tracing::info!(order_id = %order_id, "Delivery verified");
        Ok(delivered)
    }

    /// Route for the current leg of an active delivery
    pub async fn navigation(&self, order_id: &str, driver: Coordinates) -> ServiceResult<Navigation> {
        let order = self.orders.get(order_id).await?;
        let route_type = match order.status {
            OrderStatus::Assigned => RouteType::ToRestaurant,
            OrderStatus::PickedUp | OrderStatus::EnRoute => RouteType::ToCustomer,
            other => {
                return Err(AppError::new(ErrorCode::NavigationNotApplicable)
                    .with_detail("status", other.as_str())
                    .into());
            }
        };

        let Some((restaurant, restaurant_at)) = self
            .resolver
            .restaurant_by_id(order.restaurant_id)
            .await
            .and_then(|r| r.coordinates.map(|c| (r.restaurant, c)))
        else {
            return Err(AppError::new(ErrorCode::RestaurantLocationUnavailable)
                .with_detail("restaurant_id", order.restaurant_id)
                .into());
        };

        let (origin, destination) = match route_type {
            RouteType::ToRestaurant => (
                driver,
                Destination {
                    name: restaurant.name.unwrap_or_else(|| "Restaurant".into()),
                    latitude: restaurant_at.latitude,
                    longitude: restaurant_at.longitude,
                    address: restaurant.address,
                },
            ),
            RouteType::ToCustomer => {
                let Some(customer) = self.resolver.customer(&order).await else {
                    return Err(AppError::new(ErrorCode::CustomerLocationUnavailable).into());
                };
                let address = order.delivery_address.formatted();
                (
                    restaurant_at,
                    Destination {
                        name: "Customer".into(),
                        latitude: customer.latitude,
                        longitude: customer.longitude,
                        address: (!address.is_empty()).then_some(address),
                    },
                )
            }
        };

        let to = Coordinates::new(destination.latitude, destination.longitude);
        let route = match self.routes.route(origin, to).await {
            Ok(Some(route)) => route,
            Ok(None) => return Err(AppError::new(ErrorCode::NoRouteFound).into()),
            Err(ProviderError::Status { status, body }) => {
                tracing::warn!(status, body = %body, order_id = %order_id, "Directions request rejected");
                return Err(AppError::with_message(
                    ErrorCode::InvalidRequest,
                    "Routing provider rejected the request",
                )
                .with_detail("provider_status", status)
                .into());
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Navigation {
            order_id: order.order_id,
            status: order.status,
            route_type,
            origin,
            destination,
            route: route.into(),
        })
    }
}
