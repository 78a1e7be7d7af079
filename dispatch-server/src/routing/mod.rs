//! Distance / route engine
//!
//! Batch mode fans a one-origin distance matrix out over chunks of at most
//! `max_destinations_per_request` destinations, issued concurrently and merged
//! back by restaurant id. Single-route mode fetches one driving route.

use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use shared::geo::Coordinates;
use std::collections::HashMap;
use std::sync::Arc;

use crate::mapping::{MappingProvider, ProviderResult, Route, RouteStep};

pub const METERS_PER_MILE: f64 = 1609.34;

/// Round half away from zero to `places` decimals
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Road cost from the origin to one destination; `None` = unreachable
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RoadCost {
    pub meters: Option<f64>,
    pub seconds: Option<f64>,
}

/// Per-order reachability annotation as sent to couriers
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Reachability {
    pub distance_to_restaurant: Option<f64>,
    pub duration_to_restaurant: Option<f64>,
    pub distance_to_restaurant_miles: Option<f64>,
    pub duration_to_restaurant_minutes: Option<f64>,
    pub restaurant_reachable_by_road: bool,
}

impl From<RoadCost> for Reachability {
    fn from(cost: RoadCost) -> Self {
        Self {
            distance_to_restaurant: cost.meters,
            duration_to_restaurant: cost.seconds,
            distance_to_restaurant_miles: cost.meters.map(|m| round_to(m / METERS_PER_MILE, 3)),
            duration_to_restaurant_minutes: cost.seconds.map(|s| round_to(s / 60.0, 1)),
            restaurant_reachable_by_road: cost.meters.is_some(),
        }
    }
}

/// A route as returned by the navigation endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSummary {
    pub distance_meters: f64,
    pub distance_miles: f64,
    pub duration_seconds: f64,
    pub duration_minutes: f64,
    pub geometry: Value,
    pub steps: Vec<RouteStep>,
}

impl From<Route> for RouteSummary {
    fn from(route: Route) -> Self {
        Self {
            distance_meters: route.distance_meters,
            distance_miles: round_to(route.distance_meters / METERS_PER_MILE, 3),
            duration_seconds: route.duration_seconds,
            duration_minutes: round_to(route.duration_seconds / 60.0, 1),
            geometry: route.geometry,
            steps: route.steps,
        }
    }
}

#[derive(Clone)]
pub struct RouteEngine {
    provider: Arc<dyn MappingProvider>,
    chunk_size: usize,
}

impl RouteEngine {
    pub fn new(provider: Arc<dyn MappingProvider>, max_destinations_per_request: usize) -> Self {
        Self {
            provider,
            chunk_size: max_destinations_per_request.max(1),
        }
    }

    /// Road costs from `origin` to each tagged destination.
    ///
    /// Every id in `destinations` is present in the result; a failed chunk
    /// leaves its destinations unreachable.
    pub async fn costs_from(
        &self,
        origin: Coordinates,
        destinations: &[(i64, Coordinates)],
    ) -> HashMap<i64, RoadCost> {
        let requests = destinations.chunks(self.chunk_size).map(|chunk| async move {
            let points: Vec<Coordinates> = chunk.iter().map(|(_, c)| *c).collect();
            let row = match self.provider.matrix(origin, &points).await {
                Ok(row) => Some(row),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        destinations = chunk.len(),
                        "Distance matrix chunk failed; marking destinations unreachable"
                    );
                    None
                }
            };
            chunk
                .iter()
                .enumerate()
                .map(|(i, (id, _))| {
                    let cost = row
                        .as_ref()
                        .map(|row| RoadCost {
                            meters: row.distances.get(i).copied().flatten(),
                            seconds: row.durations.get(i).copied().flatten(),
                        })
                        .unwrap_or_default();
                    (*id, cost)
                })
                .collect::<Vec<_>>()
        });

        join_all(requests).await.into_iter().flatten().collect()
    }

    /// First driving route from `from` to `to`, `None` when none exists
    pub async fn route(&self, from: Coordinates, to: Coordinates) -> ProviderResult<Option<Route>> {
        let routes = self.provider.directions(from, to).await?;
        Ok(routes.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{MatrixRow, ProviderError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    /// Matrix provider: destination `i` of a chunk costs `lat * 1000` meters;
    /// latitude 0 is unreachable; any chunk containing latitude 99 fails.
    #[derive(Default)]
    struct ScriptedMatrix {
        chunk_sizes: Mutex<Vec<usize>>,
        routes: Vec<Route>,
    }

    #[async_trait]
    impl MappingProvider for ScriptedMatrix {
        async fn geocode(&self, _: &str) -> ProviderResult<Option<Coordinates>> {
            Ok(None)
        }

        async fn matrix(&self, _: Coordinates, d: &[Coordinates]) -> ProviderResult<MatrixRow> {
            self.chunk_sizes.lock().push(d.len());
            if d.iter().any(|c| c.latitude == 99.0) {
                return Err(ProviderError::Status {
                    status: 500,
                    body: "boom".into(),
                });
            }
            let cost = |c: &Coordinates| (c.latitude != 0.0).then_some(c.latitude * 1000.0);
            Ok(MatrixRow {
                distances: d.iter().map(cost).collect(),
                durations: d.iter().map(|c| cost(c).map(|m| m / 10.0)).collect(),
            })
        }

        async fn directions(&self, _: Coordinates, _: Coordinates) -> ProviderResult<Vec<Route>> {
            Ok(self.routes.clone())
        }
    }

    fn destinations(lats: &[f64]) -> Vec<(i64, Coordinates)> {
        lats.iter()
            .enumerate()
            .map(|(i, lat)| (i as i64 + 1, Coordinates::new(*lat, 0.0)))
            .collect()
    }

    #[tokio::test]
    async fn test_chunks_and_merges_by_id() {
        let provider = Arc::new(ScriptedMatrix::default());
        let engine = RouteEngine::new(provider.clone(), 2);
        let dests = destinations(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        let costs = engine.costs_from(Coordinates::new(0.0, 0.0), &dests).await;

        assert_eq!(costs.len(), 5);
        let mut sizes = provider.chunk_sizes.lock().clone();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![1, 2, 2]);
        for (id, c) in &dests {
            assert_eq!(costs[id].meters, Some(c.latitude * 1000.0));
            assert_eq!(costs[id].seconds, Some(c.latitude * 100.0));
        }
    }

    #[tokio::test]
    async fn test_null_cell_is_unreachable_not_zero() {
        let engine = RouteEngine::new(Arc::new(ScriptedMatrix::default()), 24);
        let costs = engine
            .costs_from(Coordinates::new(0.0, 0.0), &destinations(&[0.0, 2.0]))
            .await;
        assert_eq!(costs[&1], RoadCost::default());
        assert_eq!(costs[&2].meters, Some(2000.0));
    }

    #[tokio::test]
    async fn test_failed_chunk_degrades_only_its_destinations() {
        let engine = RouteEngine::new(Arc::new(ScriptedMatrix::default()), 2);
        let costs = engine
            .costs_from(Coordinates::new(0.0, 0.0), &destinations(&[1.0, 99.0, 3.0]))
            .await;
        assert_eq!(costs[&1], RoadCost::default());
        assert_eq!(costs[&2], RoadCost::default());
        assert_eq!(costs[&3].meters, Some(3000.0));
    }

    #[tokio::test]
    async fn test_no_destinations_makes_no_requests() {
        let provider = Arc::new(ScriptedMatrix::default());
        let engine = RouteEngine::new(provider.clone(), 24);
        assert!(engine.costs_from(Coordinates::new(0.0, 0.0), &[]).await.is_empty());
        assert!(provider.chunk_sizes.lock().is_empty());
    }

    #[test]
    fn test_reachability_annotation() {
        let r = Reachability::from(RoadCost {
            meters: Some(1609.34 * 2.5),
            seconds: Some(125.0),
        });
        assert_eq!(r.distance_to_restaurant_miles, Some(2.5));
        assert_eq!(r.duration_to_restaurant_minutes, Some(2.1));
        assert!(r.restaurant_reachable_by_road);

        let r = Reachability::from(RoadCost::default());
        assert!(!r.restaurant_reachable_by_road);
        let json = serde_json::to_value(r).unwrap();
        assert_eq!(json["distance_to_restaurant"], Value::Null);
        assert_eq!(json["duration_to_restaurant_minutes"], Value::Null);
    }

    #[tokio::test]
    async fn test_route_takes_first() {
        let route = |m: f64| Route {
            distance_meters: m,
            duration_seconds: 60.0,
            geometry: json!({"type": "LineString", "coordinates": []}),
            steps: Vec::new(),
        };
        let provider = ScriptedMatrix {
            routes: vec![route(1609.34), route(5.0)],
            ..Default::default()
        };
        let engine = RouteEngine::new(Arc::new(provider), 24);
        let found = engine
            .route(Coordinates::new(0.0, 0.0), Coordinates::new(1.0, 1.0))
            .await
            .unwrap()
            .unwrap();

        let summary = RouteSummary::from(found);
        assert_eq!(summary.distance_miles, 1.0);
        assert_eq!(summary.duration_minutes, 1.0);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(2.0833333, 1), 2.1);
        assert_eq!(round_to(2.25, 1), 2.3);
        assert_eq!(round_to(1.23456, 3), 1.235);
    }
}
