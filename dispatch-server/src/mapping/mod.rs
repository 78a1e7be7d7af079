//! Mapping provider (geocoding, distance matrix, directions)
//!
//! [`MappingProvider`] is the seam; [`MapboxClient`] talks to the Mapbox REST
//! API. Everything above this module sees coordinates, meters and seconds,
//! never provider JSON.

pub mod mapbox;

pub use mapbox::MapboxClient;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use shared::geo::Coordinates;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("mapping provider is not configured")]
    NotConfigured,

    #[error("mapping provider request timed out")]
    Timeout,

    #[error("mapping provider request failed: {0}")]
    Request(String),

    #[error("mapping provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected mapping provider response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else if e.is_decode() {
            ProviderError::Decode(e.to_string())
        } else {
            ProviderError::Request(e.to_string())
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Origin-to-destination costs, one entry per requested destination.
///
/// `None` means the provider reported the destination as unreachable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatrixRow {
    pub distances: Vec<Option<f64>>,
    pub durations: Vec<Option<f64>>,
}

impl MatrixRow {
    /// A row where every destination is unreachable
    pub fn unreachable(len: usize) -> Self {
        Self {
            distances: vec![None; len],
            durations: vec![None; len],
        }
    }
}

/// One maneuver of a route
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteStep {
    pub instruction: String,
    pub distance: f64,
    pub duration: f64,
    pub maneuver_type: Option<String>,
}

/// A driving route between two points
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub distance_meters: f64,
    pub duration_seconds: f64,
    /// GeoJSON geometry, passed through untouched
    pub geometry: Value,
    pub steps: Vec<RouteStep>,
}

#[async_trait]
pub trait MappingProvider: Send + Sync {
    /// Forward-geocode a free-text address. `Ok(None)` when nothing matched.
    async fn geocode(&self, address: &str) -> ProviderResult<Option<Coordinates>>;

    /// Driving costs from `origin` to each destination, in request order
    async fn matrix(
        &self,
        origin: Coordinates,
        destinations: &[Coordinates],
    ) -> ProviderResult<MatrixRow>;

    /// Driving routes from `from` to `to`; empty when no route exists
    async fn directions(&self, from: Coordinates, to: Coordinates) -> ProviderResult<Vec<Route>>;
}
