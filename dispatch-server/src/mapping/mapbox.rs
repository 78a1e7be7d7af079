//! Mapbox REST client
//!
//! | API | Path |
//! |-----|------|
//! | Geocoding v5 | `/geocoding/v5/mapbox.places/{address}.json` |
//! | Matrix v1 | `/directions-matrix/v1/mapbox/driving/{coords}` |
//! | Directions v5 | `/directions/v5/mapbox/driving/{from};{to}` |

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde_json::Value;
use shared::geo::Coordinates;
use shared::parse;
use std::time::Duration;

use super::{MappingProvider, MatrixRow, ProviderError, ProviderResult, Route, RouteStep};

#[derive(Debug, Clone)]
pub struct MapboxClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    geocode_timeout: Duration,
}

impl MapboxClient {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
        geocode_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            geocode_timeout,
        })
    }

    fn token(&self) -> ProviderResult<&str> {
        self.token.as_deref().ok_or(ProviderError::NotConfigured)
    }

    async fn json(resp: Response) -> ProviderResult<Value> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json::<Value>().await?)
    }
}

/// Geocoding URL with the address as a single percent-encoded path segment
pub fn geocode_url(base_url: &str, address: &str) -> ProviderResult<Url> {
    let mut url = Url::parse(&format!("{base_url}/geocoding/v5/mapbox.places"))
        .map_err(|e| ProviderError::Request(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| ProviderError::Request("base url cannot be a base".into()))?
        .push(&format!("{address}.json"));
    Ok(url)
}

/// First feature centre, `[lng, lat]`
pub fn parse_geocode(body: &Value) -> Option<Coordinates> {
    let center = body.get("features")?.get(0)?.get("center")?;
    let lng = parse::number(center.get(0))?;
    let lat = parse::number(center.get(1))?;
    Some(Coordinates::new(lat, lng))
}

/// Path and query parameters of a one-to-many matrix request.
///
/// A single destination uses the plain pair request (no `sources` /
/// `destinations`); larger requests pin the origin as source 0.
pub fn matrix_request(
    origin: Coordinates,
    destinations: &[Coordinates],
) -> (String, Vec<(&'static str, String)>) {
    let coords = std::iter::once(origin)
        .chain(destinations.iter().copied())
        .map(|c| c.lng_lat())
        .collect::<Vec<_>>()
        .join(";");
    let mut params = vec![("annotations", "distance,duration".to_string())];
    if destinations.len() > 1 {
        let indices = (1..=destinations.len())
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(";");
        params.push(("sources", "0".to_string()));
        params.push(("destinations", indices));
    }
    (coords, params)
}

/// Extract the origin row of a matrix response, aligned with the request.
///
/// Missing rows or cells read as unreachable.
pub fn parse_matrix(body: &Value, destination_count: usize) -> MatrixRow {
    // single pair requests come back as a full 2x2 matrix
    let offset = usize::from(destination_count == 1);
    let read = |key: &str| -> Vec<Option<f64>> {
        let row = body.get(key).and_then(|m| m.get(0));
        (0..destination_count)
            .map(|i| row.and_then(|r| parse::number(r.get(i + offset))))
            .collect()
    };
    MatrixRow {
        distances: read("distances"),
        durations: read("durations"),
    }
}

/// Routes of a directions response; empty when none were returned
pub fn parse_directions(body: &Value) -> Vec<Route> {
    let Some(routes) = body.get("routes").and_then(Value::as_array) else {
        return Vec::new();
    };
    routes
        .iter()
        .map(|route| {
            let steps = route
                .get("legs")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(|leg| leg.get("steps").and_then(Value::as_array))
                .flatten()
                .map(|step| RouteStep {
                    instruction: step
                        .pointer("/maneuver/instruction")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    distance: parse::number(step.get("distance")).unwrap_or(0.0),
                    duration: parse::number(step.get("duration")).unwrap_or(0.0),
                    maneuver_type: step
                        .pointer("/maneuver/type")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                })
                .collect();
            Route {
                distance_meters: parse::number(route.get("distance")).unwrap_or(0.0),
                duration_seconds: parse::number(route.get("duration")).unwrap_or(0.0),
                geometry: route.get("geometry").cloned().unwrap_or(Value::Null),
                steps,
            }
        })
        .collect()
}

#[async_trait]
impl MappingProvider for MapboxClient {
    async fn geocode(&self, address: &str) -> ProviderResult<Option<Coordinates>> {
        let Some(token) = self.token.as_deref() else {
            tracing::debug!("Geocoding skipped: no mapping token configured");
            return Ok(None);
        };
        let address = address.trim();
        if address.is_empty() {
            return Ok(None);
        }
        let url = geocode_url(&self.base_url, address)?;
        let resp = self
            .client
            .get(url)
            .query(&[("access_token", token), ("limit", "1")])
            .timeout(self.geocode_timeout)
            .send()
            .await?;
        Ok(parse_geocode(&Self::json(resp).await?))
    }

    async fn matrix(
        &self,
        origin: Coordinates,
        destinations: &[Coordinates],
    ) -> ProviderResult<MatrixRow> {
        if destinations.is_empty() {
            return Ok(MatrixRow::default());
        }
        let token = self.token()?;
        let (coords, params) = matrix_request(origin, destinations);
        let url = format!(
            "{}/directions-matrix/v1/mapbox/driving/{}",
            self.base_url, coords
        );
        let resp = self
            .client
            .get(url)
            .query(&[("access_token", token)])
            .query(&params)
            .send()
            .await?;
        Ok(parse_matrix(&Self::json(resp).await?, destinations.len()))
    }

    async fn directions(&self, from: Coordinates, to: Coordinates) -> ProviderResult<Vec<Route>> {
        let token = self.token()?;
        let url = format!(
            "{}/directions/v5/mapbox/driving/{};{}",
            self.base_url,
            from.lng_lat(),
            to.lng_lat()
        );
        let resp = self
            .client
            .get(url)
            .query(&[
                ("access_token", token),
                ("steps", "true"),
                ("geometries", "geojson"),
                ("overview", "full"),
            ])
            .send()
            .await?;
        Ok(parse_directions(&Self::json(resp).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_geocode_url_encodes_address() {
        let url = geocode_url("https://api.mapbox.com", "500 Congress Ave, Austin, TX 78701").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.mapbox.com/geocoding/v5/mapbox.places/500%20Congress%20Ave,%20Austin,%20TX%2078701.json"
        );
    }

    #[test]
    fn test_parse_geocode_center_is_lng_lat() {
        let body = json!({"features": [{"center": [-97.74, 30.27]}]});
        assert_eq!(parse_geocode(&body), Some(Coordinates::new(30.27, -97.74)));
        assert_eq!(parse_geocode(&json!({"features": []})), None);
        assert_eq!(parse_geocode(&json!({})), None);
    }

    #[test]
    fn test_matrix_request_single_destination() {
        let (coords, params) =
            matrix_request(Coordinates::new(1.0, 2.0), &[Coordinates::new(3.0, 4.0)]);
        assert_eq!(coords, "2,1;4,3");
        assert!(!params.iter().any(|(k, _)| *k == "sources"));
        assert!(!params.iter().any(|(k, _)| *k == "destinations"));
    }

    #[test]
    fn test_matrix_request_many_destinations() {
        let dests = [
            Coordinates::new(3.0, 4.0),
            Coordinates::new(5.0, 6.0),
            Coordinates::new(7.0, 8.0),
        ];
        let (coords, params) = matrix_request(Coordinates::new(1.0, 2.0), &dests);
        assert_eq!(coords, "2,1;4,3;6,5;8,7");
        assert!(params.contains(&("sources", "0".to_string())));
        assert!(params.contains(&("destinations", "1;2;3".to_string())));
        assert!(params.contains(&("annotations", "distance,duration".to_string())));
    }

    #[test]
    fn test_parse_matrix_single_reads_column_one() {
        let body = json!({
            "distances": [[0.0, 1609.34], [1609.34, 0.0]],
            "durations": [[0.0, 120.0], [120.0, 0.0]],
        });
        let row = parse_matrix(&body, 1);
        assert_eq!(row.distances, vec![Some(1609.34)]);
        assert_eq!(row.durations, vec![Some(120.0)]);
    }

    #[test]
    fn test_parse_matrix_null_is_unreachable() {
        let body = json!({
            "distances": [[1000.0, null, 3000.0]],
            "durations": [[60.0, null, 180.0]],
        });
        let row = parse_matrix(&body, 3);
        assert_eq!(row.distances, vec![Some(1000.0), None, Some(3000.0)]);
        assert_eq!(row.durations[1], None);

        let empty = parse_matrix(&json!({}), 2);
        assert_eq!(empty, MatrixRow::unreachable(2));
    }

    #[test]
    fn test_parse_directions_collects_steps_across_legs() {
        let body = json!({
            "routes": [{
                "distance": 1609.34,
                "duration": 300.0,
                "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]},
                "legs": [
                    {"steps": [{"distance": 100.0, "duration": 20.0, "maneuver": {"instruction": "Head north", "type": "depart"}}]},
                    {"steps": [{"distance": 0.0, "duration": 0.0, "maneuver": {"instruction": "Arrive", "type": "arrive"}}]},
                ],
            }]
        });
        let routes = parse_directions(&body);
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].steps.len(), 2);
        assert_eq!(routes[0].steps[0].instruction, "Head north");
        assert_eq!(routes[0].steps[1].maneuver_type.as_deref(), Some("arrive"));
        assert_eq!(routes[0].geometry["type"], "LineString");
    }

    #[test]
    fn test_parse_directions_no_routes() {
        assert!(parse_directions(&json!({"code": "NoRoute", "routes": []})).is_empty());
        assert!(parse_directions(&json!({"code": "NoRoute"})).is_empty());
    }

    #[tokio::test]
    async fn test_unconfigured_client() {
        let client = MapboxClient::new(
            "https://api.mapbox.com",
            None,
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.geocode("1 Main St").await.unwrap(), None);
        let err = client
            .matrix(Coordinates::new(0.0, 0.0), &[Coordinates::new(1.0, 1.0)])
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured));
    }
}
