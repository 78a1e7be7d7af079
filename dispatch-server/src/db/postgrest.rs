//! PostgREST (Supabase REST) row store

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use shared::geo::Coordinates;
use shared::parse;
use std::time::Duration;

use super::{OrderQuery, OrderStore, Restaurant, Row, StoreError, StoreResult};

const ORDERS: &str = "orders";
const RESTAURANTS: &str = "restaurants";
const USERS: &str = "users";

/// Row store backed by a PostgREST endpoint
#[derive(Debug, Clone)]
pub struct PostgrestStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PostgrestStore {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn rows(resp: Response) -> StoreResult<Vec<Row>> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        resp.json::<Vec<Row>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn select(&self, table: &str, params: &[(String, String)]) -> StoreResult<Vec<Row>> {
        let resp = self
            .authed(self.client.get(self.table_url(table)))
            .query(params)
            .send()
            .await?;
        Self::rows(resp).await
    }
}

fn eq(column: &str, value: impl std::fmt::Display) -> (String, String) {
    (column.to_string(), format!("eq.{value}"))
}

/// Translate an [`OrderQuery`] into PostgREST query parameters
pub fn order_query_params(query: &OrderQuery) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    match query.statuses.as_slice() {
        [] => {}
        [single] => params.push(eq("status", single)),
        many => {
            let list = many.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(",");
            params.push(("status".into(), format!("in.({list})")));
        }
    }
    if let Some(user_id) = &query.user_id {
        params.push(eq("user_id", user_id));
    }
    if let Some(restaurant_id) = query.restaurant_id {
        params.push(eq("restaurant_id", restaurant_id));
    }
    if let Some(courier) = &query.delivery_user_id {
        params.push(eq("delivery_user_id", courier));
    } else if query.unassigned {
        params.push(("delivery_user_id".into(), "is.null".into()));
    }
    params.push(("order".into(), "created_at.desc".into()));
    if let Some(limit) = query.limit {
        params.push(("limit".into(), limit.to_string()));
    }
    if query.offset > 0 {
        params.push(("offset".into(), query.offset.to_string()));
    }
    params
}

#[async_trait]
impl OrderStore for PostgrestStore {
    async fn insert_order(&self, row: Row) -> StoreResult<Row> {
        let resp = self
            .authed(self.client.post(self.table_url(ORDERS)))
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await?;
        Self::rows(resp)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("insert returned no rows".into()))
    }

    async fn find_order(&self, order_id: &str) -> StoreResult<Option<Row>> {
        let params = [
            ("select".to_string(), "*".to_string()),
            eq("order_id", order_id),
            ("limit".to_string(), "1".to_string()),
        ];
        Ok(self.select(ORDERS, &params).await?.into_iter().next())
    }

    async fn update_order(&self, order_id: &str, patch: Row) -> StoreResult<Option<Row>> {
        let resp = self
            .authed(self.client.patch(self.table_url(ORDERS)))
            .query(&[eq("order_id", order_id)])
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;
        Ok(Self::rows(resp).await?.into_iter().next())
    }

    async fn list_orders(&self, query: &OrderQuery) -> StoreResult<Vec<Row>> {
        self.select(ORDERS, &order_query_params(query)).await
    }

    async fn find_restaurants(&self, ids: &[i64]) -> StoreResult<Vec<Restaurant>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let list = ids.iter().map(i64::to_string).collect::<Vec<_>>().join(",");
        let params = [
            ("select".to_string(), "id,name,address,latitude,longitude".to_string()),
            ("id".to_string(), format!("in.({list})")),
        ];
        Ok(self
            .select(RESTAURANTS, &params)
            .await?
            .iter()
            .filter_map(Restaurant::from_row)
            .collect())
    }

    async fn find_user_location(&self, user_id: &str) -> StoreResult<Option<Coordinates>> {
        let params = [
            ("select".to_string(), "latitude,longitude".to_string()),
            eq("id", user_id),
            ("limit".to_string(), "1".to_string()),
        ];
        Ok(self
            .select(USERS, &params)
            .await?
            .first()
            .and_then(|row| parse::coordinates(row.get("latitude"), row.get("longitude"))))
    }
}
