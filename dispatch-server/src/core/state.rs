use std::sync::Arc;
use std::time::Instant;

use chrono::Duration;
use shared::order::PlacementEstimates;

use crate::core::{Config, Result, ServerError};
use crate::db::{MemoryStore, OrderStore, PostgrestStore};
use crate::dispatch::{DispatchConfig, DispatchService};
use crate::location::LocationResolver;
use crate::mapping::{MapboxClient, MappingProvider};
use crate::orders::OrderService;
use crate::routing::RouteEngine;
use crate::sanitizer::{InMemoryMetrics, SanitizationMetrics, Sanitizer};

fn estimate_minutes(name: &str, minutes: i64) -> Result<Duration> {
    Duration::try_minutes(minutes)
        .ok_or_else(|| ServerError::Config(format!("{name} is out of range: {minutes}")))
}

/// 服务器状态 - 持有所有服务的共享引用
///
/// 使用 Arc 实现浅拷贝，clone 成本极低。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | orders | OrderService | 下单、查询、状态流转 |
/// | dispatch | DispatchService | 可接单列表、指派、验码、导航 |
/// | store_backend | &'static str | 行存储类型 (postgrest / memory) |
/// | started_at | Instant | 启动时间 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    pub orders: OrderService,
    pub dispatch: DispatchService,
    pub store_backend: &'static str,
    pub started_at: Instant,
}

impl ServerState {
    /// 由已构造的组件组装状态
    ///
    /// 测试中可注入内存存储和假的地图服务
    ///
    /// # 错误
    ///
    /// 预计取餐 / 送达分钟数超出范围时返回 [`ServerError::Config`]
    pub fn with_parts(
        config: Config,
        store: Arc<dyn OrderStore>,
        provider: Arc<dyn MappingProvider>,
        metrics: Arc<dyn SanitizationMetrics>,
        store_backend: &'static str,
    ) -> Result<Self> {
        let estimates = PlacementEstimates {
            pickup: estimate_minutes("ESTIMATED_PICKUP_MINUTES", config.estimated_pickup_minutes)?,
            delivery: estimate_minutes(
                "ESTIMATED_DELIVERY_MINUTES",
                config.estimated_delivery_minutes,
            )?,
        };
        let orders = OrderService::new(store.clone(), Sanitizer::new(metrics), estimates);
        let dispatch = DispatchService::new(
            orders.clone(),
            LocationResolver::new(store, provider.clone()),
            RouteEngine::new(provider, config.max_destinations_per_request),
            DispatchConfig {
                enforce_single_active_delivery: config.enforce_single_active_delivery,
            },
        );

        Ok(Self {
            config,
            orders,
            dispatch,
            store_backend,
            started_at: Instant::now(),
        })
    }

    /// 初始化服务器状态
    ///
    /// 按以下顺序初始化:
    /// 1. 行存储 (PostgREST，开发环境缺省时退回内存存储)
    /// 2. 地图服务客户端 (Mapbox)
    /// 3. 清洗计数器、订单服务、调度服务
    ///
    /// # 错误
    ///
    /// 非开发环境缺少行存储地址时返回 [`ServerError::Config`]
    pub async fn initialize(config: &Config) -> Result<Self> {
        let (store, backend): (Arc<dyn OrderStore>, &'static str) =
            match (&config.store_url, &config.store_api_key) {
                (Some(url), Some(key)) => {
                    tracing::info!(url = %url, "Using PostgREST row store");
                    let store = PostgrestStore::new(url.as_str(), key.as_str(), config.upstream_timeout())?;
                    (Arc::new(store), "postgrest")
                }
                (Some(_), None) => {
                    return Err(ServerError::Config(
                        "PROJECT_URL is set but API_KEY is missing".into(),
                    ));
                }
                (None, _) if config.is_development() => {
                    tracing::warn!("No row store configured; using in-memory store (data is not persisted)");
                    (Arc::new(MemoryStore::new()), "memory")
                }
                (None, _) => {
                    return Err(ServerError::Config(format!(
                        "PROJECT_URL is required in the '{}' environment",
                        config.environment
                    )));
                }
            };

        if config.mapbox_token.is_none() {
            tracing::warn!("MAPBOX_TOKEN not set; geocoding disabled and routing unavailable");
        }
        let provider = MapboxClient::new(
            config.mapbox_base_url.as_str(),
            config.mapbox_token.clone(),
            config.upstream_timeout(),
            config.geocode_timeout(),
        )?;

        Self::with_parts(
            config.clone(),
            store,
            Arc::new(provider),
            Arc::new(InMemoryMetrics::new()),
            backend,
        )
    }
}
