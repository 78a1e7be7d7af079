use std::time::Duration;

/// 服务器配置 - 调度引擎的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | HTTP_PORT | 8000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | PROJECT_URL / SUPABASE_URL | - | 行存储 (PostgREST) 地址，缺省时使用内存存储 |
/// | API_KEY / SUPABASE_KEY | - | 行存储 API key |
/// | MAPBOX_TOKEN | - | 地图服务 token |
/// | MAPBOX_BASE_URL | https://api.mapbox.com | 地图服务地址 |
/// | MAX_DEST_PER_MATRIX | 24 | 每次距离矩阵请求的最大目的地数 |
/// | UPSTREAM_TIMEOUT_MS | 20000 | 上游请求超时(毫秒) |
/// | GEOCODE_TIMEOUT_MS | 10000 | 地理编码超时(毫秒) |
/// | ENFORCE_SINGLE_ACTIVE_DELIVERY | false | 骑手同时只能持有一单 |
/// | ESTIMATED_PICKUP_MINUTES | 30 | 下单时预计取餐时间 |
/// | ESTIMATED_DELIVERY_MINUTES | 60 | 下单时预计送达时间 |
/// | CORS_ALLOWED_ORIGIN | http://localhost:3000 | 前端来源 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | - | 日志目录 (按天滚动) |
///
/// # 示例
///
/// ```ignore
/// PROJECT_URL=https://xyz.supabase.co API_KEY=... MAPBOX_TOKEN=pk.... cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,

    // === 行存储 ===
    /// PostgREST 基础地址
    pub store_url: Option<String>,
    /// PostgREST API key
    pub store_api_key: Option<String>,

    // === 地图服务 ===
    pub mapbox_token: Option<String>,
    pub mapbox_base_url: String,
    /// 每次矩阵请求的最大目的地数 (至少 1)
    pub max_destinations_per_request: usize,
    /// 行存储 / 路线请求超时 (毫秒)
    pub upstream_timeout_ms: u64,
    /// 地理编码超时 (毫秒)
    pub geocode_timeout_ms: u64,

    // === 业务规则 ===
    pub enforce_single_active_delivery: bool,
    pub estimated_pickup_minutes: i64,
    pub estimated_delivery_minutes: i64,

    pub cors_allowed_origin: String,
    pub log_level: String,
    pub log_dir: Option<String>,
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_opt(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            http_port: env_parse("HTTP_PORT", 8000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),

            store_url: env_opt(&["PROJECT_URL", "SUPABASE_URL"]),
            store_api_key: env_opt(&["API_KEY", "SUPABASE_KEY"]),

            mapbox_token: env_opt(&["MAPBOX_TOKEN"]),
            mapbox_base_url: env_opt(&["MAPBOX_BASE_URL"])
                .unwrap_or_else(|| "https://api.mapbox.com".into()),
            max_destinations_per_request: env_parse("MAX_DEST_PER_MATRIX", 24usize).max(1),
            upstream_timeout_ms: env_parse("UPSTREAM_TIMEOUT_MS", 20_000),
            geocode_timeout_ms: env_parse("GEOCODE_TIMEOUT_MS", 10_000),

            enforce_single_active_delivery: env_parse("ENFORCE_SINGLE_ACTIVE_DELIVERY", false),
            estimated_pickup_minutes: env_parse("ESTIMATED_PICKUP_MINUTES", 30),
            estimated_delivery_minutes: env_parse("ESTIMATED_DELIVERY_MINUTES", 60),

            cors_allowed_origin: std::env::var("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: env_opt(&["LOG_DIR"]),
        }
    }

    /// 开发环境下的纯内存配置 (无行存储、无地图服务)
    ///
    /// 常用于测试场景
    pub fn in_memory() -> Self {
        let mut config = Self::from_env();
        config.environment = "development".into();
        config.store_url = None;
        config.store_api_key = None;
        config.mapbox_token = None;
        config
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }

    pub fn geocode_timeout(&self) -> Duration {
        Duration::from_millis(self.geocode_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
