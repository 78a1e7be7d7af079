//! 服务层 / 启动错误
//!
//! `ServiceError` 连接存储、地图服务层错误 (`StoreError`, `ProviderError`)
//! 与 API 层错误 (`AppError`)，使 `?` 可以直接传播。

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

use crate::db::StoreError;
use crate::mapping::ProviderError;

/// 启动期错误
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("HTTP 客户端初始化失败: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

/// 服务层错误
///
/// - `Store`: 行存储故障 (自动记录日志，映射为 DatabaseError)
/// - `Provider`: 地图服务故障且没有回退路径
/// - `App`: 业务规则错误 (原样返回客户端)
#[derive(Debug)]
pub enum ServiceError {
    Store(StoreError),
    Provider(ProviderError),
    App(AppError),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        ServiceError::Store(e)
    }
}

impl From<ProviderError> for ServiceError {
    fn from(e: ProviderError) -> Self {
        ServiceError::Provider(e)
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Store(store_err) => {
                tracing::error!(error = %store_err, "Row store error");
                AppError::new(ErrorCode::DatabaseError)
            }
            ServiceError::Provider(provider_err) => {
                tracing::warn!(error = %provider_err, "Mapping provider error");
                match provider_err {
                    ProviderError::Timeout => AppError::new(ErrorCode::TimeoutError),
                    _ => AppError::new(ErrorCode::UpstreamUnavailable),
                }
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

/// 服务层 Result 类型别名
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// 启动期 Result 类型别名
pub type Result<T> = std::result::Result<T, ServerError>;
