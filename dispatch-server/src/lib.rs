//! Dispatch Server - 外卖订单生命周期与骑手调度引擎
//!
//! # 架构概述
//!
//! - **订单** (`orders`): 下单校验、状态机、收货码
//! - **金额清洗** (`sanitizer`): 读取路径上修正历史订单的小计/总价
//! - **位置解析** (`location`): 餐厅 / 顾客坐标的回退链
//! - **路线** (`routing`): 分块距离矩阵、单条导航路线
//! - **调度** (`dispatch`): 可接单列表、指派、验码、导航
//! - **HTTP API** (`api`): RESTful 接口
//!
//! # 模块结构
//!
//! ```text
//! dispatch-server/src/
//! ├── core/          # 配置、状态、错误、服务器
//! ├── db/            # 行存储 (PostgREST / 内存)
//! ├── mapping/       # 地图服务 (Mapbox)
//! ├── location/      # 坐标解析
//! ├── routing/       # 距离矩阵与路线
//! ├── sanitizer/     # 金额清洗与计数
//! ├── orders/        # 订单生命周期
//! ├── dispatch/      # 骑手调度
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 日志、校验
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod dispatch;
pub mod location;
pub mod mapping;
pub mod orders;
pub mod routing;
pub mod sanitizer;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, Server, ServerError, ServerState};
pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 加载 .env 并初始化日志
pub fn setup_environment() -> Result<(), ServerError> {
    if let Err(e) = dotenv::dotenv()
        && !e.not_found()
    {
        return Err(ServerError::Config(format!("Failed to load .env: {e}")));
    }

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref());
    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
    ____  _                  __       __
   / __ \(_)________  ____ _/ /______/ /_
  / / / / / ___/ __ \/ __ `/ __/ ___/ __ \
 / /_/ / (__  ) /_/ / /_/ / /_/ /__/ / / /
/_____/_/____/ .___/\__,_/\__/\___/_/ /_/
            /_/
    "#
    );
}
