//! 工具模块 - 通用工具函数
//!
//! - [`logger`] - 日志初始化
//! - [`validation`] - 输入校验 (长度限制、金额)

pub mod logger;
pub mod validation;
