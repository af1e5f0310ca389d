//! 通用 API 响应模型
//!
//! 定义统一的 API 响应格式

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// 统一 API 响应结构
///
/// 所有 `/api/v1` 接口返回统一格式，包含：
/// - success: 请求是否成功
/// - data: 响应数据（成功时有值）
/// - message: 响应消息
/// - timestamp: 响应时间戳（UTC，RFC 3339）
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: String,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: "Success".to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// 错误响应体
///
/// 页面和接口的错误统一返回 `{"detail": "..."}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}
