//! 错误类型
//!
//! 业务错误统一映射为 HTTP 响应，响应体格式为 `{"detail": "..."}`

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::ErrorDetail;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Already exists")]
    AlreadyExists,
    #[error("Wrong symbol")]
    WrongSymbol,
    /// 数据源调用成功但没有返回任何可用指标
    #[error("Incomplete data for symbol {0}")]
    IncompleteData(String),
    #[error("Market data provider unavailable")]
    ProviderUnavailable(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("Not found")]
    NotFound,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Template(#[from] tera::Error),
}

impl AppError {
    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        AppError::InvalidInput(msg.into())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::AlreadyExists
            | AppError::WrongSymbol
            | AppError::IncompleteData(_)
            | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::ProviderUnavailable(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let detail = match self {
            AppError::Database(e) => {
                log::error!("数据库错误: {}", e);
                "Internal server error".to_string()
            }
            AppError::Template(e) => {
                log::error!("页面渲染失败: {:?}", e);
                "Internal server error".to_string()
            }
            AppError::ProviderUnavailable(e) => {
                log::error!("行情数据源不可用: {}", e);
                self.to_string()
            }
            _ => self.to_string(),
        };

        HttpResponse::build(self.status_code()).json(ErrorDetail { detail })
    }
}
