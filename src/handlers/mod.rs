pub mod home;
pub mod stock;
pub mod health;

use std::sync::Arc;

use actix_web::{error, web};

use crate::db::Database;
use crate::error::AppError;
use crate::services::provider::MarketDataProvider;
use crate::views::Views;

/// 请求处理器共享的依赖，进程启动时构建一次
pub struct AppState {
    pub db: Database,
    pub provider: Arc<dyn MarketDataProvider>,
    pub views: Views,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    // 请求体/查询参数解析失败也返回 {"detail": ...}
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        error::Error::from(AppError::invalid_input(err.to_string()))
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        error::Error::from(AppError::invalid_input(err.to_string()))
    }))
    .configure(home::config)
    .configure(stock::config)
    .service(
        web::scope("/api/v1")
            .configure(health::config)
            .configure(stock::api_config),
    );
}
