//! 健康检查
//!
//! GET /api/v1/health 同时探测数据库连接是否可用

use actix_web::{web, HttpResponse};

use crate::error::AppResult;
use crate::handlers::AppState;
use crate::models::ApiResponse;

pub async fn health_check(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    sqlx::query("SELECT 1").execute(state.db.pool()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Service is healthy")))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}
