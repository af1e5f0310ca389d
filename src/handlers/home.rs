//! 列表页
//!
//! GET / 按查询参数过滤自选股并渲染页面

use actix_web::{web, HttpResponse};

use crate::error::AppResult;
use crate::handlers::AppState;
use crate::models::StockQuery;
use crate::services::stock_service;

pub async fn home(
    state: web::Data<AppState>,
    query: web::Query<StockQuery>,
) -> AppResult<HttpResponse> {
    let filter = query.to_filter()?;
    let stocks = stock_service::list_stocks(&state.db, &filter).await?;
    let html = state.views.render_home(&stocks, &query, &filter)?;

    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(home));
}
