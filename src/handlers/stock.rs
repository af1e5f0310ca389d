//! 自选股接口
//!
//! - POST /stock             新增股票，成功后 303 跳转回列表页
//! - DELETE /stock/{id}      删除股票
//! - GET /api/v1/stocks      JSON 格式的列表，过滤参数同列表页

use actix_web::{http::header, web, HttpResponse};

use crate::error::AppResult;
use crate::handlers::AppState;
use crate::models::{ApiResponse, StockQuery, StockRequest};
use crate::services::stock_service;

pub async fn create_stock(
    state: web::Data<AppState>,
    body: web::Json<StockRequest>,
) -> AppResult<HttpResponse> {
    stock_service::create_stock(&state.db, state.provider.as_ref(), &body.symbol).await?;

    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, "/"))
        .finish())
}

pub async fn delete_stock(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    stock_service::delete_stock(&state.db, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn list_stocks(
    state: web::Data<AppState>,
    query: web::Query<StockQuery>,
) -> AppResult<HttpResponse> {
    let filter = query.to_filter()?;
    let stocks = stock_service::list_stocks(&state.db, &filter).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(stocks)))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/stock")
            .route("", web::post().to(create_stock))
            .route("/{id}", web::delete().to(delete_stock))
    );
}

pub fn api_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/stocks", web::get().to(list_stocks));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    use crate::db::Database;
    use crate::handlers::{self, AppState};
    use crate::models::Stock;
    use crate::services::provider::{ProviderError, ProviderInfo};
    use crate::services::testing::StubProvider;
    use crate::views::Views;

    fn info(value: Value) -> ProviderInfo {
        value.as_object().cloned().unwrap()
    }

    fn acme_info() -> ProviderInfo {
        info(json!({
            "twoHundredDayAverage": 150.0,
            "fiftyDayAverage": 140.0,
            "previousClose": 145.0,
            "forwardPE": 18.2,
            "forwardEps": 7.9,
            "dividendYield": 0.021
        }))
    }

    async fn state(provider: StubProvider) -> web::Data<AppState> {
        web::Data::new(AppState {
            db: Database::in_memory().await.unwrap(),
            provider: Arc::new(provider),
            views: Views::new().unwrap(),
        })
    }

    fn stub() -> StubProvider {
        StubProvider::new()
            .with_info("ACME", acme_info())
            .with_info(
                // 价格等于两条均线
                "FLAT",
                info(json!({
                    "twoHundredDayAverage": 100.0,
                    "fiftyDayAverage": 100.0,
                    "previousClose": 100.0
                })),
            )
            .with_info("EMPTY", ProviderInfo::new())
            .with_error("DOWN", || ProviderError::Decode("truncated".into()))
    }

    async fn all_rows(state: &web::Data<AppState>) -> Vec<Stock> {
        Stock::list(state.db.pool(), &Default::default()).await.unwrap()
    }

    fn post_stock(symbol: &str) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/stock")
            .set_json(json!({ "symbol": symbol }))
    }

    #[actix_web::test]
    async fn test_create_stock_redirects_and_stores_row() {
        let state = state(stub()).await;
        let app = test::init_service(
            App::new().app_data(state.clone()).configure(handlers::config),
        )
        .await;

        let resp = test::call_service(&app, post_stock("ACME").to_request()).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/");

        let rows = all_rows(&state).await;
        assert_eq!(rows.len(), 1);
        let acme = &rows[0];
        assert_eq!(acme.symbol, "ACME");
        assert_eq!(acme.ma200, Some(150.0));
        assert_eq!(acme.ma50, Some(140.0));
        assert_eq!(acme.price, Some(145.0));
        assert_eq!(acme.forward_pe, Some(18.2));
        assert_eq!(acme.forward_eps, Some(7.9));
        assert!((acme.dividend_yield.unwrap() - 2.1).abs() < 1e-9);
    }

    #[actix_web::test]
    async fn test_create_stock_error_details() {
        let state = state(stub()).await;
        let app = test::init_service(
            App::new().app_data(state.clone()).configure(handlers::config),
        )
        .await;

        let resp = test::call_service(&app, post_stock("ACME").to_request()).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);

        let cases = [
            ("ACME", StatusCode::BAD_REQUEST, "Already exists"),
            ("NOPE", StatusCode::BAD_REQUEST, "Wrong symbol"),
            ("no such", StatusCode::BAD_REQUEST, "Wrong symbol"),
            ("EMPTY", StatusCode::BAD_REQUEST, "Incomplete data for symbol EMPTY"),
            ("DOWN", StatusCode::BAD_GATEWAY, "Market data provider unavailable"),
        ];

        for (symbol, status, detail) in cases {
            let resp = test::call_service(&app, post_stock(symbol).to_request()).await;
            assert_eq!(resp.status(), status, "symbol {}", symbol);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body, json!({ "detail": detail }), "symbol {}", symbol);
        }

        // 失败路径不产生任何写入
        assert_eq!(all_rows(&state).await.len(), 1);
    }

    #[actix_web::test]
    async fn test_create_stock_rejects_malformed_body() {
        let state = state(stub()).await;
        let app = test::init_service(
            App::new().app_data(state.clone()).configure(handlers::config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/stock")
            .set_json(json!({ "ticker": "ACME" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["detail"].as_str().unwrap().contains("symbol"));
    }

    #[actix_web::test]
    async fn test_home_filters_render_rows() {
        let state = state(stub()).await;
        let app = test::init_service(
            App::new().app_data(state.clone()).configure(handlers::config),
        )
        .await;

        for symbol in ["ACME", "FLAT"] {
            let resp = test::call_service(&app, post_stock(symbol).to_request()).await;
            assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        }

        let cases = [
            ("/", vec!["ACME", "FLAT"]),
            // 145 > 140
            ("/?ma50=1", vec!["ACME"]),
            // 145 < 150，严格比较下 FLAT 也被排除
            ("/?ma50=1&ma200=1", vec![]),
            ("/?ma200=1", vec![]),
            ("/?forward_pe=20", vec!["ACME"]),
            ("/?forward_pe=18.2", vec![]),
            ("/?dividend_yield=2", vec!["ACME"]),
            ("/?forward_pe=&dividend_yield=&ma50=", vec!["ACME", "FLAT"]),
        ];

        for (uri, expected) in cases {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK, "uri {}", uri);
            let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();

            for symbol in ["ACME", "FLAT"] {
                let shown = html.contains(&format!("<td>{}</td>", symbol));
                assert_eq!(shown, expected.contains(&symbol), "uri {} symbol {}", uri, symbol);
            }
        }
    }

    #[actix_web::test]
    async fn test_home_rejects_non_numeric_bound() {
        let state = state(stub()).await;
        let app = test::init_service(
            App::new().app_data(state.clone()).configure(handlers::config),
        )
        .await;

        let req = test::TestRequest::get().uri("/?forward_pe=abc").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "detail": "Invalid value for forward_pe" }));
    }

    #[actix_web::test]
    async fn test_api_list_and_delete() {
        let state = state(stub()).await;
        let app = test::init_service(
            App::new().app_data(state.clone()).configure(handlers::config),
        )
        .await;

        test::call_service(&app, post_stock("ACME").to_request()).await;

        let req = test::TestRequest::get().uri("/api/v1/stocks?ma50=1").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], json!(true));
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["symbol"], "ACME");
        let id = data[0]["id"].as_i64().unwrap();

        let req = test::TestRequest::delete().uri(&format!("/stock/{}", id)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::delete().uri(&format!("/stock/{}", id)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "detail": "Not found" }));

        assert!(all_rows(&state).await.is_empty());
    }

    #[actix_web::test]
    async fn test_health() {
        let state = state(stub()).await;
        let app = test::init_service(
            App::new().app_data(state.clone()).configure(handlers::config),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["data"], "Service is healthy");
    }
}
