//! 自选股后端服务
//!
//! 维护一份股票代码自选列表，新增时从 Yahoo Finance 拉取估值与均线指标，
//! 存入 SQLite，并在服务端渲染的列表页中展示和过滤

mod config;     // 配置加载
mod db;         // 持久化层
mod error;      // 错误类型
mod handlers;   // HTTP 请求处理器
mod models;     // 数据模型定义
mod services;   // 业务逻辑服务
mod views;      // 页面渲染

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use env_logger::Env;

use crate::config::AppConfig;
use crate::db::Database;
use crate::handlers::AppState;
use crate::services::provider::YahooFinanceProvider;
use crate::views::Views;

/// 应用程序入口
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    // 初始化日志系统，RUST_LOG 优先于配置文件
    env_logger::init_from_env(Env::default().default_filter_or(config.log.level.as_str()));

    match &config.source {
        Some(path) => log::info!("从 {} 加载配置成功", path),
        None => log::info!("未找到配置文件，使用默认配置"),
    }

    let db = Database::connect(&config.database)
        .await
        .with_context(|| format!("连接数据库 {} 失败", config.database.url))?;
    db.ensure_schema().await.context("初始化 stocks 表失败")?;

    let provider = YahooFinanceProvider::new(&config.provider)?;
    let views = Views::new().context("加载页面模板失败")?;

    let state = web::Data::new(AppState {
        db,
        provider: Arc::new(provider),
        views,
    });

    let bind_addr = config.bind_addr();
    log::info!("启动自选股服务，监听 {}", bind_addr);

    // 创建并启动 HTTP 服务器
    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())  // 添加请求日志中间件
            .app_data(state.clone())
            .configure(handlers::config)  // 配置路由
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server.bind(&bind_addr)?.run().await?;
    Ok(())
}
