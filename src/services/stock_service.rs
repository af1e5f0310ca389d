//! 自选股业务逻辑
//!
//! 新增、查询、删除自选股，以及从数据源响应中提取指标

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{NewStock, Stock, StockFilter, StockMetrics};
use crate::services::provider::{MarketDataProvider, ProviderError, ProviderInfo};

// 数据源字段名
const FIELD_PRICE: &str = "previousClose";
const FIELD_MA50: &str = "fiftyDayAverage";
const FIELD_MA200: &str = "twoHundredDayAverage";
const FIELD_FORWARD_PE: &str = "forwardPE";
const FIELD_FORWARD_EPS: &str = "forwardEps";
const FIELD_DIVIDEND_YIELD: &str = "dividendYield";

fn symbol_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z0-9.\-=^]{1,16}$").expect("valid symbol regex"))
}

/// 规范化股票代码：去空白、转大写并校验字符集
pub fn normalize_symbol(raw: &str) -> AppResult<String> {
    let symbol = raw.trim().to_uppercase();
    if symbol_pattern().is_match(&symbol) {
        Ok(symbol)
    } else {
        Err(AppError::WrongSymbol)
    }
}

impl StockMetrics {
    /// 从数据源映射中提取六项指标
    ///
    /// 缺失或非数值字段记为空；股息率仅在存在时乘以 100 转为百分比。
    /// 六项全部缺失时返回 `None`，表示数据源没有该代码的可用数据。
    pub fn from_info(info: &ProviderInfo) -> Option<Self> {
        let number = |name: &str| info.get(name).and_then(Value::as_f64);

        let metrics = StockMetrics {
            price: number(FIELD_PRICE),
            ma50: number(FIELD_MA50),
            ma200: number(FIELD_MA200),
            forward_pe: number(FIELD_FORWARD_PE),
            forward_eps: number(FIELD_FORWARD_EPS),
            dividend_yield: number(FIELD_DIVIDEND_YIELD).map(|fraction| fraction * 100.0),
        };

        if metrics.is_empty() {
            None
        } else {
            Some(metrics)
        }
    }
}

/// 新增自选股
///
/// 1. 规范化并校验代码
/// 2. 已存在则直接拒绝，不请求数据源
/// 3. 请求数据源并提取指标
/// 4. 依赖唯一约束原子写入，并发写入同一代码时只有一个成功
pub async fn create_stock(
    db: &Database,
    provider: &dyn MarketDataProvider,
    raw_symbol: &str,
) -> AppResult<Stock> {
    let symbol = normalize_symbol(raw_symbol).map_err(|e| {
        log::warn!("拒绝非法股票代码: {:?}", raw_symbol);
        e
    })?;

    if Stock::exists(db.pool(), &symbol).await? {
        log::warn!("股票 {} 已存在", symbol);
        return Err(AppError::AlreadyExists);
    }

    let info = provider.fetch_info(&symbol).await.map_err(|e| match e {
        ProviderError::UnknownSymbol(_) => {
            log::warn!("数据源无法识别股票 {}: {}", symbol, e);
            AppError::WrongSymbol
        }
        // 鉴权失败、限流、服务端错误都不代表代码有误
        ProviderError::Status(_) | ProviderError::Transport(_) | ProviderError::Decode(_) => {
            log::error!("请求股票 {} 数据失败: {}", symbol, e);
            AppError::ProviderUnavailable(e.to_string())
        }
    })?;

    let metrics = StockMetrics::from_info(&info).ok_or_else(|| {
        log::warn!("数据源未返回股票 {} 的任何指标", symbol);
        AppError::IncompleteData(symbol.clone())
    })?;

    let new_stock = NewStock { symbol, metrics };
    match new_stock.insert(db.pool()).await? {
        Some(stock) => {
            log::info!("新增股票 {} (id={})", stock.symbol, stock.id);
            Ok(stock)
        }
        None => {
            log::warn!("股票 {} 已被并发写入", new_stock.symbol);
            Err(AppError::AlreadyExists)
        }
    }
}

/// 按过滤条件查询自选股
pub async fn list_stocks(db: &Database, filter: &StockFilter) -> AppResult<Vec<Stock>> {
    Ok(Stock::list(db.pool(), filter).await?)
}

/// 删除自选股
pub async fn delete_stock(db: &Database, id: i64) -> AppResult<()> {
    if Stock::delete(db.pool(), id).await? {
        log::info!("删除股票 id={}", id);
        Ok(())
    } else {
        Err(AppError::NotFound)
    }
}
