//! 自选股数据模型
//!
//! 定义持久化的股票记录、新增请求以及列表过滤参数

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// 自选股记录
///
/// 对应 `stocks` 表的一行，所有指标都可能为空（数据源可能缺失字段）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Stock {
    /// 自增主键
    pub id: i64,
    /// 股票代码，唯一
    pub symbol: String,
    /// 最新收盘价
    pub price: Option<f64>,
    /// 50 日均线
    pub ma50: Option<f64>,
    /// 200 日均线
    pub ma200: Option<f64>,
    /// 预期市盈率
    pub forward_pe: Option<f64>,
    /// 预期每股收益
    pub forward_eps: Option<f64>,
    /// 股息率（百分比）
    pub dividend_yield: Option<f64>,
}

/// 从数据源提取出的指标
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockMetrics {
    pub price: Option<f64>,
    pub ma50: Option<f64>,
    pub ma200: Option<f64>,
    pub forward_pe: Option<f64>,
    pub forward_eps: Option<f64>,
    pub dividend_yield: Option<f64>,
}

impl StockMetrics {
    pub fn is_empty(&self) -> bool {
        *self == StockMetrics::default()
    }
}

/// 待写入的新记录
#[derive(Debug, Clone)]
pub struct NewStock {
    pub symbol: String,
    pub metrics: StockMetrics,
}

/// POST /stock 请求体
#[derive(Debug, Deserialize)]
pub struct StockRequest {
    pub symbol: String,
}

/// 列表页查询参数（原始字符串形式）
///
/// `ma50`/`ma200` 只看是否出现，不作为数值解析
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct StockQuery {
    pub forward_pe: Option<String>,
    pub dividend_yield: Option<String>,
    pub ma50: Option<String>,
    pub ma200: Option<String>,
}

/// 类型化的过滤条件，多个条件之间为 AND 关系
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StockFilter {
    /// forward_pe 严格小于该值
    pub max_forward_pe: Option<f64>,
    /// dividend_yield 严格大于该值
    pub min_dividend_yield: Option<f64>,
    /// 价格高于 50 日均线
    pub above_ma50: bool,
    /// 价格高于 200 日均线
    pub above_ma200: bool,
}

impl StockQuery {
    /// 解析为类型化过滤条件
    ///
    /// 空字符串视为未提供；数值参数无法解析时返回 `InvalidInput`
    pub fn to_filter(&self) -> AppResult<StockFilter> {
        Ok(StockFilter {
            max_forward_pe: parse_bound("forward_pe", self.forward_pe.as_deref())?,
            min_dividend_yield: parse_bound("dividend_yield", self.dividend_yield.as_deref())?,
            above_ma50: is_present(self.ma50.as_deref()),
            above_ma200: is_present(self.ma200.as_deref()),
        })
    }
}

fn parse_bound(name: &str, value: Option<&str>) -> AppResult<Option<f64>> {
    let value = match value.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(v) => v,
    };

    match value.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(Some(n)),
        _ => Err(AppError::invalid_input(format!("Invalid value for {}", name))),
    }
}

fn is_present(value: Option<&str>) -> bool {
    value.map(|v| !v.trim().is_empty()).unwrap_or(false)
}
