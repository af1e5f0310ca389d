//! 页面渲染
//!
//! 基于 Tera 的服务端模板，只负责展示，不包含业务逻辑

use serde::Serialize;
use tera::{Context, Tera};

use crate::models::{Stock, StockFilter, StockQuery};

const HOME_TEMPLATE: &str = "home.html";

/// 列表页的一行，指标已格式化，缺失显示为 "-"
#[derive(Debug, Serialize)]
struct StockRow<'a> {
    id: i64,
    symbol: &'a str,
    price: String,
    ma50: String,
    ma200: String,
    forward_pe: String,
    forward_eps: String,
    dividend_yield: String,
}

impl<'a> From<&'a Stock> for StockRow<'a> {
    fn from(stock: &'a Stock) -> Self {
        Self {
            id: stock.id,
            symbol: &stock.symbol,
            price: format_metric(stock.price),
            ma50: format_metric(stock.ma50),
            ma200: format_metric(stock.ma200),
            forward_pe: format_metric(stock.forward_pe),
            forward_eps: format_metric(stock.forward_eps),
            dividend_yield: format_metric(stock.dividend_yield),
        }
    }
}

fn format_metric(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "-".to_string(),
    }
}

pub struct Views {
    tera: Tera,
}

impl Views {
    /// 加载内置模板
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_template(HOME_TEMPLATE, include_str!("../../templates/home.html"))?;
        Ok(Self { tera })
    }

    /// 渲染列表页：当前结果集 + 回显的过滤参数
    ///
    /// 数值条件原样回显，均线复选框以实际生效的过滤条件为准
    pub fn render_home(
        &self,
        stocks: &[Stock],
        query: &StockQuery,
        filter: &StockFilter,
    ) -> Result<String, tera::Error> {
        let rows: Vec<StockRow> = stocks.iter().map(StockRow::from).collect();

        let mut context = Context::new();
        context.insert("stocks", &rows);
        context.insert("forward_pe", query.forward_pe.as_deref().unwrap_or(""));
        context.insert("dividend_yield", query.dividend_yield.as_deref().unwrap_or(""));
        context.insert("above_ma50", &filter.above_ma50);
        context.insert("above_ma200", &filter.above_ma200);

        self.tera.render(HOME_TEMPLATE, &context)
    }
}
