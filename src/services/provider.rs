//! 行情数据源
//!
//! 按股票代码获取一组命名的财务字段。对外只暴露字段名到值的映射，
//! 字段名与 Yahoo Finance 的 `info` 保持一致（`previousClose`、`forwardPE` 等）。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::Mutex;
use url::Url;

use crate::config::ProviderConfig;

/// 字段名到值的映射
pub type ProviderInfo = Map<String, Value>;

/// quoteSummary 需要请求的模块
const QUOTE_SUMMARY_MODULES: [&str; 2] = ["summaryDetail", "defaultKeyStatistics"];

#[derive(Debug, Error)]
pub enum ProviderError {
    /// 网络层失败：连接、超时、读取响应体
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// 数据源自身出错（鉴权失败、限流、5xx 等），与代码是否有效无关
    #[error("unexpected status {0}")]
    Status(u16),
    /// 仅来自 404 或 quoteSummary 的 error 负载
    #[error("unknown symbol {0}")]
    UnknownSymbol(String),
    #[error("invalid response: {0}")]
    Decode(String),
}

/// 行情数据源接口
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch_info(&self, symbol: &str) -> Result<ProviderInfo, ProviderError>;
}

/// Yahoo Finance quoteSummary 接口实现
///
/// 首次请求前先完成会话握手：访问 `session_url` 拿到 cookie，
/// 再用 `{base_url}/v1/test/getcrumb` 换取 crumb，crumb 缓存复用。
///
/// GET {base_url}/v10/finance/quoteSummary/{symbol}?modules=summaryDetail,defaultKeyStatistics&crumb=...
pub struct YahooFinanceProvider {
    client: Client,
    base_url: Url,
    session_url: Url,
    crumb: Mutex<Option<String>>,
}

impl YahooFinanceProvider {
    pub fn new(config: &ProviderConfig) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("数据源地址 {} 不能作为根地址", config.base_url);
        }
        let session_url = Url::parse(&config.session_url)?;

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .cookie_store(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            session_url,
            crumb: Mutex::new(None),
        })
    }

    fn endpoint_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn quote_summary_url(&self, symbol: &str, crumb: &str) -> Url {
        let mut url = self.endpoint_url(&["v10", "finance", "quoteSummary", symbol]);
        url.query_pairs_mut()
            .append_pair("modules", &QUOTE_SUMMARY_MODULES.join(","))
            .append_pair("crumb", crumb);
        url
    }

    /// 取缓存的 crumb，没有则完成一次握手
    async fn crumb(&self) -> Result<String, ProviderError> {
        let mut cached = self.crumb.lock().await;
        if let Some(crumb) = cached.as_ref() {
            return Ok(crumb.clone());
        }

        // 会话页只为写入 cookie，状态码无关紧要
        self.client.get(self.session_url.clone()).send().await?;

        let response = self
            .client
            .get(self.endpoint_url(&["v1", "test", "getcrumb"]))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let crumb = response.text().await?.trim().to_string();
        if crumb.is_empty() {
            return Err(ProviderError::Decode("empty crumb".to_string()));
        }

        log::debug!("获取 Yahoo crumb 成功");
        *cached = Some(crumb.clone());
        Ok(crumb)
    }

    /// crumb 失效后清空缓存，下次请求重新握手
    async fn invalidate_crumb(&self) {
        self.crumb.lock().await.take();
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceProvider {
    async fn fetch_info(&self, symbol: &str) -> Result<ProviderInfo, ProviderError> {
        let crumb = self.crumb().await?;
        let url = self.quote_summary_url(symbol, &crumb);
        log::debug!("请求行情数据 URL: {}", url);

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ProviderError::UnknownSymbol(symbol.to_string()));
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            log::warn!("Yahoo 拒绝请求 ({})，丢弃缓存的 crumb", status);
            self.invalidate_crumb().await;
        }
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let body: Value = response.json().await.map_err(|e| {
            if e.is_decode() {
                ProviderError::Decode(e.to_string())
            } else {
                ProviderError::Transport(e)
            }
        })?;

        parse_quote_summary(&body, symbol)
    }
}

/// 解析 quoteSummary 响应，把各模块字段拍平成一层映射
///
/// Yahoo 的数值字段形如 `{"raw": 145.0, "fmt": "145.00"}`，取 `raw`；空对象视为缺失
fn parse_quote_summary(body: &Value, symbol: &str) -> Result<ProviderInfo, ProviderError> {
    let summary = body
        .get("quoteSummary")
        .ok_or_else(|| ProviderError::Decode("missing quoteSummary".to_string()))?;

    if summary.get("error").map_or(false, |e| !e.is_null()) {
        return Err(ProviderError::UnknownSymbol(symbol.to_string()));
    }

    let result = summary
        .get("result")
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
        .ok_or_else(|| ProviderError::UnknownSymbol(symbol.to_string()))?;

    let mut info = ProviderInfo::new();
    for module in QUOTE_SUMMARY_MODULES {
        if let Some(Value::Object(fields)) = result.get(module) {
            for (name, value) in fields {
                info.insert(name.clone(), unwrap_raw(value));
            }
        }
    }

    Ok(info)
}

fn unwrap_raw(value: &Value) -> Value {
    match value {
        Value::Object(obj) => obj.get("raw").cloned().unwrap_or(Value::Null),
        other => other.clone(),
    }
}
