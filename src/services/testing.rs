//! 测试用的行情数据源

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::provider::{MarketDataProvider, ProviderError, ProviderInfo};

/// 按代码返回预设结果，未登记的代码视为未知代码
#[derive(Default)]
pub struct StubProvider {
    responses: HashMap<String, Result<ProviderInfo, fn() -> ProviderError>>,
    calls: AtomicUsize,
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_info(mut self, symbol: &str, info: ProviderInfo) -> Self {
        self.responses.insert(symbol.to_string(), Ok(info));
        self
    }

    pub fn with_error(mut self, symbol: &str, error: fn() -> ProviderError) -> Self {
        self.responses.insert(symbol.to_string(), Err(error));
        self
    }

    /// 累计调用次数
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataProvider for StubProvider {
    async fn fetch_info(&self, symbol: &str) -> Result<ProviderInfo, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.responses.get(symbol) {
            Some(Ok(info)) => Ok(info.clone()),
            Some(Err(error)) => Err(error()),
            None => Err(ProviderError::UnknownSymbol(symbol.to_string())),
        }
    }
}
