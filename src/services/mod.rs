//! 业务逻辑服务模块
//!
//! 封装数据源访问和自选股业务逻辑

pub mod provider;       // 行情数据源
pub mod stock_service;  // 自选股服务

#[cfg(test)]
pub mod testing;
