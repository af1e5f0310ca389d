//! 持久化层
//!
//! 封装 SQLite 连接池，进程启动时创建一次，通过 `web::Data` 注入到各个处理器。
//! 每次操作从池中取连接或开启事务，作用域结束即归还（未提交的事务在 drop 时回滚）。

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::config::DatabaseConfig;

pub mod stock;

const CREATE_STOCKS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS stocks (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    symbol         TEXT NOT NULL UNIQUE,
    price          REAL,
    ma50           REAL,
    ma200          REAL,
    forward_pe     REAL,
    forward_eps    REAL,
    dividend_yield REAL
)";

const CREATE_SYMBOL_INDEX: &str =
    "CREATE UNIQUE INDEX IF NOT EXISTS ix_stocks_symbol ON stocks (symbol)";

/// 数据库句柄
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// 按配置建立连接池
    ///
    /// 内存库的每个连接都是独立的数据库，因此只开一个连接且永不回收，
    /// 保证整个生命周期内看到同一份数据
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(&config.url)?;
        let mut pool_options = SqlitePoolOptions::new().acquire_timeout(Duration::from_secs(5));

        if is_memory_url(&config.url) {
            if config.max_connections > 1 {
                log::warn!("内存数据库只使用单个连接，忽略 max_connections={}", config.max_connections);
            }
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>);
        } else {
            pool_options = pool_options.max_connections(config.max_connections.max(1));
        }

        let pool = pool_options.connect_with(options).await?;
        Ok(Self { pool })
    }

    #[cfg(test)]
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        };

        let db = Self::connect(&config).await?;
        db.ensure_schema().await?;
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// 确保 `stocks` 表存在
    ///
    /// 只做 create-if-absent，可重复执行，不会删除或修改已有数据
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(CREATE_STOCKS_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_SYMBOL_INDEX).execute(&self.pool).await?;
        log::debug!("stocks 表已就绪");
        Ok(())
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}
