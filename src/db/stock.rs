//! `stocks` 表读写

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::models::{NewStock, Stock, StockFilter};

const STOCK_COLUMNS: &str =
    "id, symbol, price, ma50, ma200, forward_pe, forward_eps, dividend_yield";

impl Stock {
    /// 按过滤条件查询，条件之间为 AND，比较均为严格比较，按 id 排序
    ///
    /// 字段为 NULL 的记录不会满足任何比较条件
    pub async fn list(pool: &SqlitePool, filter: &StockFilter) -> Result<Vec<Stock>, sqlx::Error> {
        let mut query_builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM stocks WHERE 1 = 1", STOCK_COLUMNS));

        if let Some(max_forward_pe) = filter.max_forward_pe {
            query_builder.push(" AND forward_pe < ");
            query_builder.push_bind(max_forward_pe);
        }

        if let Some(min_dividend_yield) = filter.min_dividend_yield {
            query_builder.push(" AND dividend_yield > ");
            query_builder.push_bind(min_dividend_yield);
        }

        if filter.above_ma50 {
            query_builder.push(" AND price > ma50");
        }

        if filter.above_ma200 {
            query_builder.push(" AND price > ma200");
        }

        query_builder.push(" ORDER BY id");

        query_builder
            .build_query_as::<Stock>()
            .fetch_all(pool)
            .await
    }

    /// 是否已存在该代码
    pub async fn exists(pool: &SqlitePool, symbol: &str) -> Result<bool, sqlx::Error> {
        let found: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM stocks WHERE symbol = ?)")
                .bind(symbol)
                .fetch_one(pool)
                .await?;

        Ok(found != 0)
    }

    /// 删除记录，返回是否确实删除了一行
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM stocks WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl NewStock {
    /// 在事务中插入新记录
    ///
    /// 依赖 symbol 上的唯一约束做 insert-if-absent：代码已存在时返回 `None`，不修改任何数据
    pub async fn insert(&self, pool: &SqlitePool) -> Result<Option<Stock>, sqlx::Error> {
        let sql = format!(
            "
INSERT INTO stocks (symbol, price, ma50, ma200, forward_pe, forward_eps, dividend_yield)
VALUES (?, ?, ?, ?, ?, ?, ?)
ON CONFLICT (symbol) DO NOTHING
RETURNING {}",
            STOCK_COLUMNS
        );

        let mut tx = pool.begin().await?;
        let stock = sqlx::query_as::<_, Stock>(&sql)
            .bind(&self.symbol)
            .bind(self.metrics.price)
            .bind(self.metrics.ma50)
            .bind(self.metrics.ma200)
            .bind(self.metrics.forward_pe)
            .bind(self.metrics.forward_eps)
            .bind(self.metrics.dividend_yield)
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(stock)
    }
}
