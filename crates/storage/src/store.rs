use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

use common::{Error, IndicatorRow, IndicatorStore, PartitionKey, Result, StrategyRow};

#[derive(sqlx::FromRow)]
struct IndicatorRecord {
    datetime: i64,
    sma0005: String,
    sma0010: String,
    sma0020: String,
    sma0060: String,
    sma0120: String,
    sma0240: String,
}

impl From<IndicatorRecord> for IndicatorRow {
    fn from(r: IndicatorRecord) -> Self {
        IndicatorRow {
            datetime: r.datetime,
            sma0005: r.sma0005,
            sma0010: r.sma0010,
            sma0020: r.sma0020,
            sma0060: r.sma0060,
            sma0120: r.sma0120,
            sma0240: r.sma0240,
        }
    }
}

/// `indicators` / `strategies` tables behind the `IndicatorStore` trait.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace one indicator bar. Used by the upstream stage and tests.
    pub async fn put_indicator(&self, key: &PartitionKey, row: &IndicatorRow) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO indicators
                (exchange, symbol, period, datetime, sma0005, sma0010, sma0020, sma0060, sma0120, sma0240)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(exchange, symbol, period, datetime) DO UPDATE SET
                sma0005 = excluded.sma0005,
                sma0010 = excluded.sma0010,
                sma0020 = excluded.sma0020,
                sma0060 = excluded.sma0060,
                sma0120 = excluded.sma0120,
                sma0240 = excluded.sma0240
            "#,
        )
        .bind(key.exchange.code())
        .bind(&key.symbol)
        .bind(&key.period)
        .bind(row.datetime)
        .bind(&row.sma0005)
        .bind(&row.sma0010)
        .bind(&row.sma0020)
        .bind(&row.sma0060)
        .bind(&row.sma0120)
        .bind(&row.sma0240)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Persisted strategy rows for `key`, oldest first.
    pub async fn strategy_rows(&self, key: &PartitionKey) -> Result<Vec<StrategyRow>> {
        let rows = sqlx::query_as::<_, (i64, Option<String>, Option<String>)>(
            r#"
            SELECT datetime, ssma, lsma FROM strategies
            WHERE exchange = ?1 AND symbol = ?2 AND period = ?3
            ORDER BY datetime ASC
            "#,
        )
        .bind(key.exchange.code())
        .bind(&key.symbol)
        .bind(&key.period)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(datetime, ssma, lsma)| StrategyRow { datetime, ssma, lsma })
            .collect())
    }
}

/// Map a strategy column name onto the fixed set of table columns.
fn strategy_column(column: &str) -> Result<&'static str> {
    match column {
        "ssma" => Ok("ssma"),
        "lsma" => Ok("lsma"),
        other => Err(Error::Config(format!("unknown strategy column '{other}'"))),
    }
}

#[async_trait]
impl IndicatorStore for SqliteStore {
    async fn load_series(&self, key: &PartitionKey) -> Result<Vec<IndicatorRow>> {
        let records = sqlx::query_as::<_, IndicatorRecord>(
            r#"
            SELECT datetime, sma0005, sma0010, sma0020, sma0060, sma0120, sma0240
            FROM indicators
            WHERE exchange = ?1 AND symbol = ?2 AND period = ?3
            ORDER BY datetime ASC
            "#,
        )
        .bind(key.exchange.code())
        .bind(&key.symbol)
        .bind(&key.period)
        .fetch_all(&self.pool)
        .await?;

        debug!(key = %key, rows = records.len(), "Indicator rows selected");
        Ok(records.into_iter().map(IndicatorRow::from).collect())
    }

    async fn upsert_signal(
        &self,
        key: &PartitionKey,
        datetime: i64,
        column: &str,
        code: &str,
    ) -> Result<()> {
        let column = strategy_column(column)?;
        let sql = format!(
            "INSERT INTO strategies (exchange, symbol, period, datetime, {column}) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT(exchange, symbol, period, datetime) DO UPDATE SET {column} = excluded.{column}"
        );

        sqlx::query(&sql)
            .bind(key.exchange.code())
            .bind(&key.symbol)
            .bind(&key.period)
            .bind(datetime)
            .bind(code)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
