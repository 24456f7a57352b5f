use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use common::{Error, IndicatorRow, IndicatorStore, PartitionKey, Result, StrategyRow};

/// Simulated column store.
///
/// Indicator series are seeded with `insert_series`; strategy rows are
/// upserted by the engine and can be inspected afterwards.
#[derive(Default)]
pub struct MemoryStore {
    series: RwLock<HashMap<PartitionKey, Vec<IndicatorRow>>>,
    /// Strategy rows keyed by partition, then datetime.
    strategies: RwLock<HashMap<PartitionKey, BTreeMap<i64, StrategyRow>>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    /// When set, every write after this many successful ones fails.
    fail_writes_after: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes start failing once `n` have succeeded.
    pub fn failing_writes_after(n: usize) -> Self {
        Self {
            fail_writes_after: Some(n),
            ..Self::default()
        }
    }

    /// Replace the indicator series for `key`.
    pub async fn insert_series(&self, key: PartitionKey, rows: Vec<IndicatorRow>) {
        self.series.write().await.insert(key, rows);
    }

    /// Strategy rows for `key`, oldest first.
    pub async fn strategy_rows(&self, key: &PartitionKey) -> Vec<StrategyRow> {
        self.strategies
            .read()
            .await
            .get(key)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of `load_series` calls served.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of successful `upsert_signal` calls.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IndicatorStore for MemoryStore {
    async fn load_series(&self, key: &PartitionKey) -> Result<Vec<IndicatorRow>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let rows = self
            .series
            .read()
            .await
            .get(key)
            .cloned()
            .unwrap_or_default();
        debug!(key = %key, rows = rows.len(), "Memory series loaded");
        Ok(rows)
    }

    async fn upsert_signal(
        &self,
        key: &PartitionKey,
        datetime: i64,
        column: &str,
        code: &str,
    ) -> Result<()> {
        if let Some(limit) = self.fail_writes_after {
            if self.writes.load(Ordering::SeqCst) >= limit {
                return Err(Error::Store(format!(
                    "simulated write failure for {key} at {datetime}"
                )));
            }
        }

        let mut strategies = self.strategies.write().await;
        let row = strategies
            .entry(key.clone())
            .or_default()
            .entry(datetime)
            .or_insert_with(|| StrategyRow {
                datetime,
                ..StrategyRow::default()
            });

        match column {
            "ssma" => row.ssma = Some(code.to_string()),
            "lsma" => row.lsma = Some(code.to_string()),
            other => return Err(Error::Config(format!("unknown strategy column '{other}'"))),
        }

        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
