use async_trait::async_trait;

use crate::{Delivery, IndicatorRow, NotificationEvent, PartitionKey, Result};

/// Keyed time-series store holding indicator rows and strategy results.
///
/// `SqliteStore` implements this for deployments, `MemoryStore` for tests.
#[async_trait]
pub trait IndicatorStore: Send + Sync {
    /// Full indicator history for one partition, oldest first.
    async fn load_series(&self, key: &PartitionKey) -> Result<Vec<IndicatorRow>>;

    /// Insert or overwrite one strategy column of the row at `datetime`.
    async fn upsert_signal(
        &self,
        key: &PartitionKey,
        datetime: i64,
        column: &str,
        code: &str,
    ) -> Result<()>;
}

/// Ordered, at-least-once inbound channel of trigger messages.
#[async_trait]
pub trait TriggerSource: Send {
    /// Wait for the next uncommitted message.
    async fn receive(&mut self) -> Result<Delivery>;

    /// Mark `delivery` as fully processed. Advances the committed offset to
    /// `delivery.offset + 1`.
    async fn commit(&mut self, delivery: &Delivery) -> Result<()>;
}

/// Outbound channel for notification events.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn publish(&self, event: &NotificationEvent) -> Result<()>;
}
