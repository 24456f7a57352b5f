use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

use common::{Error, NotificationEvent, NotificationSink, Result};

/// Publishes notifications by appending them to the `notifications` outbox.
#[derive(Clone)]
pub struct SqliteOutbox {
    pool: SqlitePool,
    topic: String,
}

impl SqliteOutbox {
    pub fn new(pool: SqlitePool, topic: impl Into<String>) -> Self {
        Self {
            pool,
            topic: topic.into(),
        }
    }

    /// Everything published on this topic, oldest first.
    pub async fn published(&self) -> Result<Vec<NotificationEvent>> {
        let payloads: Vec<Vec<u8>> =
            sqlx::query_scalar("SELECT payload FROM notifications WHERE topic = ?1 ORDER BY id ASC")
                .bind(&self.topic)
                .fetch_all(&self.pool)
                .await?;

        payloads
            .iter()
            .map(|p| serde_json::from_slice(p).map_err(Error::from))
            .collect()
    }
}

#[async_trait]
impl NotificationSink for SqliteOutbox {
    async fn publish(&self, event: &NotificationEvent) -> Result<()> {
        let payload = serde_json::to_vec(event)?;
        sqlx::query("INSERT INTO notifications (topic, payload) VALUES (?1, ?2)")
            .bind(&self.topic)
            .bind(payload)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Channel(e.to_string()))?;

        debug!(topic = %self.topic, strategy = %event.strategy, datetime = event.datetime, "Notification queued");
        Ok(())
    }
}
