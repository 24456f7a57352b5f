use std::time::Duration;

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::{debug, info};

use common::{Delivery, Error, Result, Trigger, TriggerSource};

/// Append a trigger to the log for `topic`. Returns its offset.
pub async fn enqueue_trigger(pool: &SqlitePool, topic: &str, trigger: &Trigger) -> Result<i64> {
    let payload = serde_json::to_vec(trigger)?;
    let result = sqlx::query("INSERT INTO triggers (topic, payload) VALUES (?1, ?2)")
        .bind(topic)
        .bind(payload)
        .execute(pool)
        .await?;
    Ok(result.last_insert_rowid())
}

/// Consumer over the `triggers` log with a committed offset per group.
///
/// Receiving polls the log; a fresh source starts at the committed offset,
/// so anything received but not committed is delivered again.
pub struct SqliteTriggerSource {
    pool: SqlitePool,
    topic: String,
    group: String,
    poll_interval: Duration,
    /// Next offset to hand out; resolved from `consumer_offsets` on first receive.
    position: Option<i64>,
}

impl SqliteTriggerSource {
    pub fn new(
        pool: SqlitePool,
        topic: impl Into<String>,
        group: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            pool,
            topic: topic.into(),
            group: group.into(),
            poll_interval,
            position: None,
        }
    }

    /// Offset the group will resume from.
    pub async fn committed(&self) -> Result<i64> {
        let next: Option<i64> = sqlx::query_scalar(
            "SELECT next_offset FROM consumer_offsets WHERE consumer_group = ?1 AND topic = ?2",
        )
        .bind(&self.group)
        .bind(&self.topic)
        .fetch_optional(&self.pool)
        .await
        .map_err(channel_error)?;
        Ok(next.unwrap_or(0))
    }

    async fn next_after(&self, position: i64) -> Result<Option<(i64, Vec<u8>)>> {
        sqlx::query_as::<_, (i64, Vec<u8>)>(
            r#"
            SELECT msg_offset, payload FROM triggers
            WHERE topic = ?1 AND msg_offset >= ?2
            ORDER BY msg_offset ASC
            LIMIT 1
            "#,
        )
        .bind(&self.topic)
        .bind(position)
        .fetch_optional(&self.pool)
        .await
        .map_err(channel_error)
    }
}

fn channel_error(e: sqlx::Error) -> Error {
    Error::Channel(e.to_string())
}

#[async_trait]
impl TriggerSource for SqliteTriggerSource {
    async fn receive(&mut self) -> Result<Delivery> {
        let position = match self.position {
            Some(p) => p,
            None => {
                let committed = self.committed().await?;
                info!(topic = %self.topic, group = %self.group, offset = committed, "Resuming from committed offset");
                committed
            }
        };
        self.position = Some(position);

        loop {
            if let Some((offset, payload)) = self.next_after(position).await? {
                self.position = Some(offset + 1);
                debug!(topic = %self.topic, offset, "Trigger read from log");
                return Ok(Delivery {
                    topic: self.topic.clone(),
                    partition: 0,
                    offset,
                    payload,
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn commit(&mut self, delivery: &Delivery) -> Result<()> {
        if delivery.topic != self.topic {
            return Err(Error::Channel(format!(
                "cannot commit offset for topic '{}' on '{}'",
                delivery.topic, self.topic
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO consumer_offsets (consumer_group, topic, next_offset)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(consumer_group, topic) DO UPDATE SET next_offset = excluded.next_offset
            "#,
        )
        .bind(&self.group)
        .bind(&self.topic)
        .bind(delivery.offset + 1)
        .execute(&self.pool)
        .await
        .map_err(channel_error)?;
        Ok(())
    }
}
