use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tracing::debug;

use common::{Delivery, Error, Result, Trigger, TriggerSource};

#[derive(Default)]
struct Log {
    payloads: Vec<Vec<u8>>,
    /// Offset of the next message a new subscriber starts from.
    committed: i64,
    closed: bool,
}

/// Append-only single-partition message log with one committed offset.
///
/// Producers `push`; consumers obtain a `MemoryTriggerSource` via
/// `subscribe`, which starts at the committed offset. Uncommitted messages
/// are therefore redelivered to the next subscriber.
#[derive(Clone)]
pub struct MemoryTriggerLog {
    topic: String,
    inner: Arc<Mutex<Log>>,
    notify: Arc<Notify>,
}

impl MemoryTriggerLog {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            inner: Arc::new(Mutex::new(Log::default())),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Append an encoded trigger. Returns its offset.
    pub async fn push(&self, trigger: &Trigger) -> Result<i64> {
        let payload = serde_json::to_vec(trigger)?;
        Ok(self.push_raw(payload).await)
    }

    /// Append raw bytes, bypassing encoding.
    pub async fn push_raw(&self, payload: Vec<u8>) -> i64 {
        let offset = {
            let mut log = self.inner.lock().await;
            log.payloads.push(payload);
            log.payloads.len() as i64 - 1
        };
        self.notify.notify_waiters();
        offset
    }

    /// Stop accepting messages; waiting consumers see a channel error once drained.
    pub async fn close(&self) {
        self.inner.lock().await.closed = true;
        self.notify.notify_waiters();
    }

    pub async fn committed(&self) -> i64 {
        self.inner.lock().await.committed
    }

    pub fn subscribe(&self) -> MemoryTriggerSource {
        MemoryTriggerSource {
            log: self.clone(),
            position: None,
        }
    }
}

/// Consumer side of a `MemoryTriggerLog`.
pub struct MemoryTriggerSource {
    log: MemoryTriggerLog,
    /// Next offset to hand out; resolved from the committed offset on first receive.
    position: Option<i64>,
}

#[async_trait]
impl TriggerSource for MemoryTriggerSource {
    async fn receive(&mut self) -> Result<Delivery> {
        loop {
            let notified = self.log.notify.notified();
            {
                let log = self.log.inner.lock().await;
                let position = *self.position.get_or_insert(log.committed);
                if let Some(payload) = log.payloads.get(position as usize) {
                    self.position = Some(position + 1);
                    debug!(topic = %self.log.topic, offset = position, "Memory trigger delivered");
                    return Ok(Delivery {
                        topic: self.log.topic.clone(),
                        partition: 0,
                        offset: position,
                        payload: payload.clone(),
                    });
                }
                if log.closed {
                    return Err(Error::Channel(format!(
                        "trigger log '{}' closed",
                        self.log.topic
                    )));
                }
            }
            notified.await;
        }
    }

    async fn commit(&mut self, delivery: &Delivery) -> Result<()> {
        if delivery.topic != self.log.topic {
            return Err(Error::Channel(format!(
                "cannot commit offset for topic '{}' on '{}'",
                delivery.topic, self.log.topic
            )));
        }
        self.log.inner.lock().await.committed = delivery.offset + 1;
        Ok(())
    }
}
