use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use common::{Error, NotificationEvent, NotificationSink, Result};

/// Collects published notifications for inspection.
#[derive(Clone)]
pub struct MemoryNotifier {
    events: Arc<RwLock<Vec<NotificationEvent>>>,
    failing: Arc<AtomicBool>,
    /// Total events accepted before publishes start failing.
    limit: Arc<AtomicUsize>,
}

impl Default for MemoryNotifier {
    fn default() -> Self {
        Self {
            events: Arc::default(),
            failing: Arc::default(),
            limit: Arc::new(AtomicUsize::new(usize::MAX)),
        }
    }
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `accepted` events in total, then fail every publish.
    pub fn failing_after(accepted: usize) -> Self {
        let notifier = Self::default();
        notifier.limit.store(accepted, Ordering::SeqCst);
        notifier
    }

    pub async fn events(&self) -> Vec<NotificationEvent> {
        self.events.read().await.clone()
    }

    /// Make every subsequent publish fail with a channel error.
    /// Clearing the flag also lifts any `failing_after` limit.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
        if !failing {
            self.limit.store(usize::MAX, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl NotificationSink for MemoryNotifier {
    async fn publish(&self, event: &NotificationEvent) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Channel("simulated produce failure".into()));
        }
        let mut events = self.events.write().await;
        if events.len() >= self.limit.load(Ordering::SeqCst) {
            return Err(Error::Channel("simulated produce failure".into()));
        }
        debug!(strategy = %event.strategy, datetime = event.datetime, "Memory notification recorded");
        events.push(event.clone());
        Ok(())
    }
}
