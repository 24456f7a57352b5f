use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use tracing::{debug, info};

use common::{
    Exchange, GatingPolicy, IndicatorStore, NotificationSink, PartitionKey, Result, Trigger,
};
use strategy::StrategyRegistry;

use crate::gate::NotificationGate;
use crate::{loader, writer};

/// What one trigger did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessOutcome {
    pub rows: usize,
    pub writes: usize,
    pub notifications: usize,
}

/// Runs loader → evaluator → writer → gate → sink for a single trigger.
pub struct TriggerProcessor {
    store: Arc<dyn IndicatorStore>,
    sink: Arc<dyn NotificationSink>,
    registry: StrategyRegistry,
    gate: NotificationGate,
    /// Offset used to render timestamps in logs.
    timezone: FixedOffset,
}

impl TriggerProcessor {
    pub fn new(
        store: Arc<dyn IndicatorStore>,
        sink: Arc<dyn NotificationSink>,
        registry: StrategyRegistry,
        policy: GatingPolicy,
        timezone: FixedOffset,
    ) -> Self {
        Self {
            store,
            sink,
            registry,
            gate: NotificationGate::new(policy),
            timezone,
        }
    }

    /// Evaluate one trigger end to end and publish its notifications.
    ///
    /// Events are published one at a time. If a later publish fails the
    /// earlier ones are already out, so a redelivered trigger may send
    /// duplicates.
    pub async fn process(&self, trigger: &Trigger) -> Result<ProcessOutcome> {
        // Reject before touching the store
        let exchange: Exchange = trigger.exchange.parse()?;
        let key = PartitionKey::new(exchange, trigger.symbol.as_str(), trigger.period.as_str());

        info!(
            key = %key,
            datetime = trigger.datetime,
            local = %self.local_time(trigger.datetime),
            "Processing trigger"
        );

        let rows = loader::load_series(self.store.as_ref(), &key).await?;
        let evaluations = self.registry.evaluate(&rows)?;
        let writes = writer::write_results(self.store.as_ref(), &key, &rows, &evaluations).await?;

        let events = self.gate.select(&key, trigger.datetime, &rows, &evaluations);
        for event in &events {
            self.sink.publish(event).await?;
            info!(
                key = %key,
                strategy = %event.strategy,
                datetime = event.datetime,
                local = %self.local_time(event.datetime),
                "Notification emitted"
            );
        }

        let outcome = ProcessOutcome {
            rows: rows.len(),
            writes,
            notifications: events.len(),
        };
        debug!(key = %key, policy = %self.gate.policy(), ?outcome, "Trigger processed");
        Ok(outcome)
    }

    fn local_time(&self, epoch_seconds: i64) -> String {
        DateTime::from_timestamp(epoch_seconds, 0)
            .map(|t| t.with_timezone(&self.timezone).to_rfc3339())
            .unwrap_or_else(|| epoch_seconds.to_string())
    }
}
