use tracing::{debug, error, info};

use common::{Delivery, Result, Trigger, TriggerSource};

use crate::processor::{ProcessOutcome, TriggerProcessor};

/// Where the worker currently is in its receive → process → commit cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Blocked on the trigger channel.
    Waiting,
    /// Running one trigger through the processor.
    Processing,
}

/// Single logical consumer: one trigger in flight, strictly in receipt order.
///
/// A delivery is committed only after it was processed successfully. Any
/// failure ends `run` with that error and leaves the delivery uncommitted so
/// the channel redelivers it to the next worker.
pub struct Worker {
    source: Box<dyn TriggerSource>,
    processor: TriggerProcessor,
    state: WorkerState,
    processed: u64,
}

impl Worker {
    pub fn new(source: Box<dyn TriggerSource>, processor: TriggerProcessor) -> Self {
        Self {
            source,
            processor,
            state: WorkerState::Waiting,
            processed: 0,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Triggers committed by this worker so far.
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Run until the first failure, which is returned.
    pub async fn run(mut self) -> Result<()> {
        info!("Worker waiting for triggers");
        loop {
            if let Err(e) = self.step().await {
                error!(
                    kind = ?e.kind(),
                    error = %e,
                    processed = self.processed,
                    state = ?self.state,
                    "Worker stopped"
                );
                return Err(e);
            }
        }
    }

    /// Receive, process and commit exactly one trigger.
    pub async fn step(&mut self) -> Result<ProcessOutcome> {
        self.state = WorkerState::Waiting;
        let delivery = self.source.receive().await?;

        self.state = WorkerState::Processing;
        debug!(topic = %delivery.topic, partition = delivery.partition, offset = delivery.offset, "Trigger received");

        let outcome = self.handle(&delivery).await?;
        self.source.commit(&delivery).await?;
        self.processed += 1;

        info!(
            offset = delivery.offset,
            rows = outcome.rows,
            writes = outcome.writes,
            notifications = outcome.notifications,
            "Trigger committed"
        );
        self.state = WorkerState::Waiting;
        Ok(outcome)
    }

    async fn handle(&self, delivery: &Delivery) -> Result<ProcessOutcome> {
        let trigger: Trigger = serde_json::from_slice(&delivery.payload)?;
        self.processor.process(&trigger).await
    }
}
