use common::{GatingPolicy, IndicatorRow, NotificationEvent, PartitionKey};
use strategy::{Evaluation, SignalCode};

/// Decides which evaluated rows turn into notifications.
///
/// Rows before the trigger timestamp were handled by an earlier trigger and
/// are never notified. `NIL` rows are never notified.
#[derive(Debug, Clone, Copy)]
pub struct NotificationGate {
    policy: GatingPolicy,
}

impl NotificationGate {
    pub fn new(policy: GatingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> GatingPolicy {
        self.policy
    }

    /// Events to emit for one trigger, grouped by strategy in evaluation
    /// order and ascending by row timestamp within a strategy.
    pub fn select(
        &self,
        key: &PartitionKey,
        trigger_datetime: i64,
        rows: &[IndicatorRow],
        evaluations: &[Evaluation],
    ) -> Vec<NotificationEvent> {
        let mut events = Vec::new();

        for eval in evaluations {
            let qualifies = |row: &IndicatorRow, code: &SignalCode| {
                row.datetime >= trigger_datetime && code.is_actionable()
            };
            let paired = rows.iter().zip(&eval.codes);

            let qualifying: Vec<&IndicatorRow> = match self.policy {
                GatingPolicy::AllCandidates => paired
                    .filter(|(row, code)| qualifies(row, code))
                    .map(|(row, _)| row)
                    .collect(),
                // Only the newest bar of the series
                GatingPolicy::LatestOnly => paired
                    .last()
                    .filter(|(row, code)| qualifies(row, code))
                    .map(|(row, _)| row)
                    .into_iter()
                    .collect(),
            };

            events.extend(qualifying.into_iter().map(|row| NotificationEvent {
                exchange: key.exchange.code().to_string(),
                symbol: key.symbol.clone(),
                period: key.period.clone(),
                datetime: row.datetime,
                strategy: eval.strategy.name().to_string(),
            }));
        }

        events
    }
}
