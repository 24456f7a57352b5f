use tracing::debug;

use common::{Error, IndicatorRow, IndicatorStore, PartitionKey, Result};
use strategy::Evaluation;

/// Upsert every evaluated code, keyed by the row's own timestamp.
///
/// Historical rows are rewritten too. Codes are deterministic, so rewriting
/// them is a no-op in effect and replaying a trigger converges to the same
/// state. Returns the number of writes issued.
pub async fn write_results(
    store: &dyn IndicatorStore,
    key: &PartitionKey,
    rows: &[IndicatorRow],
    evaluations: &[Evaluation],
) -> Result<usize> {
    if let Some(eval) = evaluations.iter().find(|e| e.codes.len() != rows.len()) {
        return Err(Error::Store(format!(
            "strategy {} produced {} codes for {} rows",
            eval.strategy,
            eval.codes.len(),
            rows.len()
        )));
    }

    let mut writes = 0;
    for eval in evaluations {
        for (row, code) in rows.iter().zip(&eval.codes) {
            store
                .upsert_signal(key, row.datetime, eval.strategy.column(), code.as_str())
                .await?;
            writes += 1;
        }

        debug!(key = %key, strategy = %eval.strategy, rows = rows.len(), "Strategy column written");
    }

    Ok(writes)
}
