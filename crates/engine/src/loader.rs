use tracing::debug;

use common::{Error, IndicatorRow, IndicatorStore, PartitionKey, Result};

/// Load the complete indicator history for `key`.
///
/// Crossovers depend on the bars before the trigger, so this never loads a
/// partial window. Series that are not strictly timestamp-ascending are
/// rejected.
pub async fn load_series(store: &dyn IndicatorStore, key: &PartitionKey) -> Result<Vec<IndicatorRow>> {
    let rows = store.load_series(key).await?;

    if let Some(pair) = rows.windows(2).find(|w| w[0].datetime >= w[1].datetime) {
        return Err(Error::Store(format!(
            "series {key} is not strictly ascending: {} followed by {}",
            pair[0].datetime, pair[1].datetime
        )));
    }

    debug!(
        key = %key,
        rows = rows.len(),
        first = rows.first().map(|r| r.datetime),
        last = rows.last().map(|r| r.datetime),
        "Indicator series loaded"
    );
    Ok(rows)
}
