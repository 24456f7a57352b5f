use std::sync::Arc;
use std::time::Duration;

use chrono::FixedOffset;
use common::{Exchange, GatingPolicy, IndicatorRow, PartitionKey, Trigger};
use engine::{TriggerProcessor, Worker};
use storage::{enqueue_trigger, SqliteOutbox, SqliteStore, SqliteTriggerSource};
use strategy::StrategyRegistry;

fn row(datetime: i64, short: [&str; 3], long: [&str; 3]) -> IndicatorRow {
    IndicatorRow {
        datetime,
        sma0005: short[0].into(),
        sma0010: short[1].into(),
        sma0020: short[2].into(),
        sma0060: long[0].into(),
        sma0120: long[1].into(),
        sma0240: long[2].into(),
    }
}

#[tokio::test]
async fn trigger_flows_from_log_to_outbox() {
    let pool = storage::connect("sqlite::memory:").await.unwrap();
    let store = SqliteStore::new(pool.clone());
    let outbox = SqliteOutbox::new(pool.clone(), "notifier");
    let key = PartitionKey::new(Exchange::Twse, "2330", "1d");

    let bars = [
        row(1_699_827_200, ["30", "20", "10"], ["1", "2", "3"]),
        row(1_699_913_600, ["30", "20", "10"], ["2", "2.5", "3"]),
        row(1_700_000_000, ["10", "20", "30"], ["4", "3", "2"]),
    ];
    for bar in &bars {
        store.put_indicator(&key, bar).await.unwrap();
    }

    let offset = enqueue_trigger(
        &pool,
        "chooser",
        &Trigger {
            exchange: "TWSE".into(),
            symbol: "2330".into(),
            period: "1d".into(),
            datetime: 1_700_000_000,
        },
    )
    .await
    .unwrap();

    let source = SqliteTriggerSource::new(pool.clone(), "chooser", "chooser", Duration::from_millis(5));
    let processor = TriggerProcessor::new(
        Arc::new(store.clone()),
        Arc::new(outbox.clone()),
        StrategyRegistry::default(),
        GatingPolicy::LatestOnly,
        FixedOffset::east_opt(8 * 3600).unwrap(),
    );
    let mut worker = Worker::new(Box::new(source), processor);
    let outcome = worker.step().await.unwrap();
    assert_eq!(outcome.writes, 6);

    // Both strategies flip on the last bar
    let events = outbox.published().await.unwrap();
    let strategies: Vec<&str> = events.iter().map(|e| e.strategy.as_str()).collect();
    assert_eq!(strategies, vec!["ssma", "lsma"]);
    assert!(events.iter().all(|e| e.datetime == 1_700_000_000));

    let rows = store.strategy_rows(&key).await.unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2].ssma.as_deref(), Some("SELL"));
    assert_eq!(rows[2].lsma.as_deref(), Some("BUY"));

    let resumed = SqliteTriggerSource::new(pool, "chooser", "chooser", Duration::from_millis(5));
    assert_eq!(resumed.committed().await.unwrap(), offset + 1);
}
