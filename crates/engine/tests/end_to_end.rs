use std::sync::Arc;
use std::time::Duration;

use chrono::FixedOffset;
use common::{
    Environment, Exchange, GatingPolicy, IndicatorRow, NotificationEvent, PartitionKey, Trigger,
};
use engine::{Supervisor, TriggerProcessor, Worker};
use memory::{MemoryNotifier, MemoryStore, MemoryTriggerLog};
use strategy::StrategyRegistry;

const DAY: i64 = 86_400;
const TRIGGER_TS: i64 = 1_700_000_000;

fn key() -> PartitionKey {
    PartitionKey::new(Exchange::Twse, "2330", "1d")
}

fn row(datetime: i64, lsma: [&str; 3]) -> IndicatorRow {
    IndicatorRow {
        datetime,
        // Flat short averages never align, so ssma stays NIL
        sma0005: "512.5".into(),
        sma0010: "512.5".into(),
        sma0020: "512.5".into(),
        sma0060: lsma[0].into(),
        sma0120: lsma[1].into(),
        sma0240: lsma[2].into(),
    }
}

/// Three bars; the last one turns the long averages bullish.
fn series() -> Vec<IndicatorRow> {
    vec![
        row(TRIGGER_TS - 2 * DAY, ["480.1", "490.2", "500.3"]),
        row(TRIGGER_TS - DAY, ["489.0", "495.5", "500.1"]),
        row(TRIGGER_TS, ["505.0", "501.0", "499.9"]),
    ]
}

fn trigger(datetime: i64) -> Trigger {
    Trigger {
        exchange: "TWSE".into(),
        symbol: "2330".into(),
        period: "1d".into(),
        datetime,
    }
}

fn processor(store: Arc<MemoryStore>, sink: &MemoryNotifier, policy: GatingPolicy) -> TriggerProcessor {
    TriggerProcessor::new(
        store,
        Arc::new(sink.clone()),
        StrategyRegistry::default(),
        policy,
        FixedOffset::east_opt(8 * 3600).unwrap(),
    )
}

#[tokio::test]
async fn trigger_on_latest_bar_notifies_lsma_once_and_writes_every_row() {
    let store = Arc::new(MemoryStore::new());
    store.insert_series(key(), series()).await;
    let sink = MemoryNotifier::new();
    let log = MemoryTriggerLog::new("chooser");
    log.push(&trigger(TRIGGER_TS)).await.unwrap();

    let mut worker = Worker::new(
        Box::new(log.subscribe()),
        processor(store.clone(), &sink, GatingPolicy::LatestOnly),
    );
    let outcome = worker.step().await.unwrap();

    assert_eq!(outcome.rows, 3);
    assert_eq!(outcome.writes, 6);
    assert_eq!(
        sink.events().await,
        vec![NotificationEvent {
            exchange: "TWSE".into(),
            symbol: "2330".into(),
            period: "1d".into(),
            datetime: TRIGGER_TS,
            strategy: "lsma".into(),
        }]
    );

    let rows = store.strategy_rows(&key()).await;
    assert_eq!(rows.len(), 3);
    for stored in &rows {
        assert_eq!(stored.ssma.as_deref(), Some("NIL"));
        assert!(stored.lsma.is_some());
    }
    assert_eq!(rows[2].lsma.as_deref(), Some("BUY"));
    assert_eq!(log.committed().await, 1);
}

#[tokio::test]
async fn reprocessing_the_same_trigger_converges_to_the_same_rows() {
    let store = Arc::new(MemoryStore::new());
    store.insert_series(key(), series()).await;
    let sink = MemoryNotifier::new();
    let p = processor(store.clone(), &sink, GatingPolicy::LatestOnly);

    p.process(&trigger(TRIGGER_TS)).await.unwrap();
    let first = store.strategy_rows(&key()).await;
    p.process(&trigger(TRIGGER_TS)).await.unwrap();
    let second = store.strategy_rows(&key()).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn trigger_after_latest_bar_notifies_nothing() {
    let store = Arc::new(MemoryStore::new());
    store.insert_series(key(), series()).await;
    let sink = MemoryNotifier::new();

    let outcome = processor(store.clone(), &sink, GatingPolicy::AllCandidates)
        .process(&trigger(TRIGGER_TS + DAY))
        .await
        .unwrap();

    assert_eq!(outcome.notifications, 0);
    assert_eq!(outcome.writes, 6);
    assert!(sink.events().await.is_empty());
}

#[tokio::test]
async fn unknown_exchange_is_rejected_without_store_access() {
    let store = Arc::new(MemoryStore::new());
    let sink = MemoryNotifier::new();
    let log = MemoryTriggerLog::new("chooser");
    log.push(&Trigger {
        exchange: "NYSE".into(),
        ..trigger(TRIGGER_TS)
    })
    .await
    .unwrap();

    let mut worker = Worker::new(
        Box::new(log.subscribe()),
        processor(store.clone(), &sink, GatingPolicy::LatestOnly),
    );
    let err = worker.step().await.unwrap_err();

    assert_eq!(err.kind(), common::ErrorKind::Configuration);
    assert_eq!(store.read_count(), 0);
    assert_eq!(log.committed().await, 0);
}

#[tokio::test]
async fn supervisor_redelivers_after_a_failed_attempt() {
    let store = Arc::new(MemoryStore::new());
    store.insert_series(key(), series()).await;
    let sink = MemoryNotifier::new();
    let log = MemoryTriggerLog::new("chooser");
    log.push(&trigger(TRIGGER_TS)).await.unwrap();

    let supervisor = Supervisor::new(
        Environment::Prod,
        Duration::from_millis(1),
        Duration::from_millis(2),
    );

    let mut attempt = 0;
    supervisor
        .run(|| {
            attempt += 1;
            // The first attempt loses the notifier mid-trigger
            sink.set_failing(attempt == 1);
            let mut worker = Worker::new(
                Box::new(log.subscribe()),
                processor(store.clone(), &sink, GatingPolicy::LatestOnly),
            );
            async move { worker.step().await.map(|_| ()) }
        })
        .await
        .unwrap();

    assert_eq!(attempt, 2);
    assert_eq!(log.committed().await, 1);
    assert_eq!(sink.events().await.len(), 1);
    assert_eq!(store.strategy_rows(&key()).await.len(), 3);
}
