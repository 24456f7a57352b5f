use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use common::Config;
use engine::{Supervisor, TriggerProcessor, Worker};
use storage::{SqliteOutbox, SqliteStore, SqliteTriggerSource};
use strategy::{StrategyFileConfig, StrategyRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting chooser...");

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env()?;
    info!(
        environment = %cfg.environment,
        database_url = %cfg.database_url,
        trigger_topic = %cfg.trigger_topic,
        notifier_topic = %cfg.notifier_topic,
        consumer_group = %cfg.consumer_group,
        strategy_config_path = %cfg.strategy_config_path,
        gating_policy = %cfg.gating_policy,
        timezone = %cfg.timezone,
        poll_interval = ?cfg.poll_interval,
        restart_backoff = ?cfg.restart_backoff,
        restart_backoff_max = ?cfg.restart_backoff_max,
        "Configuration loaded"
    );

    // ── Strategy registry ─────────────────────────────────────────────────────
    let strategy_file = StrategyFileConfig::load(&cfg.strategy_config_path)?;
    let registry = StrategyRegistry::from_config(&strategy_file)?;

    // ── Supervised worker ─────────────────────────────────────────────────────
    let supervisor = Supervisor::new(cfg.environment, cfg.restart_backoff, cfg.restart_backoff_max);
    let supervised = supervisor.run(|| run_worker(cfg.clone(), registry.clone()));

    tokio::select! {
        result = supervised => {
            result?;
            info!("Worker exited");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting.");
        }
    }

    Ok(())
}

/// Open fresh connections and run one worker until it fails.
async fn run_worker(cfg: Config, registry: StrategyRegistry) -> common::Result<()> {
    let pool = storage::connect(&cfg.database_url).await?;

    let source = SqliteTriggerSource::new(
        pool.clone(),
        cfg.trigger_topic.as_str(),
        cfg.consumer_group.as_str(),
        cfg.poll_interval,
    );
    let processor = TriggerProcessor::new(
        Arc::new(SqliteStore::new(pool.clone())),
        Arc::new(SqliteOutbox::new(pool, cfg.notifier_topic.as_str())),
        registry,
        cfg.gating_policy,
        cfg.timezone,
    );

    Worker::new(Box::new(source), processor).run().await
}
