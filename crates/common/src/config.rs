use std::time::Duration;

use chrono::FixedOffset;

use crate::{Environment, Error, GatingPolicy, Result};

/// All configuration loaded from environment variables at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,

    // Database
    pub database_url: String,

    // Channels
    pub trigger_topic: String,
    pub notifier_topic: String,
    pub consumer_group: String,
    pub poll_interval: Duration,

    // Evaluation
    pub strategy_config_path: String,
    pub gating_policy: GatingPolicy,
    /// Offset used when rendering bar timestamps in logs.
    pub timezone: FixedOffset,

    // Supervision
    pub restart_backoff: Duration,
    pub restart_backoff_max: Duration,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| {
                Error::Config(format!(
                    "Required environment variable '{key}' is not set. Check your .env file."
                ))
            })
        };
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let environment = required("ENVIRONMENT_NAME")?.parse()?;
        let gating_policy = or_default("GATING_POLICY", "latest-only").parse()?;
        let timezone = parse_offset(&or_default("TIMEZONE_OFFSET", "+08:00"))?;

        Ok(Config {
            environment,
            database_url: required("DATABASE_URL")?,
            trigger_topic: or_default("TRIGGER_TOPIC", "chooser"),
            notifier_topic: or_default("NOTIFIER_TOPIC", "notifier"),
            consumer_group: or_default("CONSUMER_GROUP", "chooser"),
            poll_interval: Duration::from_millis(parse_u64(
                "POLL_INTERVAL_MS",
                &or_default("POLL_INTERVAL_MS", "500"),
            )?),
            strategy_config_path: or_default("STRATEGY_CONFIG_PATH", "config/strategies.toml"),
            gating_policy,
            timezone,
            restart_backoff: Duration::from_secs(parse_u64(
                "RESTART_BACKOFF_SECS",
                &or_default("RESTART_BACKOFF_SECS", "3"),
            )?),
            restart_backoff_max: Duration::from_secs(parse_u64(
                "RESTART_BACKOFF_MAX_SECS",
                &or_default("RESTART_BACKOFF_MAX_SECS", "60"),
            )?),
        })
    }
}

fn parse_u64(key: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got '{raw}'")))
}

/// Parse `+HH:MM` / `-HH:MM` into a fixed UTC offset.
fn parse_offset(raw: &str) -> Result<FixedOffset> {
    raw.trim().parse::<FixedOffset>().map_err(|_| {
        Error::Config(format!("TIMEZONE_OFFSET must look like '+08:00', got '{raw}'"))
    })
}
