use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Exchanges this service knows how to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Exchange {
    Twse,
}

impl Exchange {
    pub fn code(&self) -> &'static str {
        match self {
            Exchange::Twse => "TWSE",
        }
    }
}

impl FromStr for Exchange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TWSE" => Ok(Exchange::Twse),
            other => Err(Error::Config(format!("unknown exchange '{other}'"))),
        }
    }
}

impl std::fmt::Display for Exchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Identifies one indicator time series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionKey {
    pub exchange: Exchange,
    pub symbol: String,
    pub period: String,
}

impl PartitionKey {
    pub fn new(exchange: Exchange, symbol: impl Into<String>, period: impl Into<String>) -> Self {
        Self {
            exchange,
            symbol: symbol.into(),
            period: period.into(),
        }
    }
}

impl std::fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.exchange, self.symbol, self.period)
    }
}

/// One bar of precomputed indicators. SMA values are kept as the decimal
/// strings the upstream stage stored; parsing happens during evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorRow {
    /// Bar timestamp, epoch seconds.
    pub datetime: i64,
    pub sma0005: String,
    pub sma0010: String,
    pub sma0020: String,
    pub sma0060: String,
    pub sma0120: String,
    pub sma0240: String,
}

/// Persisted strategy codes for one bar. `None` means the column was never written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrategyRow {
    pub datetime: i64,
    pub ssma: Option<String>,
    pub lsma: Option<String>,
}

/// Inbound request to (re)evaluate one instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    pub exchange: String,
    pub symbol: String,
    pub period: String,
    /// Evaluation timestamp, epoch seconds.
    pub datetime: i64,
}

/// Outbound alert for one bar and one strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub exchange: String,
    pub symbol: String,
    pub period: String,
    /// Timestamp of the bar that produced the signal, not of the trigger.
    pub datetime: i64,
    pub strategy: String,
}

/// A message received from the trigger channel, not yet committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub payload: Vec<u8>,
}

/// Which candidate rows produce notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GatingPolicy {
    /// Every non-NIL row at or after the trigger.
    AllCandidates,
    /// Only the most recent row, per strategy.
    #[default]
    LatestOnly,
}

impl FromStr for GatingPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all-candidates" => Ok(GatingPolicy::AllCandidates),
            "latest-only" => Ok(GatingPolicy::LatestOnly),
            other => Err(Error::Config(format!(
                "GATING_POLICY must be 'all-candidates' or 'latest-only', got '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for GatingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatingPolicy::AllCandidates => write!(f, "all-candidates"),
            GatingPolicy::LatestOnly => write!(f, "latest-only"),
        }
    }
}

/// Deployment environment. Only `Prod` restarts the worker after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Test,
    Stg,
    Prod,
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "test" => Ok(Environment::Test),
            "stg" => Ok(Environment::Stg),
            "prod" => Ok(Environment::Prod),
            other => Err(Error::Config(format!(
                "ENVIRONMENT_NAME must be one of dev, test, stg, prod, got '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Dev => write!(f, "dev"),
            Environment::Test => write!(f, "test"),
            Environment::Stg => write!(f, "stg"),
            Environment::Prod => write!(f, "prod"),
        }
    }
}
