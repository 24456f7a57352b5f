pub mod config;
pub mod crossover;
pub mod registry;

pub use config::{StrategyConfig, StrategyFileConfig};
pub use crossover::CrossoverInput;
pub use registry::{Evaluation, StrategyRegistry};

use std::str::FromStr;

use common::{Error, IndicatorRow, Result};

/// Discrete per-bar signal. Persisted as its upper-case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalCode {
    Buy,
    Sell,
    /// No actionable signal on this bar.
    Nil,
}

impl SignalCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalCode::Buy => "BUY",
            SignalCode::Sell => "SELL",
            SignalCode::Nil => "NIL",
        }
    }

    pub fn is_actionable(&self) -> bool {
        *self != SignalCode::Nil
    }
}

impl std::fmt::Display for SignalCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "BUY" => Ok(SignalCode::Buy),
            "SELL" => Ok(SignalCode::Sell),
            "NIL" => Ok(SignalCode::Nil),
            other => Err(Error::Store(format!("unknown signal code '{other}'"))),
        }
    }
}

/// The strategy families this service evaluates. Each variant fixes which
/// SMA fields it reads and which column it persists to; all of them share the
/// crossover computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// Short-window crossover over the 5/10/20-period SMAs.
    Ssma,
    /// Long-window crossover over the 60/120/240-period SMAs.
    Lsma,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 2] = [StrategyKind::Ssma, StrategyKind::Lsma];

    /// Name carried on notification events.
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::Ssma => "ssma",
            StrategyKind::Lsma => "lsma",
        }
    }

    /// Strategy-row column holding this strategy's codes.
    pub fn column(&self) -> &'static str {
        self.name()
    }

    /// Parse the SMA fields this strategy needs from one row.
    pub fn input(&self, row: &IndicatorRow) -> Result<CrossoverInput> {
        let (short, medium, long) = match self {
            StrategyKind::Ssma => (
                ("sma0005", &row.sma0005),
                ("sma0010", &row.sma0010),
                ("sma0020", &row.sma0020),
            ),
            StrategyKind::Lsma => (
                ("sma0060", &row.sma0060),
                ("sma0120", &row.sma0120),
                ("sma0240", &row.sma0240),
            ),
        };

        Ok(CrossoverInput::new(
            parse_decimal(short.0, short.1, row.datetime)?,
            parse_decimal(medium.0, medium.1, row.datetime)?,
            parse_decimal(long.0, long.1, row.datetime)?,
        ))
    }

    pub fn compute(&self, inputs: &[CrossoverInput]) -> Vec<SignalCode> {
        crossover::calculate(inputs)
    }
}

impl FromStr for StrategyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ssma" => Ok(StrategyKind::Ssma),
            "lsma" => Ok(StrategyKind::Lsma),
            other => Err(Error::Config(format!("unknown strategy type '{other}'"))),
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn parse_decimal(field: &'static str, raw: &str, datetime: i64) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::Format {
            field,
            value: raw.to_string(),
            datetime,
        })
}
