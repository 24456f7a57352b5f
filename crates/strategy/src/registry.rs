use tracing::{info, warn};

use common::{Error, IndicatorRow, Result};

use crate::config::StrategyFileConfig;
use crate::{SignalCode, StrategyKind};

/// Codes produced by one strategy, aligned 1:1 with the evaluated rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub strategy: StrategyKind,
    pub codes: Vec<SignalCode>,
}

/// Holds the active strategies and maps indicator series through them.
#[derive(Debug, Clone)]
pub struct StrategyRegistry {
    strategies: Vec<StrategyKind>,
}

impl StrategyRegistry {
    pub fn new(strategies: Vec<StrategyKind>) -> Self {
        Self { strategies }
    }

    /// Build the registry from config, failing on unknown strategy types.
    /// A file without any entries registers every known strategy; a file
    /// whose entries are all disabled is rejected.
    pub fn from_config(file_cfg: &StrategyFileConfig) -> Result<Self> {
        if file_cfg.strategies.is_empty() {
            info!("No strategies configured, registering all known strategies");
            return Ok(Self::new(StrategyKind::ALL.to_vec()));
        }

        let mut strategies = Vec::new();
        for cfg in &file_cfg.strategies {
            let kind: StrategyKind = cfg.strategy_type.parse()?;
            if !cfg.enabled {
                info!(strategy = %kind, "Strategy disabled in config");
                continue;
            }
            if strategies.contains(&kind) {
                warn!(strategy = %kind, "Duplicate strategy entry ignored");
                continue;
            }
            info!(strategy = %kind, column = kind.column(), "Registered strategy");
            strategies.push(kind);
        }

        if strategies.is_empty() {
            return Err(Error::Config("no strategies enabled".to_string()));
        }

        Ok(Self::new(strategies))
    }

    pub fn strategies(&self) -> &[StrategyKind] {
        &self.strategies
    }

    /// Evaluate every registered strategy over `rows` (oldest first).
    ///
    /// All inputs are parsed before anything is computed, so a malformed
    /// field fails the whole call and no partial result escapes.
    pub fn evaluate(&self, rows: &[IndicatorRow]) -> Result<Vec<Evaluation>> {
        let inputs = self
            .strategies
            .iter()
            .map(|kind| {
                rows.iter()
                    .map(|row| kind.input(row))
                    .collect::<Result<Vec<_>>>()
                    .map(|series| (*kind, series))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(inputs
            .into_iter()
            .map(|(strategy, series)| Evaluation {
                strategy,
                codes: strategy.compute(&series),
            })
            .collect())
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new(StrategyKind::ALL.to_vec())
    }
}
