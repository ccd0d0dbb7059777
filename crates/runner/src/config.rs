//! Simulation Configuration
//!
//! JSON-loadable description of a run: the markets, the agent population and
//! the pacing of the tick scheduler. Every field has a default, so a partial
//! file only needs to name what it changes.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use curvesim_clock::TimeScale;
use curvesim_core::{CurveParameters, ErrorKind, MarketId, StrategyKind};
use curvesim_curve::{CurveError, DEFAULT_INTEGRATION_STEPS};
use curvesim_gateway::{MarketSetup, SimulatorError};
use curvesim_strategy::{StrategyConfig, StrategyConfigError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading or validating a simulation configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Strategy(#[from] StrategyConfigError),

    #[error(transparent)]
    Market(#[from] SimulatorError),

    #[error(transparent)]
    Curve(#[from] CurveError),
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidConfiguration
    }
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(reason.into())
}

/// A group of identically configured agents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationEntry {
    pub strategy: StrategyConfig,
    #[serde(default = "default_count")]
    pub count: usize,
    pub initial_usdc: f64,
    /// Markets these agents trade; all markets when absent
    #[serde(default)]
    pub markets: Option<Vec<MarketId>>,
}

fn default_count() -> usize {
    1
}

impl PopulationEntry {
    pub fn new(strategy: StrategyConfig, count: usize, initial_usdc: f64) -> Self {
        Self {
            strategy,
            count,
            initial_usdc,
            markets: None,
        }
    }

    pub fn on_markets(mut self, markets: impl IntoIterator<Item = MarketId>) -> Self {
        self.markets = Some(markets.into_iter().collect());
        self
    }
}

/// Simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed for every agent's random source
    pub seed: u64,
    /// Virtual length of one tick
    pub tick_interval_ms: u64,
    /// Ticks to run; 0 runs until stopped
    pub total_ticks: u64,
    /// Ticks between aggregate reports
    pub report_interval: u64,
    /// Increments used by the curve integrals
    pub integration_steps: usize,
    pub time_scale: TimeScale,
    pub markets: Vec<MarketSetup>,
    pub population: Vec<PopulationEntry>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let linear = CurveParameters::default();
        Self {
            seed: 42,
            tick_interval_ms: 1_000,
            total_ticks: 100,
            report_interval: 5,
            integration_steps: DEFAULT_INTEGRATION_STEPS,
            time_scale: TimeScale::Fast(10),
            markets: vec![
                MarketSetup::new("final-linear", linear)
                    .with_supplies(1_000.0, 1_000.0)
                    .with_pool(Decimal::ONE_THOUSAND),
                MarketSetup::new("final-power", CurveParameters::power(0.0001, 2.0)),
            ],
            population: vec![
                PopulationEntry::new(StrategyConfig::default_for(StrategyKind::MarketMaker), 2, 10_000.0),
                PopulationEntry::new(
                    StrategyConfig::default_for(StrategyKind::IntelligentMarketMaker),
                    1,
                    5_000.0,
                ),
                PopulationEntry::new(StrategyConfig::default_for(StrategyKind::Arbitrageur), 1, 5_000.0),
                PopulationEntry::new(StrategyConfig::default_for(StrategyKind::Momentum), 2, 2_000.0),
                PopulationEntry::new(StrategyConfig::default_for(StrategyKind::Whale), 1, 20_000.0),
                PopulationEntry::new(StrategyConfig::default_for(StrategyKind::Retail), 5, 500.0),
            ],
        }
    }
}

impl SimulationConfig {
    /// Load and validate a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Parse and validate a JSON configuration
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn market_ids(&self) -> Vec<MarketId> {
        self.markets.iter().map(|m| m.id.clone()).collect()
    }

    pub fn agent_count(&self) -> usize {
        self.population.iter().map(|entry| entry.count).sum()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.report_interval == 0 {
            return Err(invalid("report_interval must be positive"));
        }
        if self.integration_steps == 0 {
            return Err(invalid("integration_steps must be positive"));
        }
        if self.tick_interval_ms == 0 && self.time_scale != TimeScale::Fixed {
            return Err(invalid("tick_interval_ms must be positive unless time_scale is fixed"));
        }
        if self.time_scale == TimeScale::Fast(0) {
            return Err(invalid("fast time scale needs a positive multiplier"));
        }

        if self.markets.is_empty() {
            return Err(invalid("at least one market is required"));
        }
        let mut ids = HashSet::new();
        for market in &self.markets {
            if !ids.insert(&market.id) {
                return Err(SimulatorError::DuplicateMarket(market.id.clone()).into());
            }
            market
                .validate()
                .map_err(|reason| SimulatorError::InvalidMarket {
                    market_id: market.id.clone(),
                    reason,
                })?;
        }

        if self.agent_count() == 0 {
            return Err(invalid("population must contain at least one agent"));
        }
        for entry in &self.population {
            entry.strategy.validate()?;
            if !entry.initial_usdc.is_finite() || entry.initial_usdc < 0.0 {
                return Err(invalid(format!(
                    "{} initial_usdc must be non-negative, got {}",
                    entry.strategy.kind(),
                    entry.initial_usdc
                )));
            }
            if let Some(markets) = &entry.markets {
                if markets.is_empty() {
                    return Err(invalid(format!(
                        "{} market list must not be empty",
                        entry.strategy.kind()
                    )));
                }
                if let Some(unknown) = markets.iter().find(|id| !ids.contains(id)) {
                    return Err(SimulatorError::UnknownMarket(unknown.clone()).into());
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.agent_count(), 12);
        assert_eq!(config.report_interval, 5);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SimulationConfig::from_json(
            r#"{
                "seed": 7,
                "total_ticks": 20,
                "time_scale": "fixed",
                "markets": [
                    {"id": "m1", "curve": {"kind": "power", "k": 0.0001, "n": 2.0}}
                ],
                "population": [
                    {"strategy": {"type": "retail", "favorite_team": "A"}, "count": 3, "initial_usdc": 100.0},
                    {"strategy": {"type": "arbitrageur"}, "initial_usdc": 1000.0, "markets": ["m1"]}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.tick_interval_ms, 1_000);
        assert_eq!(config.time_scale, TimeScale::Fixed);
        assert_eq!(config.agent_count(), 4);
        assert_eq!(config.population[1].count, 1);
        assert_eq!(config.markets[0].curve, CurveParameters::power(0.0001, 2.0));
    }

    #[test]
    fn test_rejects_bad_configs() {
        let unknown_market = SimulationConfig {
            population: vec![
                PopulationEntry::new(StrategyConfig::default_for(StrategyKind::Retail), 1, 100.0)
                    .on_markets([MarketId::new("nowhere")]),
            ],
            ..Default::default()
        };
        assert!(matches!(
            unknown_market.validate(),
            Err(ConfigError::Market(SimulatorError::UnknownMarket(_)))
        ));

        let mut duplicate = SimulationConfig::default();
        duplicate.markets.push(duplicate.markets[0].clone());
        assert!(duplicate.validate().is_err());

        let no_agents = SimulationConfig {
            population: Vec::new(),
            ..Default::default()
        };
        let err = no_agents.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);

        assert!(matches!(
            SimulationConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            SimulationConfig::from_file("/definitely/not/here.json"),
            Err(ConfigError::Io { .. })
        ));
    }
}
