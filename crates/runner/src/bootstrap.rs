//! Bootstrap - Market and population setup
//!
//! Turns a validated [`SimulationConfig`] into live components:
//! - Opening every market on the simulated gateway
//! - Building each agent's strategy, ledger and seeded random source
//! - Ordering liquidity providers first so they act before takers each tick

use std::sync::Arc;

use curvesim_core::{AgentId, MarketId, StrategyKind};
use curvesim_curve::{CurvePricingEngine, ExecutionGuard};
use curvesim_gateway::SimulatedGateway;
use curvesim_portfolio::PortfolioTracker;
use curvesim_strategy::{Strategy, StrategyAgent};
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::{ConfigError, SimulationConfig};
use crate::scheduler::{SchedulerSettings, TickScheduler};

/// One agent as the scheduler drives it
pub struct AgentSlot {
    pub agent_id: AgentId,
    pub strategy: StrategyAgent,
    pub tracker: PortfolioTracker,
    pub rng: StdRng,
    /// Markets the agent is evaluated on, in order
    pub markets: Vec<MarketId>,
}

impl AgentSlot {
    pub fn new(
        agent_id: AgentId,
        strategy: StrategyAgent,
        initial_usdc: f64,
        seed: u64,
        markets: Vec<MarketId>,
    ) -> Self {
        Self {
            agent_id,
            strategy,
            tracker: PortfolioTracker::new(initial_usdc),
            rng: StdRng::seed_from_u64(seed),
            markets,
        }
    }

    pub fn kind(&self) -> StrategyKind {
        self.strategy.kind()
    }
}

impl std::fmt::Debug for AgentSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentSlot")
            .field("agent_id", &self.agent_id)
            .field("kind", &self.kind())
            .field("markets", &self.markets)
            .finish()
    }
}

/// Simulation bootstrap - sets up markets and agents
pub struct SimulationBootstrap {
    pub engine: CurvePricingEngine,
    pub gateway: Arc<SimulatedGateway>,
    /// Agents, liquidity providers first
    pub agents: Vec<AgentSlot>,
    pub settings: SchedulerSettings,
}

impl SimulationBootstrap {
    /// Validate the configuration and build every component
    pub fn new(config: &SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let engine = CurvePricingEngine::new(config.integration_steps)?;
        let gateway = SimulatedGateway::with_markets(engine, config.markets.iter().cloned())?;
        let all_markets = config.market_ids();

        // Liquidity providers first; the sort is stable so file order holds otherwise
        let mut entries: Vec<_> = config.population.iter().collect();
        entries.sort_by_key(|entry| !entry.strategy.kind().is_liquidity_provider());

        let mut agents = Vec::with_capacity(config.agent_count());
        let mut per_kind = std::collections::HashMap::<StrategyKind, usize>::new();

        for entry in entries {
            let kind = entry.strategy.kind();
            let markets = entry.markets.clone().unwrap_or_else(|| all_markets.clone());

            for _ in 0..entry.count {
                let ordinal = per_kind.entry(kind).or_insert(0);
                *ordinal += 1;
                let agent_id = AgentId::new(format!("{}-{}", kind.as_str(), ordinal));
                let seed = config.seed.wrapping_add(agents.len() as u64);

                agents.push(AgentSlot::new(
                    agent_id,
                    entry.strategy.build(engine)?,
                    entry.initial_usdc,
                    seed,
                    markets.clone(),
                ));
            }
        }

        info!(
            "Bootstrapped {} markets and {} agents (seed {})",
            all_markets.len(),
            agents.len(),
            config.seed
        );

        Ok(Self {
            engine,
            gateway: Arc::new(gateway),
            agents,
            settings: SchedulerSettings::from_config(config),
        })
    }

    /// Hand the population to a scheduler driving the simulated gateway
    pub fn into_scheduler(self) -> TickScheduler {
        TickScheduler::new(
            self.gateway,
            self.agents,
            ExecutionGuard::new(self.engine),
            self.settings,
        )
    }
}
