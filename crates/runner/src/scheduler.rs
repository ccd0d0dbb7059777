//! Tick Scheduler
//!
//! Drives the simulation in discrete ticks:
//!
//! ```text
//! Idle ──run()──► Running ──► Evaluating ──► Submitting ──► Aggregating ──┐
//!                    ▲                                                    │
//!                    └──────────── next tick (or stop) ◄──────────────────┘
//!                                        │
//!                                        ▼
//!                                     Stopped
//! ```
//!
//! - **Evaluating**: one snapshot per market, then every agent decides on
//!   each of its markets in population order. Intents the agent cannot fund
//!   are skipped locally; the rest are bounded by the execution guard.
//! - **Submitting**: bounded orders are grouped by (market, team). Groups run
//!   as concurrent tasks; orders inside a group go out one at a time.
//! - **Aggregating**: results are applied to each agent's ledger in the order
//!   the orders were created, then periodic reports are emitted.
//!
//! A stop signal lets the current tick finish and ends the run. Every
//! per-agent failure becomes an error count in that agent's ledger.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use curvesim_clock::{TickClock, TimeScale};
use curvesim_core::{
    AgentMetrics, BoundedOrder, ErrorKind, ExecutionResult, MarketId, MarketStateSnapshot,
    OrderIntent, OrderSide, ReportEvent, RunReport, Team, TickReport,
};
use curvesim_curve::ExecutionGuard;
use curvesim_portfolio::MarkPrices;
use curvesim_ports::{Clock, GatewayError, GatewayResult, MarketGateway, ReportSink};
use curvesim_strategy::Strategy;
use log::{debug, info, trace, warn};
use tokio::sync::watch;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::bootstrap::AgentSlot;
use crate::config::SimulationConfig;
use crate::error::SchedulerError;

/// Slack allowed when checking an order against the agent's balance
const BALANCE_TOLERANCE: f64 = 1e-9;

/// Pacing and reporting of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Ticks to run; 0 runs until stopped
    pub total_ticks: u64,
    pub report_interval: u64,
    pub tick_interval_ms: u64,
    pub time_scale: TimeScale,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            total_ticks: 100,
            report_interval: 5,
            tick_interval_ms: 1_000,
            time_scale: TimeScale::Normal,
        }
    }
}

impl SchedulerSettings {
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            total_ticks: config.total_ticks,
            report_interval: config.report_interval.max(1),
            tick_interval_ms: config.tick_interval_ms,
            time_scale: config.time_scale,
        }
    }
}

/// Lifecycle of the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Evaluating,
    Submitting,
    Aggregating,
    Stopped,
}

/// Requests a graceful stop; the current tick completes first
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_stop_requested(&self) -> bool {
        *self.tx.borrow()
    }
}

/// An order on its way to the gateway
#[derive(Debug, Clone)]
struct Submission {
    /// Creation order within the tick
    seq: usize,
    agent: usize,
    market_id: MarketId,
    order: BoundedOrder,
}

struct Settled {
    submission: Submission,
    outcome: GatewayResult<ExecutionResult>,
}

type Batches = BTreeMap<(MarketId, Team), Vec<Submission>>;

/// Funds an agent has already committed to orders this tick
#[derive(Default)]
struct Reservations {
    usdc: f64,
    tokens: HashMap<(MarketId, Team), f64>,
}

impl Reservations {
    /// Reserve what the order needs, or report that the agent cannot fund it
    fn try_reserve(&mut self, agent: &AgentSlot, market_id: &MarketId, intent: &OrderIntent) -> bool {
        let state = agent.tracker.state();
        match intent.side {
            OrderSide::Buy => {
                if intent.amount > state.balances.usdc - self.usdc + BALANCE_TOLERANCE {
                    return false;
                }
                self.usdc += intent.amount;
            }
            OrderSide::Sell => {
                let held = state.tokens(market_id, intent.team);
                let reserved = self
                    .tokens
                    .entry((market_id.clone(), intent.team))
                    .or_insert(0.0);
                if intent.amount > held - *reserved + BALANCE_TOLERANCE {
                    return false;
                }
                *reserved += intent.amount;
            }
        }
        true
    }
}

/// Tick-driven orchestrator of the agent population
pub struct TickScheduler {
    gateway: Arc<dyn MarketGateway>,
    agents: Vec<AgentSlot>,
    guard: ExecutionGuard,
    settings: SchedulerSettings,
    clock: TickClock,
    /// Every market any agent trades, in id order
    markets: Vec<MarketId>,
    sinks: Vec<Arc<dyn ReportSink>>,
    state: SchedulerState,
    stop_tx: Arc<watch::Sender<bool>>,
    stop_rx: watch::Receiver<bool>,
    /// Latest spot prices per market, for marking holdings
    marks: MarkPrices,
    total_trades: u64,
    total_failed: u64,
}

impl TickScheduler {
    pub fn new(
        gateway: Arc<dyn MarketGateway>,
        agents: Vec<AgentSlot>,
        guard: ExecutionGuard,
        mut settings: SchedulerSettings,
    ) -> Self {
        settings.report_interval = settings.report_interval.max(1);
        let markets: BTreeSet<MarketId> = agents
            .iter()
            .flat_map(|agent| agent.markets.iter().cloned())
            .collect();
        let (stop_tx, stop_rx) = watch::channel(false);

        Self {
            gateway,
            agents,
            guard,
            settings,
            clock: TickClock::new(None, settings.tick_interval_ms, settings.time_scale),
            markets: markets.into_iter().collect(),
            sinks: Vec::new(),
            state: SchedulerState::Idle,
            stop_tx: Arc::new(stop_tx),
            stop_rx,
            marks: MarkPrices::new(),
            total_trades: 0,
            total_failed: 0,
        }
    }

    /// Add a reporting sink
    pub fn with_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            tx: Arc::clone(&self.stop_tx),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn agents(&self) -> &[AgentSlot] {
        &self.agents
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    pub fn clock(&self) -> &TickClock {
        &self.clock
    }

    fn transition(&mut self, next: SchedulerState) {
        trace!("Scheduler {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Run ticks until the configured count or a stop signal
    ///
    /// A run report is emitted to every sink and returned. A scheduler runs
    /// once; calling this again after it stopped is an error.
    pub async fn run(&mut self) -> Result<RunReport, SchedulerError> {
        match self.state {
            SchedulerState::Idle => {}
            SchedulerState::Stopped => return Err(SchedulerError::AlreadyStopped),
            other => return Err(SchedulerError::NotIdle(other)),
        }

        let run_id = Uuid::new_v4();
        let started_at = self.clock.now();
        let total_ticks = self.settings.total_ticks;
        let mut stop_rx = self.stop_rx.clone();
        let mut ticks_completed = 0;

        self.transition(SchedulerState::Running);
        info!(
            "Run {} started: {} agents on {} markets via {}",
            run_id,
            self.agents.len(),
            self.markets.len(),
            self.gateway.name()
        );

        loop {
            if *stop_rx.borrow() || (total_ticks > 0 && ticks_completed >= total_ticks) {
                break;
            }

            let tick = self.clock.advance();
            let tick_trades = self.run_tick(tick).await;
            ticks_completed = tick;
            self.total_trades += tick_trades;
            self.transition(SchedulerState::Running);

            if tick % self.settings.report_interval == 0 {
                let report = TickReport {
                    tick,
                    timestamp: self.clock.now(),
                    total_trades: self.total_trades,
                    tick_trades,
                    per_agent_metrics: self.agent_metrics(),
                };
                self.emit(ReportEvent::Tick(report));
            }

            if total_ticks > 0 && tick >= total_ticks {
                break;
            }
            Self::pause(self.clock.inter_tick_delay(), &mut stop_rx).await;
        }

        let stopped_early =
            *stop_rx.borrow() && (total_ticks == 0 || ticks_completed < total_ticks);
        self.transition(SchedulerState::Stopped);

        let per_agent_metrics = self.agent_metrics();
        let mut errors: BTreeMap<ErrorKind, u64> = BTreeMap::new();
        for metrics in &per_agent_metrics {
            for (kind, count) in &metrics.errors {
                *errors.entry(*kind).or_insert(0) += count;
            }
        }

        let report = RunReport {
            run_id,
            ticks_completed,
            total_trades: self.total_trades,
            total_failed: self.total_failed,
            stopped_early,
            started_at,
            finished_at: self.clock.now(),
            errors,
            per_agent_metrics,
        };
        info!(
            "Run {} finished after {} ticks: {} trades, {} failed{}",
            run_id,
            ticks_completed,
            report.total_trades,
            report.total_failed,
            if stopped_early { " (stopped early)" } else { "" }
        );
        self.emit(ReportEvent::Run(report.clone()));

        Ok(report)
    }

    /// Inter-tick delay, cut short by a stop signal
    async fn pause(delay: Duration, stop_rx: &mut watch::Receiver<bool>) {
        if delay.is_zero() {
            tokio::task::yield_now().await;
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = stop_rx.changed() => {}
        }
    }

    /// One full tick; returns the number of successful trades
    async fn run_tick(&mut self, tick: u64) -> u64 {
        self.transition(SchedulerState::Evaluating);
        let snapshots = self.fetch_snapshots().await;
        let batches = self.evaluate(tick, &snapshots);

        self.transition(SchedulerState::Submitting);
        let settled = Self::submit(Arc::clone(&self.gateway), batches).await;

        self.transition(SchedulerState::Aggregating);
        self.aggregate(tick, settled)
    }

    async fn fetch_snapshots(&mut self) -> BTreeMap<MarketId, GatewayResult<MarketStateSnapshot>> {
        let gateway = Arc::clone(&self.gateway);
        let mut snapshots = BTreeMap::new();

        for market_id in self.markets.clone() {
            let fetched = gateway.fetch_market_state(&market_id).await;
            match &fetched {
                Ok(snapshot) => {
                    let prices = self.guard.engine().spot_prices(snapshot);
                    self.marks.insert(market_id.clone(), prices);
                }
                Err(e) => warn!("State fetch for {} failed: {}", market_id, e),
            }
            snapshots.insert(market_id, fetched);
        }

        snapshots
    }

    /// Let every agent decide, returning its fundable orders grouped for submission
    fn evaluate(
        &mut self,
        tick: u64,
        snapshots: &BTreeMap<MarketId, GatewayResult<MarketStateSnapshot>>,
    ) -> Batches {
        let guard = self.guard;
        let mut batches = Batches::new();
        let mut seq = 0;

        for (index, agent) in self.agents.iter_mut().enumerate() {
            let mut reservations = Reservations::default();

            for market_id in agent.markets.clone() {
                let snapshot = match snapshots.get(&market_id) {
                    Some(Ok(snapshot)) => snapshot,
                    Some(Err(_)) => {
                        agent.tracker.record_error(ErrorKind::StateFetchFailure);
                        continue;
                    }
                    None => continue,
                };
                if snapshot.halted {
                    debug!("[{}] {} halted, skipping", agent.agent_id, market_id);
                    agent.tracker.record_error(ErrorKind::MarketHalted);
                    continue;
                }

                let intents = agent
                    .strategy
                    .decide(snapshot, agent.tracker.state(), &mut agent.rng);

                for intent in intents {
                    if !reservations.try_reserve(agent, &market_id, &intent) {
                        debug!(
                            "[{}] tick {}: cannot fund {} {} {:.6} on {}",
                            agent.agent_id, tick, intent.side, intent.team, intent.amount, market_id
                        );
                        agent.tracker.record_error(ErrorKind::InsufficientBalance);
                        continue;
                    }

                    let order = match guard.bound_order(intent, snapshot) {
                        Ok(order) => order,
                        Err(e) => {
                            warn!("[{}] order on {} not bounded: {}", agent.agent_id, market_id, e);
                            agent.tracker.record_error(e.kind());
                            continue;
                        }
                    };

                    agent.tracker.record_attempt();
                    batches
                        .entry((market_id.clone(), intent.team))
                        .or_default()
                        .push(Submission {
                            seq,
                            agent: index,
                            market_id: market_id.clone(),
                            order,
                        });
                    seq += 1;
                }
            }
        }

        batches
    }

    /// Submit every group concurrently, serializing orders inside a group
    async fn submit(gateway: Arc<dyn MarketGateway>, batches: Batches) -> Vec<Settled> {
        let mut outstanding: BTreeMap<usize, Submission> = BTreeMap::new();
        let mut tasks = JoinSet::new();

        for orders in batches.into_values() {
            outstanding.extend(orders.iter().map(|s| (s.seq, s.clone())));
            let gateway = Arc::clone(&gateway);
            tasks.spawn(async move {
                let mut settled = Vec::with_capacity(orders.len());
                for submission in orders {
                    let outcome = gateway
                        .submit_order(&submission.market_id, &submission.order)
                        .await;
                    settled.push(Settled { submission, outcome });
                }
                settled
            });
        }

        let mut settled = Vec::with_capacity(outstanding.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(group) => {
                    for item in group {
                        outstanding.remove(&item.submission.seq);
                        settled.push(item);
                    }
                }
                Err(e) => warn!("Submission task failed: {}", e),
            }
        }

        // Orders lost with a failed task never got an answer
        settled.extend(outstanding.into_values().map(|submission| Settled {
            submission,
            outcome: Err(GatewayError::Unavailable("submission task failed".to_string())),
        }));
        settled.sort_by_key(|item| item.submission.seq);
        settled
    }

    fn aggregate(&mut self, tick: u64, settled: Vec<Settled>) -> u64 {
        let mut tick_trades = 0;

        for Settled { submission, outcome } in settled {
            let agent = &mut self.agents[submission.agent];
            let intent = submission.order.intent;

            let result = match outcome {
                Ok(result) => result,
                Err(e) => {
                    warn!("[{}] submission on {} failed: {}", agent.agent_id, submission.market_id, e);
                    ExecutionResult::rejected(ErrorKind::SubmissionFailure)
                }
            };

            if result.success {
                tick_trades += 1;
            } else {
                self.total_failed += 1;
                debug!(
                    "[{}] {} {} on {} rejected: {:?}",
                    agent.agent_id, intent.side, intent.team, submission.market_id, result.error_kind
                );
            }

            agent
                .tracker
                .record_result(&submission.market_id, &intent, &result, tick);
            agent
                .strategy
                .on_execution(&submission.market_id, &intent, &result);
        }

        trace!("Tick {} aggregated: {} trades", tick, tick_trades);
        tick_trades
    }

    fn agent_metrics(&self) -> Vec<AgentMetrics> {
        self.agents
            .iter()
            .map(|agent| {
                AgentMetrics::from_portfolio(
                    agent.agent_id.clone(),
                    agent.strategy.name(),
                    agent.tracker.state(),
                    agent.tracker.rough_pnl(&self.marks),
                )
            })
            .collect()
    }

    fn emit(&self, event: ReportEvent) {
        for sink in &self.sinks {
            sink.emit(&event);
        }
    }
}
