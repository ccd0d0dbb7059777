//! Aggregate records handed to reporting sinks.
//!
//! Plain serializable structs; sinks decide the wire format.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::entities::{ErrorKind, PortfolioState};
use crate::values::{AgentId, Timestamp};

/// Per-agent counters at report time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMetrics {
    pub agent_id: AgentId,
    /// Strategy variant name
    pub strategy: String,
    pub trades_executed: u64,
    pub successful: u64,
    pub failed: u64,
    pub errors: BTreeMap<ErrorKind, u64>,
    pub usdc_balance: f64,
    /// Mark-to-market P&L against the agent's initial USDC
    pub rough_pnl: f64,
}

impl AgentMetrics {
    pub fn from_portfolio(
        agent_id: AgentId,
        strategy: impl Into<String>,
        portfolio: &PortfolioState,
        rough_pnl: f64,
    ) -> Self {
        Self {
            agent_id,
            strategy: strategy.into(),
            trades_executed: portfolio.trades_executed,
            successful: portfolio.successful,
            failed: portfolio.failed,
            errors: portfolio.errors.clone(),
            usdc_balance: portfolio.balances.usdc,
            rough_pnl,
        }
    }

    pub fn total_errors(&self) -> u64 {
        self.errors.values().sum()
    }
}

/// Periodic aggregate emitted while the run is in progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub tick: u64,
    pub timestamp: Timestamp,
    /// Successful trades since the start of the run
    pub total_trades: u64,
    /// Successful trades in this tick
    pub tick_trades: u64,
    pub per_agent_metrics: Vec<AgentMetrics>,
}

/// Final aggregate emitted when the scheduler stops
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub ticks_completed: u64,
    /// Successful trades over the run
    pub total_trades: u64,
    /// Orders rejected by the gateway over the run
    pub total_failed: u64,
    /// True when a stop signal ended the run before the configured tick count
    pub stopped_early: bool,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
    /// Error counts by kind summed over all agents
    pub errors: BTreeMap<ErrorKind, u64>,
    pub per_agent_metrics: Vec<AgentMetrics>,
}

/// Event delivered to a reporting sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReportEvent {
    Tick(TickReport),
    Run(RunReport),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_metrics_from_portfolio() {
        let mut portfolio = PortfolioState::new(500.0);
        portfolio.trades_executed = 3;
        portfolio.successful = 2;
        portfolio.failed = 1;
        portfolio.errors.insert(ErrorKind::SlippageExceeded, 1);

        let metrics =
            AgentMetrics::from_portfolio(AgentId::new("retail-1"), "retail", &portfolio, -4.0);
        assert_eq!(metrics.successful, 2);
        assert_eq!(metrics.total_errors(), 1);
        assert_eq!(metrics.usdc_balance, 500.0);
    }

    #[test]
    fn test_report_event_is_tagged() {
        let event = ReportEvent::Tick(TickReport {
            tick: 5,
            timestamp: Utc::now(),
            total_trades: 12,
            tick_trades: 3,
            per_agent_metrics: Vec::new(),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "tick");
        assert_eq!(json["tick"], 5);
    }
}
