//! Report Sinks
//!
//! Implementations of the `ReportSink` port. Emission never blocks the
//! scheduler: the channel sink drops events when its buffer is full.

use std::sync::Mutex;

use curvesim_core::ReportEvent;
use curvesim_ports::ReportSink;
use log::{info, warn};
use tokio::sync::mpsc;

/// Writes each event as one JSON line through the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ReportSink for LogSink {
    fn emit(&self, event: &ReportEvent) {
        match serde_json::to_string(event) {
            Ok(json) => info!(target: "curvesim::report", "{}", json),
            Err(e) => warn!("Failed to serialize report: {}", e),
        }
    }
}

/// Forwards events to an async consumer
pub struct ChannelSink {
    tx: mpsc::Sender<ReportEvent>,
}

impl ChannelSink {
    /// Sink and the receiving half, buffering up to `capacity` events
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ReportEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl ReportSink for ChannelSink {
    fn emit(&self, event: &ReportEvent) {
        if let Err(e) = self.tx.try_send(event.clone()) {
            warn!("Report dropped: {}", e);
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<ReportEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the events emitted so far
    pub fn events(&self) -> Vec<ReportEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl ReportSink for MemorySink {
    fn emit(&self, event: &ReportEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use curvesim_core::TickReport;

    fn tick(n: u64) -> ReportEvent {
        ReportEvent::Tick(TickReport {
            tick: n,
            timestamp: Utc::now(),
            total_trades: 0,
            tick_trades: 0,
            per_agent_metrics: Vec::new(),
        })
    }

    #[test]
    fn test_memory_sink_keeps_order() {
        let sink = MemorySink::new();
        sink.emit(&tick(5));
        sink.emit(&tick(10));

        let ticks: Vec<u64> = sink
            .events()
            .into_iter()
            .filter_map(|e| match e {
                ReportEvent::Tick(t) => Some(t.tick),
                ReportEvent::Run(_) => None,
            })
            .collect();
        assert_eq!(ticks, vec![5, 10]);
    }

    #[tokio::test]
    async fn test_channel_sink_drops_when_full() {
        let (sink, mut rx) = ChannelSink::new(1);
        sink.emit(&tick(1));
        sink.emit(&tick(2));

        match rx.recv().await {
            Some(ReportEvent::Tick(report)) => assert_eq!(report.tick, 1),
            other => panic!("unexpected event {:?}", other),
        }
        assert!(rx.try_recv().is_err());
    }
}
