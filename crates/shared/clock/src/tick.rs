use chrono::{Duration, Utc};
use curvesim_core::Timestamp;
use curvesim_ports::Clock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// How virtual tick time maps onto wall time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeScale {
    /// One tick interval of wall time per tick
    #[default]
    Normal,
    /// Accelerated (interval divided by the multiplier)
    Fast(u32),
    /// No wall-clock pause between ticks
    Fixed,
}

/// Virtual clock driven by the tick scheduler
///
/// Time only moves when `advance` is called; every reader within a tick
/// observes the same instant.
pub struct TickClock {
    /// Virtual time of tick 0
    start: Timestamp,
    /// Virtual duration of one tick
    tick_interval_ms: u64,
    scale: TimeScale,
    tick: AtomicU64,
}

impl TickClock {
    /// Create a clock at tick 0
    ///
    /// # Arguments
    /// * `start` - Virtual time of tick 0. If None, uses current wall time.
    /// * `tick_interval_ms` - Virtual length of one tick
    /// * `scale` - Wall-clock pacing
    pub fn new(start: Option<Timestamp>, tick_interval_ms: u64, scale: TimeScale) -> Self {
        Self {
            start: start.unwrap_or_else(Utc::now),
            tick_interval_ms,
            scale,
            tick: AtomicU64::new(0),
        }
    }

    /// Current tick number
    pub fn tick(&self) -> u64 {
        self.tick.load(Ordering::Acquire)
    }

    /// Move to the next tick, returning its number
    pub fn advance(&self) -> u64 {
        self.tick.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Virtual time at a given tick
    pub fn time_at(&self, tick: u64) -> Timestamp {
        let elapsed = self.tick_interval_ms.saturating_mul(tick);
        self.start + Duration::milliseconds(i64::try_from(elapsed).unwrap_or(i64::MAX))
    }

    pub fn time_scale(&self) -> TimeScale {
        self.scale
    }

    /// Wall-clock pause to take between two ticks
    pub fn inter_tick_delay(&self) -> std::time::Duration {
        let interval = std::time::Duration::from_millis(self.tick_interval_ms);
        match self.scale {
            TimeScale::Normal => interval,
            TimeScale::Fast(multiplier) => interval / multiplier.max(1),
            TimeScale::Fixed => std::time::Duration::ZERO,
        }
    }
}

impl Clock for TickClock {
    fn now(&self) -> Timestamp {
        self.time_at(self.tick())
    }

    fn name(&self) -> &str {
        "TickClock"
    }
}
