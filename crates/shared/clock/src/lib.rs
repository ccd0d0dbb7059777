//! Curvesim Clock Infrastructure
//!
//! Provides time abstractions for the tick scheduler:
//!
//! - `TickClock`: virtual clock advanced once per tick. Virtual time is
//!   `start + tick * tick_interval`; the wall-clock pause between ticks is
//!   derived from the `TimeScale`.
//!
//! ## Usage
//!
//! ```ignore
//! use curvesim_clock::{TickClock, TimeScale};
//!
//! let clock = TickClock::new(None, 1_000, TimeScale::Fast(100));
//! clock.advance();                       // tick 1
//! let pause = clock.inter_tick_delay();  // 10ms of wall time per 1s tick
//! ```

mod tick;

pub use tick::{TickClock, TimeScale};

// Re-export the Clock trait for convenience
pub use curvesim_ports::Clock;
