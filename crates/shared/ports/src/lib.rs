//! Curvesim Ports
//!
//! Port definitions (traits) for the curvesim trading simulator.
//! These define the boundaries between the simulation core and the
//! collaborators it does not own: the market gateway, reporting sinks and
//! the time source.

mod clock;
mod error;
mod gateway;
mod report;

pub use clock::Clock;
pub use error::{GatewayError, GatewayResult};
pub use gateway::MarketGateway;
pub use report::ReportSink;
