//! Error types for the runner crate

use curvesim_core::ErrorKind;
use thiserror::Error;

use crate::scheduler::SchedulerState;

/// Errors driving the tick scheduler
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Scheduler already stopped; build a new one to run again")]
    AlreadyStopped,

    #[error("Scheduler cannot start from state {0:?}")]
    NotIdle(SchedulerState),
}

impl SchedulerError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidConfiguration
    }
}
