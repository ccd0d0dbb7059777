use curvesim_core::Timestamp;

/// Source of report timestamps.
///
/// The scheduler stamps tick and run reports with the time of its virtual
/// tick clock, so a run reads the same regardless of how fast it was paced.
pub trait Clock: Send + Sync {
    /// Time at the current tick
    fn now(&self) -> Timestamp;

    /// Short label used in logs
    fn name(&self) -> &str {
        "clock"
    }
}
