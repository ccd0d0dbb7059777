use curvesim_core::ReportEvent;

/// Port for reporting sinks (dashboards, telemetry, logs)
///
/// Emission must not block the scheduler; sinks that forward elsewhere
/// should buffer or drop.
pub trait ReportSink: Send + Sync {
    fn emit(&self, event: &ReportEvent);
}
