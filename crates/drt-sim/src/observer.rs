//! Simulation observer trait: the trace and statistics side channels.

use drt_core::SimTime;
use drt_fleet::Fleet;

use crate::{ReoptRecord, SimError, SimReport, TraceRecord, ValidationRecord};

/// Callbacks invoked by [`Sim::run`][crate::Sim::run] as events are handled.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.  Observers are write-only: nothing they do
/// feeds back into the simulation.
///
/// # Example — request log
///
/// ```rust,ignore
/// struct RequestLog;
///
/// impl SimObserver for RequestLog {
///     fn on_reoptimization(&mut self, record: &ReoptRecord) {
///         println!("{} {:?}: {}", record.time, record.customers, record.outcome);
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called once per handled event, after its Handle and Append steps.
    fn on_event(&mut self, _record: &TraceRecord) {}

    /// Called for every board or alight attempt, successful or not.
    fn on_validation(&mut self, _record: &ValidationRecord) {}

    /// Called after every re-optimisation attempt, committed or rejected.
    fn on_reoptimization(&mut self, _record: &ReoptRecord) {}

    /// Called when an event is abandoned because of a lifecycle contract
    /// violation.  In strict mode the run stops right after this call.
    fn on_contract_violation(&mut self, _time: SimTime, _error: &SimError) {}

    /// Called when [`Sim::run`][crate::Sim::run] is about to return `Err`
    /// (strict-mode violation or a fatal queue error).  `on_sim_end` is not
    /// called for that run.
    fn on_run_aborted(&mut self, _time: SimTime, _error: &SimError, _fleet: &Fleet) {}

    /// Called once when the queue has drained and unserved customers have
    /// been closed out.
    fn on_sim_end(&mut self, _report: &SimReport, _fleet: &Fleet) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
