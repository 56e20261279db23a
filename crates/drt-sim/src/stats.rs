//! Run counters and the end-of-run report.

use std::fmt;

use drt_core::SimTime;
use drt_events::EventKind;
use drt_fleet::{Customer, CustomerState, Fleet};
use drt_routing::RejectReason;

/// Counters updated by the event loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimStats {
    pub events_handled:      u64,
    /// Indexed by `EventKind as usize`.
    pub events_by_kind:      [u64; 6],
    pub boardings:           u64,
    pub alightings:          u64,
    /// Boardings refused because the vehicle was full.
    pub denied_full:         u64,

    pub reopt_attempts:      u64,
    pub reopt_committed:     u64,
    pub dynamic_infeasible:  u64,
    pub oracle_timeouts:     u64,
    pub snapshot_errors:     u64,
    pub invalid_solutions:   u64,
    pub stale_commits:       u64,

    pub contract_violations: u64,
    /// Customers still `Requested` when the queue drained.
    pub unserved_at_end:     u64,
}

impl SimStats {
    pub(crate) fn count_event(&mut self, kind: EventKind) {
        self.events_handled += 1;
        self.events_by_kind[kind as usize] += 1;
    }

    pub(crate) fn count_rejection(&mut self, reason: &RejectReason) {
        match reason {
            RejectReason::Snapshot(_)        => self.snapshot_errors += 1,
            RejectReason::Infeasible         => self.dynamic_infeasible += 1,
            RejectReason::TimedOut           => self.oracle_timeouts += 1,
            RejectReason::InvalidSolution(_) => self.invalid_solutions += 1,
            RejectReason::Commit(_)          => self.stale_commits += 1,
        }
    }

    pub fn events_of(&self, kind: EventKind) -> u64 {
        self.events_by_kind[kind as usize]
    }

    /// Re-optimisations that ended in any kind of rejection.
    pub fn reopt_rejected(&self) -> u64 {
        self.reopt_attempts - self.reopt_committed
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimReport {
    pub end_time:         SimTime,
    pub stats:            SimStats,
    pub customers:        usize,
    pub served:           usize,
    pub rejected:         usize,
    /// Means over served customers; `None` when nobody was served.
    pub mean_wait_secs:   Option<f64>,
    pub mean_ride_secs:   Option<f64>,
    pub mean_delay_secs:  Option<f64>,
    pub total_distance_m: f64,
}

impl SimReport {
    pub fn new(end_time: SimTime, stats: SimStats, fleet: &Fleet) -> Self {
        let served: Vec<&Customer> = fleet.customers().iter().filter(|c| c.is_served()).collect();
        let rejected = fleet
            .customers()
            .iter()
            .filter(|c| matches!(c.state(), CustomerState::Rejected))
            .count();
        Self {
            end_time,
            customers:        fleet.customer_count(),
            served:           served.len(),
            rejected,
            mean_wait_secs:   mean(served.iter().filter_map(|c| c.wait_secs()).map(|s| s as f64)),
            mean_ride_secs:   mean(served.iter().filter_map(|c| c.ride_secs()).map(|s| s as f64)),
            mean_delay_secs:  mean(served.iter().filter_map(|c| c.delay_secs()).map(|s| s as f64)),
            total_distance_m: fleet.vehicles().iter().map(|v| v.distance_m()).sum(),
            stats,
        }
    }

    /// Served share of all customers, `0.0` for an empty run.
    pub fn service_rate(&self) -> f64 {
        if self.customers == 0 {
            0.0
        } else {
            self.served as f64 / self.customers as f64
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0u32), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

impl fmt::Display for SimReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = |v: Option<f64>| v.map_or_else(|| "-".to_owned(), |s| format!("{s:.0} s"));
        writeln!(f, "finished at      {}", self.end_time)?;
        writeln!(f, "events           {}", self.stats.events_handled)?;
        writeln!(
            f,
            "customers        {} ({} served, {} rejected, {:.1}% service rate)",
            self.customers,
            self.served,
            self.rejected,
            self.service_rate() * 100.0
        )?;
        writeln!(
            f,
            "re-optimisations {} ({} committed, {} infeasible, {} timed out, {} snapshot errors)",
            self.stats.reopt_attempts,
            self.stats.reopt_committed,
            self.stats.dynamic_infeasible,
            self.stats.oracle_timeouts,
            self.stats.snapshot_errors
        )?;
        writeln!(f, "denied (full)    {}", self.stats.denied_full)?;
        writeln!(f, "mean wait        {}", secs(self.mean_wait_secs))?;
        writeln!(f, "mean ride        {}", secs(self.mean_ride_secs))?;
        writeln!(f, "mean delay       {}", secs(self.mean_delay_secs))?;
        write!(f, "fleet distance   {:.1} km", self.total_distance_m / 1_000.0)
    }
}
