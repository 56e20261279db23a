//! The commit-or-reject re-optimisation protocol.
//!
//! ```text
//! build snapshot ──► oracle.solve ──► RoutePlan::validate ──► RoutePlan::apply
//!       │                 │                    │                     │
//!       └─ Snapshot       └─ Infeasible        └─ InvalidSolution    └─ Commit
//!                            TimedOut
//! ```
//!
//! Any failure along the way is a rejection: nothing has been written to the
//! fleet, and the caller decides how to account for it.

use std::fmt;

use drt_fleet::Fleet;
use drt_network::{DistanceModel, StopNetwork};

use crate::commit::{CommitEffect, RoutePlan};
use crate::oracle::{Oracle, OracleOutcome};
use crate::{RoutingError, SnapshotBuilder, SnapshotRequest};

/// Why a re-optimisation was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The snapshot could not be built (e.g. a time-window conflict).
    Snapshot(RoutingError),
    Infeasible,
    TimedOut,
    /// The oracle answered with something that does not fit the snapshot.
    InvalidSolution(RoutingError),
    /// Live state no longer matched the snapshot at commit time.
    Commit(RoutingError),
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::Snapshot(_)        => "snapshot",
            RejectReason::Infeasible         => "infeasible",
            RejectReason::TimedOut           => "timed_out",
            RejectReason::InvalidSolution(_) => "invalid_solution",
            RejectReason::Commit(_)          => "commit",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Snapshot(e) | RejectReason::InvalidSolution(e) | RejectReason::Commit(e) => {
                write!(f, "{}: {e}", self.as_str())
            }
            _ => f.write_str(self.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReoptOutcome {
    Committed {
        effects: Vec<CommitEffect>,
        /// Size of the snapshot that was solved.
        slots:   usize,
    },
    Rejected(RejectReason),
}

impl ReoptOutcome {
    #[inline]
    pub fn is_committed(&self) -> bool {
        matches!(self, ReoptOutcome::Committed { .. })
    }
}

/// Run one snapshot → solve → commit cycle.
pub fn reoptimize(
    builder: &SnapshotBuilder,
    oracle:  &dyn Oracle,
    request: &SnapshotRequest,
    fleet:   &mut Fleet,
    network: &StopNetwork,
    metric:  &dyn DistanceModel,
) -> ReoptOutcome {
    let snapshot = match builder.build(request, fleet, network, metric) {
        Ok(s) => s,
        Err(e) => return ReoptOutcome::Rejected(RejectReason::Snapshot(e)),
    };
    let solution = match oracle.solve(&snapshot) {
        OracleOutcome::Solved(s) => s,
        OracleOutcome::Infeasible => return ReoptOutcome::Rejected(RejectReason::Infeasible),
        OracleOutcome::TimedOut => return ReoptOutcome::Rejected(RejectReason::TimedOut),
    };
    let plan = match RoutePlan::validate(&snapshot, &solution) {
        Ok(p) => p,
        Err(e) => return ReoptOutcome::Rejected(RejectReason::InvalidSolution(e)),
    };
    match plan.apply(fleet) {
        Ok(effects) => ReoptOutcome::Committed { effects, slots: snapshot.slot_count() },
        Err(e) => ReoptOutcome::Rejected(RejectReason::Commit(e)),
    }
}
