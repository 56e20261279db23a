//! The `Oracle` trait — the pluggable routing solver.

use drt_core::TimeWindow;

use crate::RoutingSnapshot;

/// One vehicle's answer: visited slots from its start slot to its end slot,
/// with the realised service window of each visit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VehicleRoute {
    pub slots:   Vec<usize>,
    pub windows: Vec<TimeWindow>,
}

impl VehicleRoute {
    pub fn new(slots: Vec<usize>, windows: Vec<TimeWindow>) -> Self {
        Self { slots, windows }
    }
}

/// A full solution, one route per snapshot vehicle in snapshot order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OracleSolution {
    pub routes: Vec<VehicleRoute>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleOutcome {
    Solved(OracleSolution),
    Infeasible,
    TimedOut,
}

/// Pluggable routing solver.
///
/// The simulation calls `solve` synchronously inside the event handler that
/// triggered a re-optimisation and validates the answer before touching any
/// vehicle, so an oracle never needs to know about live fleet state.
///
/// A solution must route every customer slot of the snapshot exactly once,
/// keep each pickup on the same vehicle before its delivery, stay within
/// capacity and windows, and give one window per visited slot.
///
/// Closures `Fn(&RoutingSnapshot) -> OracleOutcome` implement the trait.
pub trait Oracle: Send + Sync {
    fn solve(&self, snapshot: &RoutingSnapshot) -> OracleOutcome;

    /// Short name used in reports.
    fn name(&self) -> &str {
        "oracle"
    }
}

impl<F> Oracle for F
where
    F: Fn(&RoutingSnapshot) -> OracleOutcome + Send + Sync,
{
    fn solve(&self, snapshot: &RoutingSnapshot) -> OracleOutcome {
        self(snapshot)
    }
}

/// An oracle that never finds a route.  Every request it sees is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectAll;

impl Oracle for RejectAll {
    fn solve(&self, _snapshot: &RoutingSnapshot) -> OracleOutcome {
        OracleOutcome::Infeasible
    }

    fn name(&self) -> &str {
        "reject-all"
    }
}
