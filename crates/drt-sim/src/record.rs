//! Write-only records emitted to the observer.

use std::fmt;

use drt_core::{CustomerId, SimTime, StopId, VehicleId};
use drt_events::{EventKind, EventPayload};

/// One handled event.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceRecord {
    pub time:        SimTime,
    pub seq:         u64,
    pub kind:        EventKind,
    pub payload:     EventPayload,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    Board,
    Alight,
}

impl Interaction {
    pub fn as_str(self) -> &'static str {
        match self {
            Interaction::Board  => "board",
            Interaction::Alight => "alight",
        }
    }
}

impl fmt::Display for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One customer-vehicle interaction and whether it went through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRecord {
    pub time:     SimTime,
    pub customer: CustomerId,
    pub vehicle:  VehicleId,
    pub stop:     StopId,
    pub action:   Interaction,
    pub success:  bool,
    /// Failure reason, `None` on success.
    pub reason:   Option<String>,
}

/// What started a re-optimisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReoptTrigger {
    /// All pre-booked customers at once, before the first event.
    ColdStart,
    /// One pre-booked customer after the joint cold start failed.
    ColdStartFallback,
    /// A `CustomerRequest` event.
    Request,
    /// A batched customer on a `DynamicCheck` tick.
    DynamicCheck,
}

impl ReoptTrigger {
    pub fn as_str(self) -> &'static str {
        match self {
            ReoptTrigger::ColdStart         => "cold_start",
            ReoptTrigger::ColdStartFallback => "cold_start_fallback",
            ReoptTrigger::Request           => "request",
            ReoptTrigger::DynamicCheck      => "dynamic_check",
        }
    }
}

/// One snapshot → solve → commit cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReoptRecord {
    pub time:      SimTime,
    pub trigger:   ReoptTrigger,
    pub customers: Vec<CustomerId>,
    /// `"committed"` or the rejection reason label.
    pub outcome:   &'static str,
    /// Rejection detail, empty when committed.
    pub detail:    String,
    /// Vehicles whose plan changed.
    pub vehicles:  usize,
    /// Snapshot size; `0` when rejected.
    pub slots:     usize,
}

impl ReoptRecord {
    #[inline]
    pub fn committed(&self) -> bool {
        self.outcome == "committed"
    }
}
