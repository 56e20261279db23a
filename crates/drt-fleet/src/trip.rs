//! `Trip` — an ordered stop sequence executed by one vehicle.
//!
//! # State machine
//!
//! ```text
//! Idle (cursor = 0) ──start──► Started ──advance*──► (done) ──finish──► Finished
//! ```
//!
//! `start` is valid once.  `advance` moves the cursor by one stop; it fails
//! before `start` and once the cursor is done.  `finish` is reached through
//! [`Vehicle::finish_trip`](crate::Vehicle::finish_trip), which also checks
//! that nobody is still aboard.
//!
//! Flexible trips carry, per stop, the customers expected to board and
//! alight there and the time window the routing oracle planned for the
//! visit.  Re-planning replaces only the stops after the cursor.

use drt_core::{CustomerId, ServiceMode, SimTime, StopId, TimeWindow, TripId};
use drt_network::{DistanceModel, StopNetwork};

use crate::{LifecycleError, StopCursor};

// ── PlannedStop ───────────────────────────────────────────────────────────────

/// One visit of a trip.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlannedStop {
    pub stop:       StopId,
    /// Planned service window.  The vehicle does not start serving the stop
    /// before `window.earliest`.
    pub window:     Option<TimeWindow>,
    /// Customers expected to board here.
    pub pickups:    Vec<CustomerId>,
    /// Customers expected to alight here.
    pub deliveries: Vec<CustomerId>,
}

impl PlannedStop {
    /// A visit with no plan attached (fixed-schedule trips).
    pub fn at(stop: StopId) -> Self {
        Self { stop, window: None, pickups: Vec::new(), deliveries: Vec::new() }
    }

    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = Some(window);
        self
    }

    /// `true` when no customer activity is planned here.
    pub fn is_pass_through(&self) -> bool {
        self.pickups.is_empty() && self.deliveries.is_empty()
    }
}

// ── TripPhase ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TripPhase {
    Idle,
    Started { at: SimTime },
    Finished { started: SimTime, finished: SimTime },
}

// ── Trip ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trip {
    id:              TripId,
    mode:            ServiceMode,
    stops:           Vec<PlannedStop>,
    cursor:          StopCursor,
    phase:           TripPhase,
    /// Earliest time the vehicle sets off for the first stop.
    scheduled_start: SimTime,
    /// Cumulative distance between visited stops, metres.
    distance_m:      f64,
}

impl Trip {
    pub fn new(
        id:              TripId,
        mode:            ServiceMode,
        stops:           Vec<PlannedStop>,
        scheduled_start: SimTime,
    ) -> Result<Self, LifecycleError> {
        let cursor = StopCursor::new(stops.len()).ok_or(LifecycleError::EmptyTrip)?;
        Ok(Self {
            id,
            mode,
            stops,
            cursor,
            phase: TripPhase::Idle,
            scheduled_start,
            distance_m: 0.0,
        })
    }

    /// A fixed-schedule trip over `stops` with no per-stop plan.
    pub fn fixed(id: TripId, stops: &[StopId], scheduled_start: SimTime) -> Result<Self, LifecycleError> {
        let stops = stops.iter().copied().map(PlannedStop::at).collect();
        Self::new(id, ServiceMode::Fixed, stops, scheduled_start)
    }

    #[inline] pub fn id(&self) -> TripId { self.id }
    #[inline] pub fn mode(&self) -> ServiceMode { self.mode }
    #[inline] pub fn phase(&self) -> TripPhase { self.phase }
    #[inline] pub fn scheduled_start(&self) -> SimTime { self.scheduled_start }
    #[inline] pub fn distance_m(&self) -> f64 { self.distance_m }
    #[inline] pub fn cursor(&self) -> StopCursor { self.cursor }
    #[inline] pub fn cursor_index(&self) -> usize { self.cursor.index() }
    #[inline] pub fn is_done(&self) -> bool { self.cursor.is_done() }

    #[inline]
    pub fn is_started(&self) -> bool {
        !matches!(self.phase, TripPhase::Idle)
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, TripPhase::Finished { .. })
    }

    pub fn stops(&self) -> &[PlannedStop] {
        &self.stops
    }

    /// The stop under the cursor.
    #[inline]
    pub fn current(&self) -> &PlannedStop {
        &self.stops[self.cursor.index()]
    }

    pub fn next(&self) -> Option<&PlannedStop> {
        self.cursor.next_index().map(|i| &self.stops[i])
    }

    pub fn first(&self) -> &PlannedStop {
        &self.stops[0]
    }

    pub fn last(&self) -> &PlannedStop {
        &self.stops[self.stops.len() - 1]
    }

    /// Stops strictly after the cursor.
    pub fn remaining(&self) -> &[PlannedStop] {
        &self.stops[self.cursor.index() + 1..]
    }

    // ── State machine ─────────────────────────────────────────────────────

    /// Mark the trip as started at its first stop.
    pub fn start(&mut self, t: SimTime) -> Result<(), LifecycleError> {
        match self.phase {
            TripPhase::Idle => {
                self.phase = TripPhase::Started { at: t };
                Ok(())
            }
            TripPhase::Started { .. } => Err(LifecycleError::AlreadyStarted(self.id)),
            TripPhase::Finished { .. } => Err(LifecycleError::AlreadyFinished(self.id)),
        }
    }

    /// Move the cursor to the next stop, adding the leg distance.  Returns
    /// the new current stop.
    pub fn advance(
        &mut self,
        network: &StopNetwork,
        metric:  &dyn DistanceModel,
    ) -> Result<StopId, LifecycleError> {
        match self.phase {
            TripPhase::Idle => return Err(LifecycleError::NotStarted(self.id)),
            TripPhase::Finished { .. } => return Err(LifecycleError::AlreadyFinished(self.id)),
            TripPhase::Started { .. } => {}
        }
        let from = self.current().stop;
        let index = self.cursor.advance().ok_or(LifecycleError::AlreadyDone(self.id))?;
        let to = self.stops[index].stop;
        self.distance_m += network.leg_distance_m(metric, from, to);
        Ok(to)
    }

    /// Close the trip.  Callers go through `Vehicle::finish_trip`.
    pub(crate) fn finish(&mut self, t: SimTime) -> Result<(), LifecycleError> {
        match self.phase {
            TripPhase::Finished { .. } => Err(LifecycleError::AlreadyFinished(self.id)),
            _ if !self.cursor.is_done() => {
                Err(LifecycleError::NotReady { trip: self.id, done: false, aboard: 0 })
            }
            TripPhase::Started { at } => {
                self.phase = TripPhase::Finished { started: at, finished: t };
                Ok(())
            }
            // A single-stop trip can be closed without ever being started.
            TripPhase::Idle => {
                self.phase = TripPhase::Finished { started: t, finished: t };
                Ok(())
            }
        }
    }

    /// Replace every stop after the cursor with `suffix`.  The executed
    /// prefix and the current stop are left untouched.
    pub fn replace_suffix(&mut self, suffix: Vec<PlannedStop>) -> Result<(), LifecycleError> {
        if self.is_finished() {
            return Err(LifecycleError::AlreadyFinished(self.id));
        }
        if self.cursor.is_done() {
            return Err(LifecycleError::AlreadyDone(self.id));
        }
        let keep = self.cursor.index() + 1;
        let len = keep + suffix.len();
        if !self.cursor.resize(len) {
            return Err(LifecycleError::AlreadyDone(self.id));
        }
        self.stops.truncate(keep);
        self.stops.extend(suffix);
        Ok(())
    }
}
