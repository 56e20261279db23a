//! `Vehicle` — seats, current trip, follow-on trips and counters.

use std::collections::VecDeque;

use drt_core::{CustomerId, ServiceMode, SimTime, StopId, VehicleId};

use crate::{LifecycleError, Trip};

/// Request counters kept per vehicle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleStats {
    /// Successful boardings.
    pub total_requests: u32,
    /// Completed rides.
    pub serviced:       u32,
    /// Boardings refused because the vehicle was full.
    pub denied:         u32,
}

/// Static vehicle attributes used by [`Fleet::add_vehicle`](crate::Fleet::add_vehicle).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleSpec {
    pub capacity:    u32,
    pub speed_mps:   f64,
    pub mode:        ServiceMode,
    pub start_depot: StopId,
    pub end_depot:   StopId,
}

#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id:          VehicleId,
    pub capacity:    u32,
    pub speed_mps:   f64,
    pub mode:        ServiceMode,
    pub start_depot: StopId,
    pub end_depot:   StopId,

    /// Last stop the vehicle reached (its start depot before the first trip).
    pub location:     StopId,
    /// Earliest time the vehicle can leave the stop under its trip cursor
    /// (or its location when idle).
    pub available_at: SimTime,
    pub stats:        VehicleStats,

    trip:       Option<Trip>,
    queued:     VecDeque<Trip>,
    boarded:    Vec<CustomerId>,
    served:     Vec<CustomerId>,
    /// Distance of finished trips.
    odometer_m: f64,
    trips_done: u32,
}

impl Vehicle {
    pub fn new(id: VehicleId, spec: VehicleSpec) -> Self {
        Self {
            id,
            capacity:     spec.capacity,
            speed_mps:    spec.speed_mps,
            mode:         spec.mode,
            start_depot:  spec.start_depot,
            end_depot:    spec.end_depot,
            location:     spec.start_depot,
            available_at: SimTime::ZERO,
            stats:        VehicleStats::default(),
            trip:         None,
            queued:       VecDeque::new(),
            boarded:      Vec::new(),
            served:       Vec::new(),
            odometer_m:   0.0,
            trips_done:   0,
        }
    }

    #[inline]
    pub fn is_flexible(&self) -> bool {
        self.mode.is_flexible()
    }

    // ── Seats ─────────────────────────────────────────────────────────────

    pub fn boarded(&self) -> &[CustomerId] {
        &self.boarded
    }

    #[inline]
    pub fn load(&self) -> usize {
        self.boarded.len()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.boarded.len() >= self.capacity as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.boarded.is_empty()
    }

    pub fn carries(&self, customer: CustomerId) -> bool {
        self.boarded.contains(&customer)
    }

    /// Customers this vehicle has delivered, in delivery order.
    pub fn served(&self) -> &[CustomerId] {
        &self.served
    }

    pub(crate) fn seat(&mut self, customer: CustomerId) {
        self.boarded.push(customer);
    }

    /// Remove `customer` from the boarded set.  Returns `false` if absent.
    pub(crate) fn unseat(&mut self, customer: CustomerId) -> bool {
        match self.boarded.iter().position(|c| *c == customer) {
            Some(i) => {
                self.boarded.remove(i);
                self.served.push(customer);
                true
            }
            None => false,
        }
    }

    // ── Trips ─────────────────────────────────────────────────────────────

    /// The current trip, finished or not.
    pub fn trip(&self) -> Option<&Trip> {
        self.trip.as_ref()
    }

    pub fn trip_mut(&mut self) -> Option<&mut Trip> {
        self.trip.as_mut()
    }

    /// The current trip unless it has finished.
    pub fn active_trip(&self) -> Option<&Trip> {
        self.trip.as_ref().filter(|t| !t.is_finished())
    }

    pub fn active_trip_mut(&mut self) -> Option<&mut Trip> {
        self.trip.as_mut().filter(|t| !t.is_finished())
    }

    /// Trips waiting to start after the current one.
    pub fn queued_trips(&self) -> impl Iterator<Item = &Trip> {
        self.queued.iter()
    }

    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    /// `true` when the vehicle has neither an active nor a queued trip.
    pub fn is_idle(&self) -> bool {
        self.active_trip().is_none() && self.queued.is_empty()
    }

    /// The trip a re-plan should extend: the last queued trip if any,
    /// otherwise the active trip.
    pub fn plan_trip(&self) -> Option<&Trip> {
        self.queued.back().or_else(|| self.active_trip())
    }

    pub fn plan_trip_mut(&mut self) -> Option<&mut Trip> {
        if !self.queued.is_empty() {
            return self.queued.back_mut();
        }
        self.active_trip_mut()
    }

    /// Append a trip to run after the current one.
    pub fn enqueue_trip(&mut self, trip: Trip) {
        self.queued.push_back(trip);
    }

    /// Make the next queued trip current if the vehicle has no active trip.
    /// Returns the newly current trip.
    pub fn start_next_trip(&mut self) -> Option<&Trip> {
        if self.active_trip().is_some() {
            return None;
        }
        let next = self.queued.pop_front()?;
        self.trip = Some(next);
        self.trip.as_ref()
    }

    /// Close the current trip.  Valid only once its cursor is done and the
    /// vehicle is empty.
    pub fn finish_trip(&mut self, t: SimTime) -> Result<(), LifecycleError> {
        let aboard = self.boarded.len();
        let trip = self.trip.as_mut().ok_or(LifecycleError::NoActiveTrip(self.id))?;
        if trip.is_finished() {
            return Err(LifecycleError::AlreadyFinished(trip.id()));
        }
        if !trip.is_done() || aboard > 0 {
            return Err(LifecycleError::NotReady { trip: trip.id(), done: trip.is_done(), aboard });
        }
        trip.finish(t)?;
        self.odometer_m += trip.distance_m();
        self.trips_done += 1;
        self.available_at = self.available_at.max(t);
        Ok(())
    }

    /// Distance over finished trips plus the current one.
    pub fn distance_m(&self) -> f64 {
        self.odometer_m + self.active_trip().map_or(0.0, Trip::distance_m)
    }

    pub fn trips_done(&self) -> u32 {
        self.trips_done
    }
}
