//! `Fleet` — vehicle and customer arenas and the boarding lifecycle.
//!
//! Vehicles and customers live in dense `Vec`s indexed by their ids.  Trips,
//! events and routing snapshots hold ids only, so every mutation of a
//! vehicle or customer goes through this struct.

use drt_core::{CustomerId, ServiceMode, SimTime, TripId, VehicleId};

use crate::{
    Customer, CustomerSpec, LifecycleError, PlannedStop, Trip, Vehicle, VehicleSpec,
};

/// Result of a successful [`Fleet::alight`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlightOutcome {
    /// The vehicle became empty at the last stop of its trip, which closed
    /// the trip.
    pub trip_finished: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Fleet {
    vehicles:  Vec<Vehicle>,
    customers: Vec<Customer>,
    next_trip: u32,
}

impl Fleet {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Arenas ────────────────────────────────────────────────────────────

    pub fn add_vehicle(&mut self, spec: VehicleSpec) -> VehicleId {
        let id = VehicleId(self.vehicles.len() as u32);
        self.vehicles.push(Vehicle::new(id, spec));
        id
    }

    pub fn add_customer(&mut self, spec: CustomerSpec) -> CustomerId {
        let id = CustomerId(self.customers.len() as u32);
        self.customers.push(Customer::new(id, spec));
        id
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    pub fn customer_count(&self) -> usize {
        self.customers.len()
    }

    /// # Panics
    /// Panics if `id` was not minted by this fleet.
    #[inline]
    pub fn vehicle(&self, id: VehicleId) -> &Vehicle {
        &self.vehicles[id.index()]
    }

    #[inline]
    pub fn vehicle_mut(&mut self, id: VehicleId) -> &mut Vehicle {
        &mut self.vehicles[id.index()]
    }

    /// # Panics
    /// Panics if `id` was not minted by this fleet.
    #[inline]
    pub fn customer(&self, id: CustomerId) -> &Customer {
        &self.customers[id.index()]
    }

    #[inline]
    pub fn customer_mut(&mut self, id: CustomerId) -> &mut Customer {
        &mut self.customers[id.index()]
    }

    pub fn get_vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(id.index())
    }

    pub fn get_customer(&self, id: CustomerId) -> Option<&Customer> {
        self.customers.get(id.index())
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    /// Ids of every flexible-routing vehicle, in id order.
    pub fn flexible_vehicles(&self) -> Vec<VehicleId> {
        self.vehicles.iter().filter(|v| v.is_flexible()).map(|v| v.id).collect()
    }

    pub fn has_flexible(&self) -> bool {
        self.vehicles.iter().any(Vehicle::is_flexible)
    }

    // ── Trips ─────────────────────────────────────────────────────────────

    /// Allocate a fresh trip id.
    pub fn next_trip_id(&mut self) -> TripId {
        let id = TripId(self.next_trip);
        self.next_trip += 1;
        id
    }

    /// Build a trip with a freshly allocated id.
    pub fn new_trip(
        &mut self,
        mode:  ServiceMode,
        stops: Vec<PlannedStop>,
        start: SimTime,
    ) -> Result<Trip, LifecycleError> {
        if stops.is_empty() {
            return Err(LifecycleError::EmptyTrip);
        }
        let id = self.next_trip_id();
        Trip::new(id, mode, stops, start)
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Board `customer` onto `vehicle` at `t`.
    ///
    /// `Full` leaves the customer `Requested` and counts a denial on the
    /// vehicle.  A customer that is not `Requested` yields `AlreadyBoarded`
    /// and nothing changes.
    pub fn board(
        &mut self,
        customer: CustomerId,
        vehicle:  VehicleId,
        t:        SimTime,
    ) -> Result<(), LifecycleError> {
        if !self.customers[customer.index()].is_requested() {
            return Err(LifecycleError::AlreadyBoarded(customer));
        }
        let v = &mut self.vehicles[vehicle.index()];
        if v.is_full() {
            v.stats.denied += 1;
            return Err(LifecycleError::Full { vehicle, capacity: v.capacity });
        }
        v.seat(customer);
        v.stats.total_requests += 1;

        let c = &mut self.customers[customer.index()];
        c.set_boarded(vehicle, t);
        c.planned_vehicle = Some(vehicle);
        Ok(())
    }

    /// Alight `customer` from `vehicle` at `t`.
    ///
    /// When this empties a vehicle whose trip cursor is done, the trip is
    /// finished here: the last customer off closes the trip.
    pub fn alight(
        &mut self,
        customer: CustomerId,
        vehicle:  VehicleId,
        t:        SimTime,
    ) -> Result<AlightOutcome, LifecycleError> {
        let boarded_at = match self.customers[customer.index()].state() {
            crate::CustomerState::Boarded { vehicle: on, at } if on == vehicle => at,
            _ => return Err(LifecycleError::NotBoarded { customer, vehicle }),
        };
        let v = &mut self.vehicles[vehicle.index()];
        if !v.unseat(customer) {
            return Err(LifecycleError::NotBoarded { customer, vehicle });
        }
        v.stats.serviced += 1;
        self.customers[customer.index()].set_alighted(vehicle, boarded_at, t);

        let v = &mut self.vehicles[vehicle.index()];
        let trip_finished = v.is_empty() && v.active_trip().is_some_and(Trip::is_done);
        if trip_finished {
            v.finish_trip(t)?;
        }
        Ok(AlightOutcome { trip_finished })
    }

    /// Turn every still-`Requested` customer into `Rejected`.  Returns how
    /// many were closed out.
    pub fn reject_unserved(&mut self) -> usize {
        self.customers.iter_mut().filter_map(|c| c.reject().then_some(())).count()
    }

    /// `true` when every vehicle carries at most `capacity` customers and no
    /// customer is aboard two vehicles.
    pub fn check_seats(&self) -> bool {
        let mut seen = vec![false; self.customers.len()];
        for v in &self.vehicles {
            if v.load() > v.capacity as usize {
                return false;
            }
            for c in v.boarded() {
                if std::mem::replace(&mut seen[c.index()], true) {
                    return false;
                }
            }
        }
        true
    }
}
