//! `RoutingSnapshot` — a disposable, index-based optimisation instance.
//!
//! A snapshot owns every index it hands to the oracle.  Slots `2 * i` and
//! `2 * i + 1` are the start and end of snapshot vehicle `i`; customer slots
//! follow.  Nothing in here refers back to live fleet state except through
//! ids, so a snapshot can be dropped at any point without side effects.

use std::fmt;

use drt_core::{CustomerId, SimTime, StopId, TimeWindow, TripId, VehicleId};

use crate::{RoutingError, RoutingResult};

// ── Slots ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// Start of snapshot vehicle `i`.
    Start(usize),
    /// End depot of snapshot vehicle `i`.
    End(usize),
    /// One or more customer pickups and/or deliveries.
    Customer,
}

/// One routable location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub stop:       StopId,
    pub kind:       SlotKind,
    /// Customers boarding when this slot is served.
    pub pickups:    Vec<CustomerId>,
    /// Customers alighting when this slot is served.
    pub deliveries: Vec<CustomerId>,
}

impl Slot {
    #[inline]
    pub fn is_customer(&self) -> bool {
        matches!(self.kind, SlotKind::Customer)
    }
}

/// A pickup/delivery pair.  For customers already aboard (or committed at
/// the vehicle's current stop) `pickup` is the vehicle's start slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdPair {
    pub customer: CustomerId,
    pub pickup:   usize,
    pub delivery: usize,
}

// ── Vehicles ──────────────────────────────────────────────────────────────────

/// How a solution for a vehicle is written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Replace the stops after the cursor of `trip`, whose cursor was at
    /// `cursor` when the snapshot was taken.
    Extend { trip: TripId, cursor: usize },
    /// `trip` has visited its last stop; new work goes into a queued
    /// successor.
    Append { trip: TripId },
    /// The vehicle has no trip; new work starts a fresh one.
    Idle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotVehicle {
    pub vehicle:    VehicleId,
    pub start_slot: usize,
    pub end_slot:   usize,
    pub capacity:   u32,
    /// Customers on board when the vehicle leaves its start slot.
    pub load:       u32,
    pub speed_mps:  f64,
    pub anchor:     Anchor,
}

/// A customer whose route is already tied to one vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardedRide {
    pub customer:      CustomerId,
    /// Index into [`RoutingSnapshot::vehicles`].
    pub vehicle:       usize,
    pub delivery_slot: usize,
    /// Ride time accumulated before the snapshot.
    pub elapsed_secs:  u64,
    /// `false` for customers who will board at the start slot itself.
    pub aboard:        bool,
}

/// Limits every oracle must honour on top of windows and capacity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolveLimits {
    pub max_ride_time_secs:      Option<u64>,
    pub max_schedule_slack_secs: Option<u64>,
}

// ── RoutingSnapshot ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RoutingSnapshot {
    /// Time the snapshot was taken.
    pub now:            SimTime,
    pub slots:          Vec<Slot>,
    /// `travel_secs[i][j]` from slot `i` to slot `j`.
    pub travel_secs:    Vec<Vec<u64>>,
    pub service_secs:   Vec<u64>,
    pub demands:        Vec<i32>,
    pub windows:        Vec<TimeWindow>,
    pub pairs:          Vec<PdPair>,
    /// Pair indices touching each slot, as pickup or delivery.
    pub pairs_by_slot:  Vec<Vec<usize>>,
    pub vehicles:       Vec<SnapshotVehicle>,
    pub boarded:        Vec<BoardedRide>,
    /// Per vehicle, the customer slots of its current plan in visit order.
    /// Oracles may use it as a warm start.
    pub initial_routes: Vec<Vec<usize>>,
    /// Customers this snapshot was built to place.
    pub new_customers:  Vec<CustomerId>,
    pub limits:         SolveLimits,
}

impl RoutingSnapshot {
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn travel(&self, from: usize, to: usize) -> u64 {
        self.travel_secs[from][to]
    }

    /// Pair of `customer`, if the snapshot routes them.
    pub fn pair_of(&self, customer: CustomerId) -> Option<&PdPair> {
        self.pairs.iter().find(|p| p.customer == customer)
    }

    /// Boarded-ride record of `customer`, if they are tied to a vehicle.
    pub fn ride_of(&self, customer: CustomerId) -> Option<&BoardedRide> {
        self.boarded.iter().find(|r| r.customer == customer)
    }

    /// Snapshot vehicle index owning `slot` if it is a start or end slot.
    pub fn vehicle_of_slot(&self, slot: usize) -> Option<usize> {
        match self.slots.get(slot)?.kind {
            SlotKind::Start(i) | SlotKind::End(i) => Some(i),
            SlotKind::Customer => None,
        }
    }

    pub fn total_demand(&self) -> i64 {
        self.demands.iter().map(|&d| d as i64).sum()
    }

    /// Verify the structural invariants every built snapshot satisfies.
    pub fn check(&self) -> RoutingResult<()> {
        let n = self.slots.len();
        let bad = |msg: String| Err(RoutingError::Malformed(msg));

        if self.windows.len() != n
            || self.travel_secs.len() != n
            || self.service_secs.len() != n
            || self.demands.len() != n
            || self.pairs_by_slot.len() != n
        {
            return bad(format!("per-slot arrays disagree with {n} slots"));
        }
        if let Some(row) = self.travel_secs.iter().position(|r| r.len() != n) {
            return bad(format!("matrix row {row} is not {n} wide"));
        }
        if self.initial_routes.len() != self.vehicles.len() {
            return bad("one warm-start route per vehicle expected".into());
        }
        for (i, v) in self.vehicles.iter().enumerate() {
            if v.start_slot != 2 * i || v.end_slot != 2 * i + 1 {
                return bad(format!("vehicle {i} does not own slots {} and {}", 2 * i, 2 * i + 1));
            }
            if self.slots[v.start_slot].kind != SlotKind::Start(i)
                || self.slots[v.end_slot].kind != SlotKind::End(i)
            {
                return bad(format!("vehicle {i} slot kinds are wrong"));
            }
        }
        for p in &self.pairs {
            if p.pickup >= n || p.delivery >= n || p.pickup == p.delivery {
                return bad(format!("pair of {} references slots {} and {}", p.customer, p.pickup, p.delivery));
            }
        }
        let start_load: i64 = self.vehicles.iter().map(|v| v.load as i64).sum();
        let starts: i64 = self
            .vehicles
            .iter()
            .map(|v| self.demands[v.start_slot] as i64)
            .sum();
        if starts != start_load || self.total_demand() != 0 {
            return bad(format!(
                "demand does not balance: total {}, start slots {starts}, loads {start_load}",
                self.total_demand()
            ));
        }
        Ok(())
    }
}

impl fmt::Display for RoutingSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "snapshot at {}: {} vehicles, {} slots, {} pairs",
            self.now,
            self.vehicles.len(),
            self.slots.len(),
            self.pairs.len()
        )
    }
}
