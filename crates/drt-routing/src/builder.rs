//! `SnapshotBuilder` — turns live fleet state into a `RoutingSnapshot`.
//!
//! The builder is stateless apart from its configuration.  The simulation
//! owns one and hands it out by reference, so there is no global factory to
//! reach for.
//!
//! # What ends up in a snapshot
//!
//! For every requested vehicle, two slots: its start (the stop under the
//! cursor of the trip a re-plan would extend, or its location when idle) and
//! its end depot.  Then, per customer:
//!
//! | Customer                                   | Slots                      |
//! |--------------------------------------------|----------------------------|
//! | expected at a later stop of the plan       | pickup + delivery          |
//! | expected at the plan's current stop        | delivery only, load at start |
//! | aboard, alighting after the current stop   | delivery only, load at start |
//! | aboard, alighting at the current stop      | none                       |
//! | new (listed in the request)                | pickup + delivery          |

use drt_core::{CustomerId, SimConfig, SimTime, SlotAliasing, StopId, TimeWindow, VehicleId};
use drt_fleet::{CustomerState, Fleet, Trip};
use drt_network::{DistanceModel, StopNetwork};

use crate::{
    Anchor, BoardedRide, PdPair, RoutingError, RoutingResult, RoutingSnapshot, Slot, SlotKind,
    SnapshotVehicle, SolveLimits,
};

#[cfg(feature = "fx-hash")]
type Map<K, V> = rustc_hash::FxHashMap<K, V>;
#[cfg(not(feature = "fx-hash"))]
type Map<K, V> = std::collections::HashMap<K, V>;

// ── Configuration ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotConfig {
    /// Every slot window starts as `[0, day_length_secs]`.
    pub day_length_secs:   u64,
    /// Service time of customer slots.
    pub dwell_secs:        u64,
    /// Matrix speed when the request names no vehicles.
    pub default_speed_mps: f64,
    pub slot_aliasing:     SlotAliasing,
    pub limits:            SolveLimits,
}

impl SnapshotConfig {
    pub fn from_sim_config(config: &SimConfig) -> Self {
        Self {
            day_length_secs:   config.day_length_secs,
            dwell_secs:        config.dwell_secs,
            default_speed_mps: config.default_speed_mps,
            slot_aliasing:     config.slot_aliasing,
            limits: SolveLimits {
                max_ride_time_secs:      config.max_ride_time_secs,
                max_schedule_slack_secs: config.max_schedule_slack_secs,
            },
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self::from_sim_config(&SimConfig::default())
    }
}

/// What to put in one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRequest {
    pub now:       SimTime,
    pub vehicles:  Vec<VehicleId>,
    /// Customers to place.  Customers already in a vehicle's plan are picked
    /// up from that plan and need not be listed.
    pub customers: Vec<CustomerId>,
}

impl SnapshotRequest {
    pub fn new(now: SimTime, vehicles: Vec<VehicleId>, customers: Vec<CustomerId>) -> Self {
        Self { now, vehicles, customers }
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct SnapshotBuilder {
    config: SnapshotConfig,
}

/// A customer collected while walking the fleet.
enum Need {
    Pair(CustomerId),
    /// Tied to snapshot vehicle `vehicle`; only the delivery is routed.
    DeliveryOnly { customer: CustomerId, vehicle: usize, elapsed_secs: u64, aboard: bool },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Role {
    Pickup,
    Delivery,
}

impl SnapshotBuilder {
    pub fn new(config: SnapshotConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SnapshotConfig {
        &self.config
    }

    pub fn build(
        &self,
        request: &SnapshotRequest,
        fleet:   &Fleet,
        network: &StopNetwork,
        metric:  &dyn DistanceModel,
    ) -> RoutingResult<RoutingSnapshot> {
        let now = request.now;
        let mut table = SlotTable::new(self.config.slot_aliasing);
        let mut vehicles = Vec::with_capacity(request.vehicles.len());
        let mut needs = Vec::new();
        let mut seen: Map<CustomerId, ()> = Map::default();
        let mut warm: Vec<Vec<(CustomerId, Role)>> = Vec::with_capacity(request.vehicles.len());

        // ── Vehicles and their committed customers ────────────────────────
        for (i, &vid) in request.vehicles.iter().enumerate() {
            let v = fleet.get_vehicle(vid).ok_or(RoutingError::UnknownVehicle(vid))?;
            let lower = now.max(v.available_at);
            let upper = SimTime(self.config.day_length_secs).max(lower);

            let plan = v.plan_trip();
            let (anchor, anchor_stop) = match plan {
                Some(t) if !t.is_done() => {
                    (Anchor::Extend { trip: t.id(), cursor: t.cursor_index() }, t.current().stop)
                }
                Some(t) => (Anchor::Append { trip: t.id() }, t.current().stop),
                None => (Anchor::Idle, v.location),
            };

            let start_slot = table.push(anchor_stop, SlotKind::Start(i), TimeWindow::new(lower, upper), 0);
            let end_slot = table.push(v.end_depot, SlotKind::End(i), TimeWindow::new(SimTime::ZERO, upper), 0);

            let mut route = Vec::new();
            if let Some(trip) = plan.filter(|t| !t.is_done()) {
                collect_committed(trip, vid, i, now, fleet, &mut seen, &mut needs, &mut route);
            }
            warm.push(route);

            vehicles.push(SnapshotVehicle {
                vehicle: vid,
                start_slot,
                end_slot,
                capacity: v.capacity,
                load: 0,
                speed_mps: v.speed_mps,
                anchor,
            });
        }

        // ── New customers ─────────────────────────────────────────────────
        for &c in &request.customers {
            let customer = fleet.get_customer(c).ok_or(RoutingError::UnknownCustomer(c))?;
            if !customer.is_requested() {
                return Err(RoutingError::CustomerNotRequested(c));
            }
            if seen.insert(c, ()).is_none() {
                needs.push(Need::Pair(c));
            }
        }

        // ── Customer slots ────────────────────────────────────────────────
        let mut pairs = Vec::with_capacity(needs.len());
        let mut boarded = Vec::new();
        for need in needs {
            match need {
                Need::Pair(c) => {
                    let customer = fleet.customer(c);
                    if customer.pickup == customer.delivery {
                        return Err(RoutingError::SamePickupDelivery { customer: c, stop: customer.pickup });
                    }
                    let pickup = table.customer_slot(customer.pickup, None, self.config.day_length_secs);
                    let delivery = table.customer_slot(customer.delivery, None, self.config.day_length_secs);
                    if pickup == delivery {
                        return Err(RoutingError::SamePickupDelivery { customer: c, stop: customer.pickup });
                    }
                    table.windows[pickup].tighten_earliest(customer.window.earliest);
                    table.windows[delivery].tighten_latest(customer.window.latest);
                    table.slots[pickup].pickups.push(c);
                    table.slots[delivery].deliveries.push(c);
                    table.demands[pickup] += 1;
                    table.demands[delivery] -= 1;
                    pairs.push(PdPair { customer: c, pickup, delivery });
                }
                Need::DeliveryOnly { customer: c, vehicle, elapsed_secs, aboard } => {
                    let customer = fleet.customer(c);
                    let start = vehicles[vehicle].start_slot;
                    let delivery =
                        table.customer_slot(customer.delivery, Some(vehicle), self.config.day_length_secs);
                    table.windows[delivery].tighten_latest(customer.window.latest);
                    table.slots[delivery].deliveries.push(c);
                    table.demands[delivery] -= 1;
                    table.demands[start] += 1;
                    vehicles[vehicle].load += 1;
                    pairs.push(PdPair { customer: c, pickup: start, delivery });
                    boarded.push(BoardedRide { customer: c, vehicle, delivery_slot: delivery, elapsed_secs, aboard });
                }
            }
        }

        if let Some(slot) = table.windows.iter().position(|w| !w.is_valid()) {
            return Err(RoutingError::TimeWindowConflict {
                slot,
                stop:   table.slots[slot].stop,
                window: table.windows[slot],
            });
        }

        // ── Service times and matrix ──────────────────────────────────────
        let service_secs = table
            .slots
            .iter()
            .map(|s| if s.is_customer() { self.config.dwell_secs } else { 0 })
            .collect();

        let speed = vehicles
            .iter()
            .map(|v| v.speed_mps)
            .reduce(f64::min)
            .unwrap_or(self.config.default_speed_mps);
        let stops: Vec<StopId> = table.slots.iter().map(|s| s.stop).collect();
        let travel_secs = travel_matrix(&stops, network, metric, speed);

        // ── Indices ───────────────────────────────────────────────────────
        let n = table.slots.len();
        let mut pairs_by_slot = vec![Vec::new(); n];
        let mut pair_index: Map<CustomerId, usize> = Map::default();
        for (k, p) in pairs.iter().enumerate() {
            pairs_by_slot[p.pickup].push(k);
            pairs_by_slot[p.delivery].push(k);
            pair_index.insert(p.customer, k);
        }

        let mut used = vec![false; n];
        let initial_routes = warm
            .into_iter()
            .map(|visits| {
                let mut route = Vec::new();
                for (c, role) in visits {
                    let Some(&k) = pair_index.get(&c) else { continue };
                    let slot = match role {
                        Role::Pickup => pairs[k].pickup,
                        Role::Delivery => pairs[k].delivery,
                    };
                    if table.slots[slot].is_customer() && !std::mem::replace(&mut used[slot], true) {
                        route.push(slot);
                    }
                }
                route
            })
            .collect();

        let snapshot = RoutingSnapshot {
            now,
            slots: table.slots,
            travel_secs,
            service_secs,
            demands: table.demands,
            windows: table.windows,
            pairs,
            pairs_by_slot,
            vehicles,
            boarded,
            initial_routes,
            new_customers: request.customers.clone(),
            limits: self.config.limits,
        };
        debug_assert!(snapshot.check().is_ok(), "{:?}", snapshot.check());
        Ok(snapshot)
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Walk the plan trip of snapshot vehicle `index` from its cursor, collecting
/// customers it is already committed to and the visit order for the warm
/// start.
#[allow(clippy::too_many_arguments)]
fn collect_committed(
    trip:    &Trip,
    vehicle: VehicleId,
    index:   usize,
    now:     SimTime,
    fleet:   &Fleet,
    seen:    &mut Map<CustomerId, ()>,
    needs:   &mut Vec<Need>,
    route:   &mut Vec<(CustomerId, Role)>,
) {
    let planned_here = |c: CustomerId| {
        let customer = fleet.customer(c);
        customer.is_requested() && customer.planned_vehicle == Some(vehicle)
    };

    for &c in &trip.current().pickups {
        if planned_here(c) && seen.insert(c, ()).is_none() {
            needs.push(Need::DeliveryOnly { customer: c, vehicle: index, elapsed_secs: 0, aboard: false });
        }
    }
    for stop in trip.remaining() {
        for &c in &stop.deliveries {
            if let CustomerState::Boarded { vehicle: on, at } = fleet.customer(c).state() {
                if on == vehicle && seen.insert(c, ()).is_none() {
                    needs.push(Need::DeliveryOnly {
                        customer: c,
                        vehicle: index,
                        elapsed_secs: now.since(at),
                        aboard: true,
                    });
                }
            }
            route.push((c, Role::Delivery));
        }
        for &c in &stop.pickups {
            if planned_here(c) && seen.insert(c, ()).is_none() {
                needs.push(Need::Pair(c));
            }
            route.push((c, Role::Pickup));
        }
    }
}

/// Slots, windows and demands grown together.
struct SlotTable {
    aliasing: SlotAliasing,
    slots:    Vec<Slot>,
    windows:  Vec<TimeWindow>,
    demands:  Vec<i32>,
    /// `(stop, owner)` → slot, where `owner` is the snapshot vehicle for
    /// delivery-only slots.
    by_stop:  Map<(StopId, Option<usize>), usize>,
}

impl SlotTable {
    fn new(aliasing: SlotAliasing) -> Self {
        Self {
            aliasing,
            slots:   Vec::new(),
            windows: Vec::new(),
            demands: Vec::new(),
            by_stop: Map::default(),
        }
    }

    fn push(&mut self, stop: StopId, kind: SlotKind, window: TimeWindow, demand: i32) -> usize {
        self.slots.push(Slot { stop, kind, pickups: Vec::new(), deliveries: Vec::new() });
        self.windows.push(window);
        self.demands.push(demand);
        self.slots.len() - 1
    }

    fn customer_slot(&mut self, stop: StopId, owner: Option<usize>, day_length_secs: u64) -> usize {
        let day = TimeWindow::secs(0, day_length_secs);
        match self.aliasing {
            SlotAliasing::Distinct => self.push(stop, SlotKind::Customer, day, 0),
            SlotAliasing::ByStop => {
                if let Some(&slot) = self.by_stop.get(&(stop, owner)) {
                    return slot;
                }
                let slot = self.push(stop, SlotKind::Customer, day, 0);
                self.by_stop.insert((stop, owner), slot);
                slot
            }
        }
    }
}

fn travel_matrix(
    stops:   &[StopId],
    network: &StopNetwork,
    metric:  &dyn DistanceModel,
    speed:   f64,
) -> Vec<Vec<u64>> {
    let row = |from: StopId| -> Vec<u64> {
        stops.iter().map(|&to| network.leg_secs(metric, from, to, speed)).collect()
    };

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        stops.par_iter().map(|&from| row(from)).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        stops.iter().map(|&from| row(from)).collect()
    }
}
