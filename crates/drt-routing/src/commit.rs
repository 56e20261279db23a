//! Commit: validate an oracle solution in full, then write it to the fleet.
//!
//! [`RoutePlan::validate`] checks the solution against the snapshot and
//! turns it into per-vehicle trip edits without touching the fleet.
//! [`RoutePlan::apply`] re-checks every affected vehicle's live trip state
//! and only then writes, so a failed commit leaves the fleet exactly as it
//! was.

use drt_core::{CustomerId, ServiceMode, StopId, TimeWindow, TripId, VehicleId};
use drt_fleet::{Fleet, PlannedStop};

use crate::oracle::OracleSolution;
use crate::{Anchor, RoutingError, RoutingResult, RoutingSnapshot};

/// What a commit did to one vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitEffect {
    /// The stops after the cursor of `trip` were rewritten.
    SuffixReplaced { vehicle: VehicleId, trip: TripId },
    /// The idle vehicle got a new current trip.
    Started { vehicle: VehicleId, trip: TripId },
    /// A successor trip was queued behind the finishing one.
    Queued { vehicle: VehicleId, trip: TripId },
}

impl CommitEffect {
    pub fn vehicle(&self) -> VehicleId {
        match *self {
            CommitEffect::SuffixReplaced { vehicle, .. }
            | CommitEffect::Started { vehicle, .. }
            | CommitEffect::Queued { vehicle, .. } => vehicle,
        }
    }

    pub fn trip(&self) -> TripId {
        match *self {
            CommitEffect::SuffixReplaced { trip, .. }
            | CommitEffect::Started { trip, .. }
            | CommitEffect::Queued { trip, .. } => trip,
        }
    }
}

#[derive(Debug, Clone)]
struct VehiclePlan {
    vehicle:      VehicleId,
    anchor:       Anchor,
    anchor_stop:  StopId,
    start_window: TimeWindow,
    /// Stops after the start, end depot included.
    suffix:       Vec<PlannedStop>,
    /// Customers boarding somewhere on the new suffix.
    customers:    Vec<CustomerId>,
}

impl VehiclePlan {
    fn has_work(&self) -> bool {
        self.suffix.iter().any(|s| !s.is_pass_through())
    }
}

/// A validated solution, ready to be applied.
#[derive(Debug, Clone)]
pub struct RoutePlan {
    plans: Vec<VehiclePlan>,
}

fn invalid<T>(msg: String) -> RoutingResult<T> {
    Err(RoutingError::InvalidSolution(msg))
}

impl RoutePlan {
    /// Check `solution` against `snapshot`: one route per vehicle from its
    /// start slot to its end slot, indices in range, every customer slot
    /// visited exactly once, pickups before deliveries on the same vehicle,
    /// running load within capacity and one non-empty window per visit.
    pub fn validate(snapshot: &RoutingSnapshot, solution: &OracleSolution) -> RoutingResult<Self> {
        let n = snapshot.slot_count();
        if solution.routes.len() != snapshot.vehicles.len() {
            return invalid(format!(
                "{} routes for {} vehicles",
                solution.routes.len(),
                snapshot.vehicles.len()
            ));
        }

        // (vehicle, position) of every visited customer slot.
        let mut visit: Vec<Option<(usize, usize)>> = vec![None; n];
        for (i, route) in solution.routes.iter().enumerate() {
            let sv = &snapshot.vehicles[i];
            let slots = &route.slots;
            if slots.len() < 2 || slots[0] != sv.start_slot || slots[slots.len() - 1] != sv.end_slot {
                return invalid(format!("route {i} does not run from slot {} to slot {}", sv.start_slot, sv.end_slot));
            }
            if route.windows.len() != slots.len() {
                return invalid(format!("route {i} has {} windows for {} visits", route.windows.len(), slots.len()));
            }
            if let Some(k) = route.windows.iter().position(|w| !w.is_valid()) {
                return invalid(format!("route {i} visit {k} has an empty window {}", route.windows[k]));
            }
            let mut load = snapshot.demands[sv.start_slot] as i64;
            for (k, &s) in slots.iter().enumerate().take(slots.len() - 1).skip(1) {
                if s >= n {
                    return invalid(format!("route {i} visits slot {s}, only {n} exist"));
                }
                if !snapshot.slots[s].is_customer() {
                    return invalid(format!("route {i} passes through depot slot {s}"));
                }
                if visit[s].replace((i, k)).is_some() {
                    return invalid(format!("slot {s} is visited twice"));
                }
                load += snapshot.demands[s] as i64;
                if load < 0 || load > sv.capacity as i64 {
                    return invalid(format!("route {i} carries {load} at slot {s}, capacity {}", sv.capacity));
                }
            }
        }
        if let Some(s) = (0..n).find(|&s| snapshot.slots[s].is_customer() && visit[s].is_none()) {
            return invalid(format!("customer slot {s} is never visited"));
        }
        for pair in &snapshot.pairs {
            let pickup = match snapshot.vehicle_of_slot(pair.pickup) {
                Some(owner) => Some((owner, 0)),
                None => visit[pair.pickup],
            };
            match (pickup, visit[pair.delivery]) {
                (Some((a, kp)), Some((b, kd))) if a == b && kp < kd => {}
                _ => return invalid(format!("{} is not picked up before delivery on one vehicle", pair.customer)),
            }
        }

        let plans = solution
            .routes
            .iter()
            .enumerate()
            .map(|(i, route)| {
                let sv = &snapshot.vehicles[i];
                let suffix = route.slots[1..]
                    .iter()
                    .zip(&route.windows[1..])
                    .map(|(&s, &w)| {
                        let slot = &snapshot.slots[s];
                        PlannedStop {
                            stop:       slot.stop,
                            window:     Some(w),
                            pickups:    slot.pickups.clone(),
                            deliveries: slot.deliveries.clone(),
                        }
                    })
                    .collect::<Vec<_>>();
                let customers = suffix.iter().flat_map(|s| s.pickups.iter().copied()).collect();
                VehiclePlan {
                    vehicle: sv.vehicle,
                    anchor: sv.anchor,
                    anchor_stop: snapshot.slots[sv.start_slot].stop,
                    start_window: route.windows[0],
                    suffix,
                    customers,
                }
            })
            .collect();
        Ok(Self { plans })
    }

    /// `(vehicle, customer)` for every customer boarding on a new suffix.
    pub fn assignments(&self) -> impl Iterator<Item = (VehicleId, CustomerId)> + '_ {
        self.plans
            .iter()
            .flat_map(|p| p.customers.iter().map(move |&c| (p.vehicle, c)))
    }

    /// Write the plan to `fleet`.  Every vehicle is checked against the
    /// state it had in the snapshot first; on any mismatch nothing is
    /// written and `StaleVehicle` is returned.
    pub fn apply(self, fleet: &mut Fleet) -> RoutingResult<Vec<CommitEffect>> {
        for plan in &self.plans {
            let v = fleet.get_vehicle(plan.vehicle).ok_or(RoutingError::UnknownVehicle(plan.vehicle))?;
            let live = match (plan.anchor, v.plan_trip()) {
                (Anchor::Extend { trip, cursor }, Some(t)) => {
                    t.id() == trip && t.cursor_index() == cursor && !t.is_done() && !t.is_finished()
                }
                (Anchor::Append { trip }, Some(t)) => t.id() == trip && t.is_done(),
                (Anchor::Idle, None) => true,
                _ => false,
            };
            if !live {
                return Err(RoutingError::StaleVehicle(plan.vehicle));
            }
            for &c in &plan.customers {
                if !fleet.get_customer(c).is_some_and(|cu| cu.is_requested()) {
                    return Err(RoutingError::CustomerNotRequested(c));
                }
            }
        }

        let mut effects = Vec::new();
        for plan in self.plans {
            let vid = plan.vehicle;
            let has_work = plan.has_work();
            for &c in &plan.customers {
                fleet.customer_mut(c).planned_vehicle = Some(vid);
            }
            match plan.anchor {
                Anchor::Extend { trip, .. } => {
                    let t = fleet.vehicle_mut(vid).plan_trip_mut().ok_or(RoutingError::StaleVehicle(vid))?;
                    t.replace_suffix(plan.suffix)?;
                    effects.push(CommitEffect::SuffixReplaced { vehicle: vid, trip });
                }
                Anchor::Append { .. } | Anchor::Idle if !has_work => {}
                anchor => {
                    let mut stops = Vec::with_capacity(plan.suffix.len() + 1);
                    stops.push(PlannedStop::at(plan.anchor_stop).with_window(plan.start_window));
                    stops.extend(plan.suffix);
                    let trip = fleet.new_trip(ServiceMode::Flexible, stops, plan.start_window.earliest)?;
                    let id = trip.id();
                    let v = fleet.vehicle_mut(vid);
                    v.enqueue_trip(trip);
                    if anchor == Anchor::Idle {
                        v.start_next_trip();
                        effects.push(CommitEffect::Started { vehicle: vid, trip: id });
                    } else {
                        effects.push(CommitEffect::Queued { vehicle: vid, trip: id });
                    }
                }
            }
        }
        Ok(effects)
    }
}
