//! Route timing: forward earliest-service pass, start shift and backward
//! latest-service pass over one vehicle route.
//!
//! A route is feasible when
//!
//! - it starts at the vehicle's start slot and ends at its end slot,
//! - every visit starts inside its slot window,
//! - each counted pair is picked up before it is delivered on this route,
//! - the running load stays within `0..=capacity`,
//! - waiting before any non-start visit stays within the slack limit,
//! - every ride stays within the ride-time limit.

use drt_core::{CustomerId, SimTime, TimeWindow};

use crate::RoutingSnapshot;

/// Service times of a feasible route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSchedule {
    /// Earliest service start at each position.
    pub times:       Vec<u64>,
    /// Latest service start at each position that keeps every later visit
    /// inside its window.
    pub latest:      Vec<u64>,
    /// Sum of leg travel times.
    pub travel_secs: u64,
}

impl RouteSchedule {
    /// Realised window `[earliest, latest]` of every visit.
    pub fn windows(&self) -> Vec<TimeWindow> {
        self.times
            .iter()
            .zip(&self.latest)
            .map(|(&t, &l)| TimeWindow::secs(t, l.max(t)))
            .collect()
    }

    pub fn end(&self) -> u64 {
        self.times.last().copied().unwrap_or(0)
    }
}

impl RoutingSnapshot {
    /// Schedule `route` for snapshot vehicle `vehicle`, counting every pair.
    /// `None` if the route is infeasible.
    pub fn schedule(&self, vehicle: usize, route: &[usize]) -> Option<RouteSchedule> {
        let counted = vec![true; self.pairs.len()];
        schedule_route(self, vehicle, route, &counted)
    }
}

/// Schedule `route`, checking only the pairs flagged in `counted`.  Load is
/// derived from counted pairs too, so a slot shared with a customer that is
/// not routed yet does not distort it.
pub(crate) fn schedule_route(
    snap:    &RoutingSnapshot,
    vehicle: usize,
    route:   &[usize],
    counted: &[bool],
) -> Option<RouteSchedule> {
    let sv = snap.vehicles.get(vehicle)?;
    let (&first, &last) = (route.first()?, route.last()?);
    if route.len() < 2 || first != sv.start_slot || last != sv.end_slot {
        return None;
    }

    let lo = |slot: usize| snap.windows[slot].earliest.0;
    let hi = |slot: usize| snap.windows[slot].latest.0;

    // ── Forward pass and start shift ──────────────────────────────────────
    let mut times = forward(snap, route, lo(first))?;
    let mut wait_total = 0u64;
    let mut shift = hi(first) - times[0];
    for k in 1..route.len() {
        let arrival = times[k - 1] + snap.service_secs[route[k - 1]] + snap.travel(route[k - 1], route[k]);
        wait_total += times[k] - arrival;
        shift = shift.min(hi(route[k]) - times[k] + wait_total);
    }
    let shift = shift.min(wait_total);
    if shift > 0 {
        times = forward(snap, route, times[0] + shift)?;
    }

    // ── Load, precedence, slack and ride time ─────────────────────────────
    let mut picked: Vec<Option<u64>> = vec![None; snap.pairs.len()];
    let mut load: i64 = 0;
    let mut travel_secs = 0;
    for (k, &slot) in route.iter().enumerate() {
        let t = times[k];
        if k > 0 {
            let prev = route[k - 1];
            travel_secs += snap.travel(prev, slot);
            if let Some(max) = snap.limits.max_schedule_slack_secs {
                let arrival = times[k - 1] + snap.service_secs[prev] + snap.travel(prev, slot);
                if t - arrival > max {
                    return None;
                }
            }
        }
        // Deliveries before pickups so a shared slot frees seats first.
        for &p in &snap.pairs_by_slot[slot] {
            let pair = &snap.pairs[p];
            if !counted[p] || pair.delivery != slot {
                continue;
            }
            let picked_at = picked[p].take()?;
            load -= 1;
            if let Some(max) = snap.limits.max_ride_time_secs {
                if ride_secs(snap, pair.customer, picked_at, t) > max {
                    return None;
                }
            }
        }
        for &p in &snap.pairs_by_slot[slot] {
            if counted[p] && snap.pairs[p].pickup == slot {
                picked[p] = Some(t);
                load += 1;
            }
        }
        if load < 0 || load > sv.capacity as i64 {
            return None;
        }
    }
    // A counted pickup without its delivery on this route.
    if picked.iter().any(Option::is_some) {
        return None;
    }

    // ── Backward pass ─────────────────────────────────────────────────────
    let n = route.len();
    let mut latest = vec![0; n];
    latest[n - 1] = hi(last);
    for k in (0..n - 1).rev() {
        let slot = route[k];
        let leg = snap.service_secs[slot] + snap.travel(slot, route[k + 1]);
        latest[k] = hi(slot).min(latest[k + 1].saturating_sub(leg));
    }

    Some(RouteSchedule { times, latest, travel_secs })
}

/// Earliest service start at every position when the vehicle is ready at
/// its start slot at `start`.
fn forward(snap: &RoutingSnapshot, route: &[usize], start: u64) -> Option<Vec<u64>> {
    let mut times = Vec::with_capacity(route.len());
    times.push(start);
    for k in 1..route.len() {
        let (i, j) = (route[k - 1], route[k]);
        let arrival = times[k - 1] + snap.service_secs[i] + snap.travel(i, j);
        let w = &snap.windows[j];
        let t = arrival.max(w.earliest.0);
        if t > w.latest.0 {
            return None;
        }
        times.push(t);
    }
    Some(times)
}

/// Ride time of `customer` when delivered at `delivered`.  Customers tied to
/// a start slot either rode before the snapshot (`aboard`) or board at the
/// start slot itself.
fn ride_secs(snap: &RoutingSnapshot, customer: CustomerId, picked_at: u64, delivered: u64) -> u64 {
    match snap.ride_of(customer) {
        Some(r) if r.aboard => r.elapsed_secs + SimTime(delivered).since(snap.now),
        _ => delivered - picked_at,
    }
}
