//! `InsertionOracle` — cheapest feasible insertion.
//!
//! Pairs are inserted one at a time, each at the position pair (over every
//! eligible vehicle) that adds the least travel time while keeping the
//! route feasible; ties go to the earlier finish.  The current plans from
//! the snapshot are used as a warm start.  If that start leads nowhere the
//! solve is repeated from empty routes before giving up.

use std::time::{Duration, Instant};

use crate::oracle::{Oracle, OracleOutcome, OracleSolution, VehicleRoute};
use crate::schedule::schedule_route;
use crate::RoutingSnapshot;

#[derive(Debug, Clone, Copy, Default)]
pub struct InsertionOracle {
    time_budget: Option<Duration>,
}

impl InsertionOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give up with `TimedOut` once a solve has run longer than `budget`.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget
    }
}

impl Oracle for InsertionOracle {
    fn solve(&self, snapshot: &RoutingSnapshot) -> OracleOutcome {
        let started = Instant::now();
        for warm in [true, false] {
            let mut state = Insertion::new(snapshot);
            if warm {
                state.seed_warm_start();
            }
            match state.run(started, self.time_budget) {
                Attempt::Done => return state.into_outcome(),
                Attempt::TimedOut => return OracleOutcome::TimedOut,
                Attempt::Infeasible => {}
            }
        }
        OracleOutcome::Infeasible
    }

    fn name(&self) -> &str {
        "insertion"
    }
}

// ── Search state ──────────────────────────────────────────────────────────────

enum Attempt {
    Done,
    Infeasible,
    TimedOut,
}

struct Insertion<'a> {
    snap:     &'a RoutingSnapshot,
    /// Full routes, start slot to end slot.
    routes:   Vec<Vec<usize>>,
    /// Travel time of each route.
    travel:   Vec<u64>,
    /// Pairs already placed.
    counted:  Vec<bool>,
    /// Vehicle whose route visits each slot.
    on_route: Vec<Option<usize>>,
}

impl<'a> Insertion<'a> {
    fn new(snap: &'a RoutingSnapshot) -> Self {
        let mut on_route = vec![None; snap.slot_count()];
        let routes = snap
            .vehicles
            .iter()
            .enumerate()
            .map(|(i, v)| {
                on_route[v.start_slot] = Some(i);
                on_route[v.end_slot] = Some(i);
                vec![v.start_slot, v.end_slot]
            })
            .collect::<Vec<_>>();
        let travel = routes.iter().map(|r| snap.travel(r[0], r[1])).collect();
        Self { snap, routes, travel, counted: vec![false; snap.pairs.len()], on_route }
    }

    /// Adopt each vehicle's current plan if it is still feasible on its own.
    fn seed_warm_start(&mut self) {
        let snap = self.snap;
        for (i, plan) in snap.initial_routes.iter().enumerate() {
            if plan.is_empty() || plan.iter().any(|&s| self.on_route[s].is_some()) {
                continue;
            }
            let v = &snap.vehicles[i];
            let mut route = Vec::with_capacity(plan.len() + 2);
            route.push(v.start_slot);
            route.extend_from_slice(plan);
            route.push(v.end_slot);

            let within = |slot: usize| route.contains(&slot);
            let pairs: Vec<usize> = (0..snap.pairs.len())
                .filter(|&p| !self.counted[p])
                .filter(|&p| within(snap.pairs[p].pickup) && within(snap.pairs[p].delivery))
                .collect();
            let mut counted = self.counted.clone();
            for &p in &pairs {
                counted[p] = true;
            }
            let Some(schedule) = schedule_route(snap, i, &route, &counted) else { continue };

            self.counted = counted;
            for &s in plan {
                self.on_route[s] = Some(i);
            }
            self.travel[i] = schedule.travel_secs;
            self.routes[i] = route;
        }
    }

    fn run(&mut self, started: Instant, budget: Option<Duration>) -> Attempt {
        let snap = self.snap;
        let mut order: Vec<usize> = (0..snap.pairs.len()).filter(|&p| !self.counted[p]).collect();
        // Customers tied to a vehicle first, then by pickup window.
        order.sort_by_key(|&p| {
            let pair = &snap.pairs[p];
            (
                snap.vehicle_of_slot(pair.pickup).is_none(),
                snap.windows[pair.pickup].earliest,
                pair.customer,
            )
        });

        for p in order {
            if budget.is_some_and(|b| started.elapsed() > b) {
                return Attempt::TimedOut;
            }
            if !self.insert(p) {
                return Attempt::Infeasible;
            }
        }
        Attempt::Done
    }

    /// Place pair `p` at its cheapest feasible position.  Returns `false` if
    /// there is none.
    fn insert(&mut self, p: usize) -> bool {
        let snap = self.snap;
        let pair = snap.pairs[p];
        let (pu, de) = (pair.pickup, pair.delivery);
        self.counted[p] = true;

        // (added travel, finish time, vehicle, route, route travel)
        let mut best: Option<(u64, u64, usize, Vec<usize>, u64)> = None;
        let mut consider = |v: usize, route: Vec<usize>, counted: &[bool]| {
            let Some(s) = schedule_route(snap, v, &route, counted) else { return };
            let added = s.travel_secs.saturating_sub(self.travel[v]);
            let key = (added, s.end());
            if best.as_ref().is_none_or(|b| key < (b.0, b.1)) {
                best = Some((added, s.end(), v, route, s.travel_secs));
            }
        };

        for (v, route) in self.routes.iter().enumerate() {
            let len = route.len();
            let position = |slot: usize| route.iter().position(|&s| s == slot);
            match (self.on_route[pu], self.on_route[de]) {
                (Some(a), Some(b)) if a == v && b == v => {
                    if position(pu) < position(de) {
                        consider(v, route.clone(), &self.counted);
                    }
                }
                (Some(a), None) if a == v => {
                    let Some(i) = position(pu) else { continue };
                    for j in i + 1..len {
                        let mut r = route.clone();
                        r.insert(j, de);
                        consider(v, r, &self.counted);
                    }
                }
                (None, Some(b)) if b == v => {
                    let Some(j) = position(de) else { continue };
                    for i in 1..=j {
                        let mut r = route.clone();
                        r.insert(i, pu);
                        consider(v, r, &self.counted);
                    }
                }
                (None, None) => {
                    for i in 1..len {
                        for j in i + 1..=len {
                            let mut r = route.clone();
                            r.insert(i, pu);
                            r.insert(j, de);
                            consider(v, r, &self.counted);
                        }
                    }
                }
                _ => {}
            }
        }

        match best {
            Some((_, _, v, route, travel)) => {
                self.on_route[pu] = Some(v);
                self.on_route[de] = Some(v);
                self.routes[v] = route;
                self.travel[v] = travel;
                true
            }
            None => {
                self.counted[p] = false;
                false
            }
        }
    }

    fn into_outcome(self) -> OracleOutcome {
        let mut routes = Vec::with_capacity(self.routes.len());
        for (v, slots) in self.routes.into_iter().enumerate() {
            let Some(schedule) = self.snap.schedule(v, &slots) else {
                return OracleOutcome::Infeasible;
            };
            routes.push(VehicleRoute::new(slots, schedule.windows()));
        }
        OracleOutcome::Solved(OracleSolution { routes })
    }
}
