//! The `Sim` struct and its event loop.

use std::collections::VecDeque;

use drt_core::{CustomerId, SimClock, SimConfig, SimTime, StopId, TripId, VehicleId};
use drt_events::{Event, EventKind, EventPayload, EventQueue};
use drt_fleet::{Fleet, LifecycleError, Trip};
use drt_network::{DistanceModel, StopNetwork};
use drt_routing::{
    reoptimize, CommitEffect, Oracle, ReoptOutcome, SnapshotBuilder, SnapshotRequest,
};

use crate::{
    Interaction, ReoptRecord, ReoptTrigger, SimError, SimObserver, SimReport, SimResult,
    SimStats, TraceRecord, ValidationRecord,
};

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The main simulation runner.
///
/// `Sim<O, M>` owns all live state and drives the event loop:
///
/// 1. **Pop** the earliest event by `(time, kind, seq)` and move the clock.
/// 2. **Handle** it: mutate the vehicle, trip or customer it names.
/// 3. **Append** the events it causes: arrival schedules alights, boards and
///    the departure; departure schedules the next arrival; a request may run
///    a re-optimisation whose commit starts an idle vehicle.
///
/// The loop ends when the queue is empty.  Create via
/// [`SimBuilder`][crate::SimBuilder].
pub struct Sim<O: Oracle, M: DistanceModel> {
    /// Global configuration (dwell times, limits, batching, strict mode, …).
    pub config: SimConfig,

    /// Time of the event being handled.
    pub clock: SimClock,

    /// Read-only stop universe.
    pub network: StopNetwork,

    /// Vehicle and customer arenas.
    pub fleet: Fleet,

    /// Pending events.
    pub queue: EventQueue,

    pub stats: SimStats,

    /// Routing solver called on every re-optimisation.
    pub oracle: O,

    /// Distance model shared by trip odometers and snapshot matrices.
    pub metric: M,

    /// Stateless snapshot builder, configured from `config`.
    pub snapshots: SnapshotBuilder,

    /// Requests waiting for the next `DynamicCheck`, FIFO.
    pub pending: VecDeque<CustomerId>,

    /// Customers waiting at their pickup stop for a fixed-schedule vehicle.
    pub waiting: Vec<CustomerId>,

    pub(crate) primed: bool,
}

impl<O: Oracle, M: DistanceModel> Sim<O, M> {
    // ── Public API ────────────────────────────────────────────────────────

    /// Run until the event queue is empty, then close out every customer
    /// still `Requested` and return the report.
    ///
    /// If the run stops on an error, the observer gets `on_run_aborted`
    /// before the error is returned.
    pub fn run<Obs: SimObserver>(&mut self, observer: &mut Obs) -> SimResult<SimReport> {
        if let Err(e) = self.drain(observer) {
            observer.on_run_aborted(self.clock.now, &e, &self.fleet);
            return Err(e);
        }

        self.stats.unserved_at_end += self.fleet.reject_unserved() as u64;
        self.pending.clear();
        self.waiting.clear();
        let report = self.report();
        observer.on_sim_end(&report, &self.fleet);
        Ok(report)
    }

    fn drain<Obs: SimObserver>(&mut self, observer: &mut Obs) -> SimResult<()> {
        self.prime(observer)?;
        while self.step(observer)? {}
        Ok(())
    }

    /// Handle at most `n` events.  Returns how many were handled.
    ///
    /// Useful for tests and incremental stepping; does not close the run.
    pub fn run_events<Obs: SimObserver>(&mut self, n: usize, observer: &mut Obs) -> SimResult<usize> {
        self.prime(observer)?;
        let mut handled = 0;
        while handled < n && self.step(observer)? {
            handled += 1;
        }
        Ok(handled)
    }

    /// Seed the queue.  Runs once; later calls do nothing.
    ///
    /// Pre-booked customers are solved together (one by one if that fails),
    /// vehicles with a queued trip are sent off, and every other customer
    /// gets a `CustomerRequest` at its request time.
    pub fn prime<Obs: SimObserver>(&mut self, observer: &mut Obs) -> SimResult<()> {
        if self.primed {
            return Ok(());
        }
        self.primed = true;
        let now = self.clock.now;
        let flexible = self.fleet.has_flexible();

        if flexible {
            self.cold_start(observer)?;
        }
        for i in 0..self.fleet.vehicle_count() {
            let vehicle = VehicleId(i as u32);
            if self.fleet.vehicle(vehicle).active_trip().is_none() {
                self.start_next_trip(vehicle, now)?;
            }
        }

        let requests: Vec<(SimTime, CustomerId)> = self
            .fleet
            .customers()
            .iter()
            .filter(|c| !(flexible && c.prebooked))
            .map(|c| (c.request_time.max(now), c.id))
            .collect();
        for (t, customer) in requests {
            self.queue.insert(t, EventPayload::CustomerRequest { customer })?;
        }

        if let Some(interval) = self.config.dynamic_check_interval_secs.filter(|_| flexible) {
            self.queue.insert(now + interval, EventPayload::DynamicCheck)?;
        }
        Ok(())
    }

    /// Pop and handle one event.  Returns `false` once the queue is empty.
    ///
    /// A contract violation abandons the event, is reported to the observer
    /// and counted; the loop carries on unless `config.strict` is set.
    /// Queue errors are always fatal.
    pub fn step<Obs: SimObserver>(&mut self, observer: &mut Obs) -> SimResult<bool> {
        let Some(mut event) = self.queue.pop_earliest() else {
            return Ok(false);
        };
        self.clock.advance_to(event.time);

        let result = self.handle(&event, observer);
        event.mark_handled();
        self.stats.count_event(event.kind());
        observer.on_event(&TraceRecord {
            time:        event.time,
            seq:         event.seq,
            kind:        event.kind(),
            payload:     event.payload,
            description: event.payload.to_string(),
        });

        match result {
            Ok(()) => Ok(true),
            Err(e) if e.is_contract_violation() => {
                self.stats.contract_violations += 1;
                observer.on_contract_violation(event.time, &e);
                if self.config.strict { Err(e) } else { Ok(true) }
            }
            Err(e) => Err(e),
        }
    }

    /// Report for the state reached so far.
    pub fn report(&self) -> SimReport {
        SimReport::new(self.clock.now, self.stats.clone(), &self.fleet)
    }

    // ── Handle + Append ───────────────────────────────────────────────────

    fn handle<Obs: SimObserver>(&mut self, event: &Event, observer: &mut Obs) -> SimResult<()> {
        let t = event.time;
        match event.payload {
            EventPayload::Arrive { vehicle, trip, stop } => self.on_arrive(t, vehicle, trip, stop),
            EventPayload::Depart { vehicle, trip } => self.on_depart(t, vehicle, trip),
            EventPayload::CustomerBoard { customer, vehicle, stop } => {
                self.on_board(t, customer, vehicle, stop, observer)
            }
            EventPayload::CustomerAlight { customer, vehicle, stop } => {
                self.on_alight(t, customer, vehicle, stop, observer)
            }
            EventPayload::CustomerRequest { customer } => self.on_request(customer, observer),
            EventPayload::DynamicCheck => self.on_dynamic_check(t, observer),
        }
    }

    /// Arrival at the stop under the trip cursor.  Alights happen once
    /// service starts, boards `alighting_secs` later, and the departure waits
    /// for the dwell and for the next stop's planned window.
    fn on_arrive(&mut self, t: SimTime, vid: VehicleId, trip_id: TripId, stop: StopId) -> SimResult<()> {
        let fleet = &self.fleet;
        let v = fleet.vehicle(vid);
        let trip = match v.active_trip() {
            Some(trip) if trip.id() == trip_id && trip.current().stop == stop => trip,
            other => return Err(mismatch(EventKind::Arrive, vid, trip_id, other)),
        };
        let flexible = v.is_flexible();
        let current = trip.current();
        let done = trip.is_done();
        let service = current.window.map_or(t, |w| t.max(w.earliest));

        let alights: Vec<CustomerId> = if flexible {
            current.deliveries.iter().copied().filter(|&c| v.carries(c)).collect()
        } else {
            v.boarded().iter().copied().filter(|&c| fleet.customer(c).delivery == stop).collect()
        };
        let boards: Vec<CustomerId> = if flexible {
            current
                .pickups
                .iter()
                .copied()
                .filter(|&c| {
                    let customer = fleet.customer(c);
                    customer.is_requested() && customer.planned_vehicle == Some(vid)
                })
                .collect()
        } else if done {
            Vec::new()
        } else {
            let remaining = trip.remaining();
            let (claimed, rest): (Vec<CustomerId>, Vec<CustomerId>) =
                self.waiting.iter().copied().partition(|&c| {
                    let customer = fleet.customer(c);
                    customer.is_requested()
                        && customer.pickup == stop
                        && customer.request_time <= t
                        && remaining.iter().any(|s| s.stop == customer.delivery)
                });
            self.waiting = rest;
            claimed
        };
        let hold = if flexible && current.is_pass_through() { 0 } else { self.config.dwell_secs };
        let next = trip.next().map(|n| (n.stop, n.window));
        let speed = v.speed_mps;

        // ── Handle ────────────────────────────────────────────────────────
        let v = self.fleet.vehicle_mut(vid);
        v.location = stop;
        if let Some(trip) = v.active_trip_mut() {
            if !trip.is_started() {
                trip.start(t)?;
            }
        }

        // ── Append ────────────────────────────────────────────────────────
        for &customer in &alights {
            self.queue.insert(service, EventPayload::CustomerAlight { customer, vehicle: vid, stop })?;
        }
        let board_at = service + self.config.alighting_secs;
        for customer in boards {
            self.queue.insert(board_at, EventPayload::CustomerBoard { customer, vehicle: vid, stop })?;
        }

        match next {
            None => {
                let v = self.fleet.vehicle_mut(vid);
                v.available_at = service;
                // Otherwise the last customer off closes the trip.
                if alights.is_empty() {
                    v.finish_trip(service)?;
                    self.start_next_trip(vid, service)?;
                }
            }
            Some((to, window)) => {
                let leg = self.network.leg_secs(&self.metric, stop, to, speed);
                let mut depart = service + hold;
                if let Some(w) = window {
                    depart = depart.max(SimTime(w.earliest.0.saturating_sub(leg)));
                }
                self.fleet.vehicle_mut(vid).available_at = depart;
                self.queue.insert(depart, EventPayload::Depart { vehicle: vid, trip: trip_id })?;
            }
        }
        Ok(())
    }

    /// Departure: advance the cursor and schedule the arrival at the new
    /// current stop.
    fn on_depart(&mut self, t: SimTime, vid: VehicleId, trip_id: TripId) -> SimResult<()> {
        let dwell = self.config.dwell_secs;
        let v = self.fleet.vehicle_mut(vid);
        let speed = v.speed_mps;
        let flexible = v.is_flexible();
        let trip = match v.active_trip_mut() {
            Some(trip) if trip.id() == trip_id => trip,
            other => return Err(mismatch(EventKind::Depart, vid, trip_id, other.map(|t| &*t))),
        };

        let from = trip.current().stop;
        let to = trip.advance(&self.network, &self.metric)?;
        let arrival = t + self.network.leg_secs(&self.metric, from, to, speed);
        let next = trip.current();
        let hold = if flexible && next.is_pass_through() { 0 } else { dwell };
        let service = next.window.map_or(arrival, |w| arrival.max(w.earliest));

        v.available_at = service + hold;
        self.queue.insert(arrival, EventPayload::Arrive { vehicle: vid, trip: trip_id, stop: to })?;
        Ok(())
    }

    fn on_board<Obs: SimObserver>(
        &mut self,
        t:        SimTime,
        customer: CustomerId,
        vehicle:  VehicleId,
        stop:     StopId,
        observer: &mut Obs,
    ) -> SimResult<()> {
        let result = self.fleet.board(customer, vehicle, t);
        observer.on_validation(&ValidationRecord {
            time: t,
            customer,
            vehicle,
            stop,
            action:  Interaction::Board,
            success: result.is_ok(),
            reason:  result.as_ref().err().map(ToString::to_string),
        });
        match result {
            Ok(()) => {
                self.stats.boardings += 1;
                Ok(())
            }
            // The customer keeps waiting; a fixed-line customer may still
            // catch a later vehicle.
            Err(e) if e.is_capacity() => {
                self.stats.denied_full += 1;
                if !self.fleet.vehicle(vehicle).is_flexible() {
                    self.waiting.push(customer);
                }
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn on_alight<Obs: SimObserver>(
        &mut self,
        t:        SimTime,
        customer: CustomerId,
        vehicle:  VehicleId,
        stop:     StopId,
        observer: &mut Obs,
    ) -> SimResult<()> {
        let result = self.fleet.alight(customer, vehicle, t);
        observer.on_validation(&ValidationRecord {
            time: t,
            customer,
            vehicle,
            stop,
            action:  Interaction::Alight,
            success: result.is_ok(),
            reason:  result.as_ref().err().map(ToString::to_string),
        });
        let outcome = result?;
        self.stats.alightings += 1;
        if outcome.trip_finished {
            self.start_next_trip(vehicle, t)?;
        }
        Ok(())
    }

    fn on_request<Obs: SimObserver>(&mut self, customer: CustomerId, observer: &mut Obs) -> SimResult<()> {
        if !self.fleet.get_customer(customer).is_some_and(|c| c.is_requested()) {
            return Ok(());
        }
        if !self.fleet.has_flexible() {
            self.waiting.push(customer);
        } else if self.config.dynamic_check_interval_secs.is_some() {
            self.pending.push_back(customer);
        } else {
            self.reoptimize_for(vec![customer], ReoptTrigger::Request, observer)?;
        }
        Ok(())
    }

    /// Re-optimise every batched request in arrival order, one customer per
    /// attempt, then reschedule while anything else is pending.
    fn on_dynamic_check<Obs: SimObserver>(&mut self, t: SimTime, observer: &mut Obs) -> SimResult<()> {
        while let Some(customer) = self.pending.pop_front() {
            if self.fleet.customer(customer).is_requested() {
                self.reoptimize_for(vec![customer], ReoptTrigger::DynamicCheck, observer)?;
            }
        }
        if let Some(interval) = self.config.dynamic_check_interval_secs {
            if self.queue.has_work_besides(EventKind::DynamicCheck) {
                self.queue.insert(t + interval, EventPayload::DynamicCheck)?;
            }
        }
        Ok(())
    }

    // ── Re-optimisation ───────────────────────────────────────────────────

    fn cold_start<Obs: SimObserver>(&mut self, observer: &mut Obs) -> SimResult<()> {
        let prebooked: Vec<CustomerId> = self
            .fleet
            .customers()
            .iter()
            .filter(|c| c.prebooked && c.is_requested())
            .map(|c| c.id)
            .collect();
        if prebooked.is_empty() || self.reoptimize_for(prebooked.clone(), ReoptTrigger::ColdStart, observer)? {
            return Ok(());
        }
        for customer in prebooked {
            self.reoptimize_for(vec![customer], ReoptTrigger::ColdStartFallback, observer)?;
        }
        Ok(())
    }

    /// One snapshot → solve → commit cycle over every flexible vehicle.
    /// Returns whether the plan was committed.  A rejection leaves the fleet
    /// untouched and is final for `customers`.
    fn reoptimize_for<Obs: SimObserver>(
        &mut self,
        customers: Vec<CustomerId>,
        trigger:   ReoptTrigger,
        observer:  &mut Obs,
    ) -> SimResult<bool> {
        let now = self.clock.now;
        let request = SnapshotRequest::new(now, self.fleet.flexible_vehicles(), customers);
        let outcome = reoptimize(
            &self.snapshots,
            &self.oracle,
            &request,
            &mut self.fleet,
            &self.network,
            &self.metric,
        );
        self.stats.reopt_attempts += 1;

        let record = match outcome {
            ReoptOutcome::Committed { effects, slots } => {
                self.stats.reopt_committed += 1;
                for effect in &effects {
                    // Suffix edits and queued trips ride on events that are
                    // already pending.
                    if let CommitEffect::Started { vehicle, .. } = *effect {
                        self.schedule_first_arrival(vehicle, now)?;
                    }
                }
                ReoptRecord {
                    time: now,
                    trigger,
                    customers: request.customers,
                    outcome: "committed",
                    detail: String::new(),
                    vehicles: effects.len(),
                    slots,
                }
            }
            ReoptOutcome::Rejected(reason) => {
                self.stats.count_rejection(&reason);
                ReoptRecord {
                    time: now,
                    trigger,
                    customers: request.customers,
                    outcome: reason.as_str(),
                    detail: reason.to_string(),
                    vehicles: 0,
                    slots: 0,
                }
            }
        };
        let committed = record.committed();
        observer.on_reoptimization(&record);
        Ok(committed)
    }

    // ── Trip hand-over ────────────────────────────────────────────────────

    /// Make the vehicle's next queued trip current and send it off.
    fn start_next_trip(&mut self, vehicle: VehicleId, t: SimTime) -> SimResult<()> {
        if self.fleet.vehicle_mut(vehicle).start_next_trip().is_some() {
            self.schedule_first_arrival(vehicle, t)?;
        }
        Ok(())
    }

    /// Schedule the arrival at the first stop of the active trip: the
    /// vehicle sets off at the trip's scheduled start, never before `t`.
    fn schedule_first_arrival(&mut self, vehicle: VehicleId, t: SimTime) -> SimResult<()> {
        let v = self.fleet.vehicle(vehicle);
        let trip = v.active_trip().ok_or(LifecycleError::NoActiveTrip(vehicle))?;
        let first = trip.first().stop;
        let leave = t.max(trip.scheduled_start()).max(v.available_at);
        let arrival = leave + self.network.leg_secs(&self.metric, v.location, first, v.speed_mps);
        let payload = EventPayload::Arrive { vehicle, trip: trip.id(), stop: first };

        // A re-plan before the arrival must not expect the vehicle earlier.
        self.fleet.vehicle_mut(vehicle).available_at = arrival;
        self.queue.insert(arrival, payload)?;
        Ok(())
    }
}

fn mismatch(kind: EventKind, vehicle: VehicleId, trip: TripId, active: Option<&Trip>) -> SimError {
    SimError::EventMismatch { kind, vehicle, trip, active: active.map(Trip::id) }
}
