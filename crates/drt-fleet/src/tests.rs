//! Unit tests for drt-fleet.

#[cfg(test)]
mod helpers {
    use drt_core::{GeoPoint, ServiceMode, SimTime, StopId, TimeWindow, VehicleId};
    use drt_network::{StopNetwork, StopNetworkBuilder};

    use crate::{CustomerSpec, Fleet, VehicleSpec};

    /// Stops 0..4 on a line, 1 km apart (planar metres).
    pub fn line() -> StopNetwork {
        let mut b = StopNetworkBuilder::new();
        for i in 0..4 {
            b.add_stop(&format!("S{i}"), "", GeoPoint::new(0.0, 1_000.0 * i as f64)).unwrap();
        }
        b.build()
    }

    pub fn spec(capacity: u32) -> VehicleSpec {
        VehicleSpec {
            capacity,
            speed_mps:   10.0,
            mode:        ServiceMode::Flexible,
            start_depot: StopId(0),
            end_depot:   StopId(0),
        }
    }

    pub fn request(pickup: u32, delivery: u32) -> CustomerSpec {
        CustomerSpec {
            pickup:       StopId(pickup),
            delivery:     StopId(delivery),
            window:       TimeWindow::secs(0, 3_600),
            request_time: SimTime::ZERO,
            prebooked:    false,
        }
    }

    pub fn fleet_with(capacity: u32, customers: usize) -> (Fleet, VehicleId) {
        let mut fleet = Fleet::new();
        let v = fleet.add_vehicle(spec(capacity));
        for _ in 0..customers {
            fleet.add_customer(request(1, 2));
        }
        (fleet, v)
    }
}

// ── StopCursor ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod cursor {
    use crate::StopCursor;

    #[test]
    fn empty_sequence_has_no_cursor() {
        assert!(StopCursor::new(0).is_none());
    }

    #[test]
    fn single_stop_is_done_immediately() {
        let mut c = StopCursor::new(1).unwrap();
        assert!(c.is_done());
        assert_eq!(c.advance(), None);
        assert_eq!(c.index(), 0);
    }

    #[test]
    fn advance_is_monotonic_and_done_is_terminal() {
        let mut c = StopCursor::new(4).unwrap();
        let mut last = c.index();
        while let Some(i) = c.advance() {
            assert!(i > last);
            last = i;
        }
        assert_eq!(last, 3);
        assert!(c.is_done());
        assert_eq!(c.advance(), None);
        assert!(!c.resize(10), "done cursor must not be resized");
        assert!(c.is_done());
    }

    #[test]
    fn resize_keeps_index() {
        let mut c = StopCursor::new(5).unwrap();
        c.advance();
        assert!(!c.resize(1), "cannot cut off the current stop");
        assert!(c.resize(2));
        assert!(c.is_done());
        assert_eq!(c.index(), 1);
    }
}

// ── Trip ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod trip {
    use drt_core::{ServiceMode, SimTime, StopId, TripId};
    use drt_network::Planar;

    use crate::{LifecycleError, PlannedStop, Trip, TripPhase};

    fn trip(stops: &[u32]) -> Trip {
        let stops: Vec<StopId> = stops.iter().map(|s| StopId(*s)).collect();
        Trip::fixed(TripId(7), &stops, SimTime(100)).unwrap()
    }

    #[test]
    fn empty_trip_rejected() {
        let err = Trip::new(TripId(0), ServiceMode::Fixed, vec![], SimTime::ZERO).unwrap_err();
        assert_eq!(err, LifecycleError::EmptyTrip);
    }

    #[test]
    fn start_only_once() {
        let mut t = trip(&[0, 1]);
        assert_eq!(t.phase(), TripPhase::Idle);
        t.start(SimTime(100)).unwrap();
        assert_eq!(t.start(SimTime(101)), Err(LifecycleError::AlreadyStarted(TripId(7))));
        assert_eq!(t.phase(), TripPhase::Started { at: SimTime(100) });
    }

    #[test]
    fn advance_accumulates_distance_until_done() {
        let net = super::helpers::line();
        let mut t = trip(&[0, 1, 3]);
        t.start(SimTime(100)).unwrap();
        assert_eq!(t.advance(&net, &Planar), Ok(StopId(1)));
        assert!(!t.is_done());
        assert_eq!(t.advance(&net, &Planar), Ok(StopId(3)));
        assert!(t.is_done());
        assert_eq!(t.distance_m(), 3_000.0);
        assert_eq!(t.advance(&net, &Planar), Err(LifecycleError::AlreadyDone(TripId(7))));
        assert_eq!(t.cursor_index(), 2);
    }

    #[test]
    fn advance_before_start_is_refused() {
        let net = super::helpers::line();
        let mut t = trip(&[0, 1]);
        assert_eq!(t.advance(&net, &Planar), Err(LifecycleError::NotStarted(TripId(7))));
        assert_eq!(t.cursor_index(), 0);
        assert_eq!(t.distance_m(), 0.0);
    }

    #[test]
    fn replace_suffix_keeps_prefix_and_current() {
        let net = super::helpers::line();
        let mut t = trip(&[0, 1, 2, 3]);
        t.start(SimTime(100)).unwrap();
        t.advance(&net, &Planar).unwrap();

        t.replace_suffix(vec![PlannedStop::at(StopId(3)), PlannedStop::at(StopId(0))]).unwrap();
        let stops: Vec<u32> = t.stops().iter().map(|s| s.stop.0).collect();
        assert_eq!(stops, vec![0, 1, 3, 0]);
        assert_eq!(t.cursor_index(), 1);
        assert_eq!(t.current().stop, StopId(1));
        assert_eq!(t.next().unwrap().stop, StopId(3));
    }

    #[test]
    fn replace_suffix_on_done_trip_fails_without_change() {
        let net = super::helpers::line();
        let mut t = trip(&[0, 1]);
        t.start(SimTime(100)).unwrap();
        t.advance(&net, &Planar).unwrap();
        let err = t.replace_suffix(vec![PlannedStop::at(StopId(2))]).unwrap_err();
        assert_eq!(err, LifecycleError::AlreadyDone(TripId(7)));
        assert_eq!(t.stops().len(), 2);
    }

    #[test]
    fn empty_suffix_makes_current_the_last_stop() {
        let mut t = trip(&[0, 1, 2]);
        t.replace_suffix(vec![]).unwrap();
        assert!(t.is_done());
        assert_eq!(t.last().stop, StopId(0));
    }
}

// ── Vehicle trips ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod vehicle {
    use drt_core::{SimTime, StopId, TripId, VehicleId};
    use drt_network::Planar;

    use crate::{LifecycleError, Trip, TripPhase, Vehicle};

    #[test]
    fn finish_requires_done_and_empty() {
        let net = super::helpers::line();
        let mut v = Vehicle::new(VehicleId(0), super::helpers::spec(2));
        assert_eq!(v.finish_trip(SimTime(0)), Err(LifecycleError::NoActiveTrip(VehicleId(0))));

        v.enqueue_trip(Trip::fixed(TripId(1), &[StopId(0), StopId(1)], SimTime(0)).unwrap());
        assert!(v.start_next_trip().is_some());
        v.trip_mut().unwrap().start(SimTime(0)).unwrap();
        assert!(matches!(
            v.finish_trip(SimTime(5)),
            Err(LifecycleError::NotReady { done: false, .. })
        ));

        v.trip_mut().unwrap().advance(&net, &Planar).unwrap();
        v.finish_trip(SimTime(100)).unwrap();
        assert_eq!(
            v.trip().unwrap().phase(),
            TripPhase::Finished { started: SimTime(0), finished: SimTime(100) }
        );
        assert_eq!(v.finish_trip(SimTime(101)), Err(LifecycleError::AlreadyFinished(TripId(1))));
        assert_eq!(v.distance_m(), 1_000.0);
        assert_eq!(v.trips_done(), 1);
        assert!(v.is_idle());
    }

    #[test]
    fn queued_trips_start_in_order() {
        let mut v = Vehicle::new(VehicleId(0), super::helpers::spec(2));
        v.enqueue_trip(Trip::fixed(TripId(1), &[StopId(0)], SimTime(10)).unwrap());
        v.enqueue_trip(Trip::fixed(TripId(2), &[StopId(1)], SimTime(20)).unwrap());
        assert_eq!(v.plan_trip().unwrap().id(), TripId(2));

        assert_eq!(v.start_next_trip().unwrap().id(), TripId(1));
        // The current single-stop trip is still active.
        assert!(v.start_next_trip().is_none());
        v.finish_trip(SimTime(10)).unwrap();
        assert_eq!(v.start_next_trip().unwrap().id(), TripId(2));
        assert_eq!(v.queued_len(), 0);
    }
}

// ── Customer lifecycle ────────────────────────────────────────────────────────

#[cfg(test)]
mod lifecycle {
    use drt_core::{CustomerId, SimTime, StopId, TripId};
    use drt_network::Planar;

    use crate::{CustomerState, LifecycleError, Trip};

    #[test]
    fn board_then_alight() {
        let (mut fleet, v) = super::helpers::fleet_with(4, 1);
        let c = CustomerId(0);
        fleet.board(c, v, SimTime(600)).unwrap();
        assert_eq!(fleet.customer(c).state(), CustomerState::Boarded { vehicle: v, at: SimTime(600) });
        assert_eq!(fleet.vehicle(v).boarded(), &[c]);
        assert_eq!(fleet.vehicle(v).stats.total_requests, 1);

        let out = fleet.alight(c, v, SimTime(900)).unwrap();
        assert!(!out.trip_finished);
        let cust = fleet.customer(c);
        assert!(cust.is_served());
        assert_eq!(cust.ride_secs(), Some(300));
        assert_eq!(cust.wait_secs(), Some(600));
        assert_eq!(cust.delay_secs(), Some(900 - 3_600));
        assert_eq!(fleet.vehicle(v).served(), &[c]);
        assert_eq!(fleet.vehicle(v).stats.serviced, 1);
    }

    #[test]
    fn full_vehicle_denies_and_leaves_customer_requested() {
        let (mut fleet, v) = super::helpers::fleet_with(1, 2);
        fleet.board(CustomerId(0), v, SimTime(10)).unwrap();

        let err = fleet.board(CustomerId(1), v, SimTime(10)).unwrap_err();
        assert_eq!(err, LifecycleError::Full { vehicle: v, capacity: 1 });
        assert!(err.is_capacity());
        assert_eq!(fleet.vehicle(v).stats.denied, 1);
        assert!(fleet.customer(CustomerId(1)).is_requested());
        assert_eq!(fleet.vehicle(v).load(), 1);
        assert!(fleet.check_seats());
    }

    #[test]
    fn second_board_fails_and_keeps_first_record() {
        let (mut fleet, v) = super::helpers::fleet_with(4, 1);
        let c = CustomerId(0);
        fleet.board(c, v, SimTime(10)).unwrap();
        assert_eq!(fleet.board(c, v, SimTime(20)), Err(LifecycleError::AlreadyBoarded(c)));
        assert_eq!(fleet.customer(c).boarded_at(), Some(SimTime(10)));
        assert_eq!(fleet.vehicle(v).load(), 1);
    }

    #[test]
    fn second_alight_fails_and_keeps_first_record() {
        let (mut fleet, v) = super::helpers::fleet_with(4, 1);
        let c = CustomerId(0);
        assert_eq!(
            fleet.alight(c, v, SimTime(5)),
            Err(LifecycleError::NotBoarded { customer: c, vehicle: v })
        );
        fleet.board(c, v, SimTime(10)).unwrap();
        fleet.alight(c, v, SimTime(50)).unwrap();
        assert!(fleet.alight(c, v, SimTime(60)).is_err());
        assert_eq!(fleet.customer(c).alighted_at(), Some(SimTime(50)));
        assert_eq!(fleet.vehicle(v).served().len(), 1);
    }

    #[test]
    fn alight_from_wrong_vehicle_fails() {
        let (mut fleet, v) = super::helpers::fleet_with(4, 1);
        let other = fleet.add_vehicle(super::helpers::spec(4));
        fleet.board(CustomerId(0), v, SimTime(0)).unwrap();
        assert!(fleet.alight(CustomerId(0), other, SimTime(1)).is_err());
        assert!(fleet.vehicle(v).carries(CustomerId(0)));
    }

    #[test]
    fn last_alight_at_last_stop_finishes_trip() {
        let net = super::helpers::line();
        let (mut fleet, v) = super::helpers::fleet_with(4, 2);
        let veh = fleet.vehicle_mut(v);
        veh.enqueue_trip(Trip::fixed(TripId(0), &[StopId(1), StopId(2)], SimTime(0)).unwrap());
        veh.start_next_trip();
        veh.trip_mut().unwrap().start(SimTime(0)).unwrap();

        fleet.board(CustomerId(0), v, SimTime(0)).unwrap();
        fleet.board(CustomerId(1), v, SimTime(0)).unwrap();
        fleet.vehicle_mut(v).trip_mut().unwrap().advance(&net, &Planar).unwrap();

        let first = fleet.alight(CustomerId(0), v, SimTime(100)).unwrap();
        assert!(!first.trip_finished, "still one aboard");
        let last = fleet.alight(CustomerId(1), v, SimTime(100)).unwrap();
        assert!(last.trip_finished);
        assert!(fleet.vehicle(v).trip().unwrap().is_finished());
    }

    #[test]
    fn reject_only_from_requested() {
        let (mut fleet, v) = super::helpers::fleet_with(4, 2);
        fleet.board(CustomerId(0), v, SimTime(0)).unwrap();
        assert_eq!(fleet.reject_unserved(), 1);
        assert_eq!(fleet.customer(CustomerId(1)).state(), CustomerState::Rejected);
        assert!(!fleet.customer_mut(CustomerId(0)).reject());
        assert_eq!(
            fleet.board(CustomerId(1), v, SimTime(1)),
            Err(LifecycleError::AlreadyBoarded(CustomerId(1)))
        );
    }
}

// ── CSV loaders ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod loader {
    use std::io::Cursor;

    use drt_core::{ServiceMode, SimTime, StopId, TimeWindow, VehicleId};

    use crate::{load_requests_reader, load_trips_reader, load_vehicles_reader, Fleet, FleetError};

    const VEHICLES: &str = "vehicle_id,capacity,speed_mps,mode,start_depot,end_depot\n\
                            bus1,40,8.0,fixed,S0,S0\n\
                            van1,4,10.0,flexible,S0,S3\n";

    #[test]
    fn vehicles_resolve_depots_and_modes() {
        let net = super::helpers::line();
        let mut fleet = Fleet::new();
        let codes = load_vehicles_reader(Cursor::new(VEHICLES), &net, &mut fleet).unwrap();
        assert_eq!(codes["van1"], VehicleId(1));
        let van = fleet.vehicle(VehicleId(1));
        assert_eq!(van.mode, ServiceMode::Flexible);
        assert_eq!(van.end_depot, StopId(3));
        assert_eq!(van.location, StopId(0));
        assert_eq!(fleet.flexible_vehicles(), vec![VehicleId(1)]);
    }

    #[test]
    fn bad_mode_is_parse_error() {
        let net = super::helpers::line();
        let csv = "vehicle_id,capacity,speed_mps,mode,start_depot,end_depot\nx,4,10.0,taxi,S0,S0\n";
        let err = load_vehicles_reader(Cursor::new(csv), &net, &mut Fleet::new()).unwrap_err();
        assert!(matches!(err, FleetError::Parse(_)));
    }

    #[test]
    fn requests_load_with_windows() {
        let net = super::helpers::line();
        let mut fleet = Fleet::new();
        let csv = "customer_id,request_secs,pickup,delivery,earliest,latest,prebooked\n\
                   c1,0,S1,S2,600,2400,true\n\
                   c2,900,S2,S0,1200,3600,false\n";
        assert_eq!(load_requests_reader(Cursor::new(csv), &net, &mut fleet).unwrap(), 2);
        let c2 = &fleet.customers()[1];
        assert_eq!(c2.pickup, StopId(2));
        assert_eq!(c2.window, TimeWindow::secs(1_200, 3_600));
        assert_eq!(c2.request_time, SimTime(900));
        assert!(!c2.prebooked);
        assert!(fleet.customers()[0].prebooked);
    }

    #[test]
    fn inverted_window_rejected() {
        let net = super::helpers::line();
        let csv = "customer_id,request_secs,pickup,delivery,earliest,latest,prebooked\nc1,0,S1,S2,900,100,false\n";
        assert!(load_requests_reader(Cursor::new(csv), &net, &mut Fleet::new()).is_err());
    }

    #[test]
    fn unknown_stop_rejected() {
        let net = super::helpers::line();
        let csv = "customer_id,request_secs,pickup,delivery,earliest,latest,prebooked\nc1,0,S1,S9,0,100,false\n";
        let err = load_requests_reader(Cursor::new(csv), &net, &mut Fleet::new()).unwrap_err();
        assert!(matches!(err, FleetError::Network(_)));
    }

    #[test]
    fn fixed_trips_queue_by_start_time() {
        let net = super::helpers::line();
        let mut fleet = Fleet::new();
        let codes = load_vehicles_reader(Cursor::new(VEHICLES), &net, &mut fleet).unwrap();
        let csv = "trip_id,vehicle_id,start_secs,seq,stop_id\n\
                   late,bus1,7200,1,S0\n\
                   late,bus1,7200,0,S3\n\
                   early,bus1,3600,0,S0\n\
                   early,bus1,3600,1,S1\n\
                   early,bus1,3600,2,S3\n";
        assert_eq!(load_trips_reader(Cursor::new(csv), &net, &codes, &mut fleet).unwrap(), 2);

        let bus = fleet.vehicle(VehicleId(0));
        let starts: Vec<_> = bus.queued_trips().map(|t| t.scheduled_start()).collect();
        assert_eq!(starts, vec![SimTime(3_600), SimTime(7_200)]);
        let late: Vec<u32> = bus.queued_trips().nth(1).unwrap().stops().iter().map(|s| s.stop.0).collect();
        assert_eq!(late, vec![3, 0]);
    }

    #[test]
    fn trip_for_unknown_vehicle_rejected() {
        let net = super::helpers::line();
        let mut fleet = Fleet::new();
        let codes = load_vehicles_reader(Cursor::new(VEHICLES), &net, &mut fleet).unwrap();
        let csv = "trip_id,vehicle_id,start_secs,seq,stop_id\nt,tram9,0,0,S0\n";
        let err = load_trips_reader(Cursor::new(csv), &net, &codes, &mut fleet).unwrap_err();
        assert!(matches!(err, FleetError::UnknownVehicle(_)));
    }
}
