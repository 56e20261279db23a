//! Unit tests for drt-events.

#[cfg(test)]
mod kind {
    use drt_core::{CustomerId, StopId, TripId, VehicleId};
    use crate::{EventKind, EventPayload};

    #[test]
    fn precedence_matches_discriminants() {
        let mut sorted = EventKind::ALL;
        sorted.sort();
        assert_eq!(sorted, EventKind::ALL);
        for (i, k) in EventKind::ALL.iter().enumerate() {
            assert_eq!(*k as u8, i as u8);
        }
    }

    #[test]
    fn kind_is_derived_from_payload() {
        let arrive = EventPayload::Arrive { vehicle: VehicleId(0), trip: TripId(0), stop: StopId(3) };
        let board = EventPayload::CustomerBoard {
            customer: CustomerId(1),
            vehicle:  VehicleId(0),
            stop:     StopId(3),
        };
        assert_eq!(arrive.kind(), EventKind::Arrive);
        assert_eq!(board.kind(), EventKind::CustomerBoard);
        assert_eq!(board.vehicle(), Some(VehicleId(0)));
        assert_eq!(board.customer(), Some(CustomerId(1)));
        assert_eq!(EventPayload::DynamicCheck.vehicle(), None);
    }

    #[test]
    fn description_names_entities() {
        let p = EventPayload::CustomerAlight {
            customer: CustomerId(4),
            vehicle:  VehicleId(2),
            stop:     StopId(9),
        };
        assert_eq!(p.to_string(), "CustomerId(4) alights VehicleId(2) at StopId(9)");
    }
}

#[cfg(test)]
mod queue {
    use drt_core::{CustomerId, SimRng, SimTime, StopId, TripId, VehicleId};
    use crate::{EventKind, EventPayload, EventQueue, QueueError};

    fn arrive(v: u32) -> EventPayload {
        EventPayload::Arrive { vehicle: VehicleId(v), trip: TripId(0), stop: StopId(0) }
    }

    fn depart(v: u32) -> EventPayload {
        EventPayload::Depart { vehicle: VehicleId(v), trip: TripId(0) }
    }

    fn request(c: u32) -> EventPayload {
        EventPayload::CustomerRequest { customer: CustomerId(c) }
    }

    #[test]
    fn empty_queue() {
        let mut q = EventQueue::new();
        assert!(q.is_empty());
        assert!(q.pop_earliest().is_none());
        assert!(q.peek_time().is_none());
        assert!(q.last_handled_time().is_none());
    }

    #[test]
    fn time_then_kind() {
        let mut q = EventQueue::new();
        q.insert(SimTime(10), EventPayload::DynamicCheck).unwrap();
        q.insert(SimTime(10), depart(0)).unwrap();
        q.insert(SimTime(5), request(0)).unwrap();
        q.insert(SimTime(10), arrive(1)).unwrap();
        assert_eq!(q.len(), 4);
        assert_eq!(q.peek_time(), Some(SimTime(5)));

        let kinds: Vec<_> = std::iter::from_fn(|| q.pop_earliest()).map(|e| (e.time.0, e.kind())).collect();
        assert_eq!(
            kinds,
            vec![
                (5, EventKind::CustomerRequest),
                (10, EventKind::Arrive),
                (10, EventKind::Depart),
                (10, EventKind::DynamicCheck),
            ]
        );
    }

    #[test]
    fn same_key_is_fifo() {
        let mut q = EventQueue::new();
        for c in [7, 3, 9] {
            q.insert(SimTime(0), request(c)).unwrap();
        }
        let order: Vec<_> = std::iter::from_fn(|| q.pop_earliest())
            .map(|e| e.payload.customer().unwrap().0)
            .collect();
        assert_eq!(order, vec![7, 3, 9]);
    }

    #[test]
    fn inserts_during_processing_are_ordered() {
        let mut q = EventQueue::new();
        q.insert(SimTime(100), arrive(0)).unwrap();
        q.insert(SimTime(200), arrive(1)).unwrap();

        let first = q.pop_earliest().unwrap();
        assert_eq!(first.time, SimTime(100));
        // Appended while "handling" the first event.
        q.insert(SimTime(100), depart(0)).unwrap();
        q.insert(SimTime(150), arrive(0)).unwrap();

        let times: Vec<_> = std::iter::from_fn(|| q.pop_earliest()).map(|e| e.time.0).collect();
        assert_eq!(times, vec![100, 150, 200]);
    }

    #[test]
    fn past_insert_is_refused() {
        let mut q = EventQueue::new();
        q.insert(SimTime(50), arrive(0)).unwrap();
        q.pop_earliest().unwrap();
        assert_eq!(q.last_handled_time(), Some(SimTime(50)));

        let err = q.insert(SimTime(49), depart(0)).unwrap_err();
        assert_eq!(
            err,
            QueueError::PastEvent {
                kind:         EventKind::Depart,
                time:         SimTime(49),
                last_handled: SimTime(50),
            }
        );
        assert!(q.is_empty(), "refused event must not be queued");
        // Same-second insert is fine.
        assert!(q.insert(SimTime(50), depart(0)).is_ok());
    }

    #[test]
    fn handled_flag() {
        let mut q = EventQueue::new();
        q.insert(SimTime(1), request(0)).unwrap();
        let mut e = q.pop_earliest().unwrap();
        assert!(!e.is_handled());
        e.mark_handled();
        assert!(e.is_handled());
    }

    #[test]
    fn work_besides_dynamic_check() {
        let mut q = EventQueue::new();
        q.insert(SimTime(60), EventPayload::DynamicCheck).unwrap();
        assert!(!q.has_work_besides(EventKind::DynamicCheck));
        q.insert(SimTime(90), request(0)).unwrap();
        assert!(q.has_work_besides(EventKind::DynamicCheck));
        assert_eq!(q.count_kind(EventKind::DynamicCheck), 1);
    }

    #[test]
    fn random_inserts_pop_in_order() {
        let mut rng = SimRng::new(17);
        let mut q = EventQueue::new();
        for i in 0..500u32 {
            let t = SimTime(rng.gen_range(0..200u64));
            let payload = match rng.gen_range(0..4u8) {
                0 => arrive(i),
                1 => depart(i),
                2 => request(i),
                _ => EventPayload::DynamicCheck,
            };
            q.insert(t, payload).unwrap();
        }

        let mut prev: Option<(SimTime, EventKind, u64)> = None;
        while let Some(e) = q.pop_earliest() {
            let key = (e.time, e.kind(), e.seq);
            if let Some(p) = prev {
                assert!(p < key, "{p:?} popped before {key:?}");
            }
            prev = Some(key);
            // Interleave a few appends at the current time.
            if e.seq % 50 == 0 && e.kind() <= EventKind::CustomerRequest {
                q.insert(e.time, request(9_999)).unwrap();
            }
        }
    }
}
