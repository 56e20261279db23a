//! Event categories, payloads and the `Event` record.

use std::fmt;

use drt_core::{CustomerId, SimTime, StopId, TripId, VehicleId};

// ── EventKind ─────────────────────────────────────────────────────────────────

/// Event category.  The discriminant is the same-tick precedence: a
/// vehicle's departure at `t` is handled after its arrival at `t`, and a
/// dynamic check at `t` after every customer event at `t`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum EventKind {
    Arrive          = 0,
    Depart          = 1,
    CustomerBoard   = 2,
    CustomerAlight  = 3,
    CustomerRequest = 4,
    DynamicCheck    = 5,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::Arrive,
        EventKind::Depart,
        EventKind::CustomerBoard,
        EventKind::CustomerAlight,
        EventKind::CustomerRequest,
        EventKind::DynamicCheck,
    ];

    /// Label used in trace output.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Arrive          => "arrive",
            EventKind::Depart          => "depart",
            EventKind::CustomerBoard   => "board",
            EventKind::CustomerAlight  => "alight",
            EventKind::CustomerRequest => "request",
            EventKind::DynamicCheck    => "dynamic_check",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── EventPayload ──────────────────────────────────────────────────────────────

/// What an event is about.  Entities are referenced by id only.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventPayload {
    /// `vehicle` reaches `stop`, the stop under its trip cursor.  `trip`
    /// guards against events that outlive the trip they were scheduled for.
    Arrive { vehicle: VehicleId, trip: TripId, stop: StopId },
    /// `vehicle` leaves its current stop.
    Depart { vehicle: VehicleId, trip: TripId },
    CustomerBoard { customer: CustomerId, vehicle: VehicleId, stop: StopId },
    CustomerAlight { customer: CustomerId, vehicle: VehicleId, stop: StopId },
    /// A customer's request becomes known to the dispatcher.
    CustomerRequest { customer: CustomerId },
    /// Periodic processing of batched requests.
    DynamicCheck,
}

impl EventPayload {
    /// The category this payload belongs to.
    #[inline]
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::Arrive { .. }          => EventKind::Arrive,
            EventPayload::Depart { .. }          => EventKind::Depart,
            EventPayload::CustomerBoard { .. }   => EventKind::CustomerBoard,
            EventPayload::CustomerAlight { .. }  => EventKind::CustomerAlight,
            EventPayload::CustomerRequest { .. } => EventKind::CustomerRequest,
            EventPayload::DynamicCheck           => EventKind::DynamicCheck,
        }
    }

    /// The vehicle this event concerns, if any.
    pub fn vehicle(&self) -> Option<VehicleId> {
        match *self {
            EventPayload::Arrive { vehicle, .. }
            | EventPayload::Depart { vehicle, .. }
            | EventPayload::CustomerBoard { vehicle, .. }
            | EventPayload::CustomerAlight { vehicle, .. } => Some(vehicle),
            _ => None,
        }
    }

    /// The stop this event happens at, if any.
    pub fn stop(&self) -> Option<StopId> {
        match *self {
            EventPayload::Arrive { stop, .. }
            | EventPayload::CustomerBoard { stop, .. }
            | EventPayload::CustomerAlight { stop, .. } => Some(stop),
            _ => None,
        }
    }

    /// The customer this event concerns, if any.
    pub fn customer(&self) -> Option<CustomerId> {
        match *self {
            EventPayload::CustomerBoard { customer, .. }
            | EventPayload::CustomerAlight { customer, .. }
            | EventPayload::CustomerRequest { customer } => Some(customer),
            _ => None,
        }
    }
}

impl fmt::Display for EventPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventPayload::Arrive { vehicle, trip, stop } => {
                write!(f, "{vehicle} arrives at {stop} on {trip}")
            }
            EventPayload::Depart { vehicle, trip } => write!(f, "{vehicle} departs on {trip}"),
            EventPayload::CustomerBoard { customer, vehicle, stop } => {
                write!(f, "{customer} boards {vehicle} at {stop}")
            }
            EventPayload::CustomerAlight { customer, vehicle, stop } => {
                write!(f, "{customer} alights {vehicle} at {stop}")
            }
            EventPayload::CustomerRequest { customer } => write!(f, "{customer} requests a ride"),
            EventPayload::DynamicCheck => f.write_str("dynamic request check"),
        }
    }
}

// ── Event ─────────────────────────────────────────────────────────────────────

/// A scheduled occurrence.  Immutable after creation except for `handled`.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    pub time:    SimTime,
    /// Queue-assigned insertion sequence; the FIFO tie-break within
    /// `(time, kind)`.
    pub seq:     u64,
    pub payload: EventPayload,
    handled:     bool,
}

impl Event {
    pub(crate) fn new(time: SimTime, seq: u64, payload: EventPayload) -> Self {
        Self { time, seq, payload, handled: false }
    }

    #[inline]
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    #[inline]
    pub fn is_handled(&self) -> bool {
        self.handled
    }

    /// Set once the Handle step has processed this event.
    #[inline]
    pub fn mark_handled(&mut self) {
        self.handled = true;
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.time, self.kind(), self.payload)
    }
}
