//! `Customer` — a pickup-delivery request and its lifecycle.

use drt_core::{CustomerId, SimTime, StopId, TimeWindow, VehicleId};

/// Lifecycle state.  Board and alight timestamps are written once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CustomerState {
    Requested,
    Boarded { vehicle: VehicleId, at: SimTime },
    Alighted { vehicle: VehicleId, boarded: SimTime, alighted: SimTime },
    Rejected,
}

impl CustomerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerState::Requested     => "requested",
            CustomerState::Boarded { .. } => "boarded",
            CustomerState::Alighted { .. } => "alighted",
            CustomerState::Rejected      => "rejected",
        }
    }
}

/// Request attributes used by [`Fleet::add_customer`](crate::Fleet::add_customer).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CustomerSpec {
    pub pickup:       StopId,
    pub delivery:     StopId,
    /// Desired service window: board no earlier than `earliest`, arrive no
    /// later than `latest`.
    pub window:       TimeWindow,
    /// When the request becomes known.
    pub request_time: SimTime,
    /// Known before the run starts; solved in the cold-start pass.
    pub prebooked:    bool,
}

#[derive(Debug, Clone)]
pub struct Customer {
    pub id:           CustomerId,
    pub pickup:       StopId,
    pub delivery:     StopId,
    pub window:       TimeWindow,
    pub request_time: SimTime,
    pub prebooked:    bool,
    /// Vehicle whose plan currently includes this customer.
    pub planned_vehicle: Option<VehicleId>,
    state:            CustomerState,
}

impl Customer {
    pub fn new(id: CustomerId, spec: CustomerSpec) -> Self {
        Self {
            id,
            pickup:          spec.pickup,
            delivery:        spec.delivery,
            window:          spec.window,
            request_time:    spec.request_time,
            prebooked:       spec.prebooked,
            planned_vehicle: None,
            state:           CustomerState::Requested,
        }
    }

    #[inline]
    pub fn state(&self) -> CustomerState {
        self.state
    }

    #[inline]
    pub fn is_requested(&self) -> bool {
        matches!(self.state, CustomerState::Requested)
    }

    #[inline]
    pub fn is_served(&self) -> bool {
        matches!(self.state, CustomerState::Alighted { .. })
    }

    /// Vehicle the customer is riding or rode in.
    pub fn vehicle(&self) -> Option<VehicleId> {
        match self.state {
            CustomerState::Boarded { vehicle, .. } | CustomerState::Alighted { vehicle, .. } => {
                Some(vehicle)
            }
            _ => None,
        }
    }

    pub fn boarded_at(&self) -> Option<SimTime> {
        match self.state {
            CustomerState::Boarded { at, .. } => Some(at),
            CustomerState::Alighted { boarded, .. } => Some(boarded),
            _ => None,
        }
    }

    pub fn alighted_at(&self) -> Option<SimTime> {
        match self.state {
            CustomerState::Alighted { alighted, .. } => Some(alighted),
            _ => None,
        }
    }

    // ── Metrics ───────────────────────────────────────────────────────────

    /// alight − board.
    pub fn ride_secs(&self) -> Option<u64> {
        match self.state {
            CustomerState::Alighted { boarded, alighted, .. } => Some(alighted.since(boarded)),
            _ => None,
        }
    }

    /// board − desired earliest.
    pub fn wait_secs(&self) -> Option<i64> {
        self.boarded_at().map(|b| b.signed_since(self.window.earliest))
    }

    /// alight − desired latest; negative means early.
    pub fn delay_secs(&self) -> Option<i64> {
        self.alighted_at().map(|a| a.signed_since(self.window.latest))
    }

    // ── Transitions ───────────────────────────────────────────────────────

    pub(crate) fn set_boarded(&mut self, vehicle: VehicleId, at: SimTime) {
        self.state = CustomerState::Boarded { vehicle, at };
    }

    pub(crate) fn set_alighted(&mut self, vehicle: VehicleId, boarded: SimTime, alighted: SimTime) {
        self.state = CustomerState::Alighted { vehicle, boarded, alighted };
    }

    /// Close out a request that was never served.  Returns `false` and does
    /// nothing unless the customer is still `Requested`.
    pub fn reject(&mut self) -> bool {
        if self.is_requested() {
            self.state = CustomerState::Rejected;
            self.planned_vehicle = None;
            true
        } else {
            false
        }
    }
}
