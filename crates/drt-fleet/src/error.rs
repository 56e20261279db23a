//! Fleet error types.
//!
//! [`LifecycleError`] is the typed failure of a single state-machine
//! operation (board, alight, start, advance, finish).  `Full` is an expected
//! outcome; every other variant means an event was generated in the wrong
//! causal order.

use thiserror::Error;

use drt_core::{CustomerId, TripId, VehicleId};
use drt_network::NetworkError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("vehicle {vehicle} is full ({capacity} seats)")]
    Full { vehicle: VehicleId, capacity: u32 },

    #[error("customer {0} is not waiting to board")]
    AlreadyBoarded(CustomerId),

    #[error("customer {customer} is not aboard vehicle {vehicle}")]
    NotBoarded { customer: CustomerId, vehicle: VehicleId },

    #[error("trip {0} already started")]
    AlreadyStarted(TripId),

    #[error("trip {0} has not started")]
    NotStarted(TripId),

    #[error("trip {0} has already reached its last stop")]
    AlreadyDone(TripId),

    #[error("trip {0} already finished")]
    AlreadyFinished(TripId),

    #[error("trip {trip} cannot finish: done={done}, {aboard} customer(s) aboard")]
    NotReady { trip: TripId, done: bool, aboard: usize },

    #[error("a trip needs at least one stop")]
    EmptyTrip,

    #[error("vehicle {0} has no active trip")]
    NoActiveTrip(VehicleId),
}

impl LifecycleError {
    /// `true` for the one variant that is a normal operating outcome rather
    /// than a causal-ordering bug.
    #[inline]
    pub fn is_capacity(&self) -> bool {
        matches!(self, LifecycleError::Full { .. })
    }
}

/// Errors from fleet construction and loading.
#[derive(Debug, Error)]
pub enum FleetError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("unknown vehicle {0}")]
    UnknownVehicle(String),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("fleet parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type FleetResult<T> = Result<T, FleetError>;
