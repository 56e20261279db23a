//! Routing error type.

use thiserror::Error;

use drt_core::{CustomerId, StopId, TimeWindow, VehicleId};
use drt_fleet::LifecycleError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoutingError {
    /// Aggregating the windows of customers that share a slot left it empty.
    #[error("slot {slot} at {stop} has an empty time window {window}")]
    TimeWindowConflict { slot: usize, stop: StopId, window: TimeWindow },

    #[error("customer {customer} has the same pickup and delivery stop {stop}")]
    SamePickupDelivery { customer: CustomerId, stop: StopId },

    #[error("customer {0} is not waiting for a ride")]
    CustomerNotRequested(CustomerId),

    #[error("unknown customer {0}")]
    UnknownCustomer(CustomerId),

    #[error("unknown vehicle {0}")]
    UnknownVehicle(VehicleId),

    /// The snapshot violates one of its own structural invariants.
    #[error("malformed snapshot: {0}")]
    Malformed(String),

    /// The oracle's answer does not fit the snapshot it was given.
    #[error("invalid oracle solution: {0}")]
    InvalidSolution(String),

    /// Live vehicle state moved on between snapshot and commit.
    #[error("vehicle {0} changed since the snapshot was taken")]
    StaleVehicle(VehicleId),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

pub type RoutingResult<T> = Result<T, RoutingError>;
