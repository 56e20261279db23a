//! `drt-fleet` — vehicles, trips, customers and their state machines.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                    |
//! |--------------|-------------------------------------------------------------|
//! | [`cursor`]   | `StopCursor` — owned monotonic position in a stop list      |
//! | [`trip`]     | `Trip`, `PlannedStop`, `TripPhase`                          |
//! | [`vehicle`]  | `Vehicle`, `VehicleSpec`, `VehicleStats`                    |
//! | [`customer`] | `Customer`, `CustomerSpec`, `CustomerState`                 |
//! | [`fleet`]    | `Fleet` arenas, `board` / `alight`                          |
//! | [`loader`]   | CSV loaders for vehicles, requests and fixed trips          |
//! | [`error`]    | `LifecycleError`, `FleetError`, `FleetResult<T>`            |
//!
//! # Invariants
//!
//! - `vehicle.load() <= vehicle.capacity` at all times; `board` refuses with
//!   `Full` instead of overfilling.
//! - A customer is aboard at most one vehicle.
//! - A trip's cursor never moves backwards and `done` is terminal.
//! - A trip only finishes when its cursor is done and its vehicle is empty.

pub mod cursor;
pub mod customer;
pub mod error;
pub mod fleet;
pub mod loader;
pub mod trip;
pub mod vehicle;

#[cfg(test)]
mod tests;

pub use cursor::StopCursor;
pub use customer::{Customer, CustomerSpec, CustomerState};
pub use error::{FleetError, FleetResult, LifecycleError};
pub use fleet::{AlightOutcome, Fleet};
pub use loader::{load_requests_reader, load_trips_reader, load_vehicles_reader};
pub use trip::{PlannedStop, Trip, TripPhase};
pub use vehicle::{Vehicle, VehicleSpec, VehicleStats};
