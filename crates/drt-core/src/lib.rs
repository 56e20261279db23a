//! `drt-core` — foundational types for the `rust_drt` dial-a-ride simulator.
//!
//! This crate is a dependency of every other `drt-*` crate.  It has no
//! `drt-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                                 |
//! |-----------------|----------------------------------------------------------|
//! | [`ids`]         | `StopId`, `RouteId`, `VehicleId`, `CustomerId`, `TripId` |
//! | [`geo`]         | `GeoPoint`, haversine and planar distances               |
//! | [`time`]        | `SimTime`, `TimeWindow`, `SimClock`, `SimConfig`         |
//! | [`rng`]         | `SimRng` (seeded simulation-level RNG)                   |
//! | [`service`]     | `ServiceMode`, `SlotAliasing`                            |
//! | [`error`]       | `DrtError`, `DrtResult`                                  |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |
//!           | Required to load `SimConfig` from JSON.                    |

pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod service;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{DrtError, DrtResult};
pub use geo::GeoPoint;
pub use ids::{CustomerId, RouteId, StopId, TripId, VehicleId};
pub use rng::SimRng;
pub use service::{ServiceMode, SlotAliasing};
pub use time::{SimClock, SimConfig, SimTime, TimeWindow};
