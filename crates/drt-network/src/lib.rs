//! `drt-network` — the static reference universe the simulation runs on.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                      |
//! |-------------|---------------------------------------------------------------|
//! | [`network`] | `Stop`, `TransitRoute`, `StopNetwork` (arena + R-tree), builder |
//! | [`metric`]  | `DistanceModel` trait, `Haversine`, `Planar`, `travel_secs`   |
//! | [`demand`]  | `DemandTable` keyed by (stop, route, hour)                    |
//! | [`loader`]  | CSV loaders for stops, routes and demand                      |
//! | [`error`]   | `NetworkError`, `NetworkResult<T>`                            |
//!
//! Everything here is immutable once built.  The simulation core consumes it
//! as read-only reference data and never re-validates it.

pub mod demand;
pub mod error;
pub mod loader;
pub mod metric;
pub mod network;


pub use demand::DemandTable;
pub use error::{NetworkError, NetworkResult};
pub use loader::{load_demand_reader, load_network_csv, load_routes_into, load_stops_into};
pub use metric::{DistanceModel, Haversine, Planar, travel_secs};
pub use network::{Stop, StopNetwork, StopNetworkBuilder, TransitRoute};
