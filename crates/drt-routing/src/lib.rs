//! `drt-routing` — routing snapshots and the commit-or-reject protocol.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                      |
//! |---------------|---------------------------------------------------------------|
//! | [`snapshot`]  | `RoutingSnapshot`, `Slot`, `PdPair`, `SnapshotVehicle`, `Anchor` |
//! | [`builder`]   | `SnapshotBuilder`, `SnapshotConfig`, `SnapshotRequest`        |
//! | [`oracle`]    | `Oracle` trait, `OracleOutcome`, `VehicleRoute`, `RejectAll`  |
//! | [`schedule`]  | route timing and feasibility (`RouteSchedule`)                |
//! | [`insertion`] | `InsertionOracle` — cheapest feasible insertion               |
//! | [`commit`]    | `RoutePlan` validate/apply, `CommitEffect`                    |
//! | [`protocol`]  | `reoptimize`, `ReoptOutcome`, `RejectReason`                  |
//! | [`error`]     | `RoutingError`, `RoutingResult<T>`                            |
//!
//! # Feature flags
//!
//! | Flag       | Effect                                              |
//! |------------|-----------------------------------------------------|
//! | `parallel` | Build travel-time matrix rows on the Rayon pool.    |
//! | `fx-hash`  | FxHash maps for slot aliasing.                      |

pub mod builder;
pub mod commit;
pub mod error;
pub mod insertion;
pub mod oracle;
pub mod protocol;
pub mod schedule;
pub mod snapshot;


pub use builder::{SnapshotBuilder, SnapshotConfig, SnapshotRequest};
pub use commit::{CommitEffect, RoutePlan};
pub use error::{RoutingError, RoutingResult};
pub use insertion::InsertionOracle;
pub use oracle::{Oracle, OracleOutcome, OracleSolution, RejectAll, VehicleRoute};
pub use protocol::{reoptimize, RejectReason, ReoptOutcome};
pub use schedule::RouteSchedule;
pub use snapshot::{
    Anchor, BoardedRide, PdPair, RoutingSnapshot, Slot, SlotKind, SnapshotVehicle, SolveLimits,
};
