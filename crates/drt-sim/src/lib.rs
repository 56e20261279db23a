//! `drt-sim` — discrete-event loop for the rust_drt dial-a-ride simulator.
//!
//! # Event loop
//!
//! ```text
//! prime:  cold-start solve of pre-booked customers
//!         send off vehicles with queued trips
//!         CustomerRequest per remaining customer, first DynamicCheck
//!
//! while let Some(event) = queue.pop_earliest():        // (time, kind, seq)
//!   Arrive(v, trip, stop)   → start trip, record location
//!                             ⤷ CustomerAlight at service start
//!                             ⤷ CustomerBoard  at service start + alighting_secs
//!                             ⤷ Depart after the dwell (or finish at the last stop)
//!   Depart(v, trip)         → advance cursor ⤷ Arrive at next stop
//!   CustomerBoard/Alight    → lifecycle transition (Full is counted, not fatal);
//!                             the last alight at the last stop closes the trip
//!                             ⤷ Arrive at the first stop of the next trip
//!   CustomerRequest(c)      → snapshot → oracle → commit or reject
//!                             (or wait for the next DynamicCheck when batching)
//!   DynamicCheck            → re-optimise batched requests FIFO
//!
//! close out every customer still Requested as Rejected; build SimReport
//! ```
//!
//! # Crate layout
//!
//! | Module        | Contents                                                  |
//! |---------------|-----------------------------------------------------------|
//! | [`sim`]       | `Sim` — state and the pop → handle → append loop          |
//! | [`builder`]   | `SimBuilder`                                              |
//! | [`observer`]  | `SimObserver` trait, `NoopObserver`                       |
//! | [`record`]    | `TraceRecord`, `ValidationRecord`, `ReoptRecord`          |
//! | [`stats`]     | `SimStats`, `SimReport`                                   |
//! | [`generator`] | `RequestGenerator` with bounded-retry `generate_solvable` |
//! | [`error`]     | `SimError`, `SimResult<T>`                                |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                  |
//! |------------|---------------------------------------------------------|
//! | `parallel` | Builds snapshot travel-time matrices on Rayon's pool.   |
//! | `fx-hash`  | FxHash maps for snapshot slot aliasing.                 |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use drt_network::Haversine;
//! use drt_routing::InsertionOracle;
//! use drt_sim::{NoopObserver, SimBuilder};
//!
//! let mut sim = SimBuilder::new(config, network, InsertionOracle::new(), Haversine::default())
//!     .fleet(fleet)
//!     .build()?;
//! let report = sim.run(&mut NoopObserver)?;
//! println!("{report}");
//! ```

pub mod builder;
pub mod error;
pub mod generator;
pub mod observer;
pub mod record;
pub mod sim;
pub mod stats;


pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use generator::{GeneratorConfig, RequestGenerator};
pub use observer::{NoopObserver, SimObserver};
pub use record::{Interaction, ReoptRecord, ReoptTrigger, TraceRecord, ValidationRecord};
pub use sim::Sim;
pub use stats::{SimReport, SimStats};
