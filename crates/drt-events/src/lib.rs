//! `drt-events` — the simulation clock's pending-event log.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                  |
//! |-------------|-----------------------------------------------------------|
//! | [`event`]   | `EventKind`, `EventPayload`, `Event`                      |
//! | [`queue`]   | `EventQueue` (`BTreeMap<(SimTime, EventKind), VecDeque<Event>>`) |
//! | [`error`]   | `QueueError`, `QueueResult<T>`                            |
//!
//! # Ordering (summary)
//!
//! Events pop in `(time, kind)` order.  `EventKind` discriminants encode the
//! causal precedence of same-second events:
//!
//! ```text
//! Arrive(0) < Depart(1) < CustomerBoard(2) < CustomerAlight(3)
//!           < CustomerRequest(4) < DynamicCheck(5)
//! ```
//!
//! Events with equal `(time, kind)` pop in insertion order.  The queue is a
//! forward-only log: an insert earlier than the last popped event is refused.

pub mod error;
pub mod event;
pub mod queue;

#[cfg(test)]
mod tests;

pub use error::{QueueError, QueueResult};
pub use event::{Event, EventKind, EventPayload};
pub use queue::EventQueue;
