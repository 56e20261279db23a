use thiserror::Error;

use drt_core::SimTime;

use crate::EventKind;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    /// The Append step computed a timestamp earlier than an event that has
    /// already been handled.
    #[error("{kind:?} event at {time} precedes last handled time {last_handled}")]
    PastEvent {
        kind:         EventKind,
        time:         SimTime,
        last_handled: SimTime,
    },
}

pub type QueueResult<T> = Result<T, QueueError>;
