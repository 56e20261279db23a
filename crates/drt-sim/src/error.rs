use drt_core::{DrtError, TripId, VehicleId};
use drt_events::{EventKind, QueueError};
use drt_fleet::LifecycleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] DrtError),

    /// The Append step produced an event in the past.  Always fatal.
    #[error("event queue: {0}")]
    Queue(#[from] QueueError),

    #[error("lifecycle contract violated: {0}")]
    Lifecycle(#[from] LifecycleError),

    /// A vehicle event names a trip or stop the vehicle is not on.
    #[error("{kind} event for {vehicle} on {trip} does not match its active trip {active:?}")]
    EventMismatch {
        kind:    EventKind,
        vehicle: VehicleId,
        trip:    TripId,
        active:  Option<TripId>,
    },

    #[error("no solvable request set after {attempts} attempts")]
    GeneratorExhausted { attempts: u32 },
}

impl SimError {
    /// `true` for errors that abort only the current event: a causal-ordering
    /// bug in event generation rather than a broken run.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, SimError::Lifecycle(_) | SimError::EventMismatch { .. })
    }
}

pub type SimResult<T> = Result<T, SimError>;
