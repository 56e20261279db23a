//! Framework error type.
//!
//! Sub-crates define their own error enums and wrap `DrtError` as one variant
//! via `#[from]` where they need to surface configuration or lookup failures.

use thiserror::Error;

use crate::{CustomerId, StopId, VehicleId};

/// The top-level error type for `drt-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum DrtError {
    #[error("stop {0} not found")]
    StopNotFound(StopId),

    #[error("vehicle {0} not found")]
    VehicleNotFound(VehicleId),

    #[error("customer {0} not found")]
    CustomerNotFound(CustomerId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `drt-*` crates.
pub type DrtResult<T> = Result<T, DrtError>;
