//! Network-subsystem error type.

use thiserror::Error;

/// Errors produced while building or loading a `StopNetwork`.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("unknown stop code {0:?}")]
    UnknownStop(String),

    #[error("duplicate stop code {0:?}")]
    DuplicateStop(String),

    #[error("route {0:?} has no stops")]
    EmptyRoute(String),

    #[error("network parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type NetworkResult<T> = Result<T, NetworkError>;
