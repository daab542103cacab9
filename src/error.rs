//! Error types for fastcall.

use std::io;

/// Setup and lifecycle errors.
///
/// These are all detected at configuration time, never on the call hot path.
/// Handler-level failures are not represented here: a handler reports its
/// outcome inside the response payload itself, and the protocol forwards that
/// payload verbatim in both the accelerated and the direct path.
#[derive(Debug)]
pub enum Error {
    /// Requested slot table capacity is zero.
    InvalidCapacity(usize),
    /// Token index is not below the table capacity.
    InvalidToken {
        /// The offending token index.
        token: usize,
        /// The capacity of the table it was checked against.
        capacity: usize,
    },
    /// `stop()` was called more times than `start()`.
    NotStarted,
    /// Worker thread could not be spawned.
    Io(io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidCapacity(cap) => write!(f, "invalid slot table capacity {}", cap),
            Error::InvalidToken { token, capacity } => {
                write!(f, "token {} out of range for capacity {}", token, capacity)
            }
            Error::NotStarted => write!(f, "dispatcher stopped without being started"),
            Error::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

/// Result type for fastcall setup operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error returned when a call observes the channel shutting down.
///
/// The request payload is handed back so the caller can retry on the direct
/// synchronous path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownError<Q>(pub Q);

impl<Q> ShutdownError<Q> {
    /// Recovers the request payload for the fallback path.
    pub fn into_inner(self) -> Q {
        self.0
    }
}

impl<Q> std::fmt::Display for ShutdownError<Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "channel is shutting down")
    }
}

impl<Q: std::fmt::Debug> std::error::Error for ShutdownError<Q> {}
