//! Error Types
//!
//! The core data structures are total: popping an empty stack or resolving
//! an id that is not pending is answered with `None` or an empty `Vec`, never
//! an error. Only the checked constructors and the async driver can fail.

use thiserror::Error;

/// Errors raised when seeding an [`InvertibleMap`](crate::map::InvertibleMap)
/// from both of its sides at once.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    /// A forward association has no matching reverse association.
    #[error("forward entry {key} -> {value} is missing from the reverse map")]
    MissingReverse { key: String, value: String },

    /// A reverse association has no matching forward association.
    #[error("reverse entry {value} -> {key} is missing from the forward map")]
    MissingForward { key: String, value: String },
}

/// Errors raised by [`drive`](crate::driver::drive).
#[derive(Debug, Error)]
pub enum DriverError {
    /// A unit of work panicked or its task was torn down by the runtime.
    #[error("node work failed to join: {0}")]
    Join(#[from] tokio::task::JoinError),
}
