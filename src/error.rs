//! Error types for Stateconf.
//!
//! Waiter and resource failures have their own types
//! ([`WaitError`](crate::waiter::WaitError),
//! [`ProviderError`](crate::resource::ProviderError)); this module covers the
//! crate plumbing around them.

use thiserror::Error;

use crate::waiter::{SpecError, WaitError};

/// Result type alias for Stateconf operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Stateconf.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid user-supplied argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Rejected wait configuration.
    #[error("Invalid wait configuration: {0}")]
    Spec(#[from] SpecError),

    /// A wait did not converge.
    #[error(transparent)]
    Wait(#[from] WaitError),

    /// Logging could not be initialized.
    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}
