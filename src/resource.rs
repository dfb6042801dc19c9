//! Shared plumbing for resource CRUD handlers.
//!
//! Handlers call the remote API, block on a waiter, and report failures as
//! [`ProviderError`], which names the action, service, resource and ID:
//!
//! ```text
//! creating SESv2 Dedicated IP Assignment (192.0.2.10,pool-a): unexpected state 'FAILED', ...
//! ```

use std::fmt;
use thiserror::Error;

use crate::services::ApiError;
use crate::waiter::BoxError;

/// What a handler was doing when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceAction {
    Creating,
    Reading,
    Deleting,
    WaitingForCreation,
    WaitingForDeletion,
}

impl fmt::Display for ResourceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self {
            Self::Creating => "creating",
            Self::Reading => "reading",
            Self::Deleting => "deleting",
            Self::WaitingForCreation => "waiting for creation of",
            Self::WaitingForDeletion => "waiting for deletion of",
        };
        f.write_str(action)
    }
}

/// Error returned by resource handlers and finders.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The remote object does not exist (or not in the expected shape).
    #[error("couldn't find resource{}", source_suffix(.last_error))]
    NotFound {
        /// Why the lookup came up empty
        #[source]
        last_error: Option<BoxError>,
    },

    /// A remote call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Bad handler input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A handler step failed.
    #[error("{action} {service} {resource} ({id}): {source}")]
    Action {
        /// Step that failed
        action: ResourceAction,
        /// Service display name, e.g. "SESv2"
        service: &'static str,
        /// Resource display name
        resource: &'static str,
        /// Resource identifier
        id: String,
        /// Underlying failure
        #[source]
        source: BoxError,
    },
}

fn source_suffix(last_error: &Option<BoxError>) -> String {
    last_error
        .as_ref()
        .map(|e| format!(": {}", e))
        .unwrap_or_default()
}

impl ProviderError {
    /// Not found, with the error that revealed it.
    pub fn not_found(last_error: impl Into<BoxError>) -> Self {
        Self::NotFound {
            last_error: Some(last_error.into()),
        }
    }

    /// The API answered without the object it was asked for.
    pub fn empty_result() -> Self {
        Self::not_found("empty result")
    }

    /// Wrap a failure with handler context.
    pub fn action(
        action: ResourceAction,
        service: &'static str,
        resource: &'static str,
        id: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Action {
            action,
            service,
            resource,
            id: id.into(),
            source: source.into(),
        }
    }

    /// Returns true for [`ProviderError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
