//! AWS service integrations.
//!
//! Each service exposes a client trait (the remote API the waiters poll),
//! status refresh adapters built on it, and the waiters and resource
//! handlers that use them. Transport is the client's business: the `aws`
//! cargo feature provides SDK-backed clients, tests use in-memory fakes.
//!
//! ## Available Services
//!
//! - [`lexmodels`]: Lex Model Building bots, aliases, intents and slot types
//! - [`sesv2`]: SESv2 dedicated IP pool assignments

pub mod lexmodels;
pub mod sesv2;

use thiserror::Error;

use crate::waiter::{is_transient_error_message, PollResult, RefreshError, RefreshResult};

/// Error returned by service client traits.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The requested object does not exist.
    #[error("NotFoundException: {0}")]
    NotFound(String),

    /// Request rate exceeded.
    #[error("{code}: {message}")]
    Throttling {
        /// Service error code
        code: String,
        /// Service message
        message: String,
    },

    /// The request never got a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// Any other service error.
    #[error("{code}: {message}")]
    Service {
        /// Service error code
        code: String,
        /// Service message
        message: String,
    },
}

impl ApiError {
    /// Returns true for [`ApiError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Throttling and transport errors are worth another poll, as is a service
    /// error whose message reads like one.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Throttling { .. } | Self::Transport(_) => true,
            Self::Service { message, .. } => is_transient_error_message(message),
            Self::NotFound(_) => false,
        }
    }

    /// Classify for the waiter.
    pub fn into_refresh_error(self) -> RefreshError {
        if self.is_transient() {
            RefreshError::transient(self)
        } else {
            RefreshError::fatal(self)
        }
    }

    /// Build from a service error code, recognising not-found and throttling codes.
    pub fn from_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        let code = code.into();
        let message = message.into();

        match code.as_str() {
            "NotFoundException" | "ResourceNotFoundException" => Self::NotFound(message),
            "ThrottlingException"
            | "Throttling"
            | "TooManyRequestsException"
            | "LimitExceededException"
            | "RequestLimitExceeded" => Self::Throttling { code, message },
            _ => Self::Service { code, message },
        }
    }
}

/// Turn one remote read into a poll result.
///
/// Not found becomes absence; other errors are classified with
/// [`ApiError::into_refresh_error`]; a found object is labelled by `state`.
pub(crate) fn poll_from<T, F>(result: Result<T, ApiError>, state: F) -> RefreshResult<T>
where
    F: FnOnce(&T) -> String,
{
    match result {
        Ok(output) => Ok(PollResult::new(state(&output), output)),
        Err(err) if err.is_not_found() => Ok(PollResult::absent()),
        Err(err) => Err(err.into_refresh_error()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code() {
        assert!(ApiError::from_code("NotFoundException", "no bot").is_not_found());
        assert!(ApiError::from_code("LimitExceededException", "slow down").is_transient());
        assert!(ApiError::from_code("TooManyRequestsException", "slow down").is_transient());
        assert!(!ApiError::from_code("BadRequestException", "bad name").is_transient());
        assert!(ApiError::from_code("InternalFailure", "Service Unavailable").is_transient());
    }

    #[test]
    fn test_poll_from() {
        let poll = poll_from(Ok(5u8), |_| "CREATED".to_string()).unwrap();
        assert_eq!(poll.state, "CREATED");
        assert_eq!(poll.payload, Some(5));

        let poll = poll_from::<u8, _>(Err(ApiError::NotFound("gone".into())), |_| unreachable!())
            .unwrap();
        assert!(poll.is_absent());

        let err = poll_from::<u8, _>(Err(ApiError::Transport("reset".into())), |_| unreachable!())
            .unwrap_err();
        assert!(err.is_transient());

        let err = poll_from::<u8, _>(
            Err(ApiError::from_code("AccessDeniedException", "nope")),
            |_| unreachable!(),
        )
        .unwrap_err();
        assert!(!err.is_transient());
    }
}
