//! Request and transport error types.

use thiserror::Error;

/// Failures raised by the messaging transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Publish failed
    #[error("Publish failed: {0}")]
    PublishFailed(String),

    /// Subscribe failed
    #[error("Subscribe failed: {0}")]
    SubscribeFailed(String),
}

/// Errors returned by a fan-in request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// Rejected before any I/O took place
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No replies, or fewer than expected under the strict policy
    #[error("Request timed out")]
    Timeout,

    /// Transport failure, propagated as-is
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl RequestError {
    /// Whether this is the timeout outcome.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Whether this came from the transport.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
