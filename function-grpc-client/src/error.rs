//! Client-side bridge error types.
//!
//! This module provides [`BridgeError`], the error type for every bridge call.

use std::time::Duration;

use tonic::{Code, Status};

/// Errors surfaced by a bridge call.
///
/// Every variant is terminal for the call it came from: the underlying
/// connection has already been released by the time the error is observed.
/// Nothing in this crate retries.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The connection could not be established or was lost mid-call.
    #[error("connection error: {0}")]
    Connection(String),

    /// The peer failed the call (e.g. the invoked function raised an error).
    ///
    /// The original status, including its message and metadata, is kept.
    #[error("protocol error: {}", .0.message())]
    Protocol(Status),

    /// The call was canceled before it completed.
    #[error("call canceled")]
    Canceled,

    /// A caller-imposed deadline elapsed.
    #[error("deadline exceeded after {0:?}")]
    Timeout(Duration),

    /// The configured host/port do not form a valid endpoint URI.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

impl BridgeError {
    /// Classify a status reported by the transport.
    ///
    /// - `Unavailable` becomes [`Connection`](BridgeError::Connection)
    /// - `Cancelled` becomes [`Canceled`](BridgeError::Canceled)
    /// - `DeadlineExceeded` becomes [`Timeout`](BridgeError::Timeout) with a
    ///   zero duration, since the deadline was not ours
    /// - anything else becomes [`Protocol`](BridgeError::Protocol)
    pub fn from_status(status: Status) -> Self {
        match status.code() {
            Code::Unavailable => BridgeError::Connection(status.message().to_string()),
            Code::Cancelled => BridgeError::Canceled,
            Code::DeadlineExceeded => BridgeError::Timeout(Duration::ZERO),
            _ => BridgeError::Protocol(status),
        }
    }

    /// The gRPC code that best describes this error.
    pub fn code(&self) -> Code {
        match self {
            BridgeError::Connection(_) => Code::Unavailable,
            BridgeError::Protocol(status) => status.code(),
            BridgeError::Canceled => Code::Cancelled,
            BridgeError::Timeout(_) => Code::DeadlineExceeded,
            BridgeError::InvalidAddress(_) => Code::InvalidArgument,
        }
    }

    /// The peer status, if this is a protocol error.
    pub fn status(&self) -> Option<&Status> {
        match self {
            BridgeError::Protocol(status) => Some(status),
            _ => None,
        }
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, BridgeError::Canceled)
    }
}

impl From<Status> for BridgeError {
    fn from(status: Status) -> Self {
        BridgeError::from_status(status)
    }
}

impl From<tonic::transport::Error> for BridgeError {
    fn from(err: tonic::transport::Error) -> Self {
        BridgeError::Connection(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            BridgeError::from_status(Status::unavailable("refused")),
            BridgeError::Connection(msg) if msg == "refused"
        ));
        assert!(BridgeError::from_status(Status::cancelled("gone")).is_canceled());
        assert!(matches!(
            BridgeError::from_status(Status::deadline_exceeded("slow")),
            BridgeError::Timeout(_)
        ));

        let err = BridgeError::from_status(Status::failed_precondition("wrong shape"));
        assert_eq!(err.code(), Code::FailedPrecondition);
        assert_eq!(err.status().map(Status::message), Some("wrong shape"));
    }

    #[test]
    fn test_display() {
        let err = BridgeError::from_status(Status::internal("boom"));
        assert_eq!(err.to_string(), "protocol error: boom");
        assert_eq!(
            BridgeError::Timeout(Duration::from_millis(250)).to_string(),
            "deadline exceeded after 250ms"
        );
    }

    #[test]
    fn test_codes_for_local_variants() {
        assert_eq!(BridgeError::Connection("x".into()).code(), Code::Unavailable);
        assert_eq!(BridgeError::Canceled.code(), Code::Cancelled);
        assert_eq!(
            BridgeError::InvalidAddress("x".into()).code(),
            Code::InvalidArgument
        );
    }
}
