//! The four bridges, one per interaction shape.
//!
//! | Bridge                 | Inbound          | Outbound         |
//! |------------------------|------------------|------------------|
//! | [`UnaryBridge`]        | one message      | one message      |
//! | [`ClientStreamBridge`] | lazy stream      | one message      |
//! | [`ServerStreamBridge`] | one message      | [`MessageStream`]|
//! | [`BiStreamBridge`]     | lazy stream      | [`MessageStream`]|
//!
//! Every call opens its own [`Connection`](crate::connection::Connection)
//! and releases it when the call reaches a terminal state.
//!
//! [`MessageStream`]: crate::MessageStream

mod bidi;
mod client_stream;
mod server_stream;
mod unary;

pub use bidi::BiStreamBridge;
pub use client_stream::ClientStreamBridge;
pub use server_stream::ServerStreamBridge;
pub use unary::UnaryBridge;

use std::future::Future;
use std::time::Duration;

use tonic::{Code, Status};

use crate::error::BridgeError;

/// Classify the status that ended a reply stream.
///
/// A peer cancellation is expected teardown and is not logged as a failure.
fn terminal_error(status: Status, delivered: usize) -> BridgeError {
    if status.code() == Code::Cancelled {
        tracing::debug!(delivered, "call canceled by peer");
    } else {
        tracing::error!(delivered, error = %status, "reply stream failed");
    }
    BridgeError::from_status(status)
}

/// Run `fut` under an optional caller-imposed deadline.
async fn with_deadline<F, T>(deadline: Option<Duration>, fut: F) -> Result<T, BridgeError>
where
    F: Future<Output = Result<T, BridgeError>>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| BridgeError::Timeout(limit))?,
        None => fut.await,
    }
}
