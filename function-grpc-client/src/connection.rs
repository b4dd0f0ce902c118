//! Per-call transport connection.
//!
//! Every bridge call opens its own [`Connection`] and owns it exclusively.
//! Dropping the connection closes the underlying HTTP/2 channel, so release
//! happens exactly once on every exit path: success, error, or the owning
//! task being aborted.

use std::time::Instant;

use tonic::transport::{Channel, Endpoint};

use function_grpc_core::pb::MessagingServiceClient;

use crate::config::BridgeConfig;
use crate::error::BridgeError;

/// An open plaintext connection to one peer.
pub(crate) struct Connection {
    client: MessagingServiceClient<Channel>,
    uri: String,
    opened_at: Instant,
}

impl Connection {
    /// Connect eagerly, so an unreachable peer fails the call up front.
    pub(crate) async fn open(config: &BridgeConfig) -> Result<Self, BridgeError> {
        let uri = config.uri();
        let mut endpoint = Endpoint::from_shared(uri.clone())
            .map_err(|e| BridgeError::InvalidAddress(format!("{uri}: {e}")))?;
        if let Some(timeout) = config.connect_timeout {
            endpoint = endpoint.connect_timeout(timeout);
        }

        let channel = endpoint.connect().await.map_err(|e| {
            tracing::warn!(%uri, error = %e, "failed to open connection");
            BridgeError::Connection(format!("{uri}: {e}"))
        })?;

        tracing::debug!(%uri, "connection opened");
        Ok(Self {
            client: MessagingServiceClient::new(channel),
            uri,
            opened_at: Instant::now(),
        })
    }

    /// The stub for issuing calls over this connection.
    pub(crate) fn client(&mut self) -> &mut MessagingServiceClient<Channel> {
        &mut self.client
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        tracing::debug!(
            uri = %self.uri,
            elapsed_ms = self.opened_at.elapsed().as_millis() as u64,
            "connection closed"
        );
    }
}
