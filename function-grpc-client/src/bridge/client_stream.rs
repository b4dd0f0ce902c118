//! Many inbound messages, one reply.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use tracing::Instrument;

use function_grpc_core::{Message, decode, encode_message};

use super::with_deadline;
use crate::config::BridgeConfig;
use crate::connection::Connection;
use crate::error::BridgeError;

/// Drains an inbound stream to the peer and waits for its single reply.
///
/// The inbound stream is pulled as fast as the transport accepts data; the
/// bridge does not wait for a per-message acknowledgement. When inbound is
/// exhausted, end-of-stream is signaled to the peer.
///
/// If the transport fails while sending, it stops pulling and drops the
/// inbound stream, so a channel-backed producer sees its sender close. The
/// failure itself is returned from [`call`](Self::call).
///
/// Without a configured [`timeout`](crate::ClientBuilder::timeout) a peer
/// that never replies makes `call` wait forever.
#[derive(Clone, Debug)]
pub struct ClientStreamBridge {
    config: Arc<BridgeConfig>,
}

impl ClientStreamBridge {
    pub fn new(config: Arc<BridgeConfig>) -> Self {
        Self { config }
    }

    /// Call the peer's `clientStream` with every message of `inbound`.
    pub async fn call<S>(&self, inbound: S) -> Result<Message, BridgeError>
    where
        S: Stream<Item = Message> + Send + 'static,
    {
        let span = tracing::info_span!(
            "rpc.call",
            rpc.type = "client_stream",
            otel.kind = "client"
        );

        async {
            let mut connection = Connection::open(&self.config).await?;

            let requests = inbound.map(|message| {
                tracing::trace!(bytes = message.payload().len(), "sending message");
                encode_message(&message)
            });

            let reply = with_deadline(self.config.timeout, async {
                connection
                    .client()
                    .client_stream(requests)
                    .await
                    .map_err(BridgeError::from_status)
            })
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "client stream call failed"))?;

            tracing::debug!("client stream completed");
            Ok(decode(reply.into_inner()))
        }
        .instrument(span)
        .await
    }
}
