//! Single request, single reply.

use std::sync::Arc;

use tracing::Instrument;

use function_grpc_core::{Message, decode, encode_message};

use super::with_deadline;
use crate::config::BridgeConfig;
use crate::connection::Connection;
use crate::error::BridgeError;

/// Sends one message and waits for one reply.
///
/// Exactly one attempt is made per call; the connection is closed on every
/// exit path, including when the returned future is dropped.
#[derive(Clone, Debug)]
pub struct UnaryBridge {
    config: Arc<BridgeConfig>,
}

impl UnaryBridge {
    pub fn new(config: Arc<BridgeConfig>) -> Self {
        Self { config }
    }

    /// Call the peer's `requestReply` with `request` and return its reply.
    pub async fn call(&self, request: Message) -> Result<Message, BridgeError> {
        let span = tracing::info_span!("rpc.call", rpc.type = "unary", otel.kind = "client");

        async {
            // 1. Open a connection owned by this call
            let mut connection = Connection::open(&self.config).await?;

            // 2. Encode and issue the call, bounded by the optional deadline
            let wire = encode_message(&request);
            let reply = with_deadline(self.config.timeout, async {
                connection
                    .client()
                    .request_reply(wire)
                    .await
                    .map_err(BridgeError::from_status)
            })
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "unary call failed"))?;

            // 3. Decode; the connection drops when this scope ends
            Ok(decode(reply.into_inner()))
        }
        .instrument(span)
        .await
    }
}
