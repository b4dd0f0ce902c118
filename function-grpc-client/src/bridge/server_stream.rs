//! One request, many replies.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use tonic::Status;
use tracing::Instrument;

use function_grpc_core::{Message, WireMessage, decode, encode_message};

use super::terminal_error;
use crate::config::BridgeConfig;
use crate::connection::Connection;
use crate::error::BridgeError;
use crate::flow::{CreditSender, credit_channel};
use crate::streaming::MessageStream;

/// Sends one request and exposes the peer's replies as a [`MessageStream`].
///
/// A dedicated worker task pulls replies from the transport and hands them to
/// the returned stream through a credit-governed queue, so the worker only
/// pulls the next reply once the caller has taken enough of the previous
/// ones. The worker owns the connection; both are released together when the
/// replies end or when the returned stream is dropped.
#[derive(Clone, Debug)]
pub struct ServerStreamBridge {
    config: Arc<BridgeConfig>,
}

impl ServerStreamBridge {
    pub fn new(config: Arc<BridgeConfig>) -> Self {
        Self { config }
    }

    /// Call the peer's `serverStream` with `request`.
    ///
    /// Returns once the peer has accepted the call; replies are delivered
    /// lazily afterwards.
    pub async fn call(&self, request: Message) -> Result<MessageStream, BridgeError> {
        let span = tracing::info_span!(
            "rpc.call",
            rpc.type = "server_stream",
            otel.kind = "client"
        );

        let mut connection = Connection::open(&self.config)
            .instrument(span.clone())
            .await?;

        let replies = connection
            .client()
            .server_stream(encode_message(&request))
            .instrument(span.clone())
            .await
            .map_err(|status| {
                let _enter = span.enter();
                tracing::warn!(error = %status, "server stream call rejected");
                BridgeError::from_status(status)
            })?
            .into_inner();

        let (tx, rx) = credit_channel(self.config.receive_credit());
        let worker = tokio::spawn(pull_replies(connection, replies, tx).instrument(span));

        Ok(MessageStream::new(rx, vec![worker.abort_handle()]))
    }
}

/// Pull replies until the transport completes, fails, or the caller leaves.
///
/// `connection` is held only so it is released together with `replies`.
async fn pull_replies<C, S>(
    connection: C,
    mut replies: S,
    tx: CreditSender<Result<Message, BridgeError>>,
) where
    S: Stream<Item = Result<WireMessage, Status>> + Unpin,
{
    let mut delivered = 0usize;
    let mut failure = None;

    loop {
        // Only pull once there is credit for what we pull.
        if tx.acquire().await.is_err() {
            tracing::debug!(delivered, "reply stream abandoned; stopping");
            break;
        }

        match replies.next().await {
            Some(Ok(wire)) => {
                if tx.push(Ok(decode(wire))).is_err() {
                    tracing::debug!(delivered, "reply stream abandoned; stopping");
                    break;
                }
                delivered += 1;
            }
            None => {
                tracing::debug!(delivered, "server stream completed");
                break;
            }
            Some(Err(status)) => {
                failure = Some(terminal_error(status, delivered));
                break;
            }
        }
    }

    // The connection is closed before the caller can observe the failure.
    drop(replies);
    drop(connection);
    if let Some(err) = failure {
        let _ = tx.push(Err(err));
    }
}
