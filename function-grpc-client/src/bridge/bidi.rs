//! Many inbound, many outbound, independently terminating.
//!
//! A bidirectional call is two small state machines sharing one connection:
//!
//! ```text
//! inbound drain:     NotStarted --ready--> Active --exhausted--> Completed
//! outbound delivery: Active --peer completes--> Completed
//! ```
//!
//! The drain task waits for the transport's first pull (the *ready* signal),
//! then forwards `inbound` through a credit channel the transport pulls from.
//! The delivery task pulls replies only while it holds receive credit and
//! hands them to the caller's [`MessageStream`], which grants one unit back
//! per reply taken.
//!
//! A transport error in either direction is terminal for both. Whether the
//! drain completing also ends the returned stream is set by
//! [`CompletionPolicy`]; under `InboundTerminates` the stream ends once the
//! completion grace period has passed, and replies that are ready always
//! take precedence over ending it.

use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tonic::Status;
use tracing::Instrument;

use function_grpc_core::{Message, WireMessage, decode, encode_message};

use super::terminal_error;
use crate::config::{BridgeConfig, CompletionPolicy};
use crate::connection::Connection;
use crate::error::BridgeError;
use crate::flow::{CreditSender, credit_channel};
use crate::streaming::MessageStream;

/// Multiplexes an inbound stream and the peer's reply stream over one
/// connection.
///
/// There is no ordering relationship between the two directions. Either may
/// finish first. Order within each direction is preserved.
#[derive(Clone, Debug)]
pub struct BiStreamBridge {
    config: Arc<BridgeConfig>,
}

/// Where the inbound drain ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DrainOutcome {
    /// `inbound` was exhausted and end-of-stream was signaled.
    Completed { sent: usize },
    /// The transport stopped accepting messages first.
    TransportClosed { sent: usize },
    /// The transport never became ready.
    NeverReady,
}

impl BiStreamBridge {
    pub fn new(config: Arc<BridgeConfig>) -> Self {
        Self { config }
    }

    /// Call the peer's `biStream`, sending every message of `inbound`.
    ///
    /// Returns once the peer has accepted the call. An empty `inbound`
    /// signals end-of-stream on the first ready signal, which makes the call
    /// behave like a server-streaming call.
    pub async fn call<S>(&self, inbound: S) -> Result<MessageStream, BridgeError>
    where
        S: Stream<Item = Message> + Send + 'static,
    {
        let span = tracing::info_span!("rpc.call", rpc.type = "bidi_stream", otel.kind = "client");

        let mut connection = Connection::open(&self.config)
            .instrument(span.clone())
            .await?;

        // Send direction: the transport is the receiver and pulls when it can
        // accept data. Its first pull is the ready signal.
        let (request_tx, mut request_rx) = credit_channel::<WireMessage>(self.config.send_credit());
        let ready = request_rx.ready_signal();
        let drain = tokio::spawn(drain_inbound(inbound, request_tx, ready).instrument(span.clone()));
        let drain_abort = drain.abort_handle();

        let replies = match connection
            .client()
            .bi_stream(request_rx)
            .instrument(span.clone())
            .await
        {
            Ok(response) => response.into_inner(),
            Err(status) => {
                drain.abort();
                let _enter = span.enter();
                tracing::error!(error = %status, "bidirectional call rejected");
                return Err(BridgeError::from_status(status));
            }
        };

        // Receive direction: we are the sender and the caller's stream grants
        // credit back as it consumes.
        let (reply_tx, reply_rx) = credit_channel(self.config.receive_credit());
        let deliver = tokio::spawn(
            deliver_replies(
                connection,
                replies,
                reply_tx,
                drain,
                Completion {
                    policy: self.config.completion_policy,
                    grace: self.config.completion_grace,
                },
            )
            .instrument(span),
        );

        Ok(MessageStream::new(
            reply_rx,
            vec![deliver.abort_handle(), drain_abort],
        ))
    }
}

/// Inbound drain: wait for ready, then forward every message under credit.
///
/// Dropping `tx` at the end is the end-of-stream signal to the transport.
async fn drain_inbound<S>(
    inbound: S,
    tx: CreditSender<WireMessage>,
    ready: oneshot::Receiver<()>,
) -> DrainOutcome
where
    S: Stream<Item = Message> + Send + 'static,
{
    if ready.await.is_err() {
        tracing::debug!("transport never became ready; inbound not consumed");
        return DrainOutcome::NeverReady;
    }

    let mut inbound = std::pin::pin!(inbound);
    let mut sent = 0usize;

    while let Some(message) = inbound.next().await {
        if tx.send(encode_message(&message)).await.is_err() {
            // Dropping `inbound` on return tells a channel-backed producer.
            tracing::warn!(sent, "transport stopped accepting inbound messages");
            return DrainOutcome::TransportClosed { sent };
        }
        sent += 1;
        tracing::trace!(sent, outstanding = tx.credit().outstanding(), "sent message");
    }

    tracing::debug!(sent, "inbound stream exhausted; half-closing");
    DrainOutcome::Completed { sent }
}

/// How the delivery task decides the call is over.
#[derive(Debug, Clone, Copy)]
struct Completion {
    policy: CompletionPolicy,
    grace: Duration,
}

/// Outbound delivery: pull one reply per unit of credit and hand it over.
///
/// `connection` is held only so it is released together with `replies`.
async fn deliver_replies<C, S>(
    connection: C,
    mut replies: S,
    tx: CreditSender<Result<Message, BridgeError>>,
    mut drain: JoinHandle<DrainOutcome>,
    completion: Completion,
) where
    S: Stream<Item = Result<WireMessage, Status>> + Unpin,
{
    let mut inbound_done = false;
    let mut credited = false;
    let mut delivered = 0usize;
    let mut deadline: Option<Instant> = None;
    let mut failure = None;

    loop {
        tokio::select! {
            biased;

            reply = replies.next(), if credited => {
                credited = false;
                match reply {
                    Some(Ok(wire)) => {
                        if tx.push(Ok(decode(wire))).is_err() {
                            tracing::debug!(delivered, "reply stream abandoned; canceling call");
                            break;
                        }
                        delivered += 1;
                    }
                    None => {
                        tracing::debug!(delivered, "peer completed its stream");
                        break;
                    }
                    Some(Err(status)) => {
                        failure = Some(terminal_error(status, delivered));
                        break;
                    }
                }
            }

            acquired = tx.acquire(), if !credited => {
                if acquired.is_err() {
                    tracing::debug!(delivered, "reply stream abandoned; canceling call");
                    break;
                }
                credited = true;
            }

            outcome = &mut drain, if !inbound_done => {
                inbound_done = true;
                match outcome {
                    Ok(DrainOutcome::Completed { sent }) => {
                        if completion.policy == CompletionPolicy::InboundTerminates {
                            tracing::debug!(
                                sent,
                                delivered,
                                grace_ms = completion.grace.as_millis() as u64,
                                "inbound completed; ending call after grace period"
                            );
                            deadline = Some(Instant::now() + completion.grace);
                        }
                    }
                    // The reply side will observe the transport's status.
                    Ok(DrainOutcome::TransportClosed { sent }) => {
                        tracing::debug!(sent, delivered, "inbound stopped early");
                    }
                    Ok(DrainOutcome::NeverReady) => {}
                    Err(e) if e.is_cancelled() => {}
                    Err(e) => {
                        tracing::error!(error = %e, "inbound drain panicked");
                        failure = Some(BridgeError::Connection(format!("inbound drain failed: {e}")));
                        break;
                    }
                }
            }

            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                tracing::debug!(delivered, "grace period elapsed; ending call");
                break;
            }
        }
    }

    // The call is terminal: stop sending and release the connection before
    // the caller can observe a failure.
    drain.abort();
    drop(replies);
    drop(connection);
    if let Some(err) = failure {
        let _ = tx.push(Err(err));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use tokio::sync::mpsc;
    use tokio_stream::wrappers::UnboundedReceiverStream;

    fn reply(payload: &'static str) -> Result<WireMessage, Status> {
        Ok(WireMessage {
            payload: payload.into(),
            headers: Default::default(),
        })
    }

    fn completed_drain(sent: usize) -> JoinHandle<DrainOutcome> {
        tokio::spawn(async move { DrainOutcome::Completed { sent } })
    }

    fn completion(policy: CompletionPolicy) -> Completion {
        Completion {
            policy,
            grace: Duration::from_millis(200),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_inbound_terminates_delivers_ready_replies_then_ends() {
        let (peer, replies) = mpsc::unbounded_channel();
        for payload in ["A", "B", "C"] {
            peer.send(reply(payload)).unwrap();
        }
        let (tx, mut rx) = credit_channel(1);
        let (connection, mut closed) = oneshot::channel::<()>();

        let deliver = tokio::spawn(deliver_replies(
            connection,
            UnboundedReceiverStream::new(replies),
            tx,
            completed_drain(3),
            completion(CompletionPolicy::InboundTerminates),
        ));

        let mut payloads = Vec::new();
        while let Some(item) = rx.next().await {
            payloads.push(item.unwrap().payload().clone());
        }
        assert_eq!(payloads, vec!["A", "B", "C"]);

        // The peer never completed; the grace period ended the call.
        deliver.await.unwrap();
        assert!(peer.is_closed());
        assert!(matches!(
            closed.try_recv(),
            Err(oneshot::error::TryRecvError::Closed)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_inbound_terminates_ignores_replies_after_grace() {
        let (peer, replies) = mpsc::unbounded_channel();
        peer.send(reply("A")).unwrap();
        let (tx, mut rx) = credit_channel(1);
        let (connection, _closed) = oneshot::channel::<()>();

        tokio::spawn(deliver_replies(
            connection,
            UnboundedReceiverStream::new(replies),
            tx,
            completed_drain(1),
            completion(CompletionPolicy::InboundTerminates),
        ));

        assert_eq!(rx.next().await.unwrap().unwrap().payload().as_ref(), b"A");
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(peer.send(reply("late")).is_err());
        assert!(rx.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_waits_for_peer_completion() {
        let (peer, replies) = mpsc::unbounded_channel();
        peer.send(reply("A")).unwrap();
        let (tx, mut rx) = credit_channel(1);
        let (connection, _closed) = oneshot::channel::<()>();

        tokio::spawn(deliver_replies(
            connection,
            UnboundedReceiverStream::new(replies),
            tx,
            completed_drain(1),
            completion(CompletionPolicy::Independent),
        ));

        assert_eq!(rx.next().await.unwrap().unwrap().payload().as_ref(), b"A");
        tokio::time::sleep(Duration::from_secs(1)).await;
        peer.send(reply("late")).unwrap();
        assert_eq!(rx.next().await.unwrap().unwrap().payload().as_ref(), b"late");

        drop(peer);
        assert!(rx.next().await.is_none());
    }

    #[tokio::test]
    async fn test_connection_released_before_failure_is_seen() {
        let replies = stream::iter(vec![reply("A"), Err(Status::internal("boom"))]);
        let (tx, mut rx) = credit_channel(1);
        let (connection, mut closed) = oneshot::channel::<()>();
        let drain = tokio::spawn(std::future::pending::<DrainOutcome>());

        tokio::spawn(deliver_replies(
            connection,
            replies,
            tx,
            drain,
            completion(CompletionPolicy::Independent),
        ));

        assert!(rx.next().await.unwrap().is_ok());
        let err = rx.next().await.unwrap().unwrap_err();
        assert_eq!(err.to_string(), "protocol error: boom");
        assert!(matches!(
            closed.try_recv(),
            Err(oneshot::error::TryRecvError::Closed)
        ));
        assert!(rx.next().await.is_none());
    }

    #[tokio::test]
    async fn test_drain_waits_for_ready() {
        let (tx, mut rx) = credit_channel::<WireMessage>(4);
        let ready = rx.ready_signal();
        let inbound = stream::iter(vec![Message::new("a"), Message::new("b")]);

        let drain = tokio::spawn(drain_inbound(inbound, tx, ready));
        tokio::task::yield_now().await;
        assert_eq!(rx.credit().available(), 4, "nothing sent before ready");

        let first = rx.next().await.unwrap();
        assert_eq!(first.payload.as_ref(), b"a");
        let second = rx.next().await.unwrap();
        assert_eq!(second.payload.as_ref(), b"b");
        assert!(rx.next().await.is_none(), "end-of-stream after inbound");

        assert_eq!(drain.await.unwrap(), DrainOutcome::Completed { sent: 2 });
    }

    #[tokio::test]
    async fn test_drain_empty_inbound_half_closes_on_ready() {
        let (tx, mut rx) = credit_channel::<WireMessage>(1);
        let ready = rx.ready_signal();

        let drain = tokio::spawn(drain_inbound(stream::empty(), tx, ready));

        assert!(rx.next().await.is_none());
        assert_eq!(drain.await.unwrap(), DrainOutcome::Completed { sent: 0 });
    }

    #[tokio::test]
    async fn test_drain_stops_when_transport_goes_away() {
        let (tx, mut rx) = credit_channel::<WireMessage>(1);
        let ready = rx.ready_signal();
        let (producer_tx, producer_rx) = tokio::sync::mpsc::channel::<Message>(8);
        let inbound = tokio_stream::wrappers::ReceiverStream::new(producer_rx);

        let drain = tokio::spawn(drain_inbound(inbound, tx, ready));

        producer_tx.send(Message::new("1")).await.unwrap();
        assert!(rx.next().await.is_some());
        drop(rx);
        producer_tx.send(Message::new("2")).await.unwrap();

        assert_eq!(
            drain.await.unwrap(),
            DrainOutcome::TransportClosed { sent: 1 }
        );
        // The producer observes the failure as a closed channel.
        assert!(producer_tx.is_closed());
    }

    #[tokio::test]
    async fn test_drain_never_ready() {
        let (tx, mut rx) = credit_channel::<WireMessage>(1);
        let ready = rx.ready_signal();
        drop(rx);

        let outcome = drain_inbound(stream::iter(vec![Message::new("x")]), tx, ready).await;
        assert_eq!(outcome, DrainOutcome::NeverReady);
    }

    #[tokio::test]
    async fn test_sends_bounded_by_credit() {
        const CREDIT: usize = 2;
        let (tx, mut rx) = credit_channel::<WireMessage>(CREDIT);
        let ready = rx.ready_signal();
        let credit = tx.credit().clone();
        let inbound = stream::iter((0..10).map(|i| Message::new(i.to_string())));

        let drain = tokio::spawn(drain_inbound(inbound, tx, ready));

        let mut taken = 0;
        while let Some(_msg) = rx.next().await {
            taken += 1;
            // Give the drain every chance to overrun its credit.
            for _ in 0..4 {
                tokio::task::yield_now().await;
            }
            assert!(credit.outstanding() <= CREDIT);
        }

        assert_eq!(taken, 10);
        assert_eq!(drain.await.unwrap(), DrainOutcome::Completed { sent: 10 });
    }
}
