//! The lazy reply sequence returned by streaming bridges.
//!
//! # Cancellation
//!
//! Dropping a [`MessageStream`] before it ends cancels the call: the
//! background tasks feeding it are aborted, which stops any further pulls and
//! credit grants and drops the call's connection. Dropping never blocks.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::task::AbortHandle;

use function_grpc_core::Message;

use crate::error::BridgeError;
use crate::flow::CreditReceiver;

/// A finite (or infinite), non-restartable sequence of reply messages.
///
/// Items arrive in the order the peer sent them. The first `Err` item is
/// also the last item.
///
/// # Example
///
/// ```ignore
/// use futures::TryStreamExt;
///
/// let replies: Vec<Message> = client
///     .server_stream(Message::new("\"Ricky\""))
///     .await?
///     .try_collect()
///     .await?;
/// ```
pub struct MessageStream {
    inner: CreditReceiver<Result<Message, BridgeError>>,
    tasks: Vec<AbortHandle>,
    finished: bool,
}

impl MessageStream {
    pub(crate) fn new(
        inner: CreditReceiver<Result<Message, BridgeError>>,
        tasks: Vec<AbortHandle>,
    ) -> Self {
        Self {
            inner,
            tasks,
            finished: false,
        }
    }

    /// Whether the sequence has ended (completed or failed).
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl Stream for MessageStream {
    type Item = Result<Message, BridgeError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }

        let poll = Pin::new(&mut self.inner).poll_next(cx);
        match &poll {
            Poll::Ready(None) | Poll::Ready(Some(Err(_))) => self.finished = true,
            _ => {}
        }
        poll
    }
}

impl Drop for MessageStream {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!("reply stream dropped before completion; canceling call");
        }
        for task in &self.tasks {
            task.abort();
        }
    }
}

impl std::fmt::Debug for MessageStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageStream")
            .field("finished", &self.finished)
            .finish()
    }
}
