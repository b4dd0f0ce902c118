//! Credit-based flow control.
//!
//! A [`credit_channel`] is a hand-off queue whose capacity is governed by
//! explicit credit rather than a fixed buffer size:
//!
//! - the sending side spends one unit of credit per item and waits when none
//!   is left, so it can never run ahead of the receiver by more than the
//!   credit it was granted;
//! - the receiving side returns one unit (request-one-more) each time it
//!   takes an item.
//!
//! The same channel is used in both directions of a streaming call. Towards
//! the transport, the transport is the receiver and pulls items when it can
//! accept bytes. Towards the caller, the bridge's receive loop is the sender
//! and the caller's [`MessageStream`](crate::MessageStream) is the receiver.
//!
//! The receiver also carries a one-shot *ready* signal, fired the first time
//! it is polled. For the send direction this is the transport's "ready to
//! accept data" notification.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::{Semaphore, mpsc, oneshot};

/// Create a credit-governed channel holding `initial` units of credit.
///
/// `initial` is clamped to at least one.
pub(crate) fn credit_channel<T>(initial: usize) -> (CreditSender<T>, CreditReceiver<T>) {
    let credit = Credit::new(initial);
    let (tx, rx) = mpsc::unbounded_channel();
    (
        CreditSender {
            tx,
            credit: credit.clone(),
        },
        CreditReceiver {
            rx,
            credit,
            ready: None,
        },
    )
}

/// The credit shared by both ends of a channel.
///
/// Credit is a semaphore, so it can never go negative and concurrent
/// acquire/grant calls are serialized.
#[derive(Clone, Debug)]
pub(crate) struct Credit {
    permits: Arc<Semaphore>,
    initial: usize,
}

impl Credit {
    fn new(initial: usize) -> Self {
        let initial = initial.max(1);
        Self {
            permits: Arc::new(Semaphore::new(initial)),
            initial,
        }
    }

    /// Wait for one unit of credit and spend it.
    ///
    /// Fails once the receiving side is gone.
    async fn acquire(&self) -> Result<(), CreditClosed> {
        let permit = self.permits.acquire().await.map_err(|_| CreditClosed)?;
        permit.forget();
        Ok(())
    }

    /// Return `n` units of credit.
    fn grant(&self, n: usize) {
        self.permits.add_permits(n);
    }

    fn close(&self) {
        self.permits.close();
    }

    /// Units currently available to the sender.
    pub(crate) fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Items sent but not yet taken by the receiver.
    pub(crate) fn outstanding(&self) -> usize {
        self.initial.saturating_sub(self.available())
    }
}

/// The receiving side went away; no more credit will ever be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CreditClosed;

/// Sending half of a [`credit_channel`].
#[derive(Debug)]
pub(crate) struct CreditSender<T> {
    tx: mpsc::UnboundedSender<T>,
    credit: Credit,
}

impl<T> CreditSender<T> {
    /// Spend one unit of credit, waiting for it if necessary, then enqueue.
    pub(crate) async fn send(&self, item: T) -> Result<(), CreditClosed> {
        self.acquire().await?;
        self.push(item)
    }

    /// Wait for one unit of credit without enqueueing anything yet.
    ///
    /// Pair every successful call with exactly one [`push`](Self::push).
    pub(crate) async fn acquire(&self) -> Result<(), CreditClosed> {
        if self.tx.is_closed() {
            return Err(CreditClosed);
        }
        self.credit.acquire().await
    }

    /// Enqueue an item whose credit was already acquired.
    pub(crate) fn push(&self, item: T) -> Result<(), CreditClosed> {
        self.tx.send(item).map_err(|_| CreditClosed)
    }

    pub(crate) fn credit(&self) -> &Credit {
        &self.credit
    }
}

/// Receiving half of a [`credit_channel`].
///
/// Each item taken grants one unit of credit back to the sender. Dropping the
/// receiver closes the credit so a waiting sender stops immediately.
#[derive(Debug)]
pub(crate) struct CreditReceiver<T> {
    rx: mpsc::UnboundedReceiver<T>,
    credit: Credit,
    ready: Option<oneshot::Sender<()>>,
}

impl<T> CreditReceiver<T> {
    /// Signal that resolves the first time this receiver is polled.
    ///
    /// Resolves to an error if the receiver is dropped without ever being
    /// polled. Calling this again replaces the previous signal.
    pub(crate) fn ready_signal(&mut self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        self.ready = Some(tx);
        rx
    }

    #[cfg(test)]
    pub(crate) fn credit(&self) -> &Credit {
        &self.credit
    }
}

impl<T> Stream for CreditReceiver<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if let Some(ready) = self.ready.take() {
            let _ = ready.send(());
        }

        match self.rx.poll_recv(cx) {
            Poll::Ready(Some(item)) => {
                self.credit.grant(1);
                Poll::Ready(Some(item))
            }
            other => other,
        }
    }
}

impl<T> Drop for CreditReceiver<T> {
    fn drop(&mut self) {
        self.credit.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_sender_waits_without_credit() {
        let (tx, mut rx) = credit_channel::<u32>(2);

        tx.send(1).await.unwrap();
        tx.send(2).await.unwrap();
        assert_eq!(tx.credit().available(), 0);
        assert_eq!(tx.credit().outstanding(), 2);

        // A third send must not complete until the receiver takes an item.
        assert!(
            timeout(Duration::from_millis(50), tx.send(3))
                .await
                .is_err()
        );

        assert_eq!(rx.next().await, Some(1));
        assert_eq!(rx.credit().available(), 1);

        tx.send(3).await.unwrap();
        assert_eq!(rx.next().await, Some(2));
        assert_eq!(rx.next().await, Some(3));
        assert_eq!(tx.credit().outstanding(), 0);
    }

    #[tokio::test]
    async fn test_outstanding_never_exceeds_credit() {
        const CREDIT: usize = 3;
        let (tx, mut rx) = credit_channel::<usize>(CREDIT);
        let observed = tx.credit().clone();

        let producer = tokio::spawn(async move {
            for i in 0..50 {
                tx.send(i).await.unwrap();
                assert!(tx.credit().outstanding() <= CREDIT);
            }
        });

        let mut received = Vec::new();
        while let Some(item) = rx.next().await {
            assert!(observed.outstanding() <= CREDIT);
            received.push(item);
            tokio::task::yield_now().await;
        }

        producer.await.unwrap();
        assert_eq!(received, (0..50).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_ready_fires_on_first_poll() {
        let (tx, mut rx) = credit_channel::<u32>(1);
        let mut ready = rx.ready_signal();

        assert!(ready.try_recv().is_err());

        tx.send(7).await.unwrap();
        assert_eq!(rx.next().await, Some(7));
        assert!(ready.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_ready_errors_if_never_polled() {
        let (_tx, mut rx) = credit_channel::<u32>(1);
        let ready = rx.ready_signal();
        drop(rx);
        assert!(ready.await.is_err());
    }

    #[tokio::test]
    async fn test_dropping_receiver_unblocks_sender() {
        let (tx, rx) = credit_channel::<u32>(1);
        tx.send(1).await.unwrap();

        let waiting = tokio::spawn(async move { tx.send(2).await });
        tokio::task::yield_now().await;
        drop(rx);

        assert_eq!(waiting.await.unwrap(), Err(CreditClosed));
    }

    #[test]
    fn test_zero_credit_is_clamped() {
        let (tx, _rx) = credit_channel::<u32>(0);
        assert_eq!(tx.credit().available(), 1);
    }
}
