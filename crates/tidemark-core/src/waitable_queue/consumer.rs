//! Ready-made consumer loops.
//!
//! A wake only says "the queue may have changed", and any number of enqueues
//! can hide behind a single one. Both drivers therefore drain the queue to
//! empty before every wait, and drain once more on the way out so that items
//! enqueued between the last wake and a cancellation are not stranded.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::waitable_queue::{QueueState, WaitableQueue, Wake};

/// Why a consumer loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsumerExit {
    /// The queue was closed and then drained.
    QueueClosed,
    /// The cancellation token fired; the queue was drained one last time.
    Cancelled,
}

/// Outcome of a consumer loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumerReport {
    /// Items handed to the handler.
    pub received: usize,
    /// Reason the loop stopped.
    pub exit: ConsumerExit,
}

/// Consumes `queue` from an async task until it closes or `token` is
/// cancelled.
///
/// `handler` gets every item together with the state reported by the dequeue
/// that produced it.
pub async fn consume<T, F, Fut>(
    queue: &WaitableQueue<T>,
    token: &CancellationToken,
    mut handler: F,
) -> ConsumerReport
where
    F: FnMut(T, QueueState) -> Fut,
    Fut: Future<Output = ()>,
{
    let handle = queue.wait_handle();
    let mut received = 0;

    let exit = loop {
        received += drain_async(queue, &mut handler).await;

        tokio::select! {
            biased;

            _ = token.cancelled() => break ConsumerExit::Cancelled,

            wake = handle.wait() => match wake {
                Wake::Available => debug!("consumer woken, queue might not be empty"),
                Wake::Closed => break ConsumerExit::QueueClosed,
            },
        }
    };

    received += drain_async(queue, &mut handler).await;
    debug!(received, ?exit, remaining = queue.len(), "consumer exiting");

    ConsumerReport { received, exit }
}

/// Consumes `queue` from a dedicated thread until it closes or `token` is
/// cancelled.
///
/// The token is checked at least every `poll`; a wake from the queue ends
/// the wait early.
pub fn consume_blocking<T, F>(
    queue: &WaitableQueue<T>,
    token: &CancellationToken,
    poll: Duration,
    mut handler: F,
) -> ConsumerReport
where
    F: FnMut(T, QueueState),
{
    let handle = queue.wait_handle();
    let mut received = 0;

    let exit = loop {
        received += drain(queue, &mut handler);

        if token.is_cancelled() {
            break ConsumerExit::Cancelled;
        }

        match handle.wait_timeout(poll) {
            Some(Wake::Closed) => break ConsumerExit::QueueClosed,
            Some(Wake::Available) => debug!("consumer woken, queue might not be empty"),
            None => {}
        }
    };

    received += drain(queue, &mut handler);
    debug!(received, ?exit, remaining = queue.len(), "consumer exiting");

    ConsumerReport { received, exit }
}

fn drain<T, F>(queue: &WaitableQueue<T>, handler: &mut F) -> usize
where
    F: FnMut(T, QueueState),
{
    let mut count = 0;
    while let (Some(item), state) = queue.dequeue() {
        handler(item, state);
        count += 1;
    }
    count
}

async fn drain_async<T, F, Fut>(queue: &WaitableQueue<T>, handler: &mut F) -> usize
where
    F: FnMut(T, QueueState) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut count = 0;
    while let (Some(item), state) = queue.dequeue() {
        handler(item, state).await;
        count += 1;
    }
    count
}
