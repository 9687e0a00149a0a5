use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use futures_util::stream::{self, Stream};
use tokio::sync::Notify;

/// What a waiter observed when it woke up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wake {
    /// Something was enqueued since the last wake was taken. The queue may
    /// already have been drained by another consumer.
    Available,
    /// The queue was closed. Returned to every waiter from now on.
    Closed,
}

#[derive(Debug, Default)]
struct Slot {
    pending: bool,
    closed: bool,
}

impl Slot {
    fn take(&mut self) -> Option<Wake> {
        if self.closed {
            return Some(Wake::Closed);
        }
        std::mem::take(&mut self.pending).then_some(Wake::Available)
    }
}

/// Single-slot coalescing latch behind a [`WaitHandle`].
///
/// Any number of arms before a waiter runs collapse into one
/// [`Wake::Available`]. Blocking waiters park on the condvar, async waiters on
/// the [`Notify`]; both re-check the slot after every wake-up.
#[derive(Debug, Default)]
pub(crate) struct Signal {
    slot: Mutex<Slot>,
    blocking: Condvar,
    notify: Notify,
}

impl Signal {
    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks the slot pending. Returns `false` if it already was, or if the
    /// signal is closed.
    pub(crate) fn arm(&self) -> bool {
        let mut slot = self.slot();
        if slot.closed || slot.pending {
            return false;
        }
        slot.pending = true;
        drop(slot);

        self.wake_all();
        true
    }

    /// Permanently opens the latch.
    pub(crate) fn close(&self) {
        let mut slot = self.slot();
        slot.closed = true;
        slot.pending = false;
        drop(slot);

        self.wake_all();
    }

    fn wake_all(&self) {
        self.blocking.notify_all();
        self.notify.notify_waiters();
    }
}

/// Read-only view of a queue's availability signal.
///
/// Lets consumers sleep until "something may have changed" without holding
/// the queue itself. A wake is a hint, not an item: after
/// [`Wake::Available`] the consumer must dequeue until the queue reports
/// empty, then wait again.
#[derive(Debug, Clone)]
pub struct WaitHandle {
    signal: Arc<Signal>,
}

impl WaitHandle {
    pub(crate) fn new(signal: Arc<Signal>) -> Self {
        Self { signal }
    }

    /// Takes the pending wake, if any, without blocking.
    pub fn try_wait(&self) -> Option<Wake> {
        self.signal.slot().take()
    }

    /// Suspends the calling task until the slot is pending or closed.
    ///
    /// Cancel-safe: dropping the future never consumes a wake.
    pub async fn wait(&self) -> Wake {
        loop {
            // Registered before the check so an arm racing with it is not lost.
            let notified = self.signal.notify.notified();
            if let Some(wake) = self.try_wait() {
                return wake;
            }
            notified.await;
        }
    }

    /// Blocks the calling thread until the slot is pending or closed.
    pub fn wait_blocking(&self) -> Wake {
        let mut slot = self.signal.slot();
        loop {
            if let Some(wake) = slot.take() {
                return wake;
            }
            slot = self
                .signal
                .blocking
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`wait_blocking`](Self::wait_blocking), giving up after `timeout`.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Wake> {
        let deadline = Instant::now() + timeout;
        let mut slot = self.signal.slot();
        loop {
            if let Some(wake) = slot.take() {
                return Some(wake);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            let (guard, _) = self
                .signal
                .blocking
                .wait_timeout(slot, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            slot = guard;
        }
    }

    /// Whether the queue behind this handle has been closed.
    pub fn is_closed(&self) -> bool {
        self.signal.slot().closed
    }

    /// Stream of [`Wake::Available`] events, ending once the queue closes.
    ///
    /// The stream takes wakes from the same single slot as every other
    /// waiter on this handle or its clones. A wake taken elsewhere is not
    /// seen here, so this is not a per-subscriber broadcast.
    pub fn wakes(&self) -> impl Stream<Item = ()> + Send + 'static {
        stream::unfold(self.clone(), |handle| async move {
            match handle.wait().await {
                Wake::Available => Some(((), handle)),
                Wake::Closed => None,
            }
        })
    }
}
