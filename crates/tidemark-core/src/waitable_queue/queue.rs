use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, trace, warn};

use crate::{
    config::QueueConfig,
    waitable_queue::{
        errors::{ConfigError, QueueError},
        signal::{Signal, WaitHandle},
        state::{QueueState, Watermarks},
    },
};

#[derive(Debug)]
struct Store<T> {
    items: VecDeque<T>,
    closed: bool,
    last_state: QueueState,
}

/// Unbounded multi-producer, multi-consumer FIFO with advisory watermarks.
///
/// Producers never block: [`enqueue`](Self::enqueue) appends, reports the
/// resulting [`QueueState`] and arms the availability signal. Consumers either
/// poll with [`dequeue`](Self::dequeue) or sleep on a [`WaitHandle`] and
/// drain on wake-up. [`close`](Self::close) ends the queue's life while
/// letting consumers drain what is left.
///
/// Share it between threads or tasks behind an [`Arc`].
#[derive(Debug)]
pub struct WaitableQueue<T> {
    store: Mutex<Store<T>>,
    watermarks: Watermarks,
    signal: Arc<Signal>,
}

impl<T> WaitableQueue<T> {
    /// Builds a queue from a capacity hint and a pair of watermarks.
    ///
    /// All three are counted in elements. The capacity only preallocates
    /// storage; it is never enforced as a ceiling, and a hint too large to
    /// allocate is ignored.
    pub fn new(
        capacity_hint: isize,
        low_watermark: isize,
        high_watermark: isize,
    ) -> Result<Self, ConfigError> {
        let config = QueueConfig::new(capacity_hint, low_watermark, high_watermark)?;
        Ok(Self::with_config(&config))
    }

    /// Builds a queue from an already validated configuration.
    pub fn with_config(config: &QueueConfig) -> Self {
        let watermarks = config.watermarks;

        info!(
            capacity_hint = config.capacity_hint,
            low_watermark = watermarks.low(),
            high_watermark = watermarks.high(),
            "initializing waitable queue"
        );

        let mut items = VecDeque::new();
        if let Err(err) = items.try_reserve(config.capacity_hint) {
            debug!(capacity_hint = config.capacity_hint, %err, "capacity hint ignored");
        }

        Self {
            store: Mutex::new(Store {
                items,
                closed: false,
                last_state: watermarks.classify(0),
            }),
            watermarks,
            signal: Arc::new(Signal::default()),
        }
    }

    // Nothing panics while holding the guard, so a poisoned store is still consistent.
    fn store(&self) -> MutexGuard<'_, Store<T>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `item` and returns the resulting fullness.
    ///
    /// Never blocks, whatever the state.
    ///
    /// # Panics
    ///
    /// If the queue is closed. Producers must stop enqueueing once they have
    /// called or observed [`close`](Self::close); this is a programming error,
    /// not something to recover from. See [`try_enqueue`](Self::try_enqueue)
    /// for producers that cannot rule out a concurrent close.
    pub fn enqueue(&self, item: T) -> QueueState {
        match self.try_enqueue(item) {
            Ok(state) => state,
            Err(err) => panic!("{err}"),
        }
    }

    /// Appends `item` unless the queue is closed, in which case it is handed
    /// back inside the error.
    pub fn try_enqueue(&self, item: T) -> Result<QueueState, QueueError<T>> {
        let mut store = self.store();
        if store.closed {
            drop(store);
            warn!("enqueue refused: queue closed");
            return Err(QueueError::Closed(item));
        }

        store.items.push_back(item);
        self.signal.arm();

        Ok(self.observe(&mut store))
    }

    /// Removes the head of the queue.
    ///
    /// Returns `None` once the queue is empty, in which case the state is
    /// always [`QueueState::BelowLowWatermark`]. Behaves the same whether the
    /// queue is open or closed.
    pub fn dequeue(&self) -> (Option<T>, QueueState) {
        let mut store = self.store();
        let Some(item) = store.items.pop_front() else {
            return (None, QueueState::BelowLowWatermark);
        };

        (Some(item), self.observe(&mut store))
    }

    /// Classifies the length held by the guard and logs state transitions.
    fn observe(&self, store: &mut Store<T>) -> QueueState {
        let len = store.items.len();
        let state = self.watermarks.classify(len);
        trace!(len, %state, "queue mutated");

        if state != store.last_state {
            debug!(len, from = %store.last_state, to = %state, "queue state changed");
            store.last_state = state;
        }

        state
    }

    /// Closes the queue. Idempotent.
    ///
    /// Further enqueues are rejected, remaining items stay available to
    /// [`dequeue`](Self::dequeue), and every current and future waiter on the
    /// [`WaitHandle`] returns [`Wake::Closed`](super::Wake::Closed).
    pub fn close(&self) {
        let mut store = self.store();
        if store.closed {
            return;
        }

        store.closed = true;
        self.signal.close();
        info!(remaining = store.items.len(), "waitable queue closed");
    }

    /// Handle consumers can sleep on until the queue may have work or closes.
    pub fn wait_handle(&self) -> WaitHandle {
        WaitHandle::new(self.signal.clone())
    }

    /// Number of queued items.
    ///
    /// For observability only: the value may be stale by the time the caller
    /// looks at it, so never base a control decision on it.
    pub fn len(&self) -> usize {
        self.store().items.len()
    }

    /// Whether the queue currently holds no items. Same caveat as [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        self.store().items.is_empty()
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.store().closed
    }

    /// The thresholds this queue classifies against.
    pub fn watermarks(&self) -> Watermarks {
        self.watermarks
    }
}
