//! Watermark-signaled concurrent queue.
//!
//! [`WaitableQueue`] is an unbounded FIFO shared by any number of producers
//! and consumers. Producers are never blocked; every enqueue and dequeue
//! reports an advisory [`QueueState`] computed under the queue's lock.
//! Consumers sleep on a [`WaitHandle`] and drain on wake-up, or use one of
//! the loops in [`consumer`].

pub mod consumer;
mod errors;
mod queue;
mod signal;
mod state;

pub use errors::{ConfigError, QueueError};
pub use queue::WaitableQueue;
pub use signal::{WaitHandle, Wake};
pub use state::{QueueState, Watermarks};
