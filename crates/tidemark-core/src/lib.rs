//! Concurrent queue primitives with advisory watermarks.

pub mod config;
pub mod waitable_queue;

pub use config::QueueConfig;
pub use waitable_queue::{
    ConfigError, QueueError, QueueState, WaitHandle, WaitableQueue, Wake, Watermarks,
};
