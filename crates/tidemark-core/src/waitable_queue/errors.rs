/// Rejected queue configuration.
///
/// Only produced at construction time: a queue either comes out of its factory
/// fully valid or not at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The capacity hint was below zero.
    #[error("initial capacity ({0}) cannot be negative")]
    CapacityNegative(isize),

    /// The low watermark was below zero.
    #[error("low watermark ({0}) cannot be negative")]
    LowWatermarkNegative(isize),

    /// The high watermark was below zero.
    #[error("high watermark ({0}) cannot be negative")]
    HighWatermarkNegative(isize),

    /// Both watermarks are valid on their own but `high < low`.
    #[error("high watermark ({high}) cannot be below low watermark ({low})")]
    #[allow(missing_docs)]
    HighWatermarkBelowLow { low: isize, high: isize },

    /// A configuration variable could not be parsed.
    #[error("environment variable {key} has invalid value {value:?}")]
    #[allow(missing_docs)]
    InvalidEnv { key: &'static str, value: String },
}

/// Runtime queue failure.
///
/// Enqueueing into a closed queue is a contract violation on the producer
/// side, never a condition to retry: once a producer has called or observed
/// [`close`](super::WaitableQueue::close) it must stop enqueueing. The
/// rejected item is handed back so it is not silently dropped.
#[derive(Debug, thiserror::Error)]
pub enum QueueError<T> {
    /// The queue was already closed; carries the rejected item.
    #[error("enqueue on closed queue")]
    Closed(T),
}

impl<T> QueueError<T> {
    /// Recovers the item that could not be enqueued.
    pub fn into_inner(self) -> T {
        match self {
            QueueError::Closed(item) => item,
        }
    }
}
