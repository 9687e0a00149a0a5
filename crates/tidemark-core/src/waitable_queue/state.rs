use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::errors::ConfigError;

/// Advisory fullness of a [`WaitableQueue`](super::WaitableQueue).
///
/// Returned by every enqueue and dequeue. Nothing in the queue acts on it:
/// throttling producers or scaling consumers is up to the caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum QueueState {
    /// Fewer items than the low watermark.
    BelowLowWatermark,
    /// Between the watermarks, both inclusive.
    Nominal,
    /// More items than the high watermark.
    AboveHighWatermark,
}

impl Display for QueueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl QueueState {
    /// Short stable name, suitable for log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueState::BelowLowWatermark => "BelowLowWatermark",
            QueueState::Nominal => "Nominal",
            QueueState::AboveHighWatermark => "AboveHighWatermark",
        }
    }
}

/// The `(low, high)` thresholds used to classify queue length.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "RawWatermarks")]
pub struct Watermarks {
    low: usize,
    high: usize,
}

impl Watermarks {
    /// Validates a pair of signed thresholds.
    ///
    /// The low watermark is checked before the high one, and the ordering of
    /// the pair last.
    pub fn new(low: isize, high: isize) -> Result<Self, ConfigError> {
        if low < 0 {
            return Err(ConfigError::LowWatermarkNegative(low));
        }
        if high < 0 {
            return Err(ConfigError::HighWatermarkNegative(high));
        }
        if high < low {
            return Err(ConfigError::HighWatermarkBelowLow { low, high });
        }

        Ok(Self {
            low: low.unsigned_abs(),
            high: high.unsigned_abs(),
        })
    }

    pub(crate) const fn new_unchecked(low: usize, high: usize) -> Self {
        debug_assert!(low <= high);
        Self { low, high }
    }

    /// Lengths below this classify as [`QueueState::BelowLowWatermark`].
    pub fn low(&self) -> usize {
        self.low
    }

    /// Lengths above this classify as [`QueueState::AboveHighWatermark`].
    pub fn high(&self) -> usize {
        self.high
    }

    /// Maps a queue length onto a [`QueueState`].
    ///
    /// The queue only calls this with a length read under its own lock, so the
    /// result always matches the mutation that produced it.
    pub fn classify(&self, len: usize) -> QueueState {
        if len < self.low {
            QueueState::BelowLowWatermark
        } else if len > self.high {
            QueueState::AboveHighWatermark
        } else {
            QueueState::Nominal
        }
    }
}

#[derive(Deserialize)]
struct RawWatermarks {
    low: isize,
    high: isize,
}

impl TryFrom<RawWatermarks> for Watermarks {
    type Error = ConfigError;

    fn try_from(raw: RawWatermarks) -> Result<Self, Self::Error> {
        Watermarks::new(raw.low, raw.high)
    }
}
