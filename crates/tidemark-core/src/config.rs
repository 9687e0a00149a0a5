//! Queue construction parameters and their environment overrides.

use serde::{Deserialize, Serialize};

use crate::waitable_queue::{ConfigError, Watermarks};

/// Environment variable overriding [`QueueConfig::capacity_hint`].
pub const CAPACITY_ENV: &str = "TIDEMARK_CAPACITY";
/// Environment variable overriding the low watermark.
pub const LOW_WATERMARK_ENV: &str = "TIDEMARK_LOW_WATERMARK";
/// Environment variable overriding the high watermark.
pub const HIGH_WATERMARK_ENV: &str = "TIDEMARK_HIGH_WATERMARK";

const DEFAULT_CAPACITY: isize = 16;
const DEFAULT_LOW_WATERMARK: isize = 4;
const DEFAULT_HIGH_WATERMARK: isize = 12;

/// Validated construction parameters for a
/// [`WaitableQueue`](crate::waitable_queue::WaitableQueue).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueConfig {
    /// Preallocated storage, in elements. Not a limit.
    pub capacity_hint: usize,
    /// Fullness classification thresholds.
    pub watermarks: Watermarks,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity_hint: DEFAULT_CAPACITY.unsigned_abs(),
            watermarks: Watermarks::new_unchecked(
                DEFAULT_LOW_WATERMARK.unsigned_abs(),
                DEFAULT_HIGH_WATERMARK.unsigned_abs(),
            ),
        }
    }
}

impl QueueConfig {
    /// Validates the parameters in order: capacity, low watermark, high
    /// watermark, then watermark ordering. The first failure wins.
    pub fn new(capacity_hint: isize, low: isize, high: isize) -> Result<Self, ConfigError> {
        if capacity_hint < 0 {
            return Err(ConfigError::CapacityNegative(capacity_hint));
        }

        Ok(Self {
            capacity_hint: capacity_hint.unsigned_abs(),
            watermarks: Watermarks::new(low, high)?,
        })
    }

    /// Reads overrides from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads overrides through `lookup`; absent keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let read = |key: &'static str, default: isize| -> Result<isize, ConfigError> {
            match lookup(key) {
                None => Ok(default),
                Some(value) => {
                    let parsed = value.trim().parse::<isize>();
                    parsed.map_err(|_| ConfigError::InvalidEnv { key, value })
                }
            }
        };

        Self::new(
            read(CAPACITY_ENV, DEFAULT_CAPACITY)?,
            read(LOW_WATERMARK_ENV, DEFAULT_LOW_WATERMARK)?,
            read(HIGH_WATERMARK_ENV, DEFAULT_HIGH_WATERMARK)?,
        )
    }
}
