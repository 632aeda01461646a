//! Runtime tuning parsed from environment variables.
//!
//! Every knob has a typed default; a missing or unparseable variable falls
//! back to it silently so a bad deploy value never disables the widget.

use crate::consts::{DEFAULT_DRAG_THRESHOLD_PX, DEFAULT_TAP_SUPPRESS_MS};

pub const DEFAULT_WRITE_QUEUE_CAPACITY: usize = 256;
pub const DEFAULT_WRITE_RETRIES: usize = 2;
pub const DEFAULT_WRITE_RETRY_BASE_MS: u64 = 20;

/// Gesture disambiguation knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureConfig {
    /// Movement on either axis, in pixels, before a press becomes a drag.
    pub drag_threshold_px: f64,
    /// Taps within this many milliseconds of a drag release are ignored.
    pub tap_suppress_ms: u64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self { drag_threshold_px: DEFAULT_DRAG_THRESHOLD_PX, tap_suppress_ms: DEFAULT_TAP_SUPPRESS_MS }
    }
}

/// Tuning for the background draft writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterConfig {
    /// Bounded channel capacity for queued loads and flushes.
    pub queue_capacity: usize,
    /// Attempts per write before the write is dropped.
    pub retries: usize,
    /// Base delay in milliseconds for linear retry back-off.
    pub retry_base_ms: u64,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_WRITE_QUEUE_CAPACITY,
            retries: DEFAULT_WRITE_RETRIES,
            retry_base_ms: DEFAULT_WRITE_RETRY_BASE_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BubbleConfig {
    pub gesture: GestureConfig,
    pub writer: WriterConfig,
}

impl BubbleConfig {
    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `BUBBLE_DRAG_THRESHOLD_PX`: default 8
    /// - `BUBBLE_TAP_SUPPRESS_MS`: default 200
    /// - `BUBBLE_WRITE_QUEUE_CAPACITY`: default 256
    /// - `BUBBLE_WRITE_RETRIES`: default 2
    /// - `BUBBLE_WRITE_RETRY_BASE_MS`: default 20
    #[must_use]
    pub fn from_env() -> Self {
        let gesture = GestureConfig {
            drag_threshold_px: env_parse("BUBBLE_DRAG_THRESHOLD_PX", DEFAULT_DRAG_THRESHOLD_PX),
            tap_suppress_ms: env_parse("BUBBLE_TAP_SUPPRESS_MS", DEFAULT_TAP_SUPPRESS_MS),
        };
        let writer = WriterConfig {
            queue_capacity: env_parse("BUBBLE_WRITE_QUEUE_CAPACITY", DEFAULT_WRITE_QUEUE_CAPACITY).max(1),
            retries: env_parse("BUBBLE_WRITE_RETRIES", DEFAULT_WRITE_RETRIES).max(1),
            retry_base_ms: env_parse("BUBBLE_WRITE_RETRY_BASE_MS", DEFAULT_WRITE_RETRY_BASE_MS),
        };
        Self { gesture, writer }
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
