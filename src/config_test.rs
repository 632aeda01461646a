#![allow(clippy::float_cmp)]

use super::*;

// =============================================================================
// env_parse
// =============================================================================

#[test]
fn env_parse_missing_returns_default() {
    let val: usize = env_parse("__BUBBLE_TEST_NONEXISTENT_KEY__", 42);
    assert_eq!(val, 42);
}

#[test]
fn env_parse_present_valid() {
    unsafe { std::env::set_var("__BUBBLE_TEST_EP_VALID__", "99") };
    let val: u64 = env_parse("__BUBBLE_TEST_EP_VALID__", 0);
    assert_eq!(val, 99);
    unsafe { std::env::remove_var("__BUBBLE_TEST_EP_VALID__") };
}

#[test]
fn env_parse_present_invalid_returns_default() {
    unsafe { std::env::set_var("__BUBBLE_TEST_EP_INVALID__", "eight") };
    let val: f64 = env_parse("__BUBBLE_TEST_EP_INVALID__", 8.0);
    assert_eq!(val, 8.0);
    unsafe { std::env::remove_var("__BUBBLE_TEST_EP_INVALID__") };
}

// =============================================================================
// BubbleConfig
// =============================================================================

#[test]
fn default_gesture_matches_constants() {
    let config = BubbleConfig::default();
    assert_eq!(config.gesture.drag_threshold_px, DEFAULT_DRAG_THRESHOLD_PX);
    assert_eq!(config.gesture.tap_suppress_ms, DEFAULT_TAP_SUPPRESS_MS);
}

#[test]
fn default_writer_matches_constants() {
    let config = BubbleConfig::default();
    assert_eq!(config.writer.queue_capacity, DEFAULT_WRITE_QUEUE_CAPACITY);
    assert_eq!(config.writer.retries, DEFAULT_WRITE_RETRIES);
    assert_eq!(config.writer.retry_base_ms, DEFAULT_WRITE_RETRY_BASE_MS);
}

#[test]
fn from_env_reads_overrides() {
    unsafe {
        std::env::set_var("BUBBLE_DRAG_THRESHOLD_PX", "12.5");
        std::env::set_var("BUBBLE_TAP_SUPPRESS_MS", "350");
        std::env::set_var("BUBBLE_WRITE_QUEUE_CAPACITY", "0");
    }
    let config = BubbleConfig::from_env();
    assert_eq!(config.gesture.drag_threshold_px, 12.5);
    assert_eq!(config.gesture.tap_suppress_ms, 350);
    // Zero capacity would panic in tokio::sync::mpsc::channel.
    assert_eq!(config.writer.queue_capacity, 1);
    unsafe {
        std::env::remove_var("BUBBLE_DRAG_THRESHOLD_PX");
        std::env::remove_var("BUBBLE_TAP_SUPPRESS_MS");
        std::env::remove_var("BUBBLE_WRITE_QUEUE_CAPACITY");
    }
}
