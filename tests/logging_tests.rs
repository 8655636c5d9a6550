//! Tests for the logging helpers in the `wmbus-ble-rs` crate.

use wmbus_ble_rs::logging::{init_test_logger, log_debug, log_error, log_info, log_warn};
use wmbus_ble_rs::util::logging::{log_frame_hex, log_frame_structured, ThrottleManager};
use wmbus_ble_rs::log_warn_throttled;

/// The level helpers must not panic once a logger is installed.
#[test]
fn test_logging() {
    init_test_logger();
    log_error("This is an error message");
    log_warn("This is a warning message");
    log_info("This is an info message");
    log_debug("This is a debug message");
}

/// Repeated initialization is tolerated in tests.
#[test]
fn test_init_test_logger_twice() {
    init_test_logger();
    init_test_logger();
}

/// Long notifications are truncated in the dump, not rejected.
#[test]
fn test_frame_dumps() {
    init_test_logger();
    log_frame_hex("Notification", &[0xAB; 244]);
    log_frame_hex("Notification", &[]);
    log_frame_structured("Telegram", &[0x25, 0x44, 0x2D, 0x2C], Some("compact"), None);
}

/// The throttled warning macro consults the throttle once per call.
#[test]
fn test_throttled_warning() {
    init_test_logger();
    let mut throttles = ThrottleManager::new(60_000, 2);
    for _ in 0..5 {
        log_warn_throttled!(throttles.throttle("rejected"), "Rejected candidate");
    }
    assert!(!throttles.allow("rejected"));
    assert!(throttles.allow("unrecognized-length"));
}
