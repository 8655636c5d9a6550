//! # Throttled and Frame Logging Utilities
//!
//! Logging helpers shared by the extraction pipeline: rate limiting for
//! warnings that can repeat on every notification (unknown notification sizes,
//! rejected candidates) and hex dumps of notifications and telegrams.
//!
//! ## Usage
//!
//! ```rust
//! use wmbus_ble_rs::util::logging::{LogThrottle, log_frame_hex};
//!
//! // Rate-limited logging
//! let mut throttle = LogThrottle::new(1000, 5); // 5 messages per second
//! if throttle.allow() {
//!     log::warn!("Unrecognized notification length");
//! }
//!
//! log_frame_hex("Notification", &[0xFB, 0xFB, 0xFB, 0xF0]);
//! ```

use std::collections::HashMap;
use std::time::Instant;

/// Throttling structure for rate-limiting log messages
///
/// A bridge in range of several meters can deliver a notification every few
/// hundred milliseconds; identical warnings for each one would drown the log.
#[derive(Debug)]
pub struct LogThrottle {
    /// Time window for throttling (in milliseconds)
    window_ms: u64,
    /// Maximum messages allowed per window
    cap: u32,
    /// Current message count in window
    count: u32,
    /// Start time of current window
    t0: Instant,
}

impl LogThrottle {
    /// Create new throttle with time window and message cap
    ///
    /// # Arguments
    /// * `window_ms` - Time window in milliseconds
    /// * `cap` - Maximum messages allowed per window
    pub fn new(window_ms: u64, cap: u32) -> Self {
        Self {
            window_ms,
            cap,
            count: 0,
            t0: Instant::now(),
        }
    }

    /// Check if logging is allowed (resets counter after window expires)
    pub fn allow(&mut self) -> bool {
        let now = Instant::now();
        let elapsed_ms = now.duration_since(self.t0).as_millis() as u64;

        if elapsed_ms > self.window_ms {
            self.t0 = now;
            self.count = 0;
        }

        self.count += 1;
        self.count <= self.cap
    }

    /// Reset the throttle (start new window immediately)
    pub fn reset(&mut self) {
        self.t0 = Instant::now();
        self.count = 0;
    }
}

/// Per-category throttles, so that one noisy warning does not silence another.
#[derive(Debug)]
pub struct ThrottleManager {
    throttles: HashMap<String, LogThrottle>,
    window_ms: u64,
    cap: u32,
}

impl ThrottleManager {
    /// Create a manager handing out throttles with the given window and cap
    pub fn new(window_ms: u64, cap: u32) -> Self {
        Self {
            throttles: HashMap::new(),
            window_ms,
            cap,
        }
    }

    /// Throttle for a category, created on first use
    pub fn throttle(&mut self, category: &str) -> &mut LogThrottle {
        let (window_ms, cap) = (self.window_ms, self.cap);
        self.throttles
            .entry(category.to_string())
            .or_insert_with(|| LogThrottle::new(window_ms, cap))
    }

    /// Check if logging is allowed for a specific category
    pub fn allow(&mut self, category: &str) -> bool {
        self.throttle(category).allow()
    }

    /// Reset all throttles
    pub fn reset_all(&mut self) {
        for throttle in self.throttles.values_mut() {
            throttle.reset();
        }
    }
}

impl Default for ThrottleManager {
    fn default() -> Self {
        Self::new(1000, 5)
    }
}

/// Log frame data in hex format for debugging
///
/// Output is limited to the first 64 bytes; a 244-byte multi-frame
/// notification would otherwise span several terminal lines.
pub fn log_frame_hex(prefix: &str, data: &[u8]) {
    const MAX_LOG_BYTES: usize = 64;

    let display_data = &data[..data.len().min(MAX_LOG_BYTES)];
    let hex_str = crate::util::hex::format_hex_compact(display_data);
    let suffix = if data.len() > MAX_LOG_BYTES {
        format!(" ... ({} bytes total)", data.len())
    } else {
        String::new()
    };

    log::debug!("{prefix}: {hex_str}{suffix}");
}

/// Log frame data with structured information
pub fn log_frame_structured(prefix: &str, data: &[u8], frame_kind: Option<&str>, source: Option<&str>) {
    log::debug!(
        target: "wmbus_ble::frame",
        "{}: {} bytes, kind={:?}, source={:?}, data={}",
        prefix,
        data.len(),
        frame_kind,
        source,
        crate::util::hex::format_hex_compact(&data[..data.len().min(32)])
    );
}

/// Log a warning with throttling
#[macro_export]
macro_rules! log_warn_throttled {
    ($throttle:expr, $($arg:tt)*) => {
        if $throttle.allow() {
            log::warn!($($arg)*);
        }
    };
}
