//! # Utility Modules
//!
//! Hex encoding/decoding and logging helpers used throughout the crate.

pub mod hex;
pub mod logging;

pub use hex::{decode_hex, encode_hex_upper, format_hex_compact, hex_to_bytes, parse_hex_lenient, HexError};
pub use logging::{log_frame_hex, log_frame_structured, LogThrottle, ThrottleManager};
