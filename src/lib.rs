//! # wmbus-ble-rs - wM-Bus Telegram Recovery from BLE Bridge Notifications
//!
//! BLE concentrators such as the VW1871 listen to wireless M-Bus meters and
//! repeat what they hear as BLE notifications. The telegrams arrive wrapped in
//! a proprietary envelope, sometimes truncated, padded, or several to a
//! notification. This crate turns those notifications back into well-formed
//! wM-Bus telegrams for a downstream meter decoder such as wmbusmeters.
//!
//! ## Features
//!
//! - Strip the bridge envelope and inspect its header
//! - Length-keyed extraction rules held in a configurable table
//! - Byte-level anchor scanning for concatenated telegrams
//! - Validation of L-field, anchor and meter address with typed reject reasons
//! - `telegram=|HEX|` line output for line-oriented decoders
//! - Replay of captured session logs
//! - Capture analysis: envelope header patterns, sequence bytes, frame lengths
//!
//! ## Usage
//!
//! ```rust
//! use wmbus_ble_rs::{ExtractorConfig, Pipeline, RawNotification};
//!
//! let mut pipeline = Pipeline::new(&ExtractorConfig::default()).unwrap();
//! let notification = RawNotification::from_hex("FBFBFBF0112233FEFE0E0F", "demo").unwrap();
//! let outcome = pipeline.process(&notification).unwrap();
//! for telegram in &outcome.telegrams {
//!     println!("telegram=|{}|", telegram.to_hex());
//! }
//! ```

pub mod bridge;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod util;

pub use crate::error::{BridgeError, RejectReason};
pub use crate::logging::{init_logger, log_info};

pub use bridge::{
    CandidateTelegram, Extraction, ExtractStats, FrameExtractor, FrameKind, Outcome, Pipeline,
    RawNotification, Rejection, SessionAnalysis, Telegram, TelegramFields, TelegramFormat, Validator,
    WrappedFrame,
};
pub use config::{ExtractorConfig, MeterAddress};
