//! Telegram and notification builders shared by the integration tests.
#![allow(dead_code)]

use wmbus_ble_rs::bridge::wrapper::wrap;
use wmbus_ble_rs::constants::{COMPACT_ANCHOR, FULL_ANCHOR};

/// Address field of meter 74493770 (version 0x1F, cold water)
pub const METER: [u8; 6] = [0x70, 0x37, 0x49, 0x74, 0x1F, 0x16];

/// A notification the bridge forwarded without its envelope; the compact
/// telegram starts at byte 12 and is followed by two extra bytes.
pub const VW1871_STRIPPED_HEX: &str =
    "331101250808EC916261A50125442D2C703749741F168D208E320502213A4A3B74FA49CEF847D54C4FB74C4175ED60D3E8D9BCFD";

/// The compact telegram contained in [`VW1871_STRIPPED_HEX`].
pub const VW1871_COMPACT_TELEGRAM_HEX: &str =
    "25442D2C703749741F168D208E320502213A4A3B74FA49CEF847D54C4FB74C4175ED60D3E8D9";

fn frame(anchor: &[u8; 4], len: usize, fill: u8) -> Vec<u8> {
    let mut out = anchor.to_vec();
    out.extend_from_slice(&METER);
    out.resize(len, fill);
    out
}

/// 38-byte compact telegram for the default meter.
pub fn compact_frame(fill: u8) -> Vec<u8> {
    frame(&COMPACT_ANCHOR, 38, fill)
}

/// 49-byte full telegram for the default meter.
pub fn full_frame(fill: u8) -> Vec<u8> {
    frame(&FULL_ANCHOR, 49, fill)
}

/// Wrap `parts` in the envelope, padding the core so the notification is
/// exactly `total` bytes long.
pub fn wrapped_notification(parts: &[&[u8]], total: usize) -> Vec<u8> {
    let mut core: Vec<u8> = parts.concat();
    assert!(core.len() <= total - 8, "parts do not fit a {total}-byte notification");
    core.resize(total - 8, 0x00);
    wrap(&core)
}

pub fn to_hex(data: &[u8]) -> String {
    hex::encode_upper(data)
}
