//! Bridge Envelope and Telegram Constants
//!
//! This module defines the byte-level constants used when recovering wM-Bus
//! telegrams from BLE concentrator notifications. The values reflect the
//! observed framing of the VW1871 bridge repeating Kamstrup flowIQ 2101
//! water meter traffic.

/// Envelope start delimiter sent ahead of every wrapped notification
pub const ENVELOPE_START: [u8; 4] = [0xFB, 0xFB, 0xFB, 0xF0];

/// Envelope end delimiter closing a wrapped notification
pub const ENVELOPE_END: [u8; 4] = [0xFE, 0xFE, 0x0E, 0x0F];

/// Combined size of both envelope delimiters
pub const ENVELOPE_OVERHEAD: usize = ENVELOPE_START.len() + ENVELOPE_END.len();

/// wM-Bus C-field for SND_NR (send/no reply), as emitted by the meter
pub const WMBUS_C_FIELD_SND_NR: u8 = 0x44;

/// Manufacturer code "KAM" (Kamstrup), little-endian on the wire
pub const MANUFACTURER_KAM: [u8; 2] = [0x2D, 0x2C];

/// Anchor opening a compact frame: L=0x25, C=SND_NR, M=KAM
pub const COMPACT_ANCHOR: [u8; 4] = [0x25, WMBUS_C_FIELD_SND_NR, 0x2D, 0x2C];

/// Anchor opening a full frame: L=0x30, C=SND_NR, M=KAM
pub const FULL_ANCHOR: [u8; 4] = [0x30, WMBUS_C_FIELD_SND_NR, 0x2D, 0x2C];

/// Length of an anchor pattern in bytes
pub const ANCHOR_LEN: usize = 4;

/// Total size of a compact frame window (76 hex digits)
pub const COMPACT_FRAME_LEN: usize = 38;

/// Total size of a full frame window (98 hex digits)
pub const FULL_FRAME_LEN: usize = 49;

/// Size of the wM-Bus address field: 4-byte BCD serial, version, device type
pub const METER_ADDRESS_LEN: usize = 6;

/// Offset of the address field measured from the start of the anchor
pub const METER_ADDRESS_OFFSET: usize = ANCHOR_LEN;

/// Printed serial of the default target meter
pub const DEFAULT_METER_SERIAL: u32 = 74_493_770;

/// Version byte of the default target meter
pub const DEFAULT_METER_VERSION: u8 = 0x1F;

/// Device type byte of the default target meter (0x16 = cold water)
pub const DEFAULT_METER_DEVICE_TYPE: u8 = 0x16;

/// Longest possible telegram: a one-byte L-field plus up to 255 bytes
pub const MAX_TELEGRAM_LEN: usize = 256;

/// Shortest candidate the validator will consider (20 hex digits)
pub const MIN_TELEGRAM_LEN: usize = 10;

/// Declared notification length carrying one compact frame
pub const NOTIFICATION_LEN_COMPACT: usize = 59;

/// Declared notification length carrying one full frame
pub const NOTIFICATION_LEN_FULL: usize = 70;

/// Declared notification length using the offset-trim layout
pub const NOTIFICATION_LEN_OFFSET: usize = 96;

/// Declared notification length carrying concatenated frames
pub const NOTIFICATION_LEN_MULTI: usize = 244;

/// Bytes discarded ahead of the frame in offset-trim notifications (108 hex chars)
pub const OFFSET_TRIM_PREFIX: usize = 54;

/// Bytes discarded after the frame in offset-trim notifications (8 hex chars)
pub const OFFSET_TRIM_SUFFIX: usize = 4;

/// Envelope type byte for standard notifications
pub const ENVELOPE_TYPE_STANDARD: u8 = 0x11;

/// Envelope type byte for extended notifications
pub const ENVELOPE_TYPE_EXTENDED: u8 = 0x25;
