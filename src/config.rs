//! # Extractor Configuration
//!
//! Everything the extractor and validator need to know about the bridge and the
//! target meter: the anchor patterns, the length → rule table and the meter
//! address. [`ExtractorConfig::default`] reproduces the VW1871 / flowIQ 2101
//! characterization; a JSON file can override any part of it.
//!
//! ```json
//! {
//!   "meter": { "serial": 74493770, "version": 31, "device_type": 22 },
//!   "min_telegram_len": 10
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bridge::anchor::AnchorPattern;
use crate::bridge::rules::RuleTable;
use crate::constants::{
    DEFAULT_METER_DEVICE_TYPE, DEFAULT_METER_SERIAL, DEFAULT_METER_VERSION, MAX_TELEGRAM_LEN,
    METER_ADDRESS_LEN, MIN_TELEGRAM_LEN,
};
use crate::error::BridgeError;

/// Largest serial representable in the 4-byte BCD address field.
const MAX_BCD_SERIAL: u32 = 99_999_999;

/// The wM-Bus address (A-field) of the meter whose telegrams are wanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeterAddress {
    /// Serial number as printed on the meter
    pub serial: u32,
    pub version: u8,
    pub device_type: u8,
}

impl MeterAddress {
    pub fn new(serial: u32, version: u8, device_type: u8) -> Self {
        Self {
            serial,
            version,
            device_type,
        }
    }

    /// Parse the printed 8-digit serial, keeping the default version and type.
    pub fn from_serial_str(serial: &str) -> Result<Self, BridgeError> {
        let serial = serial.trim();
        if serial.is_empty() || serial.len() > 8 || !serial.chars().all(|c| c.is_ascii_digit()) {
            return Err(BridgeError::Config(format!("meter serial must be up to 8 digits, got {serial:?}")));
        }
        let serial = serial
            .parse::<u32>()
            .map_err(|e| BridgeError::Config(format!("meter serial: {e}")))?;
        Ok(Self {
            serial,
            ..Self::default()
        })
    }

    /// The 6-byte address field as it appears on the wire: BCD serial
    /// little-endian, then version, then device type.
    pub fn wire_bytes(&self) -> [u8; METER_ADDRESS_LEN] {
        let mut out = [0u8; METER_ADDRESS_LEN];
        let mut rest = self.serial;
        for byte in out.iter_mut().take(4) {
            let pair = rest % 100;
            *byte = (((pair / 10) as u8) << 4) | (pair % 10) as u8;
            rest /= 100;
        }
        out[4] = self.version;
        out[5] = self.device_type;
        out
    }

    /// Decode an address field; `None` if the serial is not valid BCD.
    pub fn from_wire(field: &[u8]) -> Option<Self> {
        if field.len() < METER_ADDRESS_LEN {
            return None;
        }
        let mut serial = 0u32;
        for &byte in field[..4].iter().rev() {
            let (hi, lo) = (byte >> 4, byte & 0x0F);
            if hi > 9 || lo > 9 {
                return None;
            }
            serial = serial * 100 + u32::from(hi) * 10 + u32::from(lo);
        }
        Some(Self::new(serial, field[4], field[5]))
    }
}

impl Default for MeterAddress {
    fn default() -> Self {
        Self::new(DEFAULT_METER_SERIAL, DEFAULT_METER_VERSION, DEFAULT_METER_DEVICE_TYPE)
    }
}

impl std::fmt::Display for MeterAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:08} (v{:02X} t{:02X})", self.serial, self.version, self.device_type)
    }
}

/// Configuration shared by [`FrameExtractor`](crate::bridge::FrameExtractor)
/// and [`Validator`](crate::bridge::Validator).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub meter: MeterAddress,
    pub anchors: Vec<AnchorPattern>,
    pub rules: RuleTable,
    pub min_telegram_len: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            meter: MeterAddress::default(),
            anchors: vec![AnchorPattern::compact(), AnchorPattern::full()],
            rules: RuleTable::default(),
            min_telegram_len: MIN_TELEGRAM_LEN,
        }
    }
}

impl ExtractorConfig {
    /// Parse and validate a JSON configuration; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, BridgeError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, BridgeError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        log::debug!("Loading extractor configuration from {}", path.display());
        Self::from_json_str(&text)
    }

    pub fn with_meter(mut self, meter: MeterAddress) -> Self {
        self.meter = meter;
        self
    }

    pub fn with_rules(mut self, rules: RuleTable) -> Self {
        self.rules = rules;
        self
    }

    /// Reject configurations the extractor could never act on.
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.anchors.is_empty() {
            return Err(BridgeError::Config("at least one anchor pattern is required".into()));
        }
        for (i, anchor) in self.anchors.iter().enumerate() {
            if anchor.is_empty() {
                return Err(BridgeError::Config(format!("anchor #{i} is empty")));
            }
            if anchor.window < anchor.len() + METER_ADDRESS_LEN {
                return Err(BridgeError::Config(format!(
                    "anchor #{i} window of {} bytes cannot hold the anchor and meter address",
                    anchor.window
                )));
            }
            if anchor.window > MAX_TELEGRAM_LEN {
                return Err(BridgeError::Config(format!(
                    "anchor #{i} window of {} bytes exceeds the {MAX_TELEGRAM_LEN}-byte telegram limit",
                    anchor.window
                )));
            }
            if self.anchors[..i].iter().any(|other| other.pattern == anchor.pattern) {
                return Err(BridgeError::Config(format!("anchor #{i} is listed twice")));
            }
        }
        if self.meter.serial > MAX_BCD_SERIAL {
            return Err(BridgeError::Config(format!(
                "meter serial {} does not fit 8 BCD digits",
                self.meter.serial
            )));
        }
        if self.min_telegram_len == 0 {
            return Err(BridgeError::Config("min_telegram_len must be positive".into()));
        }
        self.rules.validate()
    }
}
