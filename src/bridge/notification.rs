//! Raw notifications and the text formats they arrive in.
//!
//! Notifications reach the pipeline either live (one BLE notification per
//! line on stdin, from the capture tool) or replayed from a session log
//! written by the capture tool. Both are converted to [`RawNotification`].

use bytes::Bytes;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while_m_n},
    character::complete::{char, hex_digit1},
    combinator::all_consuming,
    sequence::{delimited, tuple},
    IResult,
};
use serde::{Deserialize, Serialize};

use crate::error::BridgeError;
use crate::util::hex::{decode_hex, encode_hex_upper};

/// One BLE notification as received from the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawNotification {
    pub payload: Bytes,
    pub received_at: DateTime<Utc>,
    /// Originating device and/or characteristic
    pub source_id: String,
}

impl RawNotification {
    /// A notification received now.
    pub fn new(payload: impl Into<Bytes>, source_id: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            received_at: Utc::now(),
            source_id: source_id.into(),
        }
    }

    pub fn with_received_at(mut self, received_at: DateTime<Utc>) -> Self {
        self.received_at = received_at;
        self
    }

    pub fn from_hex(hex: &str, source_id: impl Into<String>) -> Result<Self, BridgeError> {
        Ok(Self::new(decode_hex(hex)?, source_id))
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn to_hex(&self) -> String {
        encode_hex_upper(&self.payload)
    }
}

fn telegram_field(input: &str) -> IResult<&str, &str> {
    let (input, _) = tag("telegram=")(input)?;
    alt((
        delimited(tag("||"), hex_digit1, tag("||")),
        delimited(tag("|"), hex_digit1, tag("|")),
    ))(input)
}

fn bare_hex(input: &str) -> IResult<&str, &str> {
    all_consuming(hex_digit1)(input)
}

fn digits<'a>(n: usize) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    take_while_m_n(n, n, |c: char| c.is_ascii_digit())
}

fn date_prefix(input: &str) -> IResult<&str, (&str, char, &str, char)> {
    tuple((digits(4), char('-'), digits(2), char('-')))(input)
}

/// Log output of the capture tool that echoes telegrams we will also see as
/// data lines.
fn is_log_echo(line: &str) -> bool {
    line.contains("INFO") || date_prefix(line).is_ok()
}

/// Extract the payload bytes from one input line.
///
/// Accepts `telegram=|HEX|`, the legacy `telegram=||HEX||` (anywhere in the
/// line) and lines consisting of hex only. Everything else, including odd-length
/// hex, yields `None`.
pub fn parse_line(line: &str) -> Option<Vec<u8>> {
    let line = line.trim();
    if line.is_empty() || is_log_echo(line) {
        return None;
    }

    let hex = match line.find("telegram=") {
        Some(pos) => telegram_field(&line[pos..]).ok()?.1,
        None => bare_hex(line).ok()?.1,
    };

    match decode_hex(hex) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            log::debug!("Ignoring line with undecodable hex: {e}");
            None
        }
    }
}

/// One notification as written by the capture tool's session log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(alias = "ts")]
    pub timestamp: Option<String>,
    pub device_name: Option<String>,
    pub device_address: Option<String>,
    pub characteristic_uuid: Option<String>,
    pub data_length: Option<usize>,
    pub raw_hex: String,
    pub raw_ascii: Option<String>,
}

impl SessionRecord {
    /// `address/characteristic`, falling back to whatever identifies the device.
    pub fn source_id(&self) -> String {
        let device = self
            .device_address
            .as_deref()
            .or(self.device_name.as_deref())
            .unwrap_or("session");
        match &self.characteristic_uuid {
            Some(uuid) => format!("{device}/{uuid}"),
            None => device.to_string(),
        }
    }

    pub fn into_notification(self) -> Result<RawNotification, BridgeError> {
        let payload = decode_hex(&self.raw_hex)?;
        if let Some(expected) = self.data_length {
            if expected != payload.len() {
                log::warn!(
                    "Session record claims {} bytes but carries {}",
                    expected,
                    payload.len()
                );
            }
        }

        let mut notification = RawNotification::new(payload, self.source_id());
        match self.timestamp.as_deref().and_then(parse_timestamp) {
            Some(at) => notification.received_at = at,
            None => log::debug!("Session record without usable timestamp: {:?}", self.timestamp),
        }
        Ok(notification)
    }
}

/// RFC 3339, or the naive ISO form Python's `isoformat()` writes (taken as UTC).
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[derive(Deserialize)]
struct CaptureDocument {
    frames: Vec<SessionRecord>,
}

/// Read a session log: either one JSON record per line, or a capture summary
/// document with a `frames` array. Malformed records are skipped with a warning.
pub fn parse_session(text: &str) -> Vec<RawNotification> {
    if text.trim_start().starts_with('{') {
        if let Ok(document) = serde_json::from_str::<CaptureDocument>(text) {
            return document
                .frames
                .into_iter()
                .enumerate()
                .filter_map(|(i, record)| keep_valid(i + 1, record.into_notification()))
                .collect();
        }
    }

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(i, line)| {
            let record = serde_json::from_str::<SessionRecord>(line)
                .map_err(|e| BridgeError::InvalidRecord(e.to_string()))
                .and_then(SessionRecord::into_notification);
            keep_valid(i + 1, record)
        })
        .collect()
}

fn keep_valid(index: usize, record: Result<RawNotification, BridgeError>) -> Option<RawNotification> {
    match record {
        Ok(notification) => Some(notification),
        Err(e) => {
            log::warn!("Skipping session record {index}: {e}");
            None
        }
    }
}
