//! Envelope stripping.
//!
//! Wrapped notifications look like:
//!
//! ```text
//! FB FB FB F0 | header bytes | wM-Bus telegram (often truncated) | FE FE 0E 0F
//! ```
//!
//! Some firmware versions send the payload without the envelope. Both are
//! normal; [`strip`] reports which one it saw and never fails.

use crate::constants::{ENVELOPE_END, ENVELOPE_OVERHEAD, ENVELOPE_START, ENVELOPE_TYPE_EXTENDED, ENVELOPE_TYPE_STANDARD};

/// A notification payload with its envelope removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrappedFrame<'a> {
    /// The full payload as received
    pub payload: &'a [u8],
    /// Payload without the envelope, or the whole payload if none was found
    pub core: &'a [u8],
    pub had_wrapper: bool,
}

impl WrappedFrame<'_> {
    /// Total notification length; this, not the core length, selects the rule.
    pub fn declared_length(&self) -> usize {
        self.payload.len()
    }

    /// Offset of `core` inside `payload`.
    pub fn core_offset(&self) -> usize {
        if self.had_wrapper {
            ENVELOPE_START.len()
        } else {
            0
        }
    }
}

/// Remove the envelope delimiters if both are present.
///
/// The payload must be longer than the two delimiters together; an 8-byte
/// `FBFBFBF0FEFE0E0F` is left untouched rather than stripped to nothing.
pub fn strip(payload: &[u8]) -> WrappedFrame<'_> {
    let wrapped = payload.len() > ENVELOPE_OVERHEAD
        && payload.starts_with(&ENVELOPE_START)
        && payload.ends_with(&ENVELOPE_END);

    let core = if wrapped {
        &payload[ENVELOPE_START.len()..payload.len() - ENVELOPE_END.len()]
    } else {
        payload
    };

    WrappedFrame {
        payload,
        core,
        had_wrapper: wrapped,
    }
}

/// Surround `core` with the envelope delimiters.
pub fn wrap(core: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(core.len() + ENVELOPE_OVERHEAD);
    out.extend_from_slice(&ENVELOPE_START);
    out.extend_from_slice(core);
    out.extend_from_slice(&ENVELOPE_END);
    out
}

/// Envelope type announced by the first core byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeType {
    Standard,
    Extended,
    Unknown(u8),
}

impl From<u8> for EnvelopeType {
    fn from(byte: u8) -> Self {
        match byte {
            ENVELOPE_TYPE_STANDARD => EnvelopeType::Standard,
            ENVELOPE_TYPE_EXTENDED => EnvelopeType::Extended,
            other => EnvelopeType::Unknown(other),
        }
    }
}

impl EnvelopeType {
    /// The type byte as sent by the bridge.
    pub fn byte(&self) -> u8 {
        match self {
            EnvelopeType::Standard => ENVELOPE_TYPE_STANDARD,
            EnvelopeType::Extended => ENVELOPE_TYPE_EXTENDED,
            EnvelopeType::Unknown(byte) => *byte,
        }
    }
}

/// Bridge header found right after the start delimiter.
///
/// Standard envelopes carry two header bytes (type, sequence); others carry a
/// third byte whose meaning is unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeHeader {
    pub kind: EnvelopeType,
    pub sequence: u8,
    pub extra: Option<u8>,
}

impl EnvelopeHeader {
    /// Parse the header at the start of a stripped core.
    pub fn parse(core: &[u8]) -> Option<Self> {
        match core {
            [ENVELOPE_TYPE_STANDARD, sequence, _, ..] => Some(Self {
                kind: EnvelopeType::Standard,
                sequence: *sequence,
                extra: None,
            }),
            [kind, sequence, extra, _, ..] => Some(Self {
                kind: EnvelopeType::from(*kind),
                sequence: *sequence,
                extra: Some(*extra),
            }),
            [kind, sequence] | [kind, sequence, _] => Some(Self {
                kind: EnvelopeType::from(*kind),
                sequence: *sequence,
                extra: None,
            }),
            _ => None,
        }
    }

    /// Number of core bytes taken by the header.
    pub fn header_len(&self) -> usize {
        if self.extra.is_some() {
            3
        } else {
            2
        }
    }
}
