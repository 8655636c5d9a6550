//! Capture analysis.
//!
//! Before rules are written for a new bridge firmware, its captures are
//! characterized: how many envelopes a notification holds, which header
//! patterns appear, how the sequence byte moves and which frame lengths
//! occur. [`find_envelopes`] splits a payload into envelopes (a capture can
//! hold several, and the last one may have lost its end delimiter) and
//! [`SessionAnalysis`] tallies them.
//!
//! [`TelegramFields`] breaks an accepted telegram into its link-layer fields.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::bridge::notification::RawNotification;
use crate::bridge::wrapper::EnvelopeHeader;
use crate::config::MeterAddress;
use crate::constants::{ENVELOPE_END, ENVELOPE_START, METER_ADDRESS_LEN, METER_ADDRESS_OFFSET, MIN_TELEGRAM_LEN};
use crate::util::hex::encode_hex_upper;

/// One envelope located inside a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeSpan<'a> {
    /// Offset of the start delimiter
    pub offset: usize,
    /// Bytes between the delimiters
    pub content: &'a [u8],
    /// `false` if no end delimiter followed; `content` then runs to the end
    pub complete: bool,
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// Locate every envelope in `data`, in order.
///
/// Envelopes with nothing between their delimiters are skipped.
pub fn find_envelopes(data: &[u8]) -> Vec<EnvelopeSpan<'_>> {
    let mut spans = Vec::new();
    let mut pos = 0;

    while let Some(found) = find(&data[pos..], &ENVELOPE_START) {
        let offset = pos + found;
        let content_start = offset + ENVELOPE_START.len();
        let (content_end, complete) = match find(&data[content_start..], &ENVELOPE_END) {
            Some(end) => (content_start + end, true),
            None => (data.len(), false),
        };

        let content = &data[content_start..content_end];
        if !content.is_empty() {
            spans.push(EnvelopeSpan {
                offset,
                content,
                complete,
            });
        }

        pos = if complete {
            content_end + ENVELOPE_END.len()
        } else {
            data.len()
        };
    }

    spans
}

/// Sequence bytes seen for one envelope type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceStats {
    pub samples: usize,
    values: BTreeSet<u8>,
}

impl SequenceStats {
    fn record(&mut self, sequence: u8) {
        self.samples += 1;
        self.values.insert(sequence);
    }

    pub fn unique(&self) -> usize {
        self.values.len()
    }

    pub fn min(&self) -> Option<u8> {
        self.values.first().copied()
    }

    pub fn max(&self) -> Option<u8> {
        self.values.last().copied()
    }
}

/// Counters over every envelope of a capture session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionAnalysis {
    pub notifications: usize,
    /// Notifications without any start delimiter
    pub unwrapped: usize,
    pub envelopes: usize,
    /// Envelopes whose end delimiter never arrived
    pub incomplete: usize,
    /// Envelopes with fewer than two content bytes
    pub too_short: usize,
    /// Header bytes (hex) → occurrences
    pub header_patterns: BTreeMap<String, usize>,
    /// Envelope type byte → sequence bytes seen with it
    pub sequences: BTreeMap<u8, SequenceStats>,
    /// Content length → occurrences
    pub lengths: BTreeMap<usize, usize>,
}

impl SessionAnalysis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_notifications<'a>(notifications: impl IntoIterator<Item = &'a RawNotification>) -> Self {
        let mut analysis = Self::new();
        for notification in notifications {
            analysis.add(notification);
        }
        analysis
    }

    pub fn add(&mut self, notification: &RawNotification) {
        self.add_payload(&notification.payload);
    }

    pub fn add_payload(&mut self, payload: &[u8]) {
        self.notifications += 1;

        let spans = find_envelopes(payload);
        if spans.is_empty() {
            self.unwrapped += 1;
            return;
        }

        for span in spans {
            self.add_envelope(&span);
        }
    }

    fn add_envelope(&mut self, span: &EnvelopeSpan<'_>) {
        self.envelopes += 1;
        if !span.complete {
            self.incomplete += 1;
        }
        *self.lengths.entry(span.content.len()).or_default() += 1;

        let Some(header) = EnvelopeHeader::parse(span.content) else {
            self.too_short += 1;
            return;
        };
        let pattern = encode_hex_upper(&span.content[..header.header_len()]);
        *self.header_patterns.entry(pattern).or_default() += 1;
        self.sequences
            .entry(header.kind.byte())
            .or_default()
            .record(header.sequence);
    }

    /// The most frequent header pattern, ties going to the lowest.
    pub fn dominant_header(&self) -> Option<(&str, usize)> {
        self.header_patterns
            .iter()
            .fold(None, |best: Option<(&str, usize)>, (pattern, &count)| match best {
                Some((_, top)) if top >= count => best,
                _ => Some((pattern.as_str(), count)),
            })
    }
}

impl fmt::Display for SessionAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Notifications: {} ({} without envelope)",
            self.notifications, self.unwrapped
        )?;
        writeln!(
            f,
            "Envelopes:     {} ({} unterminated, {} too short for header analysis)",
            self.envelopes, self.incomplete, self.too_short
        )?;

        writeln!(f, "Header patterns:")?;
        for (pattern, count) in &self.header_patterns {
            writeln!(f, "  {pattern}: {count}")?;
        }

        writeln!(f, "Sequence bytes:")?;
        for (kind, stats) in &self.sequences {
            match (stats.min(), stats.max()) {
                (Some(min), Some(max)) if stats.samples > 1 => writeln!(
                    f,
                    "  type 0x{kind:02X}: {} samples, {} unique values (0x{min:02X} to 0x{max:02X})",
                    stats.samples,
                    stats.unique()
                )?,
                (Some(only), _) => writeln!(f, "  type 0x{kind:02X}: 1 sample (0x{only:02X})")?,
                _ => {}
            }
        }

        writeln!(f, "Frame lengths:")?;
        for (len, count) in &self.lengths {
            writeln!(f, "  {len} bytes: {count}")?;
        }
        Ok(())
    }
}

/// Three-letter manufacturer code packed into the M-field.
pub fn manufacturer_code(id: u16) -> String {
    [10u16, 5, 0]
        .iter()
        .map(|shift| char::from(((id >> shift) & 0x1F) as u8 + b'A' - 1))
        .collect()
}

/// Link-layer fields at the start of a wM-Bus telegram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelegramFields {
    pub length: u8,
    pub control: u8,
    pub manufacturer: u16,
    pub address: [u8; METER_ADDRESS_LEN],
    /// CI-field, absent if the telegram ends after the address
    pub control_info: Option<u8>,
    /// Bytes following the CI-field
    pub payload_len: usize,
}

impl TelegramFields {
    /// Split `bytes` into L, C, M, A and CI; `None` below ten bytes.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < MIN_TELEGRAM_LEN {
            return None;
        }
        let mut address = [0u8; METER_ADDRESS_LEN];
        address.copy_from_slice(&bytes[METER_ADDRESS_OFFSET..METER_ADDRESS_OFFSET + METER_ADDRESS_LEN]);
        let ci_offset = METER_ADDRESS_OFFSET + METER_ADDRESS_LEN;

        Some(Self {
            length: bytes[0],
            control: bytes[1],
            manufacturer: u16::from_le_bytes([bytes[2], bytes[3]]),
            address,
            control_info: bytes.get(ci_offset).copied(),
            payload_len: bytes.len().saturating_sub(ci_offset + 1),
        })
    }

    pub fn manufacturer_code(&self) -> String {
        manufacturer_code(self.manufacturer)
    }

    /// The A-field decoded; `None` if the serial is not BCD.
    pub fn meter(&self) -> Option<MeterAddress> {
        MeterAddress::from_wire(&self.address)
    }
}

impl fmt::Display for TelegramFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "L=0x{:02X} C=0x{:02X} M={} (0x{:04X}) A=",
            self.length,
            self.control,
            self.manufacturer_code(),
            self.manufacturer
        )?;
        match self.meter() {
            Some(meter) => write!(f, "{meter}")?,
            None => write!(f, "{}", encode_hex_upper(&self.address))?,
        }
        match self.control_info {
            Some(ci) => write!(f, " CI=0x{ci:02X} payload {} bytes", self.payload_len),
            None => write!(f, " CI=none"),
        }
    }
}
