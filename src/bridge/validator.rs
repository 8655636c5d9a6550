//! Candidate validation.
//!
//! A candidate becomes a [`Telegram`] only if it is long enough, its L-field
//! matches its size, it starts with a known anchor and it carries the target
//! meter's address right after that anchor. Checks run in that order and the
//! first failure decides the [`RejectReason`].

use std::fmt;

use crate::bridge::analysis::TelegramFields;
use crate::bridge::anchor::{self, AnchorPattern, FrameKind};
use crate::bridge::extractor::CandidateTelegram;
use crate::bridge::rules::RuleId;
use crate::config::{ExtractorConfig, MeterAddress};
use crate::constants::METER_ADDRESS_LEN;
use crate::error::RejectReason;
use crate::util::hex::encode_hex_upper;

/// A validated wM-Bus telegram.
///
/// Only [`Validator::validate`] creates these, so `bytes[0] == len - 1` always
/// holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Telegram {
    bytes: Vec<u8>,
    frame_kind: FrameKind,
    rule_id: RuleId,
    offset: usize,
}

impl Telegram {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The L-field: number of bytes following it.
    pub fn length_field(&self) -> u8 {
        self.bytes[0]
    }

    pub fn frame_kind(&self) -> FrameKind {
        self.frame_kind
    }

    pub fn rule_id(&self) -> RuleId {
        self.rule_id
    }

    /// Position of the telegram inside the notification payload.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Uppercase hex, as handed to the downstream decoder.
    pub fn to_hex(&self) -> String {
        encode_hex_upper(&self.bytes)
    }

    pub fn fields(&self) -> Option<TelegramFields> {
        TelegramFields::parse(&self.bytes)
    }
}

impl AsRef<[u8]> for Telegram {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// A discarded candidate and the reason it was discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub reason: RejectReason,
    pub candidate: CandidateTelegram,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head = &self.candidate.bytes[..self.candidate.len().min(8)];
        write!(
            f,
            "{}: {} bytes at offset {} from {} ({}...)",
            self.reason,
            self.candidate.len(),
            self.candidate.offset,
            self.candidate.rule_id,
            encode_hex_upper(head)
        )
    }
}

/// Structural and content checks for candidate telegrams.
#[derive(Debug, Clone)]
pub struct Validator {
    anchors: Vec<AnchorPattern>,
    meter: MeterAddress,
    meter_field: [u8; METER_ADDRESS_LEN],
    min_len: usize,
}

impl Validator {
    pub fn new(config: &ExtractorConfig) -> Self {
        Self {
            anchors: config.anchors.clone(),
            meter: config.meter,
            meter_field: config.meter.wire_bytes(),
            min_len: config.min_telegram_len,
        }
    }

    pub fn meter(&self) -> MeterAddress {
        self.meter
    }

    /// Run all checks on raw bytes; returns the kind of the matching anchor.
    ///
    /// The L-field is checked before the anchor: the anchors embed the L-field
    /// of their frame size, so a wrong length would otherwise surface as an
    /// unknown anchor.
    pub fn check(&self, bytes: &[u8]) -> Result<FrameKind, RejectReason> {
        if bytes.len() < self.min_len {
            return Err(RejectReason::TooShort);
        }
        let Some((&l_field, rest)) = bytes.split_first() else {
            return Err(RejectReason::TooShort);
        };
        if usize::from(l_field) != rest.len() {
            return Err(RejectReason::LengthByteMismatch);
        }
        let anchor = anchor::leading_anchor(bytes, &self.anchors).ok_or(RejectReason::BadAnchor)?;
        let field = bytes
            .get(anchor.len()..anchor.len() + METER_ADDRESS_LEN)
            .ok_or(RejectReason::IdMismatch)?;
        if field != self.meter_field {
            return Err(RejectReason::IdMismatch);
        }
        Ok(anchor.kind)
    }

    /// Promote a candidate to a telegram or explain why not.
    pub fn validate(&self, candidate: CandidateTelegram) -> Result<Telegram, Rejection> {
        match self.check(&candidate.bytes) {
            Ok(frame_kind) => Ok(Telegram {
                frame_kind,
                rule_id: candidate.rule_id,
                offset: candidate.offset,
                bytes: candidate.bytes,
            }),
            Err(reason) => Err(Rejection { reason, candidate }),
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(&ExtractorConfig::default())
    }
}
