//! Frame extraction.
//!
//! [`FrameExtractor`] selects a rule from the notification's total length and
//! cuts candidate telegrams out of the payload. It never fails on bad data:
//! a notification that yields nothing produces an empty [`Extraction`]. The
//! only error is a rule table that has no answer for a length at all.
//!
//! The extractor holds no mutable state, so one instance can serve any number
//! of threads.

use crate::bridge::anchor::{self, AnchorPattern, FrameKind};
use crate::bridge::rules::{ExtractionRule, RuleId, RuleTable};
use crate::bridge::wrapper::{self, WrappedFrame};
use crate::config::ExtractorConfig;
use crate::error::BridgeError;

/// A byte string cut out by a rule, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateTelegram {
    pub bytes: Vec<u8>,
    pub rule_id: RuleId,
    pub frame_kind: FrameKind,
    /// Position of the first byte inside the notification payload
    pub offset: usize,
}

impl CandidateTelegram {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Byte range inside the notification payload.
    pub fn span(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.bytes.len()
    }
}

/// Result of running one notification through the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub rule_id: RuleId,
    pub declared_length: usize,
    pub had_wrapper: bool,
    pub candidates: Vec<CandidateTelegram>,
    /// An anchor was found whose window ran past the end of the buffer
    pub incomplete_trailing: bool,
}

impl Extraction {
    fn new(rule_id: RuleId, frame: &WrappedFrame<'_>) -> Self {
        Self {
            rule_id,
            declared_length: frame.declared_length(),
            had_wrapper: frame.had_wrapper,
            candidates: Vec::new(),
            incomplete_trailing: false,
        }
    }
}

/// Length-keyed telegram extractor.
#[derive(Debug, Clone)]
pub struct FrameExtractor {
    rules: RuleTable,
    anchors: Vec<AnchorPattern>,
}

impl FrameExtractor {
    pub fn new(config: &ExtractorConfig) -> Self {
        Self {
            rules: config.rules.clone(),
            anchors: config.anchors.clone(),
        }
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn anchors(&self) -> &[AnchorPattern] {
        &self.anchors
    }

    /// Strip the envelope from `payload` and extract candidates from it.
    pub fn extract(&self, payload: &[u8]) -> Result<Extraction, BridgeError> {
        self.extract_frame(&wrapper::strip(payload))
    }

    /// Extract candidates from an already stripped notification.
    pub fn extract_frame(&self, frame: &WrappedFrame<'_>) -> Result<Extraction, BridgeError> {
        let rule_id = self.rules.rule_for(frame.declared_length())?;
        let mut extraction = Extraction::new(rule_id, frame);

        match rule_id.rule {
            ExtractionRule::SingleFrame { min_core_len } => {
                self.single_frame(frame, min_core_len, &mut extraction)
            }
            ExtractionRule::OffsetTrim { prefix, suffix } => {
                self.offset_trim(frame, prefix, suffix, &mut extraction)
            }
            ExtractionRule::MultiFrameScan => self.scan(frame, &mut extraction),
        }

        Ok(extraction)
    }

    /// The core is the frame when the envelope was present; an unwrapped
    /// payload is only taken if an anchor shows up somewhere in it.
    fn single_frame(&self, frame: &WrappedFrame<'_>, min_core_len: usize, out: &mut Extraction) {
        let core = frame.core;
        if core.len() < min_core_len {
            log::debug!(
                "Core too short for single frame: {} bytes, need {}",
                core.len(),
                min_core_len
            );
            return;
        }
        if !frame.had_wrapper && !anchor::contains_any(core, &self.anchors) {
            log::debug!("Unwrapped {}-byte notification has no anchor", core.len());
            return;
        }
        out.candidates.push(CandidateTelegram {
            bytes: core.to_vec(),
            rule_id: out.rule_id,
            frame_kind: anchor::classify(core, &self.anchors),
            offset: frame.core_offset(),
        });
    }

    /// Trims are measured on the original payload, envelope included.
    fn offset_trim(&self, frame: &WrappedFrame<'_>, prefix: usize, suffix: usize, out: &mut Extraction) {
        let payload = frame.payload;
        match prefix.checked_add(suffix) {
            Some(trimmed) if trimmed < payload.len() => {}
            _ => return,
        }
        let trimmed = &payload[prefix..payload.len() - suffix];
        if !anchor::contains_any(trimmed, &self.anchors) {
            log::debug!("Offset-trimmed frame ({} bytes) has no anchor", trimmed.len());
            return;
        }
        out.candidates.push(CandidateTelegram {
            bytes: trimmed.to_vec(),
            rule_id: out.rule_id,
            frame_kind: anchor::classify(trimmed, &self.anchors),
            offset: prefix,
        });
    }

    /// Cut non-overlapping anchor windows left to right. A window that would
    /// run past the end of the core ends the scan.
    fn scan(&self, frame: &WrappedFrame<'_>, out: &mut Extraction) {
        let core = frame.core;
        let mut cursor = 0;

        while let Some(found) = anchor::find_first(core, &self.anchors, cursor) {
            let end = found.window_end();
            if end > core.len() {
                log::debug!(
                    "Incomplete trailing frame: {} anchor at offset {} needs {} bytes, {} left",
                    found.anchor.kind,
                    found.offset,
                    found.anchor.window,
                    core.len() - found.offset
                );
                out.incomplete_trailing = true;
                break;
            }
            out.candidates.push(CandidateTelegram {
                bytes: core[found.offset..end].to_vec(),
                rule_id: out.rule_id,
                frame_kind: found.anchor.kind,
                offset: frame.core_offset() + found.offset,
            });
            cursor = end;
        }
    }
}

impl Default for FrameExtractor {
    fn default() -> Self {
        Self::new(&ExtractorConfig::default())
    }
}
