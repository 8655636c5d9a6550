//! Notification → telegram pipeline.
//!
//! [`Pipeline`] ties the stateless stages together for a single consumer loop:
//! strip, extract, validate, count, log. The statistics and the log throttles
//! are the only state, and they never influence what gets extracted.

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::bridge::extractor::{Extraction, FrameExtractor};
use crate::bridge::notification::{parse_line, RawNotification};
use crate::bridge::output::TelegramSink;
use crate::bridge::rules::RuleId;
use crate::bridge::validator::{Rejection, Telegram, Validator};
use crate::bridge::wrapper;
use crate::config::ExtractorConfig;
use crate::error::{BridgeError, RejectReason};
use crate::log_warn_throttled;
use crate::util::logging::{log_frame_hex, log_frame_structured, ThrottleManager};

const THROTTLE_UNRECOGNIZED: &str = "unrecognized-length";
const THROTTLE_REJECTED: &str = "rejected";

/// Counters accumulated over the life of a pipeline.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractStats {
    pub notifications: u64,
    /// Notifications that yielded at least one telegram
    pub productive_notifications: u64,
    pub telegrams: u64,
    pub too_short: u64,
    pub bad_anchor: u64,
    pub id_mismatch: u64,
    pub length_byte_mismatch: u64,
    pub unrecognized_length: u64,
    pub incomplete_trailing: u64,
    /// Input lines that carried no notification
    pub skipped_lines: u64,
}

impl ExtractStats {
    pub fn record_rejection(&mut self, reason: RejectReason) {
        match reason {
            RejectReason::TooShort => self.too_short += 1,
            RejectReason::BadAnchor => self.bad_anchor += 1,
            RejectReason::IdMismatch => self.id_mismatch += 1,
            RejectReason::LengthByteMismatch => self.length_byte_mismatch += 1,
        }
    }

    pub fn rejected(&self) -> u64 {
        self.too_short + self.bad_anchor + self.id_mismatch + self.length_byte_mismatch
    }

    pub fn summary(&self) -> String {
        format!(
            "{} notifications -> {} telegrams ({} rejected, {} unrecognized length, {} incomplete trailing)",
            self.notifications,
            self.telegrams,
            self.rejected(),
            self.unrecognized_length,
            self.incomplete_trailing
        )
    }
}

/// Outcome of one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub rule_id: RuleId,
    pub had_wrapper: bool,
    pub telegrams: Vec<Telegram>,
    pub rejections: Vec<Rejection>,
    pub incomplete_trailing: bool,
}

/// Extractor, validator and bookkeeping for one stream of notifications.
#[derive(Debug)]
pub struct Pipeline {
    extractor: FrameExtractor,
    validator: Validator,
    stats: ExtractStats,
    throttles: ThrottleManager,
}

impl Pipeline {
    /// Build a pipeline after checking the configuration.
    pub fn new(config: &ExtractorConfig) -> Result<Self, BridgeError> {
        config.validate()?;
        Ok(Self {
            extractor: FrameExtractor::new(config),
            validator: Validator::new(config),
            stats: ExtractStats::default(),
            throttles: ThrottleManager::default(),
        })
    }

    pub fn extractor(&self) -> &FrameExtractor {
        &self.extractor
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn stats(&self) -> &ExtractStats {
        &self.stats
    }

    /// Process one notification.
    pub fn process(&mut self, notification: &RawNotification) -> Result<Outcome, BridgeError> {
        log_frame_hex(&format!("Notification from {}", notification.source_id), &notification.payload);

        let frame = wrapper::strip(&notification.payload);
        let extraction = self.extractor.extract_frame(&frame)?;
        Ok(self.settle(extraction, &notification.source_id))
    }

    /// Process a bare payload with no capture metadata.
    pub fn process_payload(&mut self, payload: &[u8]) -> Result<Outcome, BridgeError> {
        self.process(&RawNotification::new(payload.to_vec(), "-"))
    }

    fn settle(&mut self, extraction: Extraction, source: &str) -> Outcome {
        self.stats.notifications += 1;

        if extraction.rule_id.is_fallback() {
            self.stats.unrecognized_length += 1;
            log_warn_throttled!(
                self.throttles.throttle(THROTTLE_UNRECOGNIZED),
                "Unrecognized length: {} bytes from {}, using {}",
                extraction.declared_length,
                source,
                extraction.rule_id.rule.name()
            );
        }
        if extraction.incomplete_trailing {
            self.stats.incomplete_trailing += 1;
        }

        let mut outcome = Outcome {
            rule_id: extraction.rule_id,
            had_wrapper: extraction.had_wrapper,
            telegrams: Vec::new(),
            rejections: Vec::new(),
            incomplete_trailing: extraction.incomplete_trailing,
        };

        for candidate in extraction.candidates {
            match self.validator.validate(candidate) {
                Ok(telegram) => {
                    log::info!(
                        "Extracted {} telegram ({} bytes) via {} from {}",
                        telegram.frame_kind(),
                        telegram.len(),
                        telegram.rule_id(),
                        source
                    );
                    log_frame_structured(
                        "Telegram",
                        telegram.as_bytes(),
                        Some(&telegram.frame_kind().to_string()),
                        Some(source),
                    );
                    outcome.telegrams.push(telegram);
                }
                Err(rejection) => {
                    self.stats.record_rejection(rejection.reason);
                    log_warn_throttled!(
                        self.throttles.throttle(THROTTLE_REJECTED),
                        "Rejected candidate {}",
                        rejection
                    );
                    outcome.rejections.push(rejection);
                }
            }
        }

        if !outcome.telegrams.is_empty() {
            self.stats.productive_notifications += 1;
            self.stats.telegrams += outcome.telegrams.len() as u64;
        }
        outcome
    }

    /// Process notifications and hand every accepted telegram to `sink`.
    pub async fn run_notifications<I, S>(&mut self, notifications: I, sink: &mut S) -> Result<ExtractStats, BridgeError>
    where
        I: IntoIterator<Item = RawNotification>,
        S: TelegramSink + ?Sized,
    {
        for notification in notifications {
            let outcome = self.process(&notification)?;
            for telegram in &outcome.telegrams {
                sink.emit(telegram).await?;
            }
        }
        sink.flush().await?;
        log::info!("Summary: {}", self.stats.summary());
        Ok(self.stats.clone())
    }

    /// Read notification lines until EOF and hand every accepted telegram to
    /// `sink`.
    pub async fn run_lines<R, S>(&mut self, reader: R, source_id: &str, sink: &mut S) -> Result<ExtractStats, BridgeError>
    where
        R: AsyncBufRead + Unpin,
        S: TelegramSink + ?Sized,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let Some(payload) = parse_line(&line) else {
                self.stats.skipped_lines += 1;
                continue;
            };
            let outcome = self.process(&RawNotification::new(payload, source_id))?;
            for telegram in &outcome.telegrams {
                sink.emit(telegram).await?;
            }
        }
        sink.flush().await?;
        log::info!("Summary: {}", self.stats.summary());
        Ok(self.stats.clone())
    }
}
