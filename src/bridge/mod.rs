//! # BLE Bridge Telegram Recovery
//!
//! The VW1871 concentrator repeats wM-Bus radio traffic as BLE notifications.
//! Depending on the notification size it wraps, truncates, pads or
//! concatenates the telegrams. This module recovers them:
//!
//! 1. [`wrapper::strip`] removes the `FBFBFBF0 … FEFE0E0F` envelope if present.
//! 2. [`FrameExtractor`] picks a rule by the *total* notification length and
//!    cuts candidate telegrams out.
//! 3. [`Validator`] keeps only candidates with a consistent L-field, a known
//!    anchor and the target meter's address.
//!
//! ```rust
//! use wmbus_ble_rs::bridge::{FrameExtractor, Validator};
//!
//! let extractor = FrameExtractor::default();
//! let validator = Validator::default();
//!
//! let extraction = extractor.extract(&[0u8; 62]).unwrap();
//! let telegrams: Vec<_> = extraction
//!     .candidates
//!     .into_iter()
//!     .filter_map(|c| validator.validate(c).ok())
//!     .collect();
//! assert!(telegrams.is_empty());
//! ```

pub mod analysis;
pub mod anchor;
pub mod extractor;
pub mod notification;
pub mod output;
pub mod pipeline;
pub mod rules;
pub mod validator;
pub mod wrapper;

pub use analysis::{find_envelopes, EnvelopeSpan, SessionAnalysis, TelegramFields};
pub use anchor::{AnchorPattern, FrameKind};
pub use extractor::{CandidateTelegram, Extraction, FrameExtractor};
pub use notification::{parse_line, parse_session, RawNotification, SessionRecord};
pub use output::{CollectingSink, LineSink, TelegramFormat, TelegramSink};
pub use pipeline::{ExtractStats, Outcome, Pipeline};
pub use rules::{ExtractionRule, RuleId, RuleSource, RuleTable};
pub use validator::{Rejection, Telegram, Validator};
pub use wrapper::{strip, EnvelopeHeader, EnvelopeType, WrappedFrame};
