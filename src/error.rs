//! # Bridge Error Handling
//!
//! This module defines the BridgeError enum, which represents the hard failures
//! that can occur in the wmbus-ble-rs crate.
//!
//! Malformed or incomplete notifications are not errors: the extractor returns an
//! empty result for them and the validator records a [`RejectReason`]. Only
//! configuration defects and I/O at the edges propagate as `Err`.

use thiserror::Error;

/// Represents the different error types that can occur in the crate.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The rule table has neither an entry nor a fallback for a declared length.
    #[error("No extraction rule for declared length {0} bytes")]
    NoRule(usize),

    /// Indicates an invalid extractor configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Indicates an invalid hexadecimal string was provided.
    #[error("Invalid hexadecimal string: {0}")]
    InvalidHexString(String),

    /// Indicates a malformed session log record.
    #[error("Invalid session record: {0}")]
    InvalidRecord(String),

    /// I/O failure while reading notifications or writing telegrams.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A catch‑all error for uncategorized cases.
    #[error("Other error: {0}")]
    Other(String),
}

/// Why the validator discarded a candidate telegram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RejectReason {
    /// Fewer bytes than the configured minimum.
    TooShort,
    /// Does not begin with a recognized anchor pattern.
    BadAnchor,
    /// Address field does not carry the target meter.
    IdMismatch,
    /// L-field disagrees with the number of bytes that follow it.
    LengthByteMismatch,
}

impl RejectReason {
    /// Stable reason code used in logs and statistics.
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::TooShort => "too-short",
            RejectReason::BadAnchor => "bad-anchor",
            RejectReason::IdMismatch => "id-mismatch",
            RejectReason::LengthByteMismatch => "length-byte-mismatch",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
