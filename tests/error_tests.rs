//! Tests for the `BridgeError` and `RejectReason` display formats.

use wmbus_ble_rs::util::hex::{decode_hex, HexError};
use wmbus_ble_rs::{BridgeError, RejectReason};

/// Tests that the `NoRule` variant names the declared length.
#[test]
fn test_no_rule_error() {
    let err = BridgeError::NoRule(62);
    assert_eq!(err.to_string(), "No extraction rule for declared length 62 bytes");
}

/// Tests that the `Config` variant is correctly formatted.
#[test]
fn test_config_error() {
    let err = BridgeError::Config("anchor #0 is empty".to_string());
    assert_eq!(err.to_string(), "Invalid configuration: anchor #0 is empty");
}

/// Hex errors convert into `InvalidHexString`.
#[test]
fn test_hex_error_conversion() {
    let err: BridgeError = decode_hex("ABC").unwrap_err().into();
    assert!(matches!(err, BridgeError::InvalidHexString(_)));
    assert_eq!(err.to_string(), format!("Invalid hexadecimal string: {}", HexError::OddLength(3)));
}

/// I/O and JSON errors convert through `?`.
#[test]
fn test_from_conversions() {
    let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
    assert!(matches!(BridgeError::from(io), BridgeError::Io(_)));

    let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    assert!(BridgeError::from(json).to_string().starts_with("JSON error: "));
}

/// Reject reasons have stable codes for logs and statistics.
#[test]
fn test_reject_reason_codes() {
    let codes: Vec<_> = [
        RejectReason::TooShort,
        RejectReason::BadAnchor,
        RejectReason::IdMismatch,
        RejectReason::LengthByteMismatch,
    ]
    .iter()
    .map(|r| r.to_string())
    .collect();
    assert_eq!(codes, ["too-short", "bad-anchor", "id-mismatch", "length-byte-mismatch"]);
}
