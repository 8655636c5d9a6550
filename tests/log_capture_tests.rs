//! Checks on what the pipeline writes to the log.
//!
//! Runs as its own test binary so the capturing logger is the only one
//! installed.

use std::sync::Mutex;

use log::{LevelFilter, Log, Metadata, Record};
use wmbus_ble_rs::bridge::wrapper::wrap;
use wmbus_ble_rs::{ExtractorConfig, Pipeline};

static RECORDS: Mutex<Vec<(log::Level, String)>> = Mutex::new(Vec::new());

struct CapturingLogger;

impl Log for CapturingLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if let Ok(mut records) = RECORDS.lock() {
            records.push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static LOGGER: CapturingLogger = CapturingLogger;

/// Tests that a notification of unrecognized length is reported once, as a
/// warning.
#[test]
fn test_unrecognized_length_logged_once() {
    log::set_logger(&LOGGER).unwrap();
    log::set_max_level(LevelFilter::Trace);

    let mut pipeline = Pipeline::new(&ExtractorConfig::default()).unwrap();
    let payload = wrap(&[0x11; 54]);
    assert_eq!(payload.len(), 62);
    pipeline.process_payload(&payload).unwrap();

    let records = RECORDS.lock().unwrap();
    let unrecognized: Vec<_> = records
        .iter()
        .filter(|(_, message)| message.contains("Unrecognized length"))
        .collect();
    assert_eq!(unrecognized.len(), 1, "{records:?}");
    assert_eq!(unrecognized[0].0, log::Level::Warn);
    assert!(unrecognized[0].1.contains("62 bytes"));
}
