mod common;

use std::io::Write;

use common::{compact_frame, full_frame, wrapped_notification};
use tempfile::NamedTempFile;
use wmbus_ble_rs::bridge::{parse_session, CollectingSink, LineSink, TelegramFormat};
use wmbus_ble_rs::{ExtractorConfig, Pipeline, RawNotification};

fn input_lines() -> String {
    let wrapped = wrapped_notification(&[&[0x11, 0x02], &full_frame(0x01), &compact_frame(0x02)], 244);
    format!(
        "2024-05-01 12:00:00 INFO connected\n\
         telegram=|{}|\n\
         \n\
         not a notification\n\
         {}\n\
         telegram=||{}||\n",
        common::to_hex(&wrapped),
        common::VW1871_STRIPPED_HEX,
        common::to_hex(&[0x00; 30]),
    )
}

/// Tests that line input yields telegrams and skips noise lines.
#[tokio::test]
async fn test_run_lines_collects_telegrams() {
    let mut pipeline = Pipeline::new(&ExtractorConfig::default()).unwrap();
    let mut sink = CollectingSink::default();

    let stats = pipeline
        .run_lines(input_lines().as_bytes(), "test", &mut sink)
        .await
        .unwrap();

    assert_eq!(sink.telegrams.len(), 3);
    assert_eq!(sink.telegrams[0].as_bytes(), full_frame(0x01).as_slice());
    assert_eq!(sink.telegrams[1].as_bytes(), compact_frame(0x02).as_slice());
    assert_eq!(sink.telegrams[2].to_hex(), common::VW1871_COMPACT_TELEGRAM_HEX);

    assert_eq!(stats.notifications, 3);
    assert_eq!(stats.productive_notifications, 2);
    assert_eq!(stats.telegrams, 3);
    assert_eq!(stats.skipped_lines, 3);
    assert_eq!(stats.unrecognized_length, 2);
    assert_eq!(stats.rejected(), 0);
}

/// Tests that each output format frames the telegram hex as expected.
#[tokio::test]
async fn test_line_sink_formats() {
    let cases = [
        (TelegramFormat::Pipe, format!("telegram=|{}|\n", common::VW1871_COMPACT_TELEGRAM_HEX)),
        (TelegramFormat::DoublePipe, format!("telegram=||{}||\n", common::VW1871_COMPACT_TELEGRAM_HEX)),
        (TelegramFormat::Bare, format!("{}\n", common::VW1871_COMPACT_TELEGRAM_HEX)),
    ];

    for (format, expected) in cases {
        let mut pipeline = Pipeline::new(&ExtractorConfig::default()).unwrap();
        let mut sink = LineSink::new(Vec::new(), format);
        let input = format!("{}\n", common::VW1871_STRIPPED_HEX);

        pipeline.run_lines(input.as_bytes(), "test", &mut sink).await.unwrap();

        assert_eq!(sink.written(), 1);
        assert_eq!(String::from_utf8(sink.into_inner()).unwrap(), expected);
    }
}

/// Tests that a session log is replayed, skipping malformed records.
#[tokio::test]
async fn test_replay_session_log() {
    let wrapped = wrapped_notification(&[&compact_frame(0x0A), &compact_frame(0x0B)], 244);
    let log = format!(
        concat!(
            r#"{{"timestamp": "2025-03-02T10:15:30.123456", "device_name": "VW1871", "device_address": "AA:BB:CC:DD:EE:FF", "characteristic_uuid": "0000fff1", "data_length": 244, "raw_hex": "{}"}}"#,
            "\n",
            r#"{{"timestamp": "garbage", "raw_hex": "ABC"}}"#,
            "\n",
            r#"{{"ts": "2025-03-02T10:15:31Z", "raw_hex": "{}"}}"#,
            "\n"
        ),
        common::to_hex(&wrapped),
        common::VW1871_STRIPPED_HEX
    );

    let notifications = parse_session(&log);
    assert_eq!(notifications.len(), 2);
    assert_eq!(notifications[0].source_id, "AA:BB:CC:DD:EE:FF/0000fff1");
    assert_eq!(notifications[1].source_id, "session");

    let mut pipeline = Pipeline::new(&ExtractorConfig::default()).unwrap();
    let mut sink = CollectingSink::default();
    let stats = pipeline.run_notifications(notifications, &mut sink).await.unwrap();

    assert_eq!(stats.telegrams, 3);
    assert_eq!(sink.telegrams[0].rule_id().to_string(), "244:multi_frame_scan");
    assert_eq!(sink.telegrams[2].rule_id().to_string(), "fallback:multi_frame_scan");
}

/// Tests that a configuration file can target a different meter.
#[tokio::test]
async fn test_config_file_for_other_meter() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{ "meter": {{ "serial": 11223344, "version": 31, "device_type": 22 }} }}"#
    )
    .unwrap();

    let config = ExtractorConfig::from_file(file.path()).unwrap();
    assert_eq!(config.meter.serial, 11_223_344);

    let mut pipeline = Pipeline::new(&config).unwrap();
    let mut sink = CollectingSink::default();
    let notification = RawNotification::from_hex(common::VW1871_STRIPPED_HEX, "test").unwrap();
    let stats = pipeline.run_notifications(vec![notification], &mut sink).await.unwrap();

    assert!(sink.telegrams.is_empty());
    assert_eq!(stats.id_mismatch, 1);
    assert_eq!(stats.productive_notifications, 0);
}

/// Tests that a configuration file without anchors is rejected.
#[test]
fn test_invalid_config_file_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{ "anchors": [] }}"#).unwrap();
    assert!(ExtractorConfig::from_file(file.path()).is_err());
}

/// Tests that rejections are counted per reason in the stats.
#[test]
fn test_rejections_are_counted_per_reason() {
    let mut bad_length = compact_frame(0x00);
    bad_length[0] = 40;
    let mut other_meter = compact_frame(0x00);
    other_meter[5] = 0x99;

    let payload = wrapped_notification(&[&bad_length, &other_meter, &full_frame(0x03)], 244);
    let mut pipeline = Pipeline::new(&ExtractorConfig::default()).unwrap();
    let outcome = pipeline.process_payload(&payload).unwrap();

    // The corrupted L-field breaks the first anchor, so the scan never sees it
    assert_eq!(outcome.telegrams.len(), 1);
    assert_eq!(outcome.rejections.len(), 1);

    let stats = pipeline.stats();
    assert_eq!(stats.id_mismatch, 1);
    assert_eq!(stats.length_byte_mismatch, 0);
    assert_eq!(stats.telegrams, 1);
}

/// Tests that the stats serialize to JSON.
#[test]
fn test_stats_serialize_to_json() {
    let mut pipeline = Pipeline::new(&ExtractorConfig::default()).unwrap();
    pipeline.process_payload(&[0x00; 96]).unwrap();

    let json = serde_json::to_value(pipeline.stats()).unwrap();
    assert_eq!(json["notifications"], 1);
    assert_eq!(json["telegrams"], 0);
    assert_eq!(json["unrecognized_length"], 0);
}
