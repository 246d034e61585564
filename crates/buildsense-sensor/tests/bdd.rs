//! BDD-style scenario tests for the sensor runtime.

use std::path::PathBuf;

use anyhow::Result;
use buildsense_client::{MemoryClient, SpoolClient, TelemetryClient};
use buildsense_report::{JunitFormat, ParseContext};
use buildsense_sensor::{
    ReportSensor, Sensor, SensorSettings, execute, process_reports, report_files, transmit,
};
use buildsense_types::{SensorDataType, SensorRecord, keys};

const SUITE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuite name="org.demo.CalcTest" tests="2">
  <testcase name="adds" time="0.012"/>
  <testcase name="divides" time="0.3">
    <failure message="expected 2 but was 3"/>
  </testcase>
</testsuite>
"#;

fn settings(fail_on_error: bool) -> SensorSettings {
    SensorSettings {
        fail_on_error,
        retry_wait_secs: 0,
        ..SensorSettings::default()
    }
}

fn junit_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("TEST-CalcTest.xml"), SUITE).unwrap();
    std::fs::write(dir.path().join("TEST-Broken.xml"), "<testsuite name=").unwrap();
    std::fs::write(dir.path().join("notes.txt"), "not a report").unwrap();
    dir
}

// ── Scenario: report processing ──────────────────────────────────────

#[test]
fn given_directory_when_expanding_then_only_matching_files_are_taken() {
    let dir = junit_dir();
    let files = report_files(&[dir.path().to_path_buf()], ".xml").unwrap();
    assert_eq!(files.len(), 2);
    assert!(files.iter().all(|f| f.extension().is_some_and(|e| e == "xml")));
}

#[test]
fn given_missing_path_when_expanding_then_error() {
    let err = report_files(&[PathBuf::from("/definitely/not/here")], ".xml").unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[test]
fn given_one_broken_report_when_processing_then_others_continue() {
    let dir = junit_dir();
    let files = report_files(&[dir.path().to_path_buf()], ".xml").unwrap();
    let mut ctx = ParseContext::new(0);
    let batch = process_reports(&JunitFormat, &files, &mut ctx);

    assert_eq!(batch.files_read, 1);
    assert_eq!(batch.failures.len(), 1);
    assert!(batch.failures[0].path.ends_with("TEST-Broken.xml"));
    assert_eq!(batch.records.len(), 2);
    let failed = batch
        .records
        .iter()
        .find(|r| r.get(keys::unit_test::TEST_CASE_NAME) == Some("divides"))
        .unwrap();
    assert_eq!(failed.get(keys::unit_test::RESULT), Some("fail"));
}

// ── Scenario: end-to-end run ─────────────────────────────────────────

#[test]
fn given_report_sensor_when_executed_then_records_reach_client() {
    let dir = junit_dir();
    let sensor = ReportSensor {
        name: "junit".to_string(),
        format: JunitFormat,
        files: report_files(&[dir.path().to_path_buf()], ".xml").unwrap(),
    };
    let mut client = MemoryClient::new();
    let mut ctx = ParseContext::new(1_000);
    let summary = execute(&sensor, &mut client, &mut ctx, &settings(true)).unwrap();

    assert_eq!(summary.sensor, "junit");
    assert_eq!(summary.records, 2);
    assert_eq!(summary.sent, 2);
    assert!(!summary.offline_data);
    assert_eq!(client.sent().len(), 2);
}

#[test]
fn given_spool_client_when_executed_then_offline_data_is_reported() {
    let dir = junit_dir();
    let sensor = ReportSensor {
        name: "junit".to_string(),
        format: JunitFormat,
        files: vec![dir.path().join("TEST-CalcTest.xml")],
    };
    let mut client = SpoolClient::new(dir.path().join("spool.jsonl"));
    let mut ctx = ParseContext::new(0);
    let summary = execute(&sensor, &mut client, &mut ctx, &settings(true)).unwrap();

    assert_eq!(summary.stored_offline, 2);
    assert!(summary.offline_data);
}

#[test]
fn given_only_broken_reports_then_sensor_fails() {
    let dir = junit_dir();
    let sensor = ReportSensor {
        name: "junit".to_string(),
        format: JunitFormat,
        files: vec![dir.path().join("TEST-Broken.xml")],
    };
    let mut ctx = ParseContext::new(0);
    assert!(sensor.run(&mut ctx).is_err());

    let mut client = MemoryClient::new();
    assert!(execute(&sensor, &mut client, &mut ctx, &settings(true)).is_err());

    let summary = execute(&sensor, &mut client, &mut ctx, &settings(false)).unwrap();
    assert_eq!(summary.records, 0);
}

// ── Scenario: transmission failures ──────────────────────────────────

struct FixedSensor(Vec<SensorRecord>);

impl Sensor for FixedSensor {
    fn name(&self) -> &str {
        "fixed"
    }

    fn run(&self, _ctx: &mut ParseContext) -> Result<Vec<SensorRecord>> {
        Ok(self.0.clone())
    }
}

fn issue(id: &str) -> SensorRecord {
    SensorRecord::new("Tracker", SensorDataType::Issue, "2024-01-01T00:00:00.000Z", "")
        .with(keys::issue::ID, id)
}

#[test]
fn given_rejecting_client_when_fail_on_error_then_run_fails() {
    let mut client = MemoryClient::rejecting("offline");
    let err = transmit(&mut client, "fixed", vec![issue("1")], &settings(true)).unwrap_err();
    assert!(format!("{err:#}").contains("offline"));
}

#[test]
fn given_rejecting_client_when_continuing_then_summary_shows_nothing_sent() {
    let mut client = MemoryClient::rejecting("offline");
    let summary = transmit(&mut client, "fixed", vec![issue("1")], &settings(false)).unwrap();
    assert_eq!(summary.records, 1);
    assert_eq!(summary.sent, 0);
}

#[test]
fn given_invalid_record_when_continuing_then_it_is_counted_as_rejected() {
    let bare = SensorRecord::new("Tracker", SensorDataType::Issue, "t", "");
    let sensor = FixedSensor(vec![issue("1"), bare]);
    let mut client = MemoryClient::new();
    let mut ctx = ParseContext::new(0);
    let summary = execute(&sensor, &mut client, &mut ctx, &settings(false)).unwrap();
    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.sent, 1);
    assert!(!client.has_offline_data());
}
