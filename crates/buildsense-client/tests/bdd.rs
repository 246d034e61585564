//! BDD-style scenario tests for the offline spool.

use buildsense_client::{SpoolClient, TelemetryClient};
use buildsense_types::{SensorDataType, SensorRecord, keys};

fn commit_record(path: &str, added: usize) -> SensorRecord {
    SensorRecord::new("git", SensorDataType::Commit, "2024-05-01T10:00:00.000Z", path)
        .with(keys::commit::TOTAL_LINES, "10")
        .with(keys::commit::LINES_ADDED, added.to_string())
        .with(keys::commit::LINES_DELETED, "0")
}

// ── Scenario: spooling ───────────────────────────────────────────────

#[test]
fn given_records_when_sent_then_they_are_stored_offline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/spool.jsonl");
    let mut client = SpoolClient::new(&path);

    client.add(commit_record("src/a.rs", 3)).unwrap();
    client.add(commit_record("src/b.rs", 4)).unwrap();
    let outcome = client.send().unwrap();

    assert_eq!(outcome.sent, 0);
    assert_eq!(outcome.stored_offline, 2);
    assert!(client.has_offline_data());
    assert_eq!(SpoolClient::load(&path).unwrap().len(), 2);
}

#[test]
fn given_existing_spool_when_sent_again_then_records_are_appended() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spool.jsonl");

    let mut first = SpoolClient::new(&path);
    first.add(commit_record("src/a.rs", 1)).unwrap();
    first.send().unwrap();

    let mut second = SpoolClient::new(&path);
    second.add(commit_record("src/b.rs", 2)).unwrap();
    second.send().unwrap();

    let stored = SpoolClient::load(&path).unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].resource(), Some("src/a.rs"));
    assert_eq!(stored[1].get(keys::commit::LINES_ADDED), Some("2"));
}

#[test]
fn given_missing_spool_when_loaded_then_empty() {
    let dir = tempfile::tempdir().unwrap();
    assert!(SpoolClient::load(&dir.path().join("none.jsonl")).unwrap().is_empty());
}

#[test]
fn given_corrupt_spool_when_loaded_then_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spool.jsonl");
    std::fs::write(&path, "{not json}\n").unwrap();
    assert!(SpoolClient::load(&path).is_err());
}
