//! Tests for the IndexedDB -> localStorage migration pipeline
//!
//! This test suite covers, against the in-memory stores:
//! - Copying every keyed record as JSON text
//! - Idempotence and last-write-wins on duplicate keys
//! - Empty sources
//! - Missing keys and write failures under both failure policies
//! - Connection release and readiness handling

use metadata_updater_core::storage::{KeyValueStore, MemoryKeyValueStore, MemorySource};
use metadata_updater_core::{Config, FailurePolicy, MigrationError, Migrator, Readiness, Record};
use serde_json::{json, Value};
use std::time::Duration;

fn record(value: Value) -> Record {
    Record::try_from(value).unwrap()
}

fn migrator_with(records: Vec<Record>, config: Config) -> Migrator<MemorySource> {
    let mut source = MemorySource::new();
    source.insert_collection(&config.database_name, &config.collection_name, records);
    Migrator::new(source, config)
}

fn stored(dest: &MemoryKeyValueStore, key: &str) -> Option<Value> {
    dest.get_item(key)
        .unwrap()
        .map(|text| serde_json::from_str(&text).unwrap())
}

/// Two records end up under their ttid with matching JSON
#[tokio::test]
async fn test_two_records_are_copied() {
    let migrator = migrator_with(
        vec![
            record(json!({"ttid": "a1", "title": "X"})),
            record(json!({"ttid": "a2", "title": "Y"})),
        ],
        Config::default(),
    );
    let mut dest = MemoryKeyValueStore::new();

    let report = migrator.run(&mut dest, Readiness::Immediate).await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.read, 2);
    assert_eq!(report.copied, 2);
    assert_eq!(dest.keys().collect::<Vec<_>>(), vec!["a1", "a2"]);
    assert_eq!(stored(&dest, "a1"), Some(json!({"ttid": "a1", "title": "X"})));
    assert_eq!(stored(&dest, "a2"), Some(json!({"ttid": "a2", "title": "Y"})));
}

/// An empty collection leaves existing destination entries untouched
#[tokio::test]
async fn test_empty_collection_leaves_destination_unchanged() {
    let migrator = migrator_with(Vec::new(), Config::default());
    let mut dest = MemoryKeyValueStore::new();
    dest.set_item("other", "{\"keep\":true}").unwrap();
    let before = dest.clone();

    let report = migrator.run(&mut dest, Readiness::Immediate).await.unwrap();

    assert_eq!(report.read, 0);
    assert_eq!(report.copied, 0);
    assert_eq!(dest.len(), 1);
    assert_eq!(dest.get_item("other").unwrap(), before.get_item("other").unwrap());
}

/// Running twice gives the same destination state as running once
#[tokio::test]
async fn test_migration_is_idempotent() {
    let migrator = migrator_with(
        vec![
            record(json!({"ttid": "a1", "title": "X"})),
            record(json!({"ttid": 42, "title": "Y", "tags": ["math"]})),
        ],
        Config::default(),
    );

    let mut once = MemoryKeyValueStore::new();
    migrator.run(&mut once, Readiness::Immediate).await.unwrap();

    let mut twice = MemoryKeyValueStore::new();
    migrator.run(&mut twice, Readiness::Immediate).await.unwrap();
    let second = migrator.run(&mut twice, Readiness::Immediate).await.unwrap();

    assert_eq!(second.overwritten, 0);
    assert_eq!(once.keys().collect::<Vec<_>>(), twice.keys().collect::<Vec<_>>());
    for key in once.keys() {
        assert_eq!(once.get_item(key).unwrap(), twice.get_item(key).unwrap());
    }
}

/// Duplicate ttids keep only the record processed last
#[tokio::test]
async fn test_duplicate_key_last_write_wins() {
    let migrator = migrator_with(
        vec![
            record(json!({"ttid": "dup", "title": "first"})),
            record(json!({"ttid": "solo"})),
            record(json!({"ttid": "dup", "title": "last"})),
        ],
        Config::default(),
    );
    let mut dest = MemoryKeyValueStore::new();

    let report = migrator.run(&mut dest, Readiness::Immediate).await.unwrap();

    assert_eq!(report.copied, 3);
    assert_eq!(report.overwritten, 1);
    assert_eq!(dest.len(), 2);
    assert_eq!(stored(&dest, "dup"), Some(json!({"ttid": "dup", "title": "last"})));
}

/// Records without a usable ttid are reported and the rest are copied
#[tokio::test]
async fn test_missing_key_collected() {
    let migrator = migrator_with(
        vec![
            record(json!({"title": "no key"})),
            record(json!({"ttid": null})),
            record(json!({"ttid": "ok"})),
        ],
        Config::default(),
    );
    let mut dest = MemoryKeyValueStore::new();

    let report = migrator.run(&mut dest, Readiness::Immediate).await.unwrap();

    assert!(!report.is_complete());
    assert_eq!(report.copied, 1);
    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.failures[0].index, 0);
    assert_eq!(report.failures[0].key, None);
    assert_eq!(report.failures[1].index, 1);
    assert_eq!(dest.keys().collect::<Vec<_>>(), vec!["ok"]);
}

/// With the abort policy the first bad record stops the pass
#[tokio::test]
async fn test_missing_key_aborts() {
    let config = Config {
        failure_policy: FailurePolicy::Abort,
        ..Config::default()
    };
    let migrator = migrator_with(
        vec![
            record(json!({"ttid": "before"})),
            record(json!({"title": "no key"})),
            record(json!({"ttid": "after"})),
        ],
        config,
    );
    let mut dest = MemoryKeyValueStore::new();

    let result = migrator.run(&mut dest, Readiness::Immediate).await;

    assert!(matches!(result, Err(MigrationError::InvalidKey(_))));
    assert!(dest.get_item("before").unwrap().is_some());
    assert!(dest.get_item("after").unwrap().is_none());
    assert_eq!(migrator.source().open_connections(), 0);
}

/// The source connection is released after a successful run
#[tokio::test]
async fn test_connection_released_after_success() {
    let migrator = migrator_with(vec![record(json!({"ttid": "a1"}))], Config::default());
    let mut dest = MemoryKeyValueStore::new();

    migrator.run(&mut dest, Readiness::Immediate).await.unwrap();

    assert_eq!(migrator.source().open_connections(), 0);
}

/// A missing collection fails the read and still releases the connection
#[tokio::test]
async fn test_connection_released_after_read_failure() {
    let mut source = MemorySource::new();
    source.insert_collection("video_database", "other_store", Vec::new());
    let migrator = Migrator::new(source, Config::default());
    let mut dest = MemoryKeyValueStore::new();

    let result = migrator.run(&mut dest, Readiness::Immediate).await;

    assert!(matches!(result, Err(MigrationError::TransactionError(_))));
    assert_eq!(migrator.source().open_connections(), 0);
    assert!(dest.is_empty());
}

/// An unknown database is an open error and nothing is written
#[tokio::test]
async fn test_open_failure() {
    let migrator = Migrator::new(MemorySource::new(), Config::default());
    let mut dest = MemoryKeyValueStore::new();

    let result = migrator.run(&mut dest, Readiness::Immediate).await;

    assert!(matches!(result, Err(MigrationError::OpenError(_))));
    assert!(dest.is_empty());
}

/// The read waits for an explicit readiness signal
#[tokio::test]
async fn test_waits_for_readiness_signal() {
    let migrator = migrator_with(vec![record(json!({"ttid": "a1"}))], Config::default());
    let mut dest = MemoryKeyValueStore::new();
    let (tx, readiness) = Readiness::channel();

    let signal = async move {
        tokio::time::sleep(Duration::from_millis(5)).await;
        tx.send(()).unwrap();
    };
    let (report, ()) = tokio::join!(migrator.run(&mut dest, readiness), signal);

    assert_eq!(report.unwrap().copied, 1);
    assert!(dest.get_item("a1").unwrap().is_some());
}

/// A dropped readiness sender aborts before reading
#[tokio::test]
async fn test_dropped_readiness_signal() {
    let migrator = migrator_with(vec![record(json!({"ttid": "a1"}))], Config::default());
    let mut dest = MemoryKeyValueStore::new();
    let (tx, readiness) = Readiness::channel();
    drop(tx);

    let result = migrator.run(&mut dest, readiness).await;

    assert!(matches!(result, Err(MigrationError::NotReady(_))));
    assert!(dest.is_empty());
    assert_eq!(migrator.source().open_connections(), 0);
}

/// The legacy fixed delay still works
#[tokio::test]
async fn test_fixed_delay_readiness() {
    let migrator = migrator_with(vec![record(json!({"ttid": "a1"}))], Config::default());
    let mut dest = MemoryKeyValueStore::new();

    let report = migrator
        .run(&mut dest, Readiness::Delay(Duration::from_millis(10)))
        .await
        .unwrap();

    assert_eq!(report.copied, 1);
    assert!(report.finished_at.unwrap() >= report.started_at);
}
