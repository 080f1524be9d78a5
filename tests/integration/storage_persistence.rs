//! Integration tests for SQLite-backed alert history
//!
//! These tests verify that:
//! - Alerts raised by the space land in SQLite exactly once
//! - History survives a backend restart
//! - Concurrent writers of the same alert leave one row

use std::sync::Arc;

use chrono::Utc;
use gridspace::storage::{
    AlertHistoryBackend, AlertHistoryRow, SaveOutcome, StorageError, sqlite::SqliteBackend,
};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use tempfile::tempdir;

use crate::helpers::*;

#[tokio::test]
async fn test_space_to_sqlite_end_to_end() {
    let dir = tempdir().unwrap();
    let backend = Arc::new(SqliteBackend::new(dir.path().join("history.db")).await.unwrap());
    let (_store, space) = create_test_space();
    let persister = create_persister(&space, backend.clone(), 100);

    let alerts = space
        .write_price_updates(&[
            price("NODE-001", 100, 1_700_000_000_000),
            price("NODE-001", 250, 1_700_000_060_000),
        ])
        .await
        .unwrap();

    let report = persister.run_cycle().await.unwrap();
    assert_eq!(report.persisted, 1);

    let row = backend
        .find_by_alert_id(&alerts[0].alert_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.price_mwh, dec!(250));
    assert_eq!(row.threshold_or_average, Some(dec!(100.00)));
    assert_eq!(row.raised_at.timestamp_millis(), 1_700_000_060_000);
}

#[tokio::test]
async fn test_history_survives_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("history.db");

    {
        let backend = SqliteBackend::new(&path).await.unwrap();
        backend
            .insert_one(AlertHistoryRow::from_record(spike_record("N1", 1), Utc::now()))
            .await
            .unwrap();
        backend.close().await.unwrap();
    }

    let backend = SqliteBackend::new(&path).await.unwrap();
    assert_eq!(backend.count().await.unwrap(), 1);
    assert!(
        backend
            .find_by_alert_id("N1:SPIKE:1")
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_concurrent_inserts_of_same_alert() {
    let dir = tempdir().unwrap();
    let backend = Arc::new(SqliteBackend::new(dir.path().join("history.db")).await.unwrap());

    let mut tasks = vec![];
    for _ in 0..5 {
        let backend = backend.clone();
        tasks.push(tokio::spawn(async move {
            backend
                .insert_one(AlertHistoryRow::from_record(spike_record("N1", 42), Utc::now()))
                .await
        }));
    }

    let mut inserted = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(SaveOutcome::Inserted) => inserted += 1,
            Ok(SaveOutcome::AlreadyPersisted) | Err(StorageError::DuplicateKey(_)) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(inserted, 1);
    assert_eq!(backend.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_three_records_one_already_persisted_sqlite() {
    let dir = tempdir().unwrap();
    let backend = Arc::new(SqliteBackend::new(dir.path().join("history.db")).await.unwrap());
    let (_store, space) = create_test_space();

    backend
        .insert_one(AlertHistoryRow::from_record(spike_record("B", 2), Utc::now()))
        .await
        .unwrap();
    for record in [spike_record("A", 1), spike_record("B", 2), spike_record("C", 3)] {
        space.queue().enqueue(&record).await.unwrap();
    }

    let report = create_persister(&space, backend.clone(), 100)
        .run_cycle()
        .await
        .unwrap();
    assert_eq!(report.persisted, 2);
    assert_eq!(report.duplicates, 1);
    assert_eq!(backend.count().await.unwrap(), 3);
}
