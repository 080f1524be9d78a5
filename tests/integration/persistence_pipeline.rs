//! Alerts flowing from the write path into durable history
//!
//! These tests verify that:
//! - Raised alerts reach the durable store through the queue
//! - Already persisted alerts are skipped, not duplicated
//! - The worker actor drains on its own timer and on demand

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use gridspace::{
    actors::PersistenceHandle,
    storage::{AlertHistoryBackend, AlertHistoryRow, memory::MemoryBackend},
};
use pretty_assertions::assert_eq;

use crate::helpers::*;

#[tokio::test]
async fn test_raised_alert_is_persisted() {
    let (_store, space) = create_test_space();
    let backend = Arc::new(MemoryBackend::new());
    let persister = create_persister(&space, backend.clone(), 100);

    let alerts = space
        .write_price_updates(&[price("N1", 100, 1_000), price("N1", 250, 2_000)])
        .await
        .unwrap();

    let report = persister.run_cycle().await.unwrap();
    assert_eq!(report.drained, 1);
    assert_eq!(report.persisted, 1);

    let row = backend
        .find_by_alert_id(&alerts[0].alert_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.node_id, "N1");
    assert_eq!(row.raised_at, alerts[0].raised_at);
    assert_eq!(row.threshold_or_average, Some(alerts[0].threshold_or_average));
}

#[tokio::test]
async fn test_three_records_one_already_persisted() {
    let (_store, space) = create_test_space();
    let backend = Arc::new(MemoryBackend::new());

    backend
        .insert_one(AlertHistoryRow::from_record(spike_record("N2", 20), Utc::now()))
        .await
        .unwrap();
    for record in [spike_record("N1", 10), spike_record("N2", 20), spike_record("N3", 30)] {
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

#[tokio::test]
async fn test_batch_size_bounds_each_cycle() {
    let (_store, space) = create_test_space();
    let backend = Arc::new(MemoryBackend::new());
    let persister = create_persister(&space, backend.clone(), 2);

    for ts in 1..=5 {
        space.queue().enqueue(&spike_record("N1", ts)).await.unwrap();
    }

    assert_eq!(persister.run_cycle().await.unwrap().persisted, 2);
    assert_eq!(persister.run_cycle().await.unwrap().persisted, 2);
    assert_eq!(persister.run_cycle().await.unwrap().persisted, 1);
    assert!(persister.run_cycle().await.unwrap().is_idle());
    assert_eq!(backend.count().await.unwrap(), 5);
}

#[tokio::test]
async fn test_redetected_alert_is_stored_once() {
    let (_store, space) = create_test_space();
    let backend = Arc::new(MemoryBackend::new());
    let persister = create_persister(&space, backend.clone(), 100);

    space
        .write_price_updates(&[price("N1", 100, 1_000), price("N1", 250, 2_000)])
        .await
        .unwrap();
    persister.run_cycle().await.unwrap();

    // Same reading again: same alert id, queued a second time
    space
        .write_price_updates(&[price("N1", 250, 2_000)])
        .await
        .unwrap();
    let report = persister.run_cycle().await.unwrap();

    assert_eq!(report.duplicates, 1);
    assert_eq!(backend.count().await.unwrap(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_worker_drains_on_interval() {
    let (_store, space) = create_test_space();
    let backend = Arc::new(MemoryBackend::new());
    let handle = PersistenceHandle::spawn(
        create_persister(&space, backend.clone(), 100),
        Duration::from_millis(2000),
    );

    space
        .write_price_updates(&[price("N1", 100, 1_000), price("N1", 250, 2_000)])
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(4100)).await;
    assert_eq!(backend.count().await.unwrap(), 1);

    let stats = handle.get_stats().await.unwrap();
    assert!(stats.cycles >= 2);
    assert_eq!(stats.persisted, 1);
    assert_eq!(stats.failed_cycles, 0);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_worker_run_now() {
    let (_store, space) = create_test_space();
    let backend = Arc::new(MemoryBackend::new());
    let handle = PersistenceHandle::spawn(
        create_persister(&space, backend.clone(), 100),
        Duration::from_secs(3600),
    );

    space.queue().enqueue(&spike_record("N1", 1)).await.unwrap();
    space.queue().enqueue(&spike_record("N1", 2)).await.unwrap();

    let report = handle.run_now().await.unwrap();
    assert_eq!(report.persisted + report.duplicates, report.drained);
    assert_eq!(backend.count().await.unwrap(), 2);

    handle.shutdown().await;
}
