//! Concurrency tests
//!
//! These tests verify behaviour with several instances sharing one space:
//! - Concurrent batches for different nodes don't interfere
//! - Several workers draining one queue never double-persist
//! - Concurrent readers see a consistent alert list

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use gridspace::{
    config::SpaceConfig,
    space::MemoryStore,
    storage::{AlertHistoryBackend, memory::MemoryBackend},
};
use pretty_assertions::assert_eq;

use crate::helpers::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_batches_for_different_nodes() {
    let store = Arc::new(MemoryStore::new());

    let mut tasks = vec![];
    for i in 0..8 {
        let space = create_space_on(store.clone(), &SpaceConfig::default());
        tasks.push(tokio::spawn(async move {
            let node = format!("NODE-{i:03}");
            space
                .write_price_updates(&[price(&node, 100, 1_000), price(&node, 300, 2_000)])
                .await
                .unwrap()
        }));
    }

    let mut raised = 0;
    for task in tasks {
        raised += task.await.unwrap().len();
    }
    assert_eq!(raised, 8);

    let space = create_space_on(store, &SpaceConfig::default());
    let active = space.active_alerts().await.unwrap();
    let nodes: HashSet<_> = active.iter().map(|a| a.node_id.clone()).collect();
    assert_eq!(nodes.len(), 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_competing_workers_persist_each_alert_once() {
    let (_store, space) = create_test_space();
    let backend = Arc::new(MemoryBackend::new());

    // Every record is queued twice to force cross-worker duplicates
    for ts in 0..50 {
        let record = spike_record("N1", ts);
        space.queue().enqueue(&record).await.unwrap();
        space.queue().enqueue(&record).await.unwrap();
    }

    let mut tasks = vec![];
    for _ in 0..4 {
        let persister = create_persister(&space, backend.clone(), 7);
        tasks.push(tokio::spawn(async move {
            let mut persisted = 0;
            loop {
                let report = persister.run_cycle().await.unwrap();
                if report.is_idle() {
                    break persisted;
                }
                persisted += report.persisted;
            }
        }));
    }

    let mut persisted = 0;
    for task in tasks {
        persisted += task.await.unwrap();
    }

    assert_eq!(persisted, 50);
    assert_eq!(backend.count().await.unwrap(), 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_alert_listing() {
    let (_store, space) = create_test_space();
    space
        .write_price_updates(&[price("N1", 100, 1_000), price("N1", 250, 2_000)])
        .await
        .unwrap();

    let reads = (0..10).map(|_| {
        let space = space.clone();
        tokio::spawn(async move { space.active_alerts().await.unwrap() })
    });

    for listing in join_all(reads).await {
        assert_eq!(listing.unwrap().len(), 1);
    }
}
