//! Failure scenario tests
//!
//! These tests verify graceful handling of:
//! - A shared store that hangs (bounded by the timeout decorator)
//! - A durable store that is down (records stay queued)
//! - Poisoned queue entries (skipped, never block a cycle)

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use gridspace::{
    config::SpaceConfig,
    space::{MemoryStore, SharedStore, SpaceError, SpaceResult, TimedStore, keys},
    storage::{
        AlertHistoryBackend, AlertHistoryRow, HealthStatus, SaveOutcome, StorageError,
        StorageResult, memory::MemoryBackend,
    },
};

use crate::helpers::*;

/// Store that forwards to memory but can be switched to hang on every call
struct StallingStore {
    inner: MemoryStore,
    stalled: AtomicBool,
}

impl StallingStore {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            stalled: AtomicBool::new(false),
        }
    }

    async fn gate(&self) {
        if self.stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
    }
}

#[async_trait]
impl SharedStore for StallingStore {
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> SpaceResult<()> {
        self.gate().await;
        self.inner.set(key, value, ttl).await
    }
    async fn get(&self, key: &str) -> SpaceResult<Option<String>> {
        self.gate().await;
        self.inner.get(key).await
    }
    async fn zadd(&self, key: &str, member: String, score: f64) -> SpaceResult<()> {
        self.gate().await;
        self.inner.zadd(key, member, score).await
    }
    async fn zrange_by_score(&self, key: &str, min: f64, max: f64) -> SpaceResult<Vec<(String, f64)>> {
        self.gate().await;
        self.inner.zrange_by_score(key, min, max).await
    }
    async fn zremrange_by_score(&self, key: &str, min: f64, max: f64) -> SpaceResult<usize> {
        self.gate().await;
        self.inner.zremrange_by_score(key, min, max).await
    }
    async fn sadd(&self, key: &str, member: &str) -> SpaceResult<bool> {
        self.gate().await;
        self.inner.sadd(key, member).await
    }
    async fn srem(&self, key: &str, member: &str) -> SpaceResult<bool> {
        self.gate().await;
        self.inner.srem(key, member).await
    }
    async fn smembers(&self, key: &str) -> SpaceResult<Vec<String>> {
        self.gate().await;
        self.inner.smembers(key).await
    }
    async fn rpush(&self, key: &str, value: String) -> SpaceResult<usize> {
        self.gate().await;
        self.inner.rpush(key, value).await
    }
    async fn lpop(&self, key: &str) -> SpaceResult<Option<String>> {
        self.gate().await;
        self.inner.lpop(key).await
    }
    async fn expire(&self, key: &str, ttl: Duration) -> SpaceResult<bool> {
        self.gate().await;
        self.inner.expire(key, ttl).await
    }
}

/// Durable store that is down until switched back on
struct OfflineBackend {
    inner: MemoryBackend,
    online: AtomicBool,
}

impl OfflineBackend {
    fn check(&self) -> StorageResult<()> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::ConnectionFailed("connection refused".into()))
        }
    }
}

#[async_trait]
impl AlertHistoryBackend for OfflineBackend {
    async fn existing_alert_ids(&self, ids: &[String]) -> StorageResult<HashSet<String>> {
        self.check()?;
        self.inner.existing_alert_ids(ids).await
    }
    async fn insert_one(&self, row: AlertHistoryRow) -> StorageResult<SaveOutcome> {
        self.check()?;
        self.inner.insert_one(row).await
    }
    async fn find_by_alert_id(&self, id: &str) -> StorageResult<Option<AlertHistoryRow>> {
        self.inner.find_by_alert_id(id).await
    }
    async fn count(&self) -> StorageResult<u64> {
        self.inner.count().await
    }
    async fn health_check(&self) -> StorageResult<HealthStatus> {
        self.inner.health_check().await
    }
    async fn get_stats(&self) -> StorageResult<String> {
        self.inner.get_stats().await
    }
    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn test_hung_store_fails_the_request_with_timeout() {
    let raw = Arc::new(StallingStore::new());
    let store = Arc::new(TimedStore::new(raw.clone(), Duration::from_millis(100)));
    let space = create_space_on(store, &SpaceConfig::default());

    space
        .write_price_updates(&[price("N1", 100, 1_000)])
        .await
        .unwrap();

    raw.stalled.store(true, Ordering::SeqCst);
    let result = space.write_price_updates(&[price("N1", 100, 2_000)]).await;
    assert_matches!(result, Err(SpaceError::Timeout { op: "set", .. }));
    assert!(result.unwrap_err().is_retryable());

    // Recovers as soon as the store does
    raw.stalled.store(false, Ordering::SeqCst);
    assert!(space.active_alerts().await.is_ok());
}

#[tokio::test]
async fn test_records_survive_durable_outage() {
    let (_store, space) = create_test_space();
    let backend = Arc::new(OfflineBackend {
        inner: MemoryBackend::new(),
        online: AtomicBool::new(false),
    });
    let persister = create_persister(&space, backend.clone(), 100);

    space.queue().enqueue(&spike_record("N1", 1)).await.unwrap();
    space.queue().enqueue(&spike_record("N1", 2)).await.unwrap();

    assert!(persister.run_cycle().await.is_err());
    assert_eq!(backend.count().await.unwrap(), 0);

    backend.online.store(true, Ordering::SeqCst);
    let report = persister.run_cycle().await.unwrap();
    assert_eq!(report.persisted, 2);
}

#[tokio::test]
async fn test_poisoned_queue_entries_do_not_block_drain() {
    let (store, space) = create_test_space();
    let backend = Arc::new(MemoryBackend::new());
    let persister = create_persister(&space, backend.clone(), 3);

    for junk in ["", "[]", "{\"alertId\":1}"] {
        store
            .rpush(&keys::alert_history_queue(), junk.to_string())
            .await
            .unwrap();
    }
    space.queue().enqueue(&spike_record("N1", 1)).await.unwrap();

    // First cycle pops only junk
    let report = persister.run_cycle().await.unwrap();
    assert_eq!(report.drained, 0);

    let report = persister.run_cycle().await.unwrap();
    assert_eq!(report.persisted, 1);
    assert_eq!(backend.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_corrupt_alert_payload_is_skipped_in_listing() {
    let (store, space) = create_test_space();
    space
        .write_price_updates(&[price("N1", 100, 1_000), price("N1", 250, 2_000)])
        .await
        .unwrap();

    store
        .set(&keys::alert("junk"), "not an alert".to_string(), None)
        .await
        .unwrap();
    store.sadd(&keys::active_alert_ids(), "junk").await.unwrap();

    assert_eq!(space.active_alerts().await.unwrap().len(), 1);
}
