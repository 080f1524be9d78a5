//! Time-bounded shared store decorator
//!
//! Wraps any `SharedStore` so a slow or hung call fails that single step
//! with `SpaceError::Timeout` instead of stalling the request or the drain
//! cycle. No retries happen here; callers decide what a failed step means.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::error::{SpaceError, SpaceResult};
use super::store::SharedStore;

pub struct TimedStore {
    inner: Arc<dyn SharedStore>,
    limit: Duration,
}

impl TimedStore {
    pub fn new(inner: Arc<dyn SharedStore>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn bounded<T>(
        &self,
        op: &'static str,
        key: &str,
        call: impl Future<Output = SpaceResult<T>>,
    ) -> SpaceResult<T> {
        match tokio::time::timeout(self.limit, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!("{op} on {key} exceeded {:?}", self.limit);
                Err(SpaceError::Timeout {
                    op,
                    key: key.to_string(),
                })
            }
        }
    }
}

#[async_trait]
impl SharedStore for TimedStore {
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> SpaceResult<()> {
        self.bounded("set", key, self.inner.set(key, value, ttl))
            .await
    }

    async fn get(&self, key: &str) -> SpaceResult<Option<String>> {
        self.bounded("get", key, self.inner.get(key)).await
    }

    async fn zadd(&self, key: &str, member: String, score: f64) -> SpaceResult<()> {
        self.bounded("zadd", key, self.inner.zadd(key, member, score))
            .await
    }

    async fn zrange_by_score(
        &self,
        key: &str,
        min: f64,
        max: f64,
    ) -> SpaceResult<Vec<(String, f64)>> {
        self.bounded("zrange_by_score", key, self.inner.zrange_by_score(key, min, max))
            .await
    }

    async fn zremrange_by_score(&self, key: &str, min: f64, max: f64) -> SpaceResult<usize> {
        self.bounded(
            "zremrange_by_score",
            key,
            self.inner.zremrange_by_score(key, min, max),
        )
        .await
    }

    async fn sadd(&self, key: &str, member: &str) -> SpaceResult<bool> {
        self.bounded("sadd", key, self.inner.sadd(key, member)).await
    }

    async fn srem(&self, key: &str, member: &str) -> SpaceResult<bool> {
        self.bounded("srem", key, self.inner.srem(key, member)).await
    }

    async fn smembers(&self, key: &str) -> SpaceResult<Vec<String>> {
        self.bounded("smembers", key, self.inner.smembers(key)).await
    }

    async fn rpush(&self, key: &str, value: String) -> SpaceResult<usize> {
        self.bounded("rpush", key, self.inner.rpush(key, value)).await
    }

    async fn lpop(&self, key: &str) -> SpaceResult<Option<String>> {
        self.bounded("lpop", key, self.inner.lpop(key)).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> SpaceResult<bool> {
        self.bounded("expire", key, self.inner.expire(key, ttl))
            .await
    }
}
