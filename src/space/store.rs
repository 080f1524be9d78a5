//! Shared store trait definition
//!
//! The shared store is the single source of truth for hot state. Every
//! operation is atomic per key; nothing spans keys. Implementations are
//! expected to be backed by a networked key-value / data-structure service
//! shared by all API instances.

use std::time::Duration;

use async_trait::async_trait;

use super::error::SpaceResult;

/// Trait for the key-value / data-structure store shared by all instances
///
/// Expired keys behave exactly like missing keys for every operation.
#[async_trait]
pub trait SharedStore: Send + Sync {
    /// Set a string value, replacing any previous value and expiry
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> SpaceResult<()>;

    /// Get a string value
    async fn get(&self, key: &str) -> SpaceResult<Option<String>>;

    /// Add a member to a sorted set (updates the score if already present)
    async fn zadd(&self, key: &str, member: String, score: f64) -> SpaceResult<()>;

    /// Members with `min <= score <= max`, ascending by score
    async fn zrange_by_score(&self, key: &str, min: f64, max: f64)
    -> SpaceResult<Vec<(String, f64)>>;

    /// Remove members with `min <= score <= max`, returning how many were removed
    async fn zremrange_by_score(&self, key: &str, min: f64, max: f64) -> SpaceResult<usize>;

    /// Add a member to a set, returning whether it was newly added
    async fn sadd(&self, key: &str, member: &str) -> SpaceResult<bool>;

    /// Remove a member from a set, returning whether it was present
    async fn srem(&self, key: &str, member: &str) -> SpaceResult<bool>;

    /// All members of a set (unordered)
    async fn smembers(&self, key: &str) -> SpaceResult<Vec<String>>;

    /// Push to the tail of a list, returning the new length
    async fn rpush(&self, key: &str, value: String) -> SpaceResult<usize>;

    /// Pop from the head of a list
    async fn lpop(&self, key: &str) -> SpaceResult<Option<String>>;

    /// Set an expiry on an existing key, returning false if the key does not exist
    async fn expire(&self, key: &str, ttl: Duration) -> SpaceResult<bool>;
}
