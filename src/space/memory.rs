//! In-memory shared store
//!
//! Implements the full `SharedStore` contract, TTL included, inside one
//! process. It's useful for:
//! - Testing without a networked store
//! - Single-instance deployments where the "space" is the process itself
//!
//! ## Expiry
//!
//! Expiry is lazy, like the networked stores this stands in for: an expired
//! key is treated as missing by every read and dropped by the next write
//! that touches it. Time comes from `tokio::time::Instant`, so tests can
//! simulate expiry with a paused clock.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::trace;

use super::error::{SpaceError, SpaceResult};
use super::store::SharedStore;

#[derive(Debug)]
enum Value {
    Str(String),
    SortedSet(HashMap<String, f64>),
    Set(HashSet<String>),
    List(VecDeque<String>),
}

#[derive(Debug)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// In-memory shared store with per-key expiry
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys that have not expired
    pub async fn live_keys(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|entry| entry.is_live(now))
            .count()
    }
}

/// Live entry for `key`, dropping it first if it has expired
fn live_entry<'a>(entries: &'a mut HashMap<String, Entry>, key: &str) -> Option<&'a mut Entry> {
    if entries
        .get(key)
        .is_some_and(|entry| !entry.is_live(Instant::now()))
    {
        trace!("dropping expired key {key}");
        entries.remove(key);
        return None;
    }
    entries.get_mut(key)
}

fn live_or_insert<'a>(
    entries: &'a mut HashMap<String, Entry>,
    key: &str,
    empty: fn() -> Value,
) -> &'a mut Entry {
    let entry = entries
        .entry(key.to_string())
        .or_insert_with(|| Entry::new(empty()));
    if !entry.is_live(Instant::now()) {
        *entry = Entry::new(empty());
    }
    entry
}

fn wrong_type(key: &str) -> SpaceError {
    SpaceError::WrongType(key.to_string())
}

fn in_range(score: f64, min: f64, max: f64) -> bool {
    score >= min && score <= max
}

#[async_trait]
impl SharedStore for MemoryStore {
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> SpaceResult<()> {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            Entry {
                value: Value::Str(value),
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> SpaceResult<Option<String>> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) if entry.is_live(Instant::now()) => match &entry.value {
                Value::Str(value) => Ok(Some(value.clone())),
                _ => Err(wrong_type(key)),
            },
            _ => Ok(None),
        }
    }

    async fn zadd(&self, key: &str, member: String, score: f64) -> SpaceResult<()> {
        let mut entries = self.entries.write().await;
        match &mut live_or_insert(&mut entries, key, || Value::SortedSet(HashMap::new())).value {
            Value::SortedSet(members) => {
                members.insert(member, score);
                Ok(())
            }
            _ => Err(wrong_type(key)),
        }
    }

    async fn zrange_by_score(
        &self,
        key: &str,
        min: f64,
        max: f64,
    ) -> SpaceResult<Vec<(String, f64)>> {
        let entries = self.entries.read().await;
        let members = match entries.get(key) {
            Some(entry) if entry.is_live(Instant::now()) => match &entry.value {
                Value::SortedSet(members) => members,
                _ => return Err(wrong_type(key)),
            },
            _ => return Ok(Vec::new()),
        };

        let mut range: Vec<(String, f64)> = members
            .iter()
            .filter(|(_, score)| in_range(**score, min, max))
            .map(|(member, score)| (member.clone(), *score))
            .collect();
        range.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        Ok(range)
    }

    async fn zremrange_by_score(&self, key: &str, min: f64, max: f64) -> SpaceResult<usize> {
        let mut entries = self.entries.write().await;
        let Some(entry) = live_entry(&mut entries, key) else {
            return Ok(0);
        };
        let Value::SortedSet(members) = &mut entry.value else {
            return Err(wrong_type(key));
        };

        let before = members.len();
        members.retain(|_, score| !in_range(*score, min, max));
        let removed = before - members.len();
        if members.is_empty() {
            entries.remove(key);
        }
        Ok(removed)
    }

    async fn sadd(&self, key: &str, member: &str) -> SpaceResult<bool> {
        let mut entries = self.entries.write().await;
        match &mut live_or_insert(&mut entries, key, || Value::Set(HashSet::new())).value {
            Value::Set(members) => Ok(members.insert(member.to_string())),
            _ => Err(wrong_type(key)),
        }
    }

    async fn srem(&self, key: &str, member: &str) -> SpaceResult<bool> {
        let mut entries = self.entries.write().await;
        let Some(entry) = live_entry(&mut entries, key) else {
            return Ok(false);
        };
        let Value::Set(members) = &mut entry.value else {
            return Err(wrong_type(key));
        };

        let removed = members.remove(member);
        if members.is_empty() {
            entries.remove(key);
        }
        Ok(removed)
    }

    async fn smembers(&self, key: &str) -> SpaceResult<Vec<String>> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) if entry.is_live(Instant::now()) => match &entry.value {
                Value::Set(members) => Ok(members.iter().cloned().collect()),
                _ => Err(wrong_type(key)),
            },
            _ => Ok(Vec::new()),
        }
    }

    async fn rpush(&self, key: &str, value: String) -> SpaceResult<usize> {
        let mut entries = self.entries.write().await;
        match &mut live_or_insert(&mut entries, key, || Value::List(VecDeque::new())).value {
            Value::List(items) => {
                items.push_back(value);
                Ok(items.len())
            }
            _ => Err(wrong_type(key)),
        }
    }

    async fn lpop(&self, key: &str) -> SpaceResult<Option<String>> {
        let mut entries = self.entries.write().await;
        let Some(entry) = live_entry(&mut entries, key) else {
            return Ok(None);
        };
        let Value::List(items) = &mut entry.value else {
            return Err(wrong_type(key));
        };

        let head = items.pop_front();
        if items.is_empty() {
            entries.remove(key);
        }
        Ok(head)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> SpaceResult<bool> {
        let mut entries = self.entries.write().await;
        match live_entry(&mut entries, key) {
            Some(entry) => {
                entry.expires_at = Some(Instant::now() + ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
