//! Cache backends
//!
//! Raw string key/value stores with per-key expiry. Values are JSON
//! documents encoded by [`CacheService`](super::CacheService).

use async_trait::async_trait;
use dashmap::DashMap;
use redis::aio::ConnectionManager;
use regex::Regex;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Invalid key pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },
}

pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// A key/value store with expiry
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Backend name for logs and health output
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    async fn set_ex(&self, key: &str, value: String, ttl_secs: u64) -> CacheResult<()>;

    /// Delete keys, returning how many existed
    async fn del(&self, keys: &[String]) -> CacheResult<u64>;

    /// Keys matching a glob pattern (`*`, `?`)
    async fn keys(&self, pattern: &str) -> CacheResult<Vec<String>>;

    async fn exists(&self, key: &str) -> CacheResult<bool>;

    async fn ping(&self) -> CacheResult<()>;
}

/// Redis-backed store
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(url: &str) -> CacheResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        info!("Connected to Redis cache");
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: String, ttl_secs: u64) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("SETEX")
            .arg(key)
            .arg(ttl_secs)
            .arg(value)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> CacheResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        let removed: u64 = redis::cmd("DEL").arg(keys).query_async(&mut conn).await?;
        Ok(removed)
    }

    /// Cursor-based SCAN so large keyspaces do not block the server
    async fn keys(&self, pattern: &str) -> CacheResult<Vec<String>> {
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        let mut found = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;
            found.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(found)
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.conn.clone();
        let count: u64 = redis::cmd("EXISTS").arg(key).query_async(&mut conn).await?;
        Ok(count == 1)
    }

    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-process store for single-instance deployments and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.purge_expired();
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn purge_expired(&self) {
        self.entries.retain(|_, entry| !entry.is_expired());
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let hit = self.entries.get(key).map(|e| (e.is_expired(), e.value.clone()));
        match hit {
            Some((false, value)) => Ok(Some(value)),
            Some((true, _)) => {
                self.entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, value: String, ttl_secs: u64) -> CacheResult<()> {
        let entry = Entry {
            value,
            expires_at: Instant::now() + Duration::from_secs(ttl_secs),
        };
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> CacheResult<u64> {
        let removed = keys
            .iter()
            .filter_map(|k| self.entries.remove(k))
            .filter(|(_, entry)| !entry.is_expired())
            .count();
        Ok(removed as u64)
    }

    async fn keys(&self, pattern: &str) -> CacheResult<Vec<String>> {
        let matcher = glob_to_regex(pattern)?;
        self.purge_expired();
        Ok(self
            .entries
            .iter()
            .filter(|e| matcher.is_match(e.key()))
            .map(|e| e.key().clone())
            .collect())
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        Ok(self.entries.get(key).is_some_and(|e| !e.is_expired()))
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }
}

/// Store used when caching is turned off: every read misses
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledStore;

#[async_trait]
impl CacheStore for DisabledStore {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        Ok(None)
    }

    async fn set_ex(&self, _key: &str, _value: String, _ttl_secs: u64) -> CacheResult<()> {
        Ok(())
    }

    async fn del(&self, _keys: &[String]) -> CacheResult<u64> {
        Ok(0)
    }

    async fn keys(&self, _pattern: &str) -> CacheResult<Vec<String>> {
        Ok(Vec::new())
    }

    async fn exists(&self, _key: &str) -> CacheResult<bool> {
        Ok(false)
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }
}

/// Translate a Redis-style glob (`*`, `?`) into an anchored regex
fn glob_to_regex(pattern: &str) -> CacheResult<Regex> {
    let mut re = String::with_capacity(pattern.len() + 8);
    re.push('^');
    for c in pattern.chars() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            other => re.push_str(&regex::escape(&other.to_string())),
        }
    }
    re.push('$');

    Regex::new(&re).map_err(|e| CacheError::Pattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_to_regex() {
        let re = glob_to_regex("profile:*").unwrap();
        assert!(re.is_match("profile:abc"));
        assert!(!re.is_match("profiles:all"));

        let re = glob_to_regex("service?:all").unwrap();
        assert!(re.is_match("services:all"));

        let re = glob_to_regex("a.b").unwrap();
        assert!(!re.is_match("axb"));
    }

    #[tokio::test]
    async fn test_memory_set_get_del() {
        let store = MemoryStore::new();
        store.set_ex("k", "v".into(), 60).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        assert!(store.exists("k").await.unwrap());

        assert_eq!(store.del(&["k".into(), "missing".into()]).await.unwrap(), 1);
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_expiry() {
        let store = MemoryStore::new();
        store.set_ex("k", "v".into(), 0).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(!store.exists("k").await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_memory_keys_by_pattern() {
        let store = MemoryStore::new();
        for key in ["service:1", "service:2", "services:all", "project:1"] {
            store.set_ex(key, "{}".into(), 60).await.unwrap();
        }

        let mut keys = store.keys("service:*").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["service:1", "service:2"]);
    }

    #[tokio::test]
    async fn test_disabled_always_misses() {
        let store = DisabledStore;
        store.set_ex("k", "v".into(), 60).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(!store.exists("k").await.unwrap());
    }
}
