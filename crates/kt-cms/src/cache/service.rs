//! Read-through cache service
//!
//! Failures are logged and swallowed: a read error is a miss and a write
//! error returns `false`. The cache never fails a request.

use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::keys::{ttl, CacheEntity};
use super::store::{CacheStore, DisabledStore, MemoryStore, RedisStore};

/// Anything cached per item under `<singular>:<id>`
pub trait CacheItem {
    fn cache_id(&self) -> &str;
}

#[derive(Clone)]
pub struct CacheService {
    store: Arc<dyn CacheStore>,
    default_ttl: u64,
}

impl CacheService {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store, default_ttl: ttl::MEDIUM }
    }

    pub fn with_default_ttl(mut self, ttl_secs: u64) -> Self {
        self.default_ttl = ttl_secs;
        self
    }

    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn disabled() -> Self {
        Self::new(Arc::new(DisabledStore))
    }

    /// Build from configuration. An unreachable Redis falls back to the
    /// in-memory store so the site keeps serving.
    pub async fn from_config(config: &kt_config::CacheConfig) -> Self {
        let service = match config.backend {
            kt_config::CacheBackend::Redis => match RedisStore::connect(&config.redis_url).await {
                Ok(store) => Self::new(Arc::new(store)),
                Err(e) => {
                    warn!(error = %e, "Redis unavailable, falling back to in-memory cache");
                    Self::memory()
                }
            },
            kt_config::CacheBackend::Memory => Self::memory(),
            kt_config::CacheBackend::Disabled => Self::disabled(),
        };

        info!(backend = service.backend(), ttl_secs = config.default_ttl_secs, "Cache initialized");
        service.with_default_ttl(config.default_ttl_secs)
    }

    pub fn backend(&self) -> &'static str {
        self.store.name()
    }

    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key, "Cache miss");
                return None;
            }
            Err(e) => {
                warn!(key, error = %e, "Cache GET failed");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!(key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(key, error = %e, "Discarding undecodable cache entry");
                self.del(&[key.to_string()]).await;
                None
            }
        }
    }

    /// Store a JSON-encoded value with the given TTL (default when `None`)
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl_secs: Option<u64>) -> bool {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "Cache value not serializable");
                return false;
            }
        };

        match self.store.set_ex(key, raw, ttl_secs.unwrap_or(self.default_ttl)).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "Cache SET failed");
                false
            }
        }
    }

    pub async fn del(&self, keys: &[String]) -> bool {
        match self.store.del(keys).await {
            Ok(_) => true,
            Err(e) => {
                warn!(?keys, error = %e, "Cache DEL failed");
                false
            }
        }
    }

    /// Delete every key matching a glob pattern
    pub async fn invalidate_pattern(&self, pattern: &str) -> bool {
        let keys = match self.store.keys(pattern).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(pattern, error = %e, "Cache pattern lookup failed");
                return false;
            }
        };
        if keys.is_empty() {
            return true;
        }
        self.del(&keys).await
    }

    pub async fn exists(&self, key: &str) -> bool {
        match self.store.exists(key).await {
            Ok(found) => found,
            Err(e) => {
                warn!(key, error = %e, "Cache EXISTS failed");
                false
            }
        }
    }

    /// Store a list under `list_key` and every item under its item key
    pub async fn cache_list<T>(&self, entity: CacheEntity, list_key: &str, items: &[T], ttl_secs: Option<u64>) -> bool
    where
        T: Serialize + CacheItem,
    {
        let mut ok = self.set(list_key, items, ttl_secs).await;
        for item in items {
            ok &= self.set(&entity.item_key(item.cache_id()), item, ttl_secs).await;
        }
        ok
    }

    /// Drop an entity's list keys, plus the item key when `id` is given
    pub async fn invalidate(&self, entity: CacheEntity, id: Option<&str>) -> bool {
        let mut keys = entity.list_keys();
        if let Some(id) = id {
            keys.push(entity.item_key(id));
        }
        debug!(entity = entity.plural(), ?id, "Invalidating cache");
        self.del(&keys).await
    }

    pub async fn ping(&self) -> Result<(), String> {
        self.store.ping().await.map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::store::{CacheError, CacheResult};
    use async_trait::async_trait;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: String,
        title: String,
    }

    impl CacheItem for Item {
        fn cache_id(&self) -> &str {
            &self.id
        }
    }

    fn item(id: &str) -> Item {
        Item { id: id.to_string(), title: format!("Item {}", id) }
    }

    /// Store whose every operation fails
    struct BrokenStore;

    #[async_trait]
    impl CacheStore for BrokenStore {
        fn name(&self) -> &'static str {
            "broken"
        }
        async fn get(&self, _: &str) -> CacheResult<Option<String>> {
            Err(pattern_error())
        }
        async fn set_ex(&self, _: &str, _: String, _: u64) -> CacheResult<()> {
            Err(pattern_error())
        }
        async fn del(&self, _: &[String]) -> CacheResult<u64> {
            Err(pattern_error())
        }
        async fn keys(&self, _: &str) -> CacheResult<Vec<String>> {
            Err(pattern_error())
        }
        async fn exists(&self, _: &str) -> CacheResult<bool> {
            Err(pattern_error())
        }
        async fn ping(&self) -> CacheResult<()> {
            Err(pattern_error())
        }
    }

    fn pattern_error() -> CacheError {
        CacheError::Pattern { pattern: "*".into(), message: "down".into() }
    }

    #[tokio::test]
    async fn test_get_set_roundtrip() {
        let cache = CacheService::memory();
        assert!(cache.set("feature:1", &item("1"), None).await);
        assert_eq!(cache.get::<Item>("feature:1").await, Some(item("1")));
        assert!(cache.exists("feature:1").await);
    }

    #[tokio::test]
    async fn test_cache_list_stores_items_individually() {
        let cache = CacheService::memory();
        let items = vec![item("a"), item("b")];
        assert!(cache.cache_list(CacheEntity::Services, "services:all", &items, None).await);

        assert_eq!(cache.get::<Vec<Item>>("services:all").await, Some(items));
        assert_eq!(cache.get::<Item>("service:b").await, Some(item("b")));
    }

    #[tokio::test]
    async fn test_invalidate_drops_lists_and_item() {
        let cache = CacheService::memory();
        let items = vec![item("a"), item("b")];
        cache.cache_list(CacheEntity::Projects, "projects:all", &items, None).await;
        cache.cache_list(CacheEntity::Projects, "projects:active", &items, None).await;

        cache.invalidate(CacheEntity::Projects, Some("a")).await;

        assert!(!cache.exists("projects:all").await);
        assert!(!cache.exists("projects:active").await);
        assert!(!cache.exists("project:a").await);
        assert!(cache.exists("project:b").await);
    }

    #[tokio::test]
    async fn test_invalidate_pattern() {
        let cache = CacheService::memory();
        cache.set("profile:1", &item("1"), None).await;
        cache.set("profile:2", &item("2"), None).await;
        cache.set("profiles:all", &vec![item("1")], None).await;

        assert!(cache.invalidate_pattern("profile:*").await);
        assert!(!cache.exists("profile:1").await);
        assert!(!cache.exists("profile:2").await);
        assert!(cache.exists("profiles:all").await);
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_a_miss() {
        let cache = CacheService::memory();
        cache.set("feature:1", &"not an item", None).await;
        assert_eq!(cache.get::<Item>("feature:1").await, None);
        assert!(!cache.exists("feature:1").await);
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let cache = CacheService::new(Arc::new(BrokenStore));
        assert_eq!(cache.get::<Item>("feature:1").await, None);
        assert!(!cache.set("feature:1", &item("1"), None).await);
        assert!(!cache.del(&["feature:1".into()]).await);
        assert!(!cache.invalidate_pattern("feature:*").await);
        assert!(!cache.exists("feature:1").await);
        assert!(cache.ping().await.is_err());
    }

    #[tokio::test]
    async fn test_disabled_backend() {
        let cache = CacheService::disabled();
        assert_eq!(cache.backend(), "disabled");
        assert!(cache.set("feature:1", &item("1"), None).await);
        assert_eq!(cache.get::<Item>("feature:1").await, None);
    }
}
