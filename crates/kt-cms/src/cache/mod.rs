//! Cache Layer
//!
//! Optional read-through cache keyed by entity.

pub mod keys;
pub mod store;
pub mod service;

pub use keys::{ttl, CacheEntity};
pub use store::{CacheError, CacheStore, DisabledStore, MemoryStore, RedisStore};
pub use service::{CacheItem, CacheService};
