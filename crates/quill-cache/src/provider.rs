//! [`CacheProvider`]: enum dispatch over the available backends.

use std::{convert::Infallible, fmt, time::Duration};

use quill_core::cache::{Cache, NoopCache};

use crate::{Error, MemoryCache, RedisCache, Result};

/// The cache backend chosen at startup.
pub enum CacheProvider {
  Redis(RedisCache),
  Memory(MemoryCache),
  /// Caching disabled: every read misses.
  Noop(NoopCache),
}

impl CacheProvider {
  pub fn name(&self) -> &'static str {
    match self {
      Self::Redis(_) => "redis",
      Self::Memory(_) => "memory",
      Self::Noop(_) => "none",
    }
  }
}

impl fmt::Debug for CacheProvider {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("CacheProvider").field(&self.name()).finish()
  }
}

impl From<RedisCache> for CacheProvider {
  fn from(c: RedisCache) -> Self { Self::Redis(c) }
}

impl From<MemoryCache> for CacheProvider {
  fn from(c: MemoryCache) -> Self { Self::Memory(c) }
}

impl From<NoopCache> for CacheProvider {
  fn from(c: NoopCache) -> Self { Self::Noop(c) }
}

fn absurd<T>(e: Infallible) -> T { match e {} }

impl Cache for CacheProvider {
  type Error = Error;

  async fn get(&self, key: &str) -> Result<Option<String>> {
    match self {
      Self::Redis(c) => c.get(key).await,
      Self::Memory(c) => c.get(key).await.map_err(absurd),
      Self::Noop(c) => c.get(key).await.map_err(absurd),
    }
  }

  async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
    match self {
      Self::Redis(c) => c.set(key, value, ttl).await,
      Self::Memory(c) => c.set(key, value, ttl).await.map_err(absurd),
      Self::Noop(c) => c.set(key, value, ttl).await.map_err(absurd),
    }
  }

  async fn delete(&self, key: &str) -> Result<()> {
    match self {
      Self::Redis(c) => c.delete(key).await,
      Self::Memory(c) => c.delete(key).await.map_err(absurd),
      Self::Noop(c) => c.delete(key).await.map_err(absurd),
    }
  }

  async fn delete_by_prefix(&self, prefix: &str) -> Result<u64> {
    match self {
      Self::Redis(c) => c.delete_by_prefix(prefix).await,
      Self::Memory(c) => c.delete_by_prefix(prefix).await.map_err(absurd),
      Self::Noop(c) => c.delete_by_prefix(prefix).await.map_err(absurd),
    }
  }
}
