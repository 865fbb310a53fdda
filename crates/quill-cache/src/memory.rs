//! [`MemoryCache`]: an in-process cache with per-key expiry.

use std::{convert::Infallible, time::Duration};

use dashmap::DashMap;
use quill_core::cache::Cache;
use tokio::time::Instant;

struct Entry {
  value:      String,
  expires_at: Instant,
}

/// A process-local cache backed by a concurrent map.
///
/// Expired entries read as absent and are evicted lazily on access or by
/// [`MemoryCache::evict_expired`].
#[derive(Default)]
pub struct MemoryCache {
  entries: DashMap<String, Entry>,
}

impl MemoryCache {
  pub fn new() -> Self { Self::default() }

  /// Number of entries held, including expired ones not yet evicted.
  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  /// Drop every expired entry. Returns how many were removed.
  pub fn evict_expired(&self) -> usize {
    let now = Instant::now();
    let before = self.entries.len();
    self.entries.retain(|_, e| e.expires_at > now);
    before.saturating_sub(self.entries.len())
  }
}

impl Cache for MemoryCache {
  type Error = Infallible;

  async fn get(&self, key: &str) -> Result<Option<String>, Infallible> {
    let now = Instant::now();
    // The shard guard must be released before `remove_if` touches the
    // same shard.
    let hit = match self.entries.get(key) {
      Some(e) if e.expires_at > now => Some(e.value.clone()),
      _ => None,
    };
    if hit.is_none() {
      self.entries.remove_if(key, |_, e| e.expires_at <= now);
    }
    Ok(hit)
  }

  async fn set(
    &self,
    key: &str,
    value: String,
    ttl: Duration,
  ) -> Result<(), Infallible> {
    let expires_at = Instant::now() + ttl;
    self.entries.insert(key.to_owned(), Entry { value, expires_at });
    Ok(())
  }

  async fn delete(&self, key: &str) -> Result<(), Infallible> {
    self.entries.remove(key);
    Ok(())
  }

  async fn delete_by_prefix(&self, prefix: &str) -> Result<u64, Infallible> {
    let mut removed = 0u64;
    self.entries.retain(|k, _| {
      let keep = !k.starts_with(prefix);
      if !keep {
        removed += 1;
      }
      keep
    });
    Ok(removed)
  }
}
