//! The `Cache` trait, the no-op backend and the list codec.
//!
//! The cache is a string-keyed, string-valued store with per-key expiry.
//! Callers own serialisation; comment lists are stored as a versioned JSON
//! envelope so entries written by an older format read as misses.

use std::{convert::Infallible, future::Future, time::Duration};

use serde::{Deserialize, Serialize};

use crate::comment::Comment;

// ─── Layout ──────────────────────────────────────────────────────────────────

/// Prefix shared by every cached comment list.
pub const CACHE_KEY_PREFIX: &str = "comments:";

/// Expiry applied to a cached comment list.
pub const LIST_TTL: Duration = Duration::from_secs(600);

/// Version tag written into every cached list envelope.
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// Cache key holding the comment list for `parent_id`.
pub fn cache_key(parent_id: &str) -> String {
  format!("{CACHE_KEY_PREFIX}{parent_id}")
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a key-value cache backend.
pub trait Cache: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch the value under `key`; `None` if absent or expired.
  fn get<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;

  /// Store `value` under `key` for `ttl`, overwriting silently.
  fn set<'a>(
    &'a self,
    key: &'a str,
    value: String,
    ttl: Duration,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Remove one key. A missing key is not an error.
  fn delete<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Remove every key starting with `prefix`, returning how many were
  /// removed. Best-effort: keys written during the sweep may survive.
  fn delete_by_prefix<'a>(
    &'a self,
    prefix: &'a str,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;
}

// ─── No-op backend ───────────────────────────────────────────────────────────

/// A cache that never holds anything. Every read misses, every write
/// succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl Cache for NoopCache {
  type Error = Infallible;

  async fn get(&self, _key: &str) -> Result<Option<String>, Infallible> {
    Ok(None)
  }

  async fn set(
    &self,
    _key: &str,
    _value: String,
    _ttl: Duration,
  ) -> Result<(), Infallible> {
    Ok(())
  }

  async fn delete(&self, _key: &str) -> Result<(), Infallible> { Ok(()) }

  async fn delete_by_prefix(&self, _prefix: &str) -> Result<u64, Infallible> {
    Ok(0)
  }
}

// ─── Codec ───────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct EnvelopeRef<'a> {
  v:        u32,
  comments: &'a [Comment],
}

#[derive(Deserialize)]
struct Envelope {
  v:        u32,
  comments: Vec<Comment>,
}

/// Encode a comment list for storage in the cache.
pub fn encode_list(comments: &[Comment]) -> serde_json::Result<String> {
  serde_json::to_string(&EnvelopeRef { v: CACHE_FORMAT_VERSION, comments })
}

/// Decode a cached comment list. Unparseable input or an envelope of a
/// different version yields `None`.
pub fn decode_list(raw: &str) -> Option<Vec<Comment>> {
  let envelope: Envelope = serde_json::from_str(raw).ok()?;
  (envelope.v == CACHE_FORMAT_VERSION).then_some(envelope.comments)
}
