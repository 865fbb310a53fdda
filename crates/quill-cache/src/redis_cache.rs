//! [`RedisCache`]: a Redis-backed [`Cache`].

use std::time::Duration;

use quill_core::cache::Cache;
use redis::{AsyncCommands as _, aio::MultiplexedConnection};
use tracing::debug;

use crate::{Error, Result};

/// Keys requested per `SCAN` round trip.
const SCAN_BATCH: usize = 100;

/// A cache backed by a Redis server.
///
/// Cloning is cheap; the multiplexed connection is shared.
#[derive(Clone)]
pub struct RedisCache {
  conn: MultiplexedConnection,
}

impl RedisCache {
  /// Connect to the server at `url` (e.g. `redis://127.0.0.1:6379`).
  pub async fn connect(url: &str) -> Result<Self> {
    let client = redis::Client::open(url)?;
    let conn = client.get_multiplexed_async_connection().await?;
    Ok(Self { conn })
  }

  /// Round-trip a `PING` to verify the server is reachable.
  pub async fn ping(&self) -> Result<()> {
    let mut conn = self.conn.clone();
    let _: String = redis::cmd("PING").query_async(&mut conn).await?;
    Ok(())
  }
}

impl Cache for RedisCache {
  type Error = Error;

  async fn get(&self, key: &str) -> Result<Option<String>> {
    let mut conn = self.conn.clone();
    let value: Option<String> = conn.get(key).await?;
    Ok(value)
  }

  async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
    let mut conn = self.conn.clone();
    // Redis rejects a zero expiry.
    let seconds = ttl.as_secs().max(1);
    let _: () = conn.set_ex(key, value, seconds).await?;
    Ok(())
  }

  async fn delete(&self, key: &str) -> Result<()> {
    let mut conn = self.conn.clone();
    let _: () = conn.del(key).await?;
    Ok(())
  }

  /// Cursor-driven `SCAN MATCH` so large key sets never block the server
  /// the way `KEYS` would.
  async fn delete_by_prefix(&self, prefix: &str) -> Result<u64> {
    let mut conn = self.conn.clone();
    let pattern = format!("{}*", escape_glob(prefix));
    let mut cursor: u64 = 0;
    let mut removed: u64 = 0;

    loop {
      let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
        .arg(cursor)
        .arg("MATCH")
        .arg(&pattern)
        .arg("COUNT")
        .arg(SCAN_BATCH)
        .query_async(&mut conn)
        .await?;

      if !keys.is_empty() {
        let n: u64 = conn.del(&keys).await?;
        removed += n;
      }
      if next == 0 {
        break;
      }
      cursor = next;
    }

    debug!(%pattern, removed, "redis prefix sweep finished");
    Ok(removed)
  }
}

/// Escape the glob metacharacters `SCAN MATCH` understands so `prefix` is
/// matched literally.
fn escape_glob(prefix: &str) -> String {
  let mut out = String::with_capacity(prefix.len());
  for ch in prefix.chars() {
    if matches!(ch, '*' | '?' | '[' | ']' | '\\') {
      out.push('\\');
    }
    out.push(ch);
  }
  out
}
