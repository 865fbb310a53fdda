//! Behavioural tests for `CommentService` against in-memory fake ports.

use std::{
  collections::HashMap,
  sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicI64, Ordering},
  },
  time::Duration,
};

use chrono::{TimeDelta, Utc};

use crate::{
  Error,
  cache::{Cache, cache_key, decode_list},
  comment::{Comment, CommentId, NewComment},
  service::CommentService,
  store::CommentStore,
};

// ─── Fakes ───────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("injected failure")]
struct Injected;

#[derive(Default)]
struct FakeStore {
  rows:    Mutex<Vec<Comment>>,
  next_id: AtomicI64,
  fail:    AtomicBool,
  /// Simulated latency applied to every call.
  delay:   Option<Duration>,
  /// Stall after a write has been applied, as a store would when the commit
  /// lands but the reply is slow.
  lag:     Option<Duration>,
}

impl FakeStore {
  fn row(&self, id: CommentId) -> Option<Comment> {
    self.rows.lock().unwrap().iter().find(|c| c.comment_id == id).cloned()
  }

  async fn pause(&self) -> Result<(), Injected> {
    if let Some(d) = self.delay {
      tokio::time::sleep(d).await;
    }
    if self.fail.load(Ordering::SeqCst) { Err(Injected) } else { Ok(()) }
  }

  async fn linger(&self) {
    if let Some(d) = self.lag {
      tokio::time::sleep(d).await;
    }
  }
}

impl CommentStore for FakeStore {
  type Error = Injected;

  async fn create(&self, input: NewComment) -> Result<Comment, Injected> {
    self.pause().await?;
    let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
    // Space creation times apart so ordering is deterministic.
    let at = Utc::now() + TimeDelta::milliseconds(id);
    let comment = Comment {
      comment_id: CommentId(id),
      parent_id:  input.parent_id,
      author_id:  input.author_id,
      content:    input.content,
      created_at: at,
      updated_at: at,
    };
    self.rows.lock().unwrap().push(comment.clone());
    self.linger().await;
    Ok(comment)
  }

  async fn find_by_id(&self, id: CommentId) -> Result<Option<Comment>, Injected> {
    self.pause().await?;
    Ok(self.row(id))
  }

  async fn find_by_parent(&self, parent_id: &str) -> Result<Vec<Comment>, Injected> {
    self.pause().await?;
    let mut out: Vec<Comment> = self
      .rows
      .lock()
      .unwrap()
      .iter()
      .filter(|c| c.parent_id == parent_id)
      .cloned()
      .collect();
    out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(out)
  }

  async fn update(&self, comment: Comment) -> Result<Option<Comment>, Injected> {
    self.pause().await?;
    let updated = {
      let mut rows = self.rows.lock().unwrap();
      rows.iter_mut().find(|c| c.comment_id == comment.comment_id).map(|row| {
        row.content = comment.content;
        row.updated_at = Utc::now();
        row.clone()
      })
    };
    self.linger().await;
    Ok(updated)
  }

  async fn delete(&self, id: CommentId) -> Result<bool, Injected> {
    self.pause().await?;
    let removed = {
      let mut rows = self.rows.lock().unwrap();
      let before = rows.len();
      rows.retain(|c| c.comment_id != id);
      rows.len() != before
    };
    self.linger().await;
    Ok(removed)
  }
}

#[derive(Default)]
struct FakeCache {
  entries: Mutex<HashMap<String, String>>,
  /// Every call, in order, as `"op key"`.
  log:     Mutex<Vec<String>>,
  fail:    AtomicBool,
}

impl FakeCache {
  fn record(&self, op: &str, key: &str) -> Result<(), Injected> {
    self.log.lock().unwrap().push(format!("{op} {key}"));
    if self.fail.load(Ordering::SeqCst) { Err(Injected) } else { Ok(()) }
  }

  fn log(&self) -> Vec<String> { self.log.lock().unwrap().clone() }

  fn raw(&self, key: &str) -> Option<String> {
    self.entries.lock().unwrap().get(key).cloned()
  }

  fn put_raw(&self, key: &str, value: &str) {
    self.entries.lock().unwrap().insert(key.into(), value.into());
  }
}

impl Cache for FakeCache {
  type Error = Injected;

  async fn get(&self, key: &str) -> Result<Option<String>, Injected> {
    self.record("get", key)?;
    Ok(self.raw(key))
  }

  async fn set(&self, key: &str, value: String, _ttl: Duration) -> Result<(), Injected> {
    self.record("set", key)?;
    self.entries.lock().unwrap().insert(key.into(), value);
    Ok(())
  }

  async fn delete(&self, key: &str) -> Result<(), Injected> {
    self.record("del", key)?;
    self.entries.lock().unwrap().remove(key);
    Ok(())
  }

  async fn delete_by_prefix(&self, prefix: &str) -> Result<u64, Injected> {
    self.record("del_prefix", prefix)?;
    let mut entries = self.entries.lock().unwrap();
    let before = entries.len();
    entries.retain(|k, _| !k.starts_with(prefix));
    Ok((before - entries.len()) as u64)
  }
}

type Service = CommentService<FakeStore, FakeCache>;

fn service() -> (Service, Arc<FakeStore>, Arc<FakeCache>) {
  let store = Arc::new(FakeStore::default());
  let cache = Arc::new(FakeCache::default());
  (CommentService::new(store.clone(), cache.clone()), store, cache)
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_returns_stored_comment() {
  let (svc, store, _) = service();
  let c = svc.create("P1", "alice", "first!").await.unwrap();
  assert_eq!(c.parent_id, "P1");
  assert_eq!(c.author_id, "alice");
  assert_eq!(c.content, "first!");
  assert!(c.comment_id.is_valid());
  assert_eq!(store.row(c.comment_id), Some(c));
}

#[tokio::test]
async fn create_invalidates_parent_list() {
  let (svc, _, cache) = service();
  svc.get_by_parent("P1").await.unwrap();
  assert!(cache.raw("comments:P1").is_some());

  svc.create("P1", "alice", "hi").await.unwrap();
  assert!(cache.raw("comments:P1").is_none());
  assert_eq!(cache.log().last().map(String::as_str), Some("del comments:P1"));
}

#[tokio::test]
async fn empty_content_is_rejected_before_any_io() {
  let (svc, store, cache) = service();

  assert!(matches!(svc.create("P1", "alice", "").await, Err(Error::EmptyContent)));
  assert!(matches!(svc.create("P1", "alice", "  \n").await, Err(Error::EmptyContent)));
  assert!(matches!(
    svc.update(CommentId(1), "alice", "").await,
    Err(Error::EmptyContent)
  ));

  assert!(store.rows.lock().unwrap().is_empty());
  assert!(cache.log().is_empty());
  assert!(cache.raw("comments:P1").is_none());
}

#[tokio::test]
async fn create_store_failure_is_internal_and_leaves_cache_alone() {
  let (svc, store, cache) = service();
  store.fail.store(true, Ordering::SeqCst);
  assert!(matches!(svc.create("P1", "alice", "x").await, Err(Error::Internal(_))));
  assert!(cache.log().is_empty());
}

#[tokio::test]
async fn cache_failure_does_not_fail_writes() {
  let (svc, _, cache) = service();
  cache.fail.store(true, Ordering::SeqCst);
  let c = svc.create("P1", "alice", "x").await.unwrap();
  let u = svc.update(c.comment_id, "alice", "y").await.unwrap();
  assert_eq!(u.content, "y");
  svc.delete(c.comment_id, "alice").await.unwrap();
}

// ─── GetByParent ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn miss_reads_store_and_populates_cache() {
  let (svc, _, cache) = service();
  let c = svc.create("P1", "alice", "x").await.unwrap();

  let list = svc.get_by_parent("P1").await.unwrap();
  assert_eq!(list, vec![c.clone()]);

  let cached = cache.raw(&cache_key("P1")).expect("populated");
  assert_eq!(decode_list(&cached), Some(vec![c]));
}

#[tokio::test]
async fn hit_short_circuits_the_store() {
  let (svc, store, _) = service();
  svc.create("P1", "alice", "x").await.unwrap();
  let first = svc.get_by_parent("P1").await.unwrap();

  // A failing store proves the second read never reaches it.
  store.fail.store(true, Ordering::SeqCst);
  let second = svc.get_by_parent("P1").await.unwrap();
  assert_eq!(first, second);
}

#[tokio::test]
async fn repeated_reads_are_stable() {
  let (svc, _, _) = service();
  for text in ["a", "b", "c"] {
    svc.create("P1", "alice", text).await.unwrap();
  }
  let miss = svc.get_by_parent("P1").await.unwrap();
  let hit = svc.get_by_parent("P1").await.unwrap();
  let hit_again = svc.get_by_parent("P1").await.unwrap();
  assert_eq!(miss, hit);
  assert_eq!(hit, hit_again);
}

#[tokio::test]
async fn list_is_newest_first() {
  let (svc, _, _) = service();
  let a = svc.create("P1", "alice", "one").await.unwrap();
  let b = svc.create("P1", "bob", "two").await.unwrap();
  let c = svc.create("P1", "carol", "three").await.unwrap();
  svc.create("P2", "dave", "elsewhere").await.unwrap();

  let ids: Vec<_> = svc
    .get_by_parent("P1")
    .await
    .unwrap()
    .into_iter()
    .map(|c| c.comment_id)
    .collect();
  assert_eq!(ids, vec![c.comment_id, b.comment_id, a.comment_id]);
}

#[tokio::test]
async fn empty_parent_yields_empty_list() {
  let (svc, _, _) = service();
  assert!(svc.get_by_parent("nobody").await.unwrap().is_empty());
}

#[tokio::test]
async fn corrupt_cache_entry_falls_back_to_store() {
  let (svc, _, cache) = service();
  let c = svc.create("P1", "alice", "x").await.unwrap();
  cache.put_raw("comments:P1", "{ definitely not json");

  let list = svc.get_by_parent("P1").await.unwrap();
  assert_eq!(list, vec![c]);
  // The bad entry is overwritten with a readable one.
  assert!(decode_list(&cache.raw("comments:P1").unwrap()).is_some());
}

#[tokio::test]
async fn stale_format_cache_entry_falls_back_to_store() {
  let (svc, _, cache) = service();
  let c = svc.create("P1", "alice", "x").await.unwrap();
  cache.put_raw("comments:P1", "[]");

  assert_eq!(svc.get_by_parent("P1").await.unwrap(), vec![c]);
}

#[tokio::test]
async fn cache_outage_still_serves_reads() {
  let (svc, _, cache) = service();
  let c = svc.create("P1", "alice", "x").await.unwrap();
  cache.fail.store(true, Ordering::SeqCst);
  assert_eq!(svc.get_by_parent("P1").await.unwrap(), vec![c]);
}

#[tokio::test]
async fn read_store_failure_is_internal() {
  let (svc, store, _) = service();
  store.fail.store(true, Ordering::SeqCst);
  assert!(matches!(svc.get_by_parent("P1").await, Err(Error::Internal(_))));
}

// ─── Update / Delete ─────────────────────────────────────────────────────────

#[tokio::test]
async fn write_then_read_reflects_every_change() {
  let (svc, _, _) = service();

  let c = svc.create("P1", "alice", "original").await.unwrap();
  let list = svc.get_by_parent("P1").await.unwrap();
  assert_eq!(list.len(), 1);

  svc.update(c.comment_id, "alice", "edited").await.unwrap();
  let list = svc.get_by_parent("P1").await.unwrap();
  assert_eq!(list.len(), 1);
  assert_eq!(list[0].content, "edited");

  svc.delete(c.comment_id, "alice").await.unwrap();
  assert!(svc.get_by_parent("P1").await.unwrap().is_empty());
}

#[tokio::test]
async fn update_refreshes_updated_at_only() {
  let (svc, _, _) = service();
  let c = svc.create("P1", "alice", "v1").await.unwrap();
  let u = svc.update(c.comment_id, "alice", "v2").await.unwrap();
  assert_eq!(u.comment_id, c.comment_id);
  assert_eq!(u.author_id, c.author_id);
  assert_eq!(u.parent_id, c.parent_id);
  assert_eq!(u.created_at, c.created_at);
  assert_eq!(u.content, "v2");
}

#[tokio::test]
async fn non_author_cannot_mutate() {
  let (svc, store, cache) = service();
  let c = svc.create("P1", "alice", "mine").await.unwrap();
  svc.get_by_parent("P1").await.unwrap();
  let log_before = cache.log();

  assert!(matches!(
    svc.update(c.comment_id, "mallory", "pwned").await,
    Err(Error::UnauthorizedAction(id)) if id == c.comment_id
  ));
  assert!(matches!(
    svc.delete(c.comment_id, "mallory").await,
    Err(Error::UnauthorizedAction(_))
  ));

  assert_eq!(store.row(c.comment_id), Some(c));
  assert_eq!(cache.log(), log_before);
  assert!(cache.raw("comments:P1").is_some());
}

#[tokio::test]
async fn missing_comment_is_not_found_without_cache_access() {
  let (svc, _, cache) = service();
  let id = CommentId(404);
  assert!(matches!(
    svc.update(id, "alice", "x").await,
    Err(Error::CommentNotFound(got)) if got == id
  ));
  assert!(matches!(svc.delete(id, "alice").await, Err(Error::CommentNotFound(_))));
  assert!(cache.log().is_empty());
}

#[tokio::test]
async fn invalidation_targets_the_records_parent() {
  let (svc, _, cache) = service();
  let c = svc.create("P1", "alice", "x").await.unwrap();
  svc.get_by_parent("P1").await.unwrap();
  svc.get_by_parent("P2").await.unwrap();

  svc.update(c.comment_id, "alice", "y").await.unwrap();
  assert!(cache.raw("comments:P1").is_none());
  assert!(cache.raw("comments:P2").is_some());
}

// ─── Purge / deadlines ───────────────────────────────────────────────────────

#[tokio::test]
async fn purge_cache_drops_every_list() {
  let (svc, _, cache) = service();
  svc.get_by_parent("P1").await.unwrap();
  svc.get_by_parent("P2").await.unwrap();
  cache.put_raw("sessions:x", "keep");

  assert_eq!(svc.purge_cache().await.unwrap(), 2);
  assert!(cache.raw("comments:P1").is_none());
  assert!(cache.raw("sessions:x").is_some());
}

#[tokio::test]
async fn purge_cache_surfaces_cache_errors() {
  let (svc, _, cache) = service();
  cache.fail.store(true, Ordering::SeqCst);
  assert!(matches!(svc.purge_cache().await, Err(Error::Internal(_))));
}

#[tokio::test(start_paused = true)]
async fn slow_store_is_cancelled_at_deadline() {
  let store = Arc::new(FakeStore {
    delay: Some(Duration::from_secs(5)),
    ..FakeStore::default()
  });
  let cache = Arc::new(FakeCache::default());
  let svc = CommentService::new(store.clone(), cache.clone())
    .with_deadline(Duration::from_secs(1));

  assert!(matches!(svc.create("P1", "alice", "x").await, Err(Error::Cancelled)));
  assert!(store.rows.lock().unwrap().is_empty());
  assert!(matches!(svc.get_by_parent("P1").await, Err(Error::Cancelled)));
}

#[tokio::test(start_paused = true)]
async fn fast_store_completes_within_deadline() {
  let store = Arc::new(FakeStore {
    delay: Some(Duration::from_millis(10)),
    ..FakeStore::default()
  });
  let svc = CommentService::new(store, Arc::new(FakeCache::default()))
    .with_deadline(Duration::from_secs(1));

  let c = svc.create("P1", "alice", "x").await.unwrap();
  assert_eq!(svc.get_by_parent("P1").await.unwrap(), vec![c]);
}

/// A service over `store` and `cache` that gives up after one second.
fn bounded(store: &Arc<FakeStore>, cache: &Arc<FakeCache>) -> Service {
  CommentService::new(store.clone(), cache.clone()).with_deadline(Duration::from_secs(1))
}

fn lagging_store() -> Arc<FakeStore> {
  Arc::new(FakeStore { lag: Some(Duration::from_secs(5)), ..FakeStore::default() })
}

#[tokio::test(start_paused = true)]
async fn update_committed_past_deadline_still_invalidates() {
  let store = lagging_store();
  let cache = Arc::new(FakeCache::default());
  let open = CommentService::new(store.clone(), cache.clone());
  let c = open.create("P1", "alice", "original").await.unwrap();
  open.get_by_parent("P1").await.unwrap();
  assert!(cache.raw("comments:P1").is_some());

  let result = bounded(&store, &cache).update(c.comment_id, "alice", "edited").await;
  assert!(matches!(result, Err(Error::Cancelled)));
  assert_eq!(store.row(c.comment_id).unwrap().content, "edited");
  assert!(cache.raw("comments:P1").is_none());

  let served = open.get_by_parent("P1").await.unwrap();
  assert_eq!(served[0].content, "edited");
}

#[tokio::test(start_paused = true)]
async fn delete_committed_past_deadline_still_invalidates() {
  let store = lagging_store();
  let cache = Arc::new(FakeCache::default());
  let open = CommentService::new(store.clone(), cache.clone());
  let c = open.create("P1", "alice", "doomed").await.unwrap();
  open.get_by_parent("P1").await.unwrap();

  let result = bounded(&store, &cache).delete(c.comment_id, "alice").await;
  assert!(matches!(result, Err(Error::Cancelled)));
  assert!(store.row(c.comment_id).is_none());
  assert!(cache.raw("comments:P1").is_none());
  assert!(open.get_by_parent("P1").await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn create_committed_past_deadline_still_invalidates() {
  let store = lagging_store();
  let cache = Arc::new(FakeCache::default());
  let open = CommentService::new(store.clone(), cache.clone());
  open.get_by_parent("P1").await.unwrap();

  let result = bounded(&store, &cache).create("P1", "alice", "late").await;
  assert!(matches!(result, Err(Error::Cancelled)));
  assert_eq!(store.rows.lock().unwrap().len(), 1);
  assert!(cache.raw("comments:P1").is_none());
  assert_eq!(open.get_by_parent("P1").await.unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn slow_lookup_cancels_update_and_delete_without_writing() {
  let store = Arc::new(FakeStore {
    delay: Some(Duration::from_secs(5)),
    ..FakeStore::default()
  });
  let cache = Arc::new(FakeCache::default());
  let open = CommentService::new(store.clone(), cache.clone());
  let c = open.create("P1", "alice", "kept").await.unwrap();
  open.get_by_parent("P1").await.unwrap();

  let svc = bounded(&store, &cache);
  assert!(matches!(
    svc.update(c.comment_id, "alice", "edited").await,
    Err(Error::Cancelled)
  ));
  assert!(matches!(svc.delete(c.comment_id, "alice").await, Err(Error::Cancelled)));

  assert_eq!(store.row(c.comment_id), Some(c));
  assert!(cache.raw("comments:P1").is_some());
}
