//! [`CommentService`]: cache-aside reads and ownership-gated writes.
//!
//! The service holds no state of its own beyond handles to its two ports.
//! Reads consult the cache first and fall through to the store on a miss;
//! every successful write deletes the affected parent's cached list before
//! returning, as does a write abandoned at its deadline. Cache failures are logged and absorbed; only store failures,
//! validation and ownership violations reach the caller.

use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::{Instant, timeout_at};
use tracing::{debug, warn};

use crate::{
  Error, Result,
  cache::{CACHE_KEY_PREFIX, Cache, LIST_TTL, cache_key, decode_list, encode_list},
  comment::{Comment, CommentId, NewComment, ensure_content},
  store::CommentStore,
};

/// The comment use-case layer, generic over its store and cache ports.
///
/// Cloning is cheap; both ports are reference-counted.
pub struct CommentService<S, C> {
  store:   Arc<S>,
  cache:   Arc<C>,
  timeout: Option<Duration>,
}

impl<S, C> Clone for CommentService<S, C> {
  fn clone(&self) -> Self {
    Self {
      store:   Arc::clone(&self.store),
      cache:   Arc::clone(&self.cache),
      timeout: self.timeout,
    }
  }
}

impl<S, C> CommentService<S, C>
where
  S: CommentStore,
  C: Cache,
{
  pub fn new(store: Arc<S>, cache: Arc<C>) -> Self {
    Self { store, cache, timeout: None }
  }

  /// Bound every operation by `timeout`. Port calls still in flight when it
  /// elapses are dropped and the operation fails with [`Error::Cancelled`].
  pub fn with_deadline(mut self, timeout: Duration) -> Self {
    self.timeout = Some(timeout);
    self
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn cache(&self) -> &C { &self.cache }

  // ── Operations ──────────────────────────────────────────────────────────

  /// Post a new comment under `parent_id` on behalf of `author_id`.
  pub async fn create(
    &self,
    parent_id: &str,
    author_id: &str,
    content: &str,
  ) -> Result<Comment> {
    ensure_content(content)?;
    let deadline = self.deadline();

    let input = NewComment {
      parent_id: parent_id.to_owned(),
      author_id: author_id.to_owned(),
      content:   content.to_owned(),
    };
    let comment = self.write(deadline, parent_id, self.store.create(input)).await?;

    self.invalidate(&comment.parent_id).await;
    debug!(id = %comment.comment_id, parent_id, "comment created");
    Ok(comment)
  }

  /// All comments for `parent_id`, newest first, served from the cache when
  /// a readable entry exists.
  pub async fn get_by_parent(&self, parent_id: &str) -> Result<Vec<Comment>> {
    let deadline = self.deadline();
    let key = cache_key(parent_id);

    match within(deadline, self.cache.get(&key)).await {
      Ok(Ok(Some(raw))) => match decode_list(&raw) {
        Some(comments) => {
          debug!(%key, "comment list cache hit");
          return Ok(comments);
        }
        None => warn!(%key, "discarding unreadable cached comment list"),
      },
      Ok(Ok(None)) => debug!(%key, "comment list cache miss"),
      Ok(Err(e)) => warn!(%key, error = %e, "cache read failed"),
      Err(_) => warn!(%key, "cache read timed out"),
    }

    let comments = within(deadline, self.store.find_by_parent(parent_id))
      .await?
      .map_err(Error::internal)?;

    match encode_list(&comments) {
      Ok(raw) => match within(deadline, self.cache.set(&key, raw, LIST_TTL)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(%key, error = %e, "cache populate failed"),
        Err(_) => warn!(%key, "cache populate timed out"),
      },
      Err(e) => warn!(%key, error = %e, "failed to encode comment list"),
    }

    Ok(comments)
  }

  /// Replace the content of comment `id`. Only its author may do so.
  pub async fn update(
    &self,
    id: CommentId,
    caller_id: &str,
    content: &str,
  ) -> Result<Comment> {
    ensure_content(content)?;
    let deadline = self.deadline();

    let mut comment = self.owned_by(deadline, id, caller_id).await?;
    comment.content = content.to_owned();
    let parent_id = comment.parent_id.clone();

    let updated = self
      .write(deadline, &parent_id, self.store.update(comment))
      .await?
      .ok_or(Error::CommentNotFound(id))?;

    self.invalidate(&updated.parent_id).await;
    debug!(%id, parent_id = %updated.parent_id, "comment updated");
    Ok(updated)
  }

  /// Permanently remove comment `id`. Only its author may do so.
  pub async fn delete(&self, id: CommentId, caller_id: &str) -> Result<()> {
    let deadline = self.deadline();
    let comment = self.owned_by(deadline, id, caller_id).await?;

    let removed = self
      .write(deadline, &comment.parent_id, self.store.delete(id))
      .await?;
    if !removed {
      return Err(Error::CommentNotFound(id));
    }

    self.invalidate(&comment.parent_id).await;
    debug!(%id, parent_id = %comment.parent_id, "comment deleted");
    Ok(())
  }

  /// Drop every cached comment list. Returns the number of keys removed.
  ///
  /// Unlike the invalidations performed by writes, a failure here is
  /// reported to the caller.
  pub async fn purge_cache(&self) -> Result<u64> {
    let removed = within(self.deadline(), self.cache.delete_by_prefix(CACHE_KEY_PREFIX))
      .await?
      .map_err(Error::internal)?;
    debug!(removed, "purged cached comment lists");
    Ok(removed)
  }

  // ── Helpers ─────────────────────────────────────────────────────────────

  fn deadline(&self) -> Option<Instant> {
    self.timeout.map(|t| Instant::now() + t)
  }

  /// Load comment `id` from the store and check that `caller_id` wrote it.
  async fn owned_by(
    &self,
    deadline: Option<Instant>,
    id: CommentId,
    caller_id: &str,
  ) -> Result<Comment> {
    let comment = within(deadline, self.store.find_by_id(id))
      .await?
      .map_err(Error::internal)?
      .ok_or(Error::CommentNotFound(id))?;

    if comment.author_id != caller_id {
      warn!(%id, caller_id, "rejected mutation by non-author");
      return Err(Error::UnauthorizedAction(id));
    }
    Ok(comment)
  }

  /// Run a store write under `deadline`.
  ///
  /// A write abandoned at the deadline may still commit on the store's side,
  /// so the cached list for `parent_id` is dropped before reporting
  /// [`Error::Cancelled`].
  async fn write<T, F>(
    &self,
    deadline: Option<Instant>,
    parent_id: &str,
    fut: F,
  ) -> Result<T>
  where
    F: Future<Output = Result<T, S::Error>>,
  {
    match within(deadline, fut).await {
      Ok(result) => result.map_err(Error::internal),
      Err(cancelled) => {
        warn!(parent_id, "store write outlived its deadline");
        self.invalidate(parent_id).await;
        Err(cancelled)
      }
    }
  }

  /// Delete the cached list for `parent_id`.
  ///
  /// Runs after the store write has committed, so it is not bounded by the
  /// operation deadline and its failure is only logged.
  async fn invalidate(&self, parent_id: &str) {
    let key = cache_key(parent_id);
    if let Err(e) = self.cache.delete(&key).await {
      warn!(%key, error = %e, "cache invalidation failed");
    }
  }
}

/// Await `fut`, giving up with [`Error::Cancelled`] once `deadline` passes.
async fn within<F: Future>(deadline: Option<Instant>, fut: F) -> Result<F::Output> {
  match deadline {
    Some(at) => timeout_at(at, fut).await.map_err(|_| Error::Cancelled),
    None => Ok(fut.await),
  }
}
