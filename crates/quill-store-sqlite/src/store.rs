//! [`SqliteStore`]: the SQLite implementation of [`CommentStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use tracing::info;

use quill_core::{
  comment::{Comment, CommentId, NewComment},
  store::CommentStore,
};

use crate::{
  Result,
  encode::{COLUMNS, RawComment, encode_dt, now},
  schema::{SCHEMA, TEARDOWN},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Quill comment store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Drop all comments and recreate the schema from scratch.
  pub async fn reset(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(TEARDOWN)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    info!("comment store reset");
    Ok(())
  }
}

// ─── CommentStore impl ───────────────────────────────────────────────────────

impl CommentStore for SqliteStore {
  type Error = crate::Error;

  async fn create(&self, input: NewComment) -> Result<Comment> {
    let at     = now();
    let at_str = encode_dt(at);

    let NewComment { parent_id, author_id, content } = input;
    let (p, a, c) = (parent_id.clone(), author_id.clone(), content.clone());

    let comment_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO comments (parent_id, author_id, content, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?4)",
          rusqlite::params![p, a, c, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Comment {
      comment_id: CommentId(comment_id),
      parent_id,
      author_id,
      content,
      created_at: at,
      updated_at: at,
    })
  }

  async fn find_by_id(&self, id: CommentId) -> Result<Option<Comment>> {
    let raw: Option<RawComment> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {COLUMNS} FROM comments WHERE comment_id = ?1"),
            rusqlite::params![id.0],
            RawComment::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawComment::into_comment).transpose()
  }

  async fn find_by_parent(&self, parent_id: &str) -> Result<Vec<Comment>> {
    let parent_id = parent_id.to_owned();

    let raws: Vec<RawComment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {COLUMNS} FROM comments
           WHERE parent_id = ?1
           ORDER BY created_at DESC, comment_id DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![parent_id], RawComment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawComment::into_comment).collect()
  }

  async fn update(&self, comment: Comment) -> Result<Option<Comment>> {
    let at_str  = encode_dt(now());
    let id      = comment.comment_id.0;
    let content = comment.content.clone();

    // Identity, ownership and creation time are never rewritten.
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE comments SET content = ?1, updated_at = ?2 WHERE comment_id = ?3",
          rusqlite::params![content, at_str, id],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.find_by_id(comment.comment_id).await
  }

  async fn delete(&self, id: CommentId) -> Result<bool> {
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM comments WHERE comment_id = ?1",
          rusqlite::params![id.0],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }
}
