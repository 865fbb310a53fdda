//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with a fixed microsecond
//! precision and a `Z` suffix, so lexical column order is chronological.

use chrono::{DateTime, SecondsFormat, Utc};
use quill_core::comment::{Comment, CommentId};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// The current time, truncated to what [`encode_dt`] preserves.
pub fn now() -> DateTime<Utc> {
  let now = Utc::now();
  decode_dt(&encode_dt(now)).unwrap_or(now)
}

// ─── Raw row ─────────────────────────────────────────────────────────────────

/// Column list matching [`RawComment::from_row`].
pub const COLUMNS: &str =
  "comment_id, parent_id, author_id, content, created_at, updated_at";

/// A `comments` row as read from SQLite, before timestamp decoding.
pub struct RawComment {
  pub comment_id: i64,
  pub parent_id:  String,
  pub author_id:  String,
  pub content:    String,
  pub created_at: String,
  pub updated_at: String,
}

impl RawComment {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      comment_id: row.get(0)?,
      parent_id:  row.get(1)?,
      author_id:  row.get(2)?,
      content:    row.get(3)?,
      created_at: row.get(4)?,
      updated_at: row.get(5)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      comment_id: CommentId(self.comment_id),
      parent_id:  self.parent_id,
      author_id:  self.author_id,
      content:    self.content,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}
