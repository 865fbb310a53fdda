//! The comment entity.
//!
//! Field names on the wire follow the public API: a comment's parent is a
//! story (`story_id`) and its author is a user (`user_id`).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned surrogate key of a comment.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CommentId(pub i64);

impl CommentId {
  /// Ids handed out by the store are always positive.
  pub fn is_valid(self) -> bool { self.0 > 0 }
}

impl fmt::Display for CommentId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

impl From<i64> for CommentId {
  fn from(id: i64) -> Self { Self(id) }
}

/// A persisted comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
  #[serde(rename = "id")]
  pub comment_id: CommentId,
  /// Opaque id of the story this comment belongs to. Never validated here.
  #[serde(rename = "story_id")]
  pub parent_id:  String,
  /// Identity of the caller that created the comment; immutable.
  #[serde(rename = "user_id")]
  pub author_id:  String,
  pub content:    String,
  pub created_at: DateTime<Utc>,
  /// Refreshed by the store on every successful update.
  pub updated_at: DateTime<Utc>,
}

/// Input to [`crate::store::CommentStore::create`].
/// Id and timestamps are always assigned by the store.
#[derive(Debug, Clone)]
pub struct NewComment {
  pub parent_id: String,
  pub author_id: String,
  pub content:   String,
}

/// Reject content that is empty or consists only of whitespace.
pub fn ensure_content(content: &str) -> crate::Result<()> {
  if content.trim().is_empty() {
    return Err(crate::Error::EmptyContent);
  }
  Ok(())
}
