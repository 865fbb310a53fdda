//! The `CommentStore` trait.
//!
//! Implemented by durable backends (e.g. `quill-store-sqlite`). The service
//! layer depends on this abstraction, never on a concrete backend.

use std::future::Future;

use crate::comment::{Comment, CommentId, NewComment};

/// Abstraction over the durable comment store.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`). Dropping a future
/// cancels the in-flight call.
pub trait CommentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new comment. The store assigns the id and both timestamps.
  fn create(
    &self,
    input: NewComment,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  /// Retrieve a comment by id. Returns `None` if not found.
  fn find_by_id(
    &self,
    id: CommentId,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;

  /// All comments attached to `parent_id`, newest-created first.
  fn find_by_parent<'a>(
    &'a self,
    parent_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + 'a;

  /// Replace the mutable fields of an existing comment and refresh its
  /// `updated_at`. Returns the stored record, or `None` if the row no
  /// longer exists.
  fn update(
    &self,
    comment: Comment,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;

  /// Permanently remove a comment. Returns `false` if nothing was deleted.
  fn delete(
    &self,
    id: CommentId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
