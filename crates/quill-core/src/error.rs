//! Error types for `quill-core`.

use thiserror::Error;

use crate::comment::CommentId;

/// Outcome kinds surfaced by [`crate::service::CommentService`].
///
/// Validation and ownership failures are typed so the transport layer can
/// tell them apart from a generic server error.
#[derive(Debug, Error)]
pub enum Error {
  /// Content was empty or consisted only of whitespace.
  #[error("comment content cannot be empty")]
  EmptyContent,

  #[error("comment not found: {0}")]
  CommentNotFound(CommentId),

  #[error("you are not authorized to modify comment {0}")]
  UnauthorizedAction(CommentId),

  #[error("operation cancelled: deadline exceeded")]
  Cancelled,

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend failure as [`Error::Internal`].
  pub fn internal<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Internal(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
