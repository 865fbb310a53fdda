//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  /// Missing or invalid bearer token.
  #[error("unauthenticated: {0}")]
  Unauthenticated(String),

  #[error(transparent)]
  Service(#[from] quill_core::Error),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    use quill_core::Error as E;
    match self {
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
      ApiError::Service(e) => match e {
        E::EmptyContent => StatusCode::BAD_REQUEST,
        E::CommentNotFound(_) => StatusCode::NOT_FOUND,
        E::UnauthorizedAction(_) => StatusCode::FORBIDDEN,
        E::Cancelled => StatusCode::GATEWAY_TIMEOUT,
        E::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    ApiError::BadRequest(rejection.body_text())
  }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self {
    ApiError::BadRequest(rejection.body_text())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = match &self {
      ApiError::BadRequest(m) | ApiError::Unauthenticated(m) => m.clone(),
      ApiError::Service(quill_core::Error::Internal(e)) => {
        tracing::error!(error = %e, "request failed");
        "internal server error".to_owned()
      }
      ApiError::Service(e) => e.to_string(),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
