//! Body and path extractors whose rejections use the API error envelope.
//!
//! axum's own [`Json`](axum::Json) and [`Path`](axum::extract::Path) reply
//! with plain-text 4xx bodies; these wrappers turn the same failures into
//! [`ApiError::BadRequest`].

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

/// A JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// A typed path segment.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);
