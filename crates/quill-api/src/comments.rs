//! Handlers for `/comments` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/comments?story_id=<id>` | Public; newest first |
//! | `POST`   | `/comments` | Body: [`CreateBody`]; returns 201 + stored comment |
//! | `PUT`    | `/comments/{id}` | Body: [`UpdateBody`]; author only |
//! | `DELETE` | `/comments/{id}` | Author only |

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use quill_core::{
  cache::Cache,
  comment::{Comment, CommentId},
  store::CommentStore,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
  AppState,
  auth::Caller,
  error::ApiError,
  extract::{ApiJson, ApiPath},
};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub story_id: Option<String>,
}

/// `GET /comments?story_id=<id>`
pub async fn list<S, C>(
  State(state): State<AppState<S, C>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Comment>>, ApiError>
where
  S: CommentStore + 'static,
  C: Cache + 'static,
{
  let story_id = params
    .story_id
    .filter(|s| !s.is_empty())
    .ok_or_else(|| ApiError::BadRequest("story_id query parameter is required".into()))?;

  let comments = state.service.get_by_parent(&story_id).await?;
  Ok(Json(comments))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub story_id: String,
  pub content:  String,
}

/// `POST /comments`; returns 201 + the stored [`Comment`].
pub async fn create<S, C>(
  State(state): State<AppState<S, C>>,
  Caller(caller): Caller,
  ApiJson(body): ApiJson<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CommentStore + 'static,
  C: Cache + 'static,
{
  if body.story_id.is_empty() {
    return Err(ApiError::BadRequest("story_id is required".into()));
  }
  let comment = state
    .service
    .create(&body.story_id, &caller, &body.content)
    .await?;
  Ok((StatusCode::CREATED, Json(comment)))
}

// ─── Update ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub content: String,
}

/// `PUT /comments/{id}`
pub async fn update<S, C>(
  State(state): State<AppState<S, C>>,
  ApiPath(id): ApiPath<CommentId>,
  Caller(caller): Caller,
  ApiJson(body): ApiJson<UpdateBody>,
) -> Result<Json<Comment>, ApiError>
where
  S: CommentStore + 'static,
  C: Cache + 'static,
{
  let id = checked_id(id)?;
  let comment = state.service.update(id, &caller, &body.content).await?;
  Ok(Json(comment))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /comments/{id}`
pub async fn delete<S, C>(
  State(state): State<AppState<S, C>>,
  ApiPath(id): ApiPath<CommentId>,
  Caller(caller): Caller,
) -> Result<impl IntoResponse, ApiError>
where
  S: CommentStore + 'static,
  C: Cache + 'static,
{
  let id = checked_id(id)?;
  state.service.delete(id, &caller).await?;
  Ok(Json(json!({ "message": "comment deleted" })))
}

fn checked_id(id: CommentId) -> Result<CommentId, ApiError> {
  if id.is_valid() {
    Ok(id)
  } else {
    Err(ApiError::BadRequest("invalid comment id".into()))
  }
}
