//! JSON REST API for Quill.
//!
//! Exposes an axum [`Router`] over a [`CommentService`]. The handlers only
//! translate HTTP to service calls and service errors to status codes.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = quill_api::router(state);
//! ```

pub mod auth;
pub mod comments;
pub mod error;
pub mod extract;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, put},
};
use quill_core::{cache::Cache, service::CommentService, store::CommentStore};
use serde::Deserialize;

pub use auth::TokenKeys;
pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Which cache backend the server runs with.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
  Redis,
  #[default]
  Memory,
  None,
}

/// Runtime server configuration, deserialised from `config.toml` and
/// `QUILL_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:          String,
  #[serde(default = "default_port")]
  pub port:          u16,
  #[serde(default = "default_store_path")]
  pub store_path:    PathBuf,
  #[serde(default)]
  pub cache_backend: CacheBackend,
  /// Required when `cache_backend = "redis"`.
  #[serde(default)]
  pub redis_url:     Option<String>,
  /// HS256 secret shared with the token issuer. Must not be empty.
  #[serde(default)]
  pub jwt_secret:    String,
  /// Upper bound on each service operation, in milliseconds.
  #[serde(default)]
  pub op_timeout_ms: Option<u64>,
}

fn default_host() -> String { "0.0.0.0".to_owned() }

fn default_port() -> u16 { 8083 }

fn default_store_path() -> PathBuf { PathBuf::from("quill.db") }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, C> {
  pub service: CommentService<S, C>,
  pub auth:    Arc<TokenKeys>,
}

impl<S, C> Clone for AppState<S, C> {
  fn clone(&self) -> Self {
    Self { service: self.service.clone(), auth: Arc::clone(&self.auth) }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
///
/// Reads are public; writes require a bearer token (see [`auth::Caller`]).
pub fn router<S, C>(state: AppState<S, C>) -> Router
where
  S: CommentStore + 'static,
  C: Cache + 'static,
{
  Router::new()
    .route(
      "/api/comments",
      get(comments::list::<S, C>).post(comments::create::<S, C>),
    )
    .route(
      "/api/comments/{id}",
      put(comments::update::<S, C>).delete(comments::delete::<S, C>),
    )
    .with_state(state)
}
