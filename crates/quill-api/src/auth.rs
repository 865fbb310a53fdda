//! Bearer-token caller identity.
//!
//! Tokens are HS256 JWTs whose `user_id` claim names the caller. Issuing is
//! normally the job of a separate auth service; [`TokenKeys::issue`] exists
//! for the server's `--issue-token` helper and for tests.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use jsonwebtoken::{
  DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use quill_core::{cache::Cache, store::CommentStore};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
  pub user_id: String,
  /// Expiry as a Unix timestamp.
  pub exp:     u64,
}

/// Signing and verification keys derived from the shared secret.
#[derive(Clone)]
pub struct TokenKeys {
  encoding:   EncodingKey,
  decoding:   DecodingKey,
  validation: Validation,
}

impl TokenKeys {
  pub fn new(secret: &str) -> Self {
    Self {
      encoding:   EncodingKey::from_secret(secret.as_bytes()),
      decoding:   DecodingKey::from_secret(secret.as_bytes()),
      validation: Validation::default(),
    }
  }

  /// Sign a token for `user_id` valid for `ttl_secs` seconds.
  ///
  /// A failure here is a server-side signing problem, not a caller error,
  /// so it is reported as the underlying [`jsonwebtoken`] error.
  pub fn issue(
    &self,
    user_id: &str,
    ttl_secs: u64,
  ) -> jsonwebtoken::errors::Result<String> {
    self.sign(&Header::default(), user_id, ttl_secs)
  }

  fn sign(
    &self,
    header: &Header,
    user_id: &str,
    ttl_secs: u64,
  ) -> jsonwebtoken::errors::Result<String> {
    let now = SystemTime::now()
      .duration_since(UNIX_EPOCH)
      .map(|d| d.as_secs())
      .unwrap_or(0);
    let claims = Claims { user_id: user_id.to_owned(), exp: now + ttl_secs };
    encode(header, &claims, &self.encoding)
  }

  /// Validate signature and expiry, returning the claims.
  pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
    let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(
      |e| {
        let reason = match e.kind() {
          ErrorKind::ExpiredSignature => "token expired",
          ErrorKind::InvalidSignature => "invalid token signature",
          _ => "invalid token",
        };
        ApiError::Unauthenticated(reason.to_owned())
      },
    )?;
    if data.claims.user_id.is_empty() {
      return Err(ApiError::Unauthenticated("token has no user_id".to_owned()));
    }
    Ok(data.claims)
  }
}

/// Pull the token out of an `Authorization: Bearer …` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
  let value = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or_else(|| ApiError::Unauthenticated("missing authorization header".into()))?;

  value
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .ok_or_else(|| ApiError::Unauthenticated("expected a bearer token".into()))
}

/// The authenticated caller's identity. Present in a handler means the
/// request carried a valid token.
#[derive(Debug, Clone)]
pub struct Caller(pub String);

impl<S, C> FromRequestParts<AppState<S, C>> for Caller
where
  S: CommentStore + 'static,
  C: Cache + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, C>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers)?;
    let claims = state.auth.verify(token)?;
    Ok(Caller(claims.user_id))
  }
}
