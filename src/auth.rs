//! Identity provider seam
//!
//! The original system leaned on hosted auth vendors; here that collapses
//! to one abstract capability: turn request headers into an opaque caller
//! id. The concrete adapter reads `Authorization: Bearer <id>` (or the
//! `X-User-Id` header), which is what a reverse proxy terminating the real
//! vendor session would inject.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use crate::error::AppError;
use crate::state::AppState;

/// Maps request headers to an opaque caller identity.
pub trait IdentityProvider: Send + Sync {
    fn identify(&self, headers: &HeaderMap) -> Option<String>;
}

/// Bearer-token adapter: the token itself is the caller id.
#[derive(Debug, Default)]
pub struct BearerIdentity;

impl IdentityProvider for BearerIdentity {
    fn identify(&self, headers: &HeaderMap) -> Option<String> {
        if let Some(value) = headers.get(header::AUTHORIZATION) {
            let value = value.to_str().ok()?;
            let token = value.strip_prefix("Bearer ")?.trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
        headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
    }
}

/// Authenticated caller extractor. Rejects with 401 when the identity
/// provider cannot place the request.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        state
            .identity()
            .identify(&parts.headers)
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}
