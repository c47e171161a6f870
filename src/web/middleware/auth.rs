//! Bearer authentication extractors.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::db::Account;
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Extractor for the authenticated actor.
///
/// Verifies the bearer token and loads the live account record, so a
/// suspended account is refused even while its token is unexpired.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Account);

/// Raw bearer token, if any.
///
/// Used by mutating routes, which hand the token to
/// [`AppState::admit`] so a refused actor is audited.
#[derive(Debug, Clone)]
pub struct BearerToken(pub Option<String>);

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token =
            bearer_token(parts).ok_or_else(|| ApiError::unauthorized("Missing authorization"))?;

        let account = state.engine.resolve_actor(token).await?;
        Ok(AuthUser(account))
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(BearerToken(bearer_token(parts).map(str::to_string)))
    }
}
