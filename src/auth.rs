//! Token authentication
//!
//! Clients send `Authorization: Token <key>`. The key is looked up in the
//! token table and the owning user becomes the request's identity.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use std::sync::Arc;

use crate::error::AppError;
use crate::models::User;
use crate::AppState;

const SCHEME: &str = "Token";

/// The authenticated user making the request
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| {
                AppError::Unauthorized("Authentication credentials were not provided".to_string())
            })?
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;

        let key = parse_token(header)
            .ok_or_else(|| AppError::Unauthorized("Invalid authorization header".to_string()))?;

        let user = state
            .store
            .user_by_token(key)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))?;

        Ok(CurrentUser(user))
    }
}

/// Extract the key from a `Token <key>` header value
fn parse_token(header: &str) -> Option<&str> {
    let mut parts = header.split_whitespace();
    let scheme = parts.next()?;
    let key = parts.next()?;

    if !scheme.eq_ignore_ascii_case(SCHEME) || parts.next().is_some() {
        return None;
    }
    Some(key)
}
