//! Bearer-token authentication: password hashing, JWT issue/verify, and the
//! `AuthUser` extractor used by every protected route.

pub mod handlers;
pub mod password;
pub mod token;

use axum::{async_trait, extract::FromRequestParts, http::header, http::request::Parts};

use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;

/// The authenticated, active user behind the request's bearer token.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))?;

        let user_id = token::decode_access_token(token, &state.config.secret_key)
            .ok_or_else(|| AppError::Unauthorized("Could not validate credentials".to_string()))?;

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if !user.is_active {
            return Err(AppError::Validation("Inactive user".to_string()));
        }
        Ok(AuthUser(user))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return None;
    }
    Some(token.trim())
}
