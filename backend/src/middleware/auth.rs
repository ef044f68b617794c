//! Authentication gate and role guard.
//!
//! Credential order: the `token` cookie first, then the raw `Authorization`
//! header value (a `Bearer ` prefix is tolerated). A well-signed token for a
//! deleted account is a rejection, never a 500.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::convert::Infallible;

use crate::config::Config;
use crate::error::AppError;
use crate::repositories::UserStore;
use crate::state::AppState;
use crate::utils::cookies::{extract_cookie_value, SESSION_COOKIE_NAME};
use crate::utils::jwt::TokenError;

/// Request-scoped identity resolved by the auth gate.
///
/// The extractor never fails: when the gate has not run, `user_id` is the
/// `0` sentinel and handlers must treat it as "no identity".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i32,
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Identity>()
            .copied()
            .unwrap_or(Identity { user_id: 0 }))
    }
}

/// Middleware guarding protected routes: validates the session credential,
/// resolves the subject to a live account, and attaches [`Identity`].
pub async fn auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_credential(request.headers())
        .ok_or_else(|| AppError::Unauthorized("Permission denied".to_string()))?;

    let user_id = state
        .tokens
        .validate_session(&token)
        .map_err(|err| session_rejection(&state.config, err))?;

    let user = match state.users.get_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return Err(AppError::Unauthorized("Permission denied".to_string()));
        }
        Err(err) => {
            tracing::error!(user_id, error = %err, "failed to resolve authenticated user");
            return Err(AppError::Unauthorized("Permission denied".to_string()));
        }
    };

    request.extensions_mut().insert(Identity { user_id: user.id });
    Ok(next.run(request).await)
}

/// Inverse gate for the login route: a valid, unexpired session credential
/// is rejected so authenticated users cannot re-login; anything else
/// (absent, expired, or garbage) passes through to the handler.
pub async fn block_if_authenticated(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_credential(request.headers()) {
        if state.tokens.validate_session(&token).is_ok() {
            return (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({ "error": "User is already authenticated" })),
            )
                .into_response();
        }
    }
    next.run(request).await
}

/// Fresh role lookup; promotion or demotion takes effect on the very next
/// request without re-authentication. The handler owns the 403.
pub async fn require_super_user(users: &dyn UserStore, user_id: i32) -> Result<bool, AppError> {
    let role = users.get_role_by_id(user_id).await?;
    Ok(role == crate::models::user::UserRole::SuperUser)
}

/// Maps a token-validation failure to the configured rejection: the detail
/// when verbose errors are on, a generic body otherwise.
pub fn session_rejection(config: &Config, err: TokenError) -> AppError {
    if config.verbose_auth_errors {
        AppError::Unauthorized(err.to_string())
    } else {
        AppError::Unauthorized("Permission denied".to_string())
    }
}

/// Pulls the session credential off a request: `token` cookie, then the raw
/// `Authorization` header.
pub fn extract_credential(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| extract_cookie_value(raw, SESSION_COOKIE_NAME));
    if from_cookie.is_some() {
        return from_cookie;
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(strip_bearer)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn strip_bearer(header: &str) -> &str {
    let trimmed = header.trim();
    if let Some(space) = trimmed.find(' ') {
        let (scheme, rest) = trimmed.split_at(space);
        if scheme.eq_ignore_ascii_case("bearer") {
            return rest.trim_start();
        }
    }
    trimmed
}
