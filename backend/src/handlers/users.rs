//! User account handlers: registration, verification, sessions, and
//! super-user management.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use validator::Validate;

use crate::error::AppError;
use crate::middleware::auth::{
    extract_credential, require_super_user, session_rejection, Identity,
};
use crate::models::user::{
    LoginUserPayload, NewUser, RegisterUserPayload, UpdateUserPayload, UserResponse, UserRole,
};
use crate::models::PageQuery;
use crate::state::AppState;
use crate::utils::cookies::{build_clear_session_cookie, build_session_cookie};
use crate::utils::password::{hash_password, verify_password};

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if state.users.get_by_email(&payload.email).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "User with email {} already exists",
            payload.email
        )));
    }

    let password_hash = hash_password(&payload.password).map_err(AppError::Internal)?;
    let user = state
        .users
        .create(NewUser {
            first_name: payload.first_name,
            last_name: payload.last_name,
            email: payload.email,
            password_hash,
        })
        .await?;

    let token = state
        .tokens
        .issue_verification(&user.email)
        .map_err(AppError::Internal)?;

    // Fire and forget; a transport hiccup should not fail registration.
    let mailer = Arc::clone(&state.mailer);
    let email = user.email.clone();
    tokio::spawn(async move {
        if let Err(err) = mailer.send_verification_email(&email, &token).await {
            tracing::error!(%email, error = %err, "failed to send verification email");
        }
    });

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "email": user.email,
            "status": "verification email sent",
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailQuery {
    pub token: Option<String>,
}

pub async fn verify_email(
    State(state): State<AppState>,
    Query(params): Query<VerifyEmailQuery>,
) -> Result<Json<Value>, AppError> {
    let token = params
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::BadRequest("Token is missing".to_string()))?;

    let email = state.tokens.validate_verification(&token).map_err(|err| {
        AppError::BadRequest(format!("Error validating verification token: {err}"))
    })?;

    let user = state
        .users
        .get_by_email(&email)
        .await?
        .ok_or_else(|| AppError::BadRequest("No account matches this token".to_string()))?;

    if user.verified {
        return Err(AppError::BadRequest("User is already verified".to_string()));
    }

    state.users.mark_verified(user.id).await?;

    Ok(Json(json!({ "message": "User verified successfully" })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    // One message for both unknown email and wrong password, so the
    // endpoint never reveals whether an account exists.
    let rejection = || AppError::BadRequest("Email or password is incorrect".to_string());

    let user = state
        .users
        .get_by_email(&payload.email)
        .await?
        .ok_or_else(rejection)?;

    if !verify_password(&payload.password, &user.password).map_err(AppError::Internal)? {
        return Err(rejection());
    }

    let token = state
        .tokens
        .issue_session(user.id)
        .map_err(AppError::Internal)?;
    let cookie = build_session_cookie(
        &token,
        state.config.jwt_expiration_seconds,
        state.config.is_production,
    );

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(json!({
            "token": token,
            "expires_in": state.config.jwt_expiration_seconds.to_string(),
        })),
    ))
}

pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    // Stateless sessions: logout only clears the client-held cookie.
    let cookie = build_clear_session_cookie(state.config.is_production);
    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "message": "Logged out successfully" })),
    )
}

pub async fn auth_status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let token = extract_credential(&headers)
        .ok_or_else(|| AppError::Unauthorized("Token is missing".to_string()))?;

    let user_id = state
        .tokens
        .validate_session(&token)
        .map_err(|err| session_rejection(&state.config, err))?;

    let user = state
        .users
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Permission denied".to_string()))?;

    Ok(Json(json!({ "user": UserResponse::from(user) })))
}

/// Promotes an existing, password-verified account to super user, or creates
/// a fresh super-user account for an unknown email.
pub async fn upsert_super_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if let Some(user) = state.users.get_by_email(&payload.email).await? {
        if !verify_password(&payload.password, &user.password).map_err(AppError::Internal)? {
            return Err(AppError::BadRequest(
                "Email or password is incorrect".to_string(),
            ));
        }

        let role = state.users.get_role_by_id(user.id).await?;
        if role == UserRole::SuperUser {
            return Err(AppError::Conflict(
                "User is already a super user".to_string(),
            ));
        }

        state.users.promote_to_super_user(user.id).await?;
        return Ok((
            StatusCode::OK,
            Json(json!({
                "message": "User promoted to super user",
                "role": UserRole::SuperUser.as_str(),
            })),
        ));
    }

    let password_hash = hash_password(&payload.password).map_err(AppError::Internal)?;
    state
        .users
        .create_super_user(NewUser {
            first_name: payload.first_name,
            last_name: payload.last_name,
            email: payload.email,
            password_hash,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Super user created successfully" })),
    ))
}

pub async fn demote_user(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i32>,
) -> Result<Json<Value>, AppError> {
    if !require_super_user(state.users.as_ref(), identity.user_id).await? {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    if state.users.get_by_id(id).await?.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    state.users.demote_to_normal_user(id).await?;

    Ok(Json(json!({
        "message": "User demoted to normal user",
        "role": UserRole::NormalUser.as_str(),
    })))
}

pub async fn current_user(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .users
        .get_by_id(identity.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Permission denied".to_string()))?;

    Ok(Json(user.into()))
}

pub async fn list_users(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    if !require_super_user(state.users.as_ref(), identity.user_id).await? {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    let users = state
        .users
        .list_paginated(query.page(), query.page_size())
        .await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

pub async fn get_user(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i32>,
) -> Result<Json<UserResponse>, AppError> {
    if !require_super_user(state.users.as_ref(), identity.user_id).await? {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    let user = state
        .users
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

pub async fn update_user(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<Json<Value>, AppError> {
    payload.validate()?;

    let user = state
        .users
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if user.id != identity.user_id {
        return Err(AppError::Forbidden(
            "You can only update your own information".to_string(),
        ));
    }

    state.users.update_information(id, &payload).await?;

    Ok(Json(json!({
        "message": "User information updated successfully"
    })))
}

pub async fn delete_user(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i32>,
) -> Result<Json<Value>, AppError> {
    if !require_super_user(state.users.as_ref(), identity.user_id).await? {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    if state.users.get_by_id(id).await?.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    // Even a super user may never remove their own account.
    if id == identity.user_id {
        return Err(AppError::BadRequest("You cannot delete yourself".to_string()));
    }

    state.users.delete_by_id(id).await?;

    Ok(Json(json!({ "message": "User deleted successfully" })))
}
