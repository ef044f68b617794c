//! Per-event invitation template handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use validator::Validate;

use crate::error::AppError;
use crate::handlers::events::load_owned_event;
use crate::middleware::auth::Identity;
use crate::models::email_template::{
    CreateEmailTemplatePayload, EmailTemplate, NewEmailTemplate, UpdateEmailTemplatePayload,
};
use crate::state::AppState;

pub async fn get_template(
    State(state): State<AppState>,
    identity: Identity,
    Path(event_id): Path<i32>,
) -> Result<Json<EmailTemplate>, AppError> {
    load_owned_event(&state, event_id, identity.user_id).await?;

    let template = state
        .templates
        .get_by_event_id(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Email template not found".to_string()))?;

    Ok(Json(template))
}

pub async fn create_template(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<CreateEmailTemplatePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    load_owned_event(&state, payload.event_id, identity.user_id).await?;

    if state
        .templates
        .get_by_event_id(payload.event_id)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "Email template already exists".to_string(),
        ));
    }

    state
        .templates
        .create(NewEmailTemplate {
            event_id: payload.event_id,
            header_image: payload.header_image,
            content: payload.content,
            footer_image: payload.footer_image,
            subject: payload.subject,
            bg_color: payload.bg_color,
            message: payload.message,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Email template created successfully" })),
    ))
}

pub async fn update_template(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<UpdateEmailTemplatePayload>,
) -> Result<Json<Value>, AppError> {
    payload.validate()?;
    load_owned_event(&state, payload.event_id, identity.user_id).await?;

    let template = EmailTemplate {
        id: payload.id,
        event_id: payload.event_id,
        header_image: payload.header_image,
        content: payload.content,
        footer_image: payload.footer_image,
        subject: payload.subject,
        bg_color: payload.bg_color,
        message: payload.message,
    };
    state.templates.update(&template).await?;

    Ok(Json(json!({ "message": "Email template updated successfully" })))
}
