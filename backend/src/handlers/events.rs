//! Event CRUD handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use validator::Validate;

use crate::error::AppError;
use crate::middleware::auth::Identity;
use crate::models::event::{CreateEventPayload, Event, NewEvent};
use crate::state::AppState;

/// Loads an event and enforces that the caller owns it. Ownership is always
/// the handler's responsibility; workflows never re-check it.
pub(crate) async fn load_owned_event(
    state: &AppState,
    event_id: i32,
    user_id: i32,
) -> Result<Event, AppError> {
    let event = state
        .events
        .get_by_id(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    if !event.owned_by(user_id) {
        return Err(AppError::Forbidden("You do not own this event".to_string()));
    }

    Ok(event)
}

pub async fn list_events(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<Event>>, AppError> {
    let events = state.events.get_all_for_user(identity.user_id).await?;
    Ok(Json(events))
}

pub async fn create_event(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<CreateEventPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if state.events.get_by_title(&payload.title).await?.is_some() {
        return Err(AppError::Conflict(
            "Event with the same title already exists".to_string(),
        ));
    }

    let event = state
        .events
        .create(NewEvent {
            title: payload.title,
            description: payload.description,
            start_date: payload.start_date,
            end_date: payload.end_date,
            location: payload.location,
            user_id: identity.user_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn update_event(
    State(state): State<AppState>,
    identity: Identity,
    Path(event_id): Path<i32>,
    Json(payload): Json<CreateEventPayload>,
) -> Result<Json<Value>, AppError> {
    payload.validate()?;

    let mut event = load_owned_event(&state, event_id, identity.user_id).await?;
    event.title = payload.title;
    event.description = payload.description;
    event.start_date = payload.start_date;
    event.end_date = payload.end_date;
    event.location = payload.location;

    state.events.update(&event).await?;

    Ok(Json(json!({ "message": "Event updated successfully" })))
}

pub async fn delete_event(
    State(state): State<AppState>,
    identity: Identity,
    Path(event_id): Path<i32>,
) -> Result<Json<Value>, AppError> {
    let event = load_owned_event(&state, event_id, identity.user_id).await?;
    state.events.delete(event.id).await?;

    Ok(Json(json!({ "message": "Event deleted successfully" })))
}
