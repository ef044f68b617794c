//! Attendee handlers: roster CRUD plus the bulk endpoints (CSV import,
//! invitation dispatch, roster teardown).

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use validator::Validate;

use crate::error::AppError;
use crate::handlers::events::load_owned_event;
use crate::middleware::auth::Identity;
use crate::models::attendee::{Attendee, CreateAttendeePayload, NewAttendee, UpdateAttendeePayload};
use crate::models::PageQuery;
use crate::services::bulk::{run_bulk, DEFAULT_BULK_CONCURRENCY};
use crate::services::import::import_attendees;
use crate::services::invitations::send_invitations;
use crate::state::AppState;
use crate::utils::csv::parse_attendee_rows;

pub async fn get_attendee(
    State(state): State<AppState>,
    identity: Identity,
    Path(attendee_id): Path<i32>,
) -> Result<Json<Attendee>, AppError> {
    let attendee = state
        .attendees
        .get_by_id(attendee_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Attendee not found".to_string()))?;

    load_owned_event(&state, attendee.event_id, identity.user_id).await?;

    Ok(Json(attendee))
}

pub async fn create_attendee(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<CreateAttendeePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    load_owned_event(&state, payload.event_id, identity.user_id).await?;

    if state.attendees.get_by_email(&payload.email).await?.is_some() {
        return Err(AppError::Conflict(
            "Attendee with same email already exists".to_string(),
        ));
    }

    let qr_code = state
        .images
        .generate_qr_image(&payload.email)
        .await
        .map_err(AppError::Internal)?;

    let attendee = state
        .attendees
        .create(NewAttendee {
            first_name: payload.first_name,
            last_name: payload.last_name,
            email: payload.email,
            event_id: payload.event_id,
            qr_code,
            company_name: payload.company_name,
            title: payload.title,
            table_no: payload.table_no,
            role: payload.role,
            attendance: false,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(attendee)))
}

pub async fn update_attendee(
    State(state): State<AppState>,
    identity: Identity,
    Path(attendee_id): Path<i32>,
    Json(payload): Json<UpdateAttendeePayload>,
) -> Result<Json<Value>, AppError> {
    payload.validate()?;

    let attendee = state
        .attendees
        .get_by_id(attendee_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Attendee not found".to_string()))?;

    load_owned_event(&state, attendee.event_id, identity.user_id).await?;

    // A changed email invalidates the QR artifact, which encodes it.
    let email_changed = payload.email != attendee.email;
    let qr_code = if email_changed {
        state
            .images
            .generate_qr_image(&payload.email)
            .await
            .map_err(AppError::Internal)?
    } else {
        attendee.qr_code.clone()
    };

    state
        .attendees
        .update(
            attendee_id,
            &NewAttendee {
                first_name: payload.first_name,
                last_name: payload.last_name,
                email: payload.email,
                event_id: attendee.event_id,
                qr_code,
                company_name: payload.company_name,
                title: payload.title,
                table_no: payload.table_no,
                role: payload.role,
                attendance: payload.attendance,
            },
        )
        .await?;

    let message = if email_changed {
        "Attendee updated successfully with new qrcode"
    } else {
        "Attendee updated successfully"
    };
    Ok(Json(json!({ "message": message })))
}

pub async fn delete_attendee(
    State(state): State<AppState>,
    identity: Identity,
    Path((event_id, attendee_id)): Path<(i32, i32)>,
) -> Result<Json<Value>, AppError> {
    load_owned_event(&state, event_id, identity.user_id).await?;

    let attendee = state
        .attendees
        .get_by_id(attendee_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Attendee not found".to_string()))?;

    state
        .images
        .delete_qr_image(&attendee.qr_code)
        .await
        .map_err(AppError::Internal)?;

    state.attendees.delete_by_id(attendee_id).await?;

    Ok(Json(json!({ "message": "Attendee deleted successfully" })))
}

/// Tears down an event's roster: hosted QR images are deleted through the
/// worker pool first, then the rows go in one statement. Image-deletion
/// failures are reported but never block the row deletion.
pub async fn delete_all_attendees(
    State(state): State<AppState>,
    identity: Identity,
    Path(event_id): Path<i32>,
) -> Result<Json<Value>, AppError> {
    load_owned_event(&state, event_id, identity.user_id).await?;

    let roster = state.attendees.list_for_event(event_id).await?;

    let images = Arc::clone(&state.images);
    let outcomes = run_bulk(roster, DEFAULT_BULK_CONCURRENCY, move |attendee| {
        let images = Arc::clone(&images);
        async move { images.delete_qr_image(&attendee.qr_code).await }
    })
    .await;

    let failed_image_deletions: Vec<Value> = outcomes
        .iter()
        .filter_map(|outcome| {
            outcome.result.as_ref().err().map(|reason| {
                json!({ "email": outcome.item.email, "reason": reason })
            })
        })
        .collect();

    if !failed_image_deletions.is_empty() {
        tracing::warn!(
            event_id,
            failed = failed_image_deletions.len(),
            "some QR images could not be deleted"
        );
    }

    state.attendees.delete_all_for_event(event_id).await?;

    let message = if failed_image_deletions.is_empty() {
        "Attendees deleted successfully".to_string()
    } else {
        format!(
            "Attendees deleted successfully, but {} QR images were not deleted",
            failed_image_deletions.len()
        )
    };

    Ok(Json(json!({
        "message": message,
        "failed_image_deletions": failed_image_deletions,
    })))
}

pub async fn list_attendees_paginated(
    State(state): State<AppState>,
    identity: Identity,
    Path(event_id): Path<i32>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Attendee>>, AppError> {
    load_owned_event(&state, event_id, identity.user_id).await?;

    let attendees = state
        .attendees
        .list_paginated(event_id, query.page(), query.page_size())
        .await?;

    Ok(Json(attendees))
}

pub async fn list_all_attendees(
    State(state): State<AppState>,
    identity: Identity,
    Path(event_id): Path<i32>,
) -> Result<Json<Vec<Attendee>>, AppError> {
    load_owned_event(&state, event_id, identity.user_id).await?;

    let attendees = state.attendees.list_for_event(event_id).await?;
    Ok(Json(attendees))
}

pub async fn count_attendees(
    State(state): State<AppState>,
    identity: Identity,
    Path(event_id): Path<i32>,
) -> Result<Json<Value>, AppError> {
    load_owned_event(&state, event_id, identity.user_id).await?;

    let count = state.attendees.count_for_event(event_id).await?;
    Ok(Json(json!({ "row_count": count })))
}

/// CSV import: multipart field `import`, header row skipped, rows fanned out
/// through the worker pool. Any problem row downgrades the response to 206
/// with the itemized list; a clean run is 201.
pub async fn import_attendees_csv(
    State(state): State<AppState>,
    identity: Identity,
    Path(event_id): Path<i32>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    load_owned_event(&state, event_id, identity.user_id).await?;

    let mut csv_data = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::BadRequest("Invalid file".to_string()))?
    {
        if field.name() == Some("import") {
            if field.content_type() != Some("text/csv") {
                return Err(AppError::BadRequest("Invalid file type".to_string()));
            }
            csv_data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|_| AppError::BadRequest("Invalid file".to_string()))?,
            );
            break;
        }
    }
    let csv_data = csv_data.ok_or_else(|| AppError::BadRequest("Invalid file".to_string()))?;

    let rows = parse_attendee_rows(&csv_data)
        .map_err(|_| AppError::BadRequest("Failed to parse CSV file".to_string()))?;

    let report = import_attendees(
        event_id,
        rows,
        Arc::clone(&state.attendees),
        Arc::clone(&state.images),
        DEFAULT_BULK_CONCURRENCY,
    )
    .await;

    if report.is_clean() {
        Ok((
            StatusCode::CREATED,
            Json(json!({
                "message": "Attendees imported successfully",
                "created": report.created,
            })),
        ))
    } else {
        Ok((
            StatusCode::PARTIAL_CONTENT,
            Json(json!({
                "message": "Attendees imported with some errors",
                "error": "Some attendees already exist or failed to create",
                "created": report.created,
                "problems": report.problems,
            })),
        ))
    }
}

/// Invitation dispatch: template and roster are fetched once, then each
/// recipient is rendered and sent through the worker pool. Failures are
/// itemized in a 206; full success is 200.
pub async fn send_invitation_emails(
    State(state): State<AppState>,
    identity: Identity,
    Path(event_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    load_owned_event(&state, event_id, identity.user_id).await?;

    let template = state
        .templates
        .get_by_event_id(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Email template not found".to_string()))?;

    let roster = state.attendees.list_for_event(event_id).await?;

    let report = send_invitations(
        template,
        roster,
        Arc::clone(&state.mailer),
        DEFAULT_BULK_CONCURRENCY,
    )
    .await;

    if report.all_sent() {
        Ok((
            StatusCode::OK,
            Json(json!({
                "message": "Invitation emails sent successfully",
                "sent": report.sent,
            })),
        ))
    } else {
        Ok((
            StatusCode::PARTIAL_CONTENT,
            Json(json!({
                "message": "Some invitation emails failed to send",
                "sent": report.sent,
                "failed": report.failed,
            })),
        ))
    }
}

pub async fn mark_attendance(
    State(state): State<AppState>,
    identity: Identity,
    Path(attendee_email): Path<String>,
) -> Result<Json<Value>, AppError> {
    let attendee = state
        .attendees
        .get_by_email(&attendee_email)
        .await?
        .ok_or_else(|| AppError::NotFound("Attendee not found".to_string()))?;

    if attendee.attendance {
        return Err(AppError::BadRequest("Attendance already marked".to_string()));
    }

    load_owned_event(&state, attendee.event_id, identity.user_id).await?;

    let mut data = attendee.as_update();
    data.attendance = true;
    state.attendees.update(attendee.id, &data).await?;

    Ok(Json(json!({ "message": "Attendance marked successfully" })))
}
