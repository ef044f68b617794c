//! CSV attendee import workflow.
//!
//! The caller has already verified event ownership; this workflow only fans
//! the parsed rows out through the worker pool and aggregates per-row
//! outcomes. One bad row never aborts the batch.

use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;

use crate::repositories::AttendeeStore;
use crate::services::bulk::run_bulk;
use crate::utils::csv::AttendeeCsvRow;
use crate::utils::qr::ImageUploader;

/// What happened to a single roster row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    Created,
    /// An attendee with this email already exists for the target event.
    /// Non-fatal: reported, not retried.
    AlreadyExists,
}

#[derive(Debug, Serialize)]
pub struct ImportProblem {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct ImportReport {
    pub created: usize,
    pub problems: Vec<ImportProblem>,
}

impl ImportReport {
    /// True when every row was persisted with no duplicates or failures.
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

pub async fn import_attendees(
    event_id: i32,
    rows: Vec<AttendeeCsvRow>,
    attendees: Arc<dyn AttendeeStore>,
    images: Arc<dyn ImageUploader>,
    limit: usize,
) -> ImportReport {
    let outcomes = run_bulk(rows, limit, move |row| {
        let attendees = Arc::clone(&attendees);
        let images = Arc::clone(&images);
        async move { import_row(event_id, row, attendees, images).await }
    })
    .await;

    let mut created = 0;
    let mut problems = Vec::new();
    for outcome in outcomes {
        match outcome.result {
            Ok(RowStatus::Created) => created += 1,
            Ok(RowStatus::AlreadyExists) => problems.push(ImportProblem {
                first_name: outcome.item.first_name,
                last_name: outcome.item.last_name,
                email: outcome.item.email,
                reason: "attendee already exists for this event".to_string(),
            }),
            Err(reason) => {
                tracing::warn!(email = %outcome.item.email, %reason, "attendee import row failed");
                problems.push(ImportProblem {
                    first_name: outcome.item.first_name,
                    last_name: outcome.item.last_name,
                    email: outcome.item.email,
                    reason,
                });
            }
        }
    }

    ImportReport { created, problems }
}

async fn import_row(
    event_id: i32,
    row: AttendeeCsvRow,
    attendees: Arc<dyn AttendeeStore>,
    images: Arc<dyn ImageUploader>,
) -> anyhow::Result<RowStatus> {
    let qr_code = images
        .generate_qr_image(&row.email)
        .await
        .context("failed to generate QR code")?;

    // Optimistic duplicate check; the insert below re-checks via the unique
    // key, so a race between concurrent workers still resolves correctly.
    if let Some(existing) = attendees.get_by_email(&row.email).await? {
        if existing.event_id == event_id {
            return Ok(RowStatus::AlreadyExists);
        }
    }

    match attendees.create(row.into_new_attendee(event_id, qr_code)).await {
        Ok(_) => Ok(RowStatus::Created),
        Err(crate::error::AppError::Conflict(_)) => Ok(RowStatus::AlreadyExists),
        Err(err) => Err(anyhow::Error::new(err).context("failed to create attendee")),
    }
}
