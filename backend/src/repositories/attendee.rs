//! Attendee store.
//!
//! The table enforces `UNIQUE (event_id, email)`; a violation surfaces as
//! `AppError::Conflict`, which the import workflow treats as the
//! authoritative duplicate signal when concurrent workers race the
//! check-then-insert.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::attendee::{Attendee, NewAttendee};

#[async_trait]
pub trait AttendeeStore: Send + Sync {
    async fn get_by_id(&self, id: i32) -> Result<Option<Attendee>, AppError>;
    async fn get_by_email(&self, email: &str) -> Result<Option<Attendee>, AppError>;
    async fn list_for_event(&self, event_id: i32) -> Result<Vec<Attendee>, AppError>;
    async fn list_paginated(
        &self,
        event_id: i32,
        page: i64,
        page_size: i64,
    ) -> Result<Vec<Attendee>, AppError>;
    async fn count_for_event(&self, event_id: i32) -> Result<i64, AppError>;
    async fn create(&self, attendee: NewAttendee) -> Result<Attendee, AppError>;
    /// Full-field replacement of an existing row.
    async fn update(&self, id: i32, data: &NewAttendee) -> Result<(), AppError>;
    async fn delete_by_id(&self, id: i32) -> Result<(), AppError>;
    async fn delete_all_for_event(&self, event_id: i32) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct PgAttendeeStore {
    pool: PgPool,
}

impl PgAttendeeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ATTENDEE_COLUMNS: &str = "id, first_name, last_name, email, event_id, qr_code, \
     company_name, title, table_no, role, attendance";

#[async_trait]
impl AttendeeStore for PgAttendeeStore {
    async fn get_by_id(&self, id: i32) -> Result<Option<Attendee>, AppError> {
        let attendee = sqlx::query_as::<_, Attendee>(&format!(
            "SELECT {ATTENDEE_COLUMNS} FROM attendees WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attendee)
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Attendee>, AppError> {
        let attendee = sqlx::query_as::<_, Attendee>(&format!(
            "SELECT {ATTENDEE_COLUMNS} FROM attendees WHERE email = $1 LIMIT 1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attendee)
    }

    async fn list_for_event(&self, event_id: i32) -> Result<Vec<Attendee>, AppError> {
        let attendees = sqlx::query_as::<_, Attendee>(&format!(
            "SELECT {ATTENDEE_COLUMNS} FROM attendees WHERE event_id = $1 ORDER BY id"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(attendees)
    }

    async fn list_paginated(
        &self,
        event_id: i32,
        page: i64,
        page_size: i64,
    ) -> Result<Vec<Attendee>, AppError> {
        let offset = (page - 1) * page_size;
        let attendees = sqlx::query_as::<_, Attendee>(&format!(
            "SELECT {ATTENDEE_COLUMNS} FROM attendees WHERE event_id = $1 ORDER BY id \
             LIMIT $2 OFFSET $3"
        ))
        .bind(event_id)
        .bind(page_size)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(attendees)
    }

    async fn count_for_event(&self, event_id: i32) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attendees WHERE event_id = $1")
            .bind(event_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn create(&self, attendee: NewAttendee) -> Result<Attendee, AppError> {
        let created = sqlx::query_as::<_, Attendee>(&format!(
            "INSERT INTO attendees (first_name, last_name, email, event_id, qr_code, \
             company_name, title, table_no, role, attendance) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {ATTENDEE_COLUMNS}"
        ))
        .bind(&attendee.first_name)
        .bind(&attendee.last_name)
        .bind(&attendee.email)
        .bind(attendee.event_id)
        .bind(&attendee.qr_code)
        .bind(&attendee.company_name)
        .bind(&attendee.title)
        .bind(attendee.table_no)
        .bind(&attendee.role)
        .bind(attendee.attendance)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn update(&self, id: i32, data: &NewAttendee) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE attendees SET first_name = $1, last_name = $2, email = $3, qr_code = $4, \
             company_name = $5, title = $6, table_no = $7, role = $8, attendance = $9 \
             WHERE id = $10",
        )
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.email)
        .bind(&data.qr_code)
        .bind(&data.company_name)
        .bind(&data.title)
        .bind(data.table_no)
        .bind(&data.role)
        .bind(data.attendance)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_by_id(&self, id: i32) -> Result<(), AppError> {
        sqlx::query("DELETE FROM attendees WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_all_for_event(&self, event_id: i32) -> Result<(), AppError> {
        sqlx::query("DELETE FROM attendees WHERE event_id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
