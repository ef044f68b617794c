//! Event store.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::event::{Event, NewEvent};

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn get_by_id(&self, id: i32) -> Result<Option<Event>, AppError>;
    async fn get_by_title(&self, title: &str) -> Result<Option<Event>, AppError>;
    async fn get_all_for_user(&self, user_id: i32) -> Result<Vec<Event>, AppError>;
    async fn create(&self, event: NewEvent) -> Result<Event, AppError>;
    async fn update(&self, event: &Event) -> Result<(), AppError>;
    async fn delete(&self, id: i32) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const EVENT_COLUMNS: &str =
    "id, title, description, start_date, end_date, location, user_id, created_at, updated_at";

#[async_trait]
impl EventStore for PgEventStore {
    async fn get_by_id(&self, id: i32) -> Result<Option<Event>, AppError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    async fn get_by_title(&self, title: &str) -> Result<Option<Event>, AppError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE title = $1"
        ))
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    async fn get_all_for_user(&self, user_id: i32) -> Result<Vec<Event>, AppError> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE user_id = $1 ORDER BY start_date"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    async fn create(&self, event: NewEvent) -> Result<Event, AppError> {
        let created = sqlx::query_as::<_, Event>(&format!(
            "INSERT INTO events (title, description, start_date, end_date, location, user_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7) RETURNING {EVENT_COLUMNS}"
        ))
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(&event.location)
        .bind(event.user_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn update(&self, event: &Event) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE events SET title = $1, description = $2, start_date = $3, end_date = $4, \
             location = $5, updated_at = $6 WHERE id = $7",
        )
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(&event.location)
        .bind(Utc::now())
        .bind(event.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, id: i32) -> Result<(), AppError> {
        sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
