//! Email template store (one template per event).

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::email_template::{EmailTemplate, NewEmailTemplate};

#[async_trait]
pub trait EmailTemplateStore: Send + Sync {
    async fn get_by_event_id(&self, event_id: i32) -> Result<Option<EmailTemplate>, AppError>;
    async fn create(&self, template: NewEmailTemplate) -> Result<EmailTemplate, AppError>;
    async fn update(&self, template: &EmailTemplate) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct PgEmailTemplateStore {
    pool: PgPool,
}

impl PgEmailTemplateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const TEMPLATE_COLUMNS: &str =
    "id, event_id, header_image, content, footer_image, subject, bg_color, message";

#[async_trait]
impl EmailTemplateStore for PgEmailTemplateStore {
    async fn get_by_event_id(&self, event_id: i32) -> Result<Option<EmailTemplate>, AppError> {
        let template = sqlx::query_as::<_, EmailTemplate>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM email_templates WHERE event_id = $1"
        ))
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(template)
    }

    async fn create(&self, template: NewEmailTemplate) -> Result<EmailTemplate, AppError> {
        let created = sqlx::query_as::<_, EmailTemplate>(&format!(
            "INSERT INTO email_templates (event_id, header_image, content, footer_image, subject, bg_color, message) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {TEMPLATE_COLUMNS}"
        ))
        .bind(template.event_id)
        .bind(&template.header_image)
        .bind(&template.content)
        .bind(&template.footer_image)
        .bind(&template.subject)
        .bind(&template.bg_color)
        .bind(&template.message)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn update(&self, template: &EmailTemplate) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE email_templates SET header_image = $1, content = $2, footer_image = $3, \
             subject = $4, bg_color = $5, message = $6 WHERE event_id = $7",
        )
        .bind(&template.header_image)
        .bind(&template.content)
        .bind(&template.footer_image)
        .bind(&template.subject)
        .bind(&template.bg_color)
        .bind(&template.message)
        .bind(template.event_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
