//! Per-event invitation email template.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::attendee::Attendee;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EmailTemplate {
    pub id: i32,
    pub event_id: i32,
    pub header_image: String,
    /// Body with `{{first_name}}`, `{{last_name}}` and `{{qr_code}}`
    /// placeholders substituted per recipient.
    pub content: String,
    pub footer_image: String,
    pub subject: String,
    pub bg_color: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct NewEmailTemplate {
    pub event_id: i32,
    pub header_image: String,
    pub content: String,
    pub footer_image: String,
    pub subject: String,
    pub bg_color: String,
    pub message: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEmailTemplatePayload {
    pub event_id: i32,
    #[validate(length(min = 1))]
    pub header_image: String,
    #[validate(length(min = 1))]
    pub content: String,
    #[validate(length(min = 1))]
    pub footer_image: String,
    #[validate(length(min = 1))]
    pub subject: String,
    #[validate(length(min = 1))]
    pub bg_color: String,
    #[validate(length(min = 1))]
    pub message: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEmailTemplatePayload {
    pub id: i32,
    pub event_id: i32,
    #[validate(length(min = 1))]
    pub header_image: String,
    #[validate(length(min = 1))]
    pub content: String,
    #[validate(length(min = 1))]
    pub footer_image: String,
    #[validate(length(min = 1))]
    pub subject: String,
    #[validate(length(min = 1))]
    pub bg_color: String,
    #[validate(length(min = 1))]
    pub message: String,
}

impl EmailTemplate {
    /// Renders the full HTML email for one attendee, substituting the
    /// recipient placeholders in `content`.
    pub fn render_for(&self, attendee: &Attendee) -> String {
        let content = self
            .content
            .replace("{{first_name}}", &attendee.first_name)
            .replace("{{last_name}}", &attendee.last_name)
            .replace("{{qr_code}}", &attendee.qr_code);

        format!(
            r#"{message}
<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{subject}</title>
    <style>
      body {{
        font-family: Arial, sans-serif;
        line-height: 1.6;
        margin: 0;
        padding: 0;
        color: black;
      }}
      .container {{
        max-width: 600px;
        width: 100%;
        margin: 0 auto;
      }}
      .img-container img {{
        width: 100%;
        height: auto;
        object-fit: cover;
        object-position: center;
      }}
    </style>
  </head>
  <body>
    <table style="background-color: {bg_color};" class="container" role="presentation" cellspacing="0" cellpadding="0">
      <tr>
        <td class="img-container"><img src="{header}" alt="Header" /></td>
      </tr>
      <tr>
        <td><div>{content}</div></td>
      </tr>
      <tr>
        <td class="img-container"><img src="{footer}" alt="Footer" /></td>
      </tr>
    </table>
  </body>
</html>
"#,
            message = self.message,
            subject = self.subject,
            bg_color = self.bg_color,
            header = self.header_image,
            content = content,
            footer = self.footer_image,
        )
    }
}
