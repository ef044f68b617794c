//! Outbound email: account verification and event invitations.

use anyhow::Result;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::Config;
use crate::models::attendee::Attendee;
use crate::models::email_template::EmailTemplate;

/// Transport seam for everything the service mails out. Bulk dispatch and
/// registration both talk to this trait, never to SMTP directly.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification_email(&self, to_email: &str, token: &str) -> Result<()>;
    async fn send_invitation_email(
        &self,
        attendee: &Attendee,
        template: &EmailTemplate,
    ) -> Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    backend_host: String,
    skip_send: bool,
}

impl SmtpMailer {
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = if config.smtp_username.is_empty() {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
                .port(config.smtp_port)
                .build()
        } else {
            let creds = Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            );
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?
                .port(config.smtp_port)
                .credentials(creds)
                .build()
        };

        Ok(Self {
            transport,
            from_address: config.email_from.clone(),
            backend_host: config.backend_host.clone(),
            skip_send: config.smtp_skip_send,
        })
    }

    async fn send_html(&self, to_email: &str, subject: &str, body: String) -> Result<()> {
        if self.skip_send {
            tracing::debug!(to = %to_email, %subject, "SMTP_SKIP_SEND set, dropping email");
            return Ok(());
        }

        let email = Message::builder()
            .from(self.from_address.parse()?)
            .to(to_email.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body)?;

        self.transport.send(email).await?;
        Ok(())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_verification_email(&self, to_email: &str, token: &str) -> Result<()> {
        let verification_link = format!(
            "{}/api/v1/user/verify/email?token={}",
            self.backend_host, token
        );

        let body = format!(
            r#"<html>
  <body>
    <p>Welcome! Please confirm your email address to activate your account.</p>
    <p><a href="{link}">Verify your account</a></p>
    <p>This link is valid for 5 minutes. If you did not register, ignore this email.</p>
  </body>
</html>"#,
            link = verification_link
        );

        self.send_html(to_email, "Verify Your Account", body).await
    }

    async fn send_invitation_email(
        &self,
        attendee: &Attendee,
        template: &EmailTemplate,
    ) -> Result<()> {
        let body = template.render_for(attendee);
        self.send_html(&attendee.email, &template.subject, body)
            .await?;
        tracing::info!(to = %attendee.email, "invitation email sent");
        Ok(())
    }
}
