//! Invitation email dispatch workflow.
//!
//! The template and roster are fetched once by the caller; here each
//! attendee gets a rendered email through the worker pool, and per-recipient
//! failures are collected rather than aborting the run.

use std::sync::Arc;

use serde::Serialize;

use crate::models::attendee::Attendee;
use crate::models::email_template::EmailTemplate;
use crate::services::bulk::run_bulk;
use crate::utils::email::Mailer;

#[derive(Debug, Serialize)]
pub struct FailedRecipient {
    pub email: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct DispatchReport {
    pub sent: usize,
    pub failed: Vec<FailedRecipient>,
}

impl DispatchReport {
    pub fn all_sent(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Sends the event's invitation to every attendee. An empty roster is a
/// vacuous success with no mailer calls at all.
pub async fn send_invitations(
    template: EmailTemplate,
    attendees: Vec<Attendee>,
    mailer: Arc<dyn Mailer>,
    limit: usize,
) -> DispatchReport {
    let template = Arc::new(template);
    let outcomes = run_bulk(attendees, limit, move |attendee| {
        let mailer = Arc::clone(&mailer);
        let template = Arc::clone(&template);
        async move { mailer.send_invitation_email(&attendee, &template).await }
    })
    .await;

    let mut sent = 0;
    let mut failed = Vec::new();
    for outcome in outcomes {
        match outcome.result {
            Ok(()) => sent += 1,
            Err(reason) => {
                tracing::warn!(
                    email = %outcome.item.email,
                    %reason,
                    "failed to send invitation email"
                );
                failed.push(FailedRecipient {
                    email: outcome.item.email,
                    reason,
                });
            }
        }
    }

    DispatchReport { sent, failed }
}
