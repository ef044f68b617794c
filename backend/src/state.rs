use std::sync::Arc;

use crate::config::Config;
use crate::repositories::{AttendeeStore, EmailTemplateStore, EventStore, UserStore};
use crate::utils::email::Mailer;
use crate::utils::jwt::TokenService;
use crate::utils::qr::ImageUploader;

/// Shared application state: immutable configuration, the token service,
/// and trait-object collaborators. Handlers and middleware only ever see
/// these seams, so tests can swap in in-memory implementations.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub tokens: TokenService,
    pub users: Arc<dyn UserStore>,
    pub events: Arc<dyn EventStore>,
    pub attendees: Arc<dyn AttendeeStore>,
    pub templates: Arc<dyn EmailTemplateStore>,
    pub mailer: Arc<dyn Mailer>,
    pub images: Arc<dyn ImageUploader>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Config,
        users: Arc<dyn UserStore>,
        events: Arc<dyn EventStore>,
        attendees: Arc<dyn AttendeeStore>,
        templates: Arc<dyn EmailTemplateStore>,
        mailer: Arc<dyn Mailer>,
        images: Arc<dyn ImageUploader>,
    ) -> Self {
        let tokens = TokenService::from_config(&config);
        Self {
            config,
            tokens,
            users,
            events,
            attendees,
            templates,
            mailer,
            images,
        }
    }
}
