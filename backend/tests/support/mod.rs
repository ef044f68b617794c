#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use guestlist_backend::{
    config::Config,
    error::AppError,
    models::{
        attendee::{Attendee, NewAttendee},
        email_template::{EmailTemplate, NewEmailTemplate},
        event::{Event, NewEvent},
        user::{NewUser, UpdateUserPayload, User, UserRole},
    },
    repositories::{AttendeeStore, EmailTemplateStore, EventStore, UserStore},
    state::AppState,
    utils::{email::Mailer, password::hash_password, qr::ImageUploader},
};

pub fn test_config(verbose_auth_errors: bool) -> Config {
    Config {
        database_url: String::new(),
        port: 0,
        public_host: "http://localhost:3000".to_string(),
        backend_host: "http://localhost:8080".to_string(),
        jwt_secret: "test-secret".to_string(),
        jwt_expiration_seconds: 3600,
        is_production: false,
        verbose_auth_errors,
        smtp_host: String::new(),
        smtp_port: 0,
        smtp_username: String::new(),
        smtp_password: String::new(),
        smtp_skip_send: true,
        email_from: "noreply@test.local".to_string(),
        image_cdn_url: "http://localhost:9000".to_string(),
        image_cdn_token: String::new(),
    }
}

/// Everything an `AppState` needs, backed by in-memory fakes.
pub struct TestBackend {
    pub users: Arc<InMemoryUserStore>,
    pub events: Arc<InMemoryEventStore>,
    pub attendees: Arc<InMemoryAttendeeStore>,
    pub templates: Arc<InMemoryTemplateStore>,
    pub mailer: Arc<RecordingMailer>,
    pub images: Arc<StubImages>,
}

impl TestBackend {
    pub fn new() -> Self {
        Self {
            users: Arc::new(InMemoryUserStore::default()),
            events: Arc::new(InMemoryEventStore::default()),
            attendees: Arc::new(InMemoryAttendeeStore::default()),
            templates: Arc::new(InMemoryTemplateStore::default()),
            mailer: Arc::new(RecordingMailer::default()),
            images: Arc::new(StubImages::default()),
        }
    }

    pub fn state(&self, verbose_auth_errors: bool) -> AppState {
        AppState::new(
            test_config(verbose_auth_errors),
            self.users.clone(),
            self.events.clone(),
            self.attendees.clone(),
            self.templates.clone(),
            self.mailer.clone(),
            self.images.clone(),
        )
    }
}

pub fn hashed(password: &str) -> String {
    hash_password(password).expect("hash password")
}

// ---------------------------------------------------------------------------
// Users

#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<Vec<User>>,
    next_id: AtomicI32,
}

impl InMemoryUserStore {
    pub fn add_user(&self, email: &str, password_hash: &str, role: UserRole, verified: bool) -> User {
        let now = Utc::now();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let user = User {
            id,
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: email.to_string(),
            password: password_hash.to_string(),
            role,
            verified,
            created_at: now,
            updated_at: now,
        };
        self.users.lock().unwrap().push(user.clone());
        user
    }

    pub fn set_role(&self, id: i32, role: UserRole) {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.role = role;
        }
    }

    pub fn remove(&self, id: i32) {
        self.users.lock().unwrap().retain(|u| u.id != id);
    }

    pub fn count(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn get_role_by_id(&self, id: i32) -> Result<UserRole, AppError> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.role)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        Ok(self.add_user(&user.email, &user.password_hash, UserRole::NormalUser, false))
    }

    async fn create_super_user(&self, user: NewUser) -> Result<User, AppError> {
        Ok(self.add_user(&user.email, &user.password_hash, UserRole::SuperUser, true))
    }

    async fn promote_to_super_user(&self, id: i32) -> Result<(), AppError> {
        self.set_role(id, UserRole::SuperUser);
        Ok(())
    }

    async fn demote_to_normal_user(&self, id: i32) -> Result<(), AppError> {
        self.set_role(id, UserRole::NormalUser);
        Ok(())
    }

    async fn mark_verified(&self, id: i32) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.verified = true;
        }
        Ok(())
    }

    async fn update_information(
        &self,
        id: i32,
        update: &UpdateUserPayload,
    ) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.first_name = update.first_name.clone();
            user.last_name = update.last_name.clone();
            user.email = update.email.clone();
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: i32) -> Result<(), AppError> {
        self.remove(id);
        Ok(())
    }

    async fn list_paginated(&self, page: i64, page_size: i64) -> Result<Vec<User>, AppError> {
        let users = self.users.lock().unwrap();
        let offset = ((page - 1) * page_size) as usize;
        Ok(users
            .iter()
            .skip(offset)
            .take(page_size as usize)
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Events

#[derive(Default)]
pub struct InMemoryEventStore {
    events: Mutex<Vec<Event>>,
    next_id: AtomicI32,
}

impl InMemoryEventStore {
    pub fn add_event(&self, title: &str, user_id: i32) -> Event {
        let now = Utc::now();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let event = Event {
            id,
            title: title.to_string(),
            description: "a gathering".to_string(),
            start_date: now,
            end_date: now,
            location: "Main Hall".to_string(),
            user_id,
            created_at: now,
            updated_at: now,
        };
        self.events.lock().unwrap().push(event.clone());
        event
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn get_by_id(&self, id: i32) -> Result<Option<Event>, AppError> {
        Ok(self.events.lock().unwrap().iter().find(|e| e.id == id).cloned())
    }

    async fn get_by_title(&self, title: &str) -> Result<Option<Event>, AppError> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.title == title)
            .cloned())
    }

    async fn get_all_for_user(&self, user_id: i32) -> Result<Vec<Event>, AppError> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create(&self, event: NewEvent) -> Result<Event, AppError> {
        let now = Utc::now();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let created = Event {
            id,
            title: event.title,
            description: event.description,
            start_date: event.start_date,
            end_date: event.end_date,
            location: event.location,
            user_id: event.user_id,
            created_at: now,
            updated_at: now,
        };
        self.events.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update(&self, event: &Event) -> Result<(), AppError> {
        let mut events = self.events.lock().unwrap();
        if let Some(existing) = events.iter_mut().find(|e| e.id == event.id) {
            *existing = event.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: i32) -> Result<(), AppError> {
        self.events.lock().unwrap().retain(|e| e.id != id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Attendees

/// Enforces the `(event_id, email)` uniqueness key like the real table, so
/// a raced insert surfaces as `AppError::Conflict`.
#[derive(Default)]
pub struct InMemoryAttendeeStore {
    attendees: Mutex<Vec<Attendee>>,
    next_id: AtomicI32,
    fail_create_for: Mutex<HashSet<String>>,
}

impl InMemoryAttendeeStore {
    pub fn add_attendee(&self, email: &str, event_id: i32) -> Attendee {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let attendee = Attendee {
            id,
            first_name: "Existing".to_string(),
            last_name: "Guest".to_string(),
            email: email.to_string(),
            event_id,
            qr_code: format!("https://cdn.test/qr-codes/{email}.svg"),
            company_name: String::new(),
            title: String::new(),
            table_no: 0,
            role: String::new(),
            attendance: false,
        };
        self.attendees.lock().unwrap().push(attendee.clone());
        attendee
    }

    /// Makes `create` fail with a downstream error for this email.
    pub fn fail_create_for(&self, email: &str) {
        self.fail_create_for
            .lock()
            .unwrap()
            .insert(email.to_string());
    }

    pub fn emails_for_event(&self, event_id: i32) -> Vec<String> {
        self.attendees
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.event_id == event_id)
            .map(|a| a.email.clone())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.attendees.lock().unwrap().len()
    }
}

#[async_trait]
impl AttendeeStore for InMemoryAttendeeStore {
    async fn get_by_id(&self, id: i32) -> Result<Option<Attendee>, AppError> {
        Ok(self
            .attendees
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Attendee>, AppError> {
        Ok(self
            .attendees
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn list_for_event(&self, event_id: i32) -> Result<Vec<Attendee>, AppError> {
        Ok(self
            .attendees
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn list_paginated(
        &self,
        event_id: i32,
        page: i64,
        page_size: i64,
    ) -> Result<Vec<Attendee>, AppError> {
        let offset = ((page - 1) * page_size) as usize;
        Ok(self
            .attendees
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.event_id == event_id)
            .skip(offset)
            .take(page_size as usize)
            .cloned()
            .collect())
    }

    async fn count_for_event(&self, event_id: i32) -> Result<i64, AppError> {
        Ok(self
            .attendees
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.event_id == event_id)
            .count() as i64)
    }

    async fn create(&self, attendee: NewAttendee) -> Result<Attendee, AppError> {
        if self
            .fail_create_for
            .lock()
            .unwrap()
            .contains(&attendee.email)
        {
            return Err(AppError::Internal(anyhow::anyhow!(
                "simulated storage failure"
            )));
        }

        let mut attendees = self.attendees.lock().unwrap();
        if attendees
            .iter()
            .any(|a| a.event_id == attendee.event_id && a.email == attendee.email)
        {
            return Err(AppError::Conflict("Resource already exists".to_string()));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let created = Attendee {
            id,
            first_name: attendee.first_name,
            last_name: attendee.last_name,
            email: attendee.email,
            event_id: attendee.event_id,
            qr_code: attendee.qr_code,
            company_name: attendee.company_name,
            title: attendee.title,
            table_no: attendee.table_no,
            role: attendee.role,
            attendance: attendee.attendance,
        };
        attendees.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: i32, data: &NewAttendee) -> Result<(), AppError> {
        let mut attendees = self.attendees.lock().unwrap();
        if let Some(existing) = attendees.iter_mut().find(|a| a.id == id) {
            existing.first_name = data.first_name.clone();
            existing.last_name = data.last_name.clone();
            existing.email = data.email.clone();
            existing.qr_code = data.qr_code.clone();
            existing.company_name = data.company_name.clone();
            existing.title = data.title.clone();
            existing.table_no = data.table_no;
            existing.role = data.role.clone();
            existing.attendance = data.attendance;
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: i32) -> Result<(), AppError> {
        self.attendees.lock().unwrap().retain(|a| a.id != id);
        Ok(())
    }

    async fn delete_all_for_event(&self, event_id: i32) -> Result<(), AppError> {
        self.attendees
            .lock()
            .unwrap()
            .retain(|a| a.event_id != event_id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Email templates

#[derive(Default)]
pub struct InMemoryTemplateStore {
    templates: Mutex<Vec<EmailTemplate>>,
    next_id: AtomicI32,
}

impl InMemoryTemplateStore {
    pub fn add_template(&self, event_id: i32) -> EmailTemplate {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let template = EmailTemplate {
            id,
            event_id,
            header_image: "https://cdn.test/header.png".to_string(),
            content: "Hello {{first_name}} {{last_name}}, your pass: {{qr_code}}".to_string(),
            footer_image: "https://cdn.test/footer.png".to_string(),
            subject: "You are invited".to_string(),
            bg_color: "#ffffff".to_string(),
            message: "preview".to_string(),
        };
        self.templates.lock().unwrap().push(template.clone());
        template
    }
}

#[async_trait]
impl EmailTemplateStore for InMemoryTemplateStore {
    async fn get_by_event_id(&self, event_id: i32) -> Result<Option<EmailTemplate>, AppError> {
        Ok(self
            .templates
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.event_id == event_id)
            .cloned())
    }

    async fn create(&self, template: NewEmailTemplate) -> Result<EmailTemplate, AppError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let created = EmailTemplate {
            id,
            event_id: template.event_id,
            header_image: template.header_image,
            content: template.content,
            footer_image: template.footer_image,
            subject: template.subject,
            bg_color: template.bg_color,
            message: template.message,
        };
        self.templates.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update(&self, template: &EmailTemplate) -> Result<(), AppError> {
        let mut templates = self.templates.lock().unwrap();
        if let Some(existing) = templates
            .iter_mut()
            .find(|t| t.event_id == template.event_id)
        {
            *existing = template.clone();
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Mailer

#[derive(Default)]
pub struct RecordingMailer {
    pub invitations: Mutex<Vec<String>>,
    pub verifications: Mutex<Vec<String>>,
    pub fail_for: Mutex<HashSet<String>>,
}

impl RecordingMailer {
    pub fn fail_for(&self, email: &str) {
        self.fail_for.lock().unwrap().insert(email.to_string());
    }

    pub fn invitation_count(&self) -> usize {
        self.invitations.lock().unwrap().len()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_verification_email(&self, to_email: &str, _token: &str) -> anyhow::Result<()> {
        self.verifications.lock().unwrap().push(to_email.to_string());
        Ok(())
    }

    async fn send_invitation_email(
        &self,
        attendee: &Attendee,
        _template: &EmailTemplate,
    ) -> anyhow::Result<()> {
        if self.fail_for.lock().unwrap().contains(&attendee.email) {
            anyhow::bail!("smtp rejected recipient");
        }
        self.invitations.lock().unwrap().push(attendee.email.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Images

#[derive(Default)]
pub struct StubImages {
    pub fail_generate_for: Mutex<HashSet<String>>,
    pub fail_delete: Mutex<HashSet<String>>,
    pub deleted: Mutex<Vec<String>>,
}

impl StubImages {
    pub fn fail_generate_for(&self, data: &str) {
        self.fail_generate_for
            .lock()
            .unwrap()
            .insert(data.to_string());
    }

    pub fn fail_delete_for(&self, url: &str) {
        self.fail_delete.lock().unwrap().insert(url.to_string());
    }
}

#[async_trait]
impl ImageUploader for StubImages {
    async fn generate_qr_image(&self, data: &str) -> anyhow::Result<String> {
        if self.fail_generate_for.lock().unwrap().contains(data) {
            anyhow::bail!("image backend unavailable");
        }
        Ok(format!("https://cdn.test/qr-codes/{data}.svg"))
    }

    async fn delete_qr_image(&self, url: &str) -> anyhow::Result<()> {
        if self.fail_delete.lock().unwrap().contains(url) {
            anyhow::bail!("image backend unavailable");
        }
        self.deleted.lock().unwrap().push(url.to_string());
        Ok(())
    }
}
