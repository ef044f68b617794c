//! Attendee model and request payloads.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Attendee {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub event_id: i32,
    /// URL of the hosted QR-code artifact generated from the email.
    pub qr_code: String,
    pub company_name: String,
    pub title: String,
    pub table_no: i32,
    pub role: String,
    pub attendance: bool,
}

#[derive(Debug, Clone)]
/// Full field set for inserting or replacing an attendee row.
pub struct NewAttendee {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub event_id: i32,
    pub qr_code: String,
    pub company_name: String,
    pub title: String,
    pub table_no: i32,
    pub role: String,
    pub attendance: bool,
}

impl Attendee {
    /// The stored row as replacement data, for full-field updates.
    pub fn as_update(&self) -> NewAttendee {
        NewAttendee {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            event_id: self.event_id,
            qr_code: self.qr_code.clone(),
            company_name: self.company_name.clone(),
            title: self.title.clone(),
            table_no: self.table_no,
            role: self.role.clone(),
            attendance: self.attendance,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAttendeePayload {
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    pub event_id: i32,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub table_no: i32,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAttendeePayload {
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub table_no: i32,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub attendance: bool,
}
