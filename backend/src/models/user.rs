//! Models that represent user accounts, roles, and authentication payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
/// Database representation of an organizer account.
pub struct User {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Argon2 hash of the user's password. Never serialized to clients.
    #[serde(skip_serializing)]
    pub password: String,
    /// Role describing the user's privileges.
    pub role: UserRole,
    /// Whether the account's email address has been confirmed.
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Default)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
/// Supported user roles stored in the database.
pub enum UserRole {
    /// Standard organizer with access to their own events only.
    #[default]
    NormalUser,
    /// Elevated role with cross-tenant user-management capability.
    SuperUser,
}

impl UserRole {
    /// Returns the canonical snake_case representation of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::NormalUser => "normal_user",
            UserRole::SuperUser => "super_user",
        }
    }
}

impl Serialize for UserRole {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "normal_user" => Ok(UserRole::NormalUser),
            "super_user" => Ok(UserRole::SuperUser),
            other => Err(serde::de::Error::unknown_variant(
                other,
                &["normal_user", "super_user"],
            )),
        }
    }
}

#[derive(Debug, Clone)]
/// Fields required to persist a new account; role and verification status
/// are decided by the store method used.
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Deserialize, Validate)]
/// Payload for registering a new account (also used for super-user upsert).
pub struct RegisterUserPayload {
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 3, max = 20))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
/// Credentials submitted at login.
pub struct LoginUserPayload {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
/// Payload for a user updating their own profile.
pub struct UpdateUserPayload {
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
/// Public-facing representation of a user returned by the API.
pub struct UserResponse {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    pub verified: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            role: user.role.as_str().to_string(),
            verified: user.verified,
        }
    }
}

impl User {
    /// Returns `true` when the user holds the elevated role.
    pub fn is_super_user(&self) -> bool {
        matches!(self.role, UserRole::SuperUser)
    }
}
