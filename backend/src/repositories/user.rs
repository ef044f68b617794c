//! User store: account lookup, role management, and lifecycle.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::user::{NewUser, UpdateUserPayload, User, UserRole};

/// Black-box persistence interface for user accounts. `Option` is the
/// distinguished "not found" signal on lookups.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_by_id(&self, id: i32) -> Result<Option<User>, AppError>;
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    /// Fresh role lookup; authorization checks call this per request so a
    /// promotion takes effect without re-login.
    async fn get_role_by_id(&self, id: i32) -> Result<UserRole, AppError>;
    async fn create(&self, user: NewUser) -> Result<User, AppError>;
    async fn create_super_user(&self, user: NewUser) -> Result<User, AppError>;
    async fn promote_to_super_user(&self, id: i32) -> Result<(), AppError>;
    async fn demote_to_normal_user(&self, id: i32) -> Result<(), AppError>;
    async fn mark_verified(&self, id: i32) -> Result<(), AppError>;
    async fn update_information(
        &self,
        id: i32,
        update: &UpdateUserPayload,
    ) -> Result<(), AppError>;
    async fn delete_by_id(&self, id: i32) -> Result<(), AppError>;
    async fn list_paginated(&self, page: i64, page_size: i64) -> Result<Vec<User>, AppError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert(&self, user: NewUser, role: UserRole, verified: bool) -> Result<User, AppError> {
        let created = sqlx::query_as::<_, User>(
            "INSERT INTO users (first_name, last_name, email, password, role, verified, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7) \
             RETURNING id, first_name, last_name, email, password, role, verified, created_at, updated_at",
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(role)
        .bind(verified)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn set_role(&self, id: i32, role: UserRole) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET role = $1, updated_at = $2 WHERE id = $3")
            .bind(role)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn get_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, first_name, last_name, email, password, role, verified, created_at, updated_at \
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, first_name, last_name, email, password, role, verified, created_at, updated_at \
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_role_by_id(&self, id: i32) -> Result<UserRole, AppError> {
        let role: Option<UserRole> = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        role.ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        self.insert(user, UserRole::NormalUser, false).await
    }

    async fn create_super_user(&self, user: NewUser) -> Result<User, AppError> {
        self.insert(user, UserRole::SuperUser, true).await
    }

    async fn promote_to_super_user(&self, id: i32) -> Result<(), AppError> {
        self.set_role(id, UserRole::SuperUser).await
    }

    async fn demote_to_normal_user(&self, id: i32) -> Result<(), AppError> {
        self.set_role(id, UserRole::NormalUser).await
    }

    async fn mark_verified(&self, id: i32) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET verified = TRUE, updated_at = $1 WHERE id = $2")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_information(
        &self,
        id: i32,
        update: &UpdateUserPayload,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE users SET first_name = $1, last_name = $2, email = $3, updated_at = $4 \
             WHERE id = $5",
        )
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.email)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_by_id(&self, id: i32) -> Result<(), AppError> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_paginated(&self, page: i64, page_size: i64) -> Result<Vec<User>, AppError> {
        let offset = (page - 1) * page_size;
        let users = sqlx::query_as::<_, User>(
            "SELECT id, first_name, last_name, email, password, role, verified, created_at, updated_at \
             FROM users ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(page_size)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}
