//! Users repository for authentication

use serde::Serialize;
use sqlx::SqlitePool;

/// User record from database
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Latest-issued refresh token, if the user is signed in
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub created_at: String,
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
}

pub struct UsersRepository {
    pool: SqlitePool,
}

impl UsersRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new user and return its assigned id.
    ///
    /// Fails with a uniqueness violation if the email is already registered.
    pub async fn create(&self, user: CreateUser) -> sqlx::Result<i64> {
        sqlx::query_scalar(
            r#"
            INSERT INTO users (email, username, password_hash)
            VALUES (?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
    }

    /// Get user by email (case-insensitive)
    pub async fn get_by_email(&self, email: &str) -> sqlx::Result<Option<UserRecord>> {
        sqlx::query_as(
            "SELECT id, email, username, password_hash, refresh_token, created_at FROM users WHERE email = ? COLLATE NOCASE",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    /// Overwrite the user's stored refresh token in place.
    ///
    /// Passing `None` clears it (sign-out); passing a new value implicitly
    /// invalidates whatever was stored before.
    pub async fn set_refresh_token(&self, id: i64, token: Option<&str>) -> sqlx::Result<()> {
        sqlx::query("UPDATE users SET refresh_token = ? WHERE id = ?")
            .bind(token)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
