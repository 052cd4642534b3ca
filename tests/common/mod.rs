//! Shared helpers for integration tests
#![allow(dead_code)]

use bookstack::db::Database;
use bookstack::services::auth::{AuthConfig, AuthService};

/// Fresh in-memory database with the schema applied
pub async fn test_db() -> Database {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("connect in-memory database");
    db.init_schema().await.expect("create schema");
    db
}

pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "integration-secret".to_string(),
        access_token_lifetime: 900,
        refresh_token_lifetime: 3600,
        // minimum cost keeps the tests fast
        bcrypt_cost: 4,
    }
}

pub fn test_auth(db: &Database) -> AuthService {
    AuthService::new(db.clone(), test_auth_config())
}
