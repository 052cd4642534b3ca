//! Bookstack - library catalog backend
//!
//! User registration and bearer-token authentication, book CRUD, and bulk
//! import from CSV/JSON, backed by SQLite.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod services;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Database;
use crate::services::auth::AuthService;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,
    pub auth: AuthService,
}

/// Build the application router with all routes and middleware
pub fn app(state: AppState) -> Router {
    Router::new()
        // Health endpoints (no auth required)
        .merge(api::health::router())
        // REST API endpoints
        .nest("/api", api::auth::router())
        .nest("/api", api::books::router())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
