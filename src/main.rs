//! Bookstack backend - entry point

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bookstack::config::Config;
use bookstack::db::Database;
use bookstack::services::auth::{AuthConfig, AuthService};
use bookstack::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(Config::from_env()?);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookstack=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Bookstack backend");

    let db = Database::connect(&config.database_url).await?;
    db.init_schema().await?;
    tracing::info!("Database connected");

    let auth = AuthService::new(db.clone(), AuthConfig::from(config.as_ref()));

    let state = AppState {
        config: config.clone(),
        db,
        auth,
    };
    let router = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
