use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feedback_hub::{
    api::{create_router, AppState},
    config::Config,
    db::{self, UserRepository},
    error::AppError,
    session::SessionKey,
    templates::Templates,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,feedback_hub=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 Starting feedback hub v{}...", env!("CARGO_PKG_VERSION"));

    let config = Arc::new(Config::from_env()?);
    tracing::info!("✅ Configuration loaded");

    // Connect and run migrations
    let db = db::connect(&config).await?;
    tracing::info!("✅ Database ready: {}", config.database_url);

    for username in &config.admin_usernames {
        if UserRepository::set_admin(&db, username, true).await? {
            tracing::info!("👑 {} has admin rights", username);
        } else {
            tracing::warn!("⚠️  ADMIN_USERNAMES names unknown user {}", username);
        }
    }

    let templates = Arc::new(Templates::load()?);
    tracing::info!("✅ Templates compiled");

    let state = AppState {
        db,
        templates,
        session_key: SessionKey::new(&config.secret_key, config.secure_cookies)?,
        config: config.clone(),
    };

    let app = create_router(state);

    let addr = config.server_address();
    tracing::info!("🌐 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
