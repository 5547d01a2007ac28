// =============================================================================
// AdPace Backend - API Server Entry Point
// =============================================================================
// Table of Contents:
// 1. Imports
// 2. Application State
// 3. Main Entry Point
// 4. Router Setup
// =============================================================================

mod campaigns;
mod config;
mod db;
mod error;
mod optimize;
mod spreadsheet;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;

// -----------------------------------------------------------------------------
// 2. Application State
// -----------------------------------------------------------------------------

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,
}

// -----------------------------------------------------------------------------
// 3. Main Entry Point
// -----------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables from multiple possible locations
    // Try current directory first, then crates/backend/
    if dotenvy::dotenv().is_err() {
        let _ = dotenvy::from_filename("crates/backend/.env");
    }

    // Load configuration
    let config = Config::from_env()?;
    let bind_addr = config.bind_address.clone();

    // Ensure database directory exists for SQLite
    if config.database_url.starts_with("sqlite:") {
        let db_path = config.database_url.trim_start_matches("sqlite:");
        if let Some(parent) = std::path::Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).ok();
            }
        }
    }

    // Initialize database
    let db = Database::new(&config.database_url).await?;
    db.run_migrations().await?;

    // Create app state
    let state = AppState {
        config: Arc::new(config),
        db,
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("🚀 AdPace API Server running on http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

// -----------------------------------------------------------------------------
// 4. Router Setup
// -----------------------------------------------------------------------------

fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(|| async { "OK" }))
        // Campaigns API
        .route("/api/campaigns", get(campaigns::get_campaigns))
        .route("/api/campaigns", post(campaigns::create_campaign))
        .route("/api/campaigns", delete(campaigns::delete_campaigns))
        .route("/api/campaigns/:id", put(campaigns::update_campaign))
        .route("/api/campaigns/:id", delete(campaigns::delete_campaign))
        // Optimization trigger
        .route("/api/optimize", post(optimize::run_optimization))
        // Spreadsheet import/export
        .route("/api/import", post(spreadsheet::import_campaigns))
        .route("/api/export", get(spreadsheet::export_campaigns))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
