//! CourseHub Server: real-time course seat selection.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, fmt};

use coursehub_api::{AppState, run_server, shutdown_signal};
use coursehub_core::config::AppConfig;
use coursehub_core::error::AppError;
use coursehub_database::DatabasePool;
use coursehub_realtime::RealtimeEngine;

#[tokio::main]
async fn main() {
    let env = std::env::var("COURSEHUB_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting CourseHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    let db = DatabasePool::connect(&config.database).await?;
    db.migrate().await?;

    // ── Step 2: Real-time engine ─────────────────────────────────
    let realtime = RealtimeEngine::new(
        config.realtime.clone(),
        Arc::new(db.choices()),
        Arc::new(db.users()),
    );

    // ── Step 3: Course registry ──────────────────────────────────
    let courses = db.courses();
    let loaded = realtime.reload_courses(&courses).await?;
    let persisted: i64 = courses
        .count_choices()
        .await?
        .iter()
        .map(|(_, n)| n)
        .sum();
    if persisted > 0 {
        tracing::warn!(
            courses = loaded,
            persisted_choices = persisted,
            "Seat counts start at zero; existing choices are not counted against capacity"
        );
    }

    // ── Step 4: HTTP server ──────────────────────────────────────
    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let state = AppState::new(config, realtime, Some(db.clone()));

    let served = run_server(listener, state, shutdown_signal()).await;

    if tokio::time::timeout(grace, db.close()).await.is_err() {
        tracing::warn!("Timed out closing the database pool");
    }
    served?;

    tracing::info!("CourseHub server stopped");
    Ok(())
}
