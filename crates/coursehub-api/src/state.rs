//! Application state shared across all handlers.

use std::sync::Arc;

use coursehub_core::config::AppConfig;
use coursehub_database::DatabasePool;
use coursehub_realtime::RealtimeEngine;

/// Application state passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// WebSocket real-time engine.
    pub realtime: RealtimeEngine,
    /// PostgreSQL pool, absent when running on in-memory stores.
    pub db: Option<DatabasePool>,
}

impl AppState {
    /// Creates the state.
    pub fn new(config: AppConfig, realtime: RealtimeEngine, db: Option<DatabasePool>) -> Self {
        Self {
            config: Arc::new(config),
            realtime,
            db,
        }
    }
}
