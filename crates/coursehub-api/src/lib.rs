//! # coursehub-api
//!
//! HTTP layer for CourseHub built on Axum.
//!
//! Serves the WebSocket endpoint that hands connections to the real-time
//! engine, plus a health check and a read-only course listing.

pub mod app;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use app::{run_server, shutdown_signal};
pub use router::build_router;
pub use state::AppState;
