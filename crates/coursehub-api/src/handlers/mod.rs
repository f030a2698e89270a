//! HTTP and WebSocket handlers.

pub mod course;
pub mod health;
pub mod ws;
