//! Per-connection session: authentication, dispatch loop, and cleanup.

pub mod handler;
pub mod state;

pub use handler::Session;
pub use state::SessionState;
