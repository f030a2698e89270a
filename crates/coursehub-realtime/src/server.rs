//! Top-level real-time engine that ties together all subsystems.

use std::sync::Arc;

use axum::extract::ws::WebSocket;
use tracing::info;

use coursehub_core::config::RealtimeConfig;
use coursehub_core::result::AppResult;
use coursehub_core::traits::{ChoiceStore, CourseSource, SessionAuthenticator};
use coursehub_core::types::SessionToken;

use crate::connection::{ActiveUsers, BroadcastRegistry};
use crate::message::MessageCodec;
use crate::registry::CourseRegistry;
use crate::seat::SeatAllocator;
use crate::session::Session;

/// Central real-time engine shared by every connection.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// Course registry.
    pub courses: Arc<CourseRegistry>,
    /// Outbound queues of active sessions.
    pub broadcast: Arc<BroadcastRegistry>,
    /// Seat request protocol.
    pub allocator: SeatAllocator,
    /// Session cookie resolver.
    pub authenticator: Arc<dyn SessionAuthenticator>,
    /// Users with a live connection (single-session mode).
    pub active_users: Arc<ActiveUsers>,
    /// Frame decoder.
    pub codec: MessageCodec,
    config: Arc<RealtimeConfig>,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine").finish()
    }
}

impl RealtimeEngine {
    /// Creates an engine with an empty course registry.
    pub fn new(
        config: RealtimeConfig,
        store: Arc<dyn ChoiceStore>,
        authenticator: Arc<dyn SessionAuthenticator>,
    ) -> Self {
        let courses = Arc::new(CourseRegistry::new());
        let broadcast = Arc::new(BroadcastRegistry::new(config.send_queue_capacity));
        let allocator = SeatAllocator::new(courses.clone(), store, broadcast.clone());

        info!(
            send_queue_capacity = config.send_queue_capacity,
            single_session_per_user = config.single_session_per_user,
            "Real-time engine initialized"
        );

        Self {
            courses,
            broadcast,
            allocator,
            authenticator,
            active_users: Arc::new(ActiveUsers::new()),
            codec: MessageCodec::from_config(&config),
            config: Arc::new(config),
        }
    }

    /// Engine configuration.
    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }

    /// Reloads every course from `source`.
    pub async fn reload_courses(&self, source: &dyn CourseSource) -> AppResult<usize> {
        self.courses.reload(source).await
    }

    /// Serves an upgraded connection until it closes.
    pub async fn handle_socket(&self, socket: WebSocket, token: Option<SessionToken>) {
        Session::new(self.clone()).run(socket, token).await;
    }
}
