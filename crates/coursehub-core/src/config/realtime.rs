//! Real-time WebSocket engine configuration.

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Capacity of each session's outbound queue. Broadcasts to a session
    /// whose queue is full are dropped for that session.
    #[serde(default = "default_send_queue_capacity")]
    pub send_queue_capacity: usize,
    /// Initial capacity of the field vector when decoding a frame.
    #[serde(default = "default_message_arguments_cap")]
    pub message_arguments_cap: usize,
    /// Initial capacity of each field buffer when decoding a frame.
    #[serde(default = "default_message_bytes_cap")]
    pub message_bytes_cap: usize,
    /// WebSocket subprotocol offered during the upgrade.
    #[serde(default = "default_subprotocol")]
    pub subprotocol: String,
    /// Reject a connection when its user already has a live session.
    #[serde(default)]
    pub single_session_per_user: bool,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            send_queue_capacity: default_send_queue_capacity(),
            message_arguments_cap: default_message_arguments_cap(),
            message_bytes_cap: default_message_bytes_cap(),
            subprotocol: default_subprotocol(),
            single_session_per_user: false,
        }
    }
}

fn default_send_queue_capacity() -> usize {
    10
}

fn default_message_arguments_cap() -> usize {
    4
}

fn default_message_bytes_cap() -> usize {
    8
}

fn default_subprotocol() -> String {
    "cca1".to_string()
}
