//! WebSocket upgrade handler.

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::{State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use tracing::debug;

use coursehub_core::types::SessionToken;

use crate::state::AppState;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

/// Body returned to requests that are not valid WebSocket upgrades.
pub const NOT_A_WEBSOCKET: &str = "This endpoint only supports valid WebSocket connections.";

/// GET /ws
///
/// Authentication happens after the upgrade so that failures can be
/// reported over the socket.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    jar: CookieJar,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            debug!(reason = %rejection, "Rejected non-WebSocket request");
            return (StatusCode::BAD_REQUEST, NOT_A_WEBSOCKET).into_response();
        }
    };

    let token = jar
        .get(SESSION_COOKIE)
        .map(|cookie| SessionToken::new(cookie.value()));
    let subprotocol = state.realtime.config().subprotocol.clone();
    let engine = state.realtime.clone();

    ws.protocols([subprotocol])
        .on_upgrade(move |socket| async move { engine.handle_socket(socket, token).await })
}
