//! Drives one WebSocket connection from upgrade to close.

use axum::extract::ws::{CloseFrame, Message, WebSocket, close_code};
use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use coursehub_core::error::{AppError, ErrorKind};
use coursehub_core::result::AppResult;
use coursehub_core::types::{AuthenticatedUser, SessionToken};

use super::state::SessionState;
use crate::connection::ConnectionId;
use crate::message::{ClientCommand, ServerMessage};
use crate::seat::Allocation;
use crate::server::RealtimeEngine;

/// Close reasons are limited to 123 bytes by the WebSocket framing.
const MAX_CLOSE_REASON: usize = 123;

/// What the reader task hands to the dispatch loop.
#[derive(Debug)]
enum Inbound {
    Frame(Vec<u8>),
    Closed,
    Failed(String),
}

/// Why the dispatch loop stopped.
#[derive(Debug)]
enum Exit {
    PeerClosed,
    ReadFailed(String),
    WriteFailed(String),
    Fatal(AppError),
}

/// One client connection.
#[derive(Debug)]
pub struct Session {
    id: ConnectionId,
    state: SessionState,
    engine: RealtimeEngine,
}

impl Session {
    /// Creates a session in the `Connecting` state.
    pub fn new(engine: RealtimeEngine) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Connecting,
            engine,
        }
    }

    /// Connection identifier used in logs and registries.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        if !self.state.can_advance_to(next) {
            warn!(conn_id = %self.id, from = %self.state, to = %next, "Ignoring backward session transition");
            return;
        }
        debug!(conn_id = %self.id, from = %self.state, to = %next, "Session state changed");
        self.state = next;
    }

    /// Runs the session until the connection ends.
    ///
    /// `token` is the value of the `session` cookie from the upgrade
    /// request, if any.
    pub async fn run(mut self, mut socket: WebSocket, token: Option<SessionToken>) {
        self.transition(SessionState::Authenticating);

        let (token, user) = match self.authenticate(token).await {
            Ok(found) => found,
            Err(err) if err.is(ErrorKind::Authentication) => {
                debug!(conn_id = %self.id, reason = %err.message, "Session not authenticated");
                self.reject(&mut socket, ServerMessage::Unauthenticated, close_code::NORMAL)
                    .await;
                return;
            }
            Err(err) => {
                error!(conn_id = %self.id, error = %err, "Session lookup failed");
                self.reject(&mut socket, ServerMessage::error(err.message), close_code::ERROR)
                    .await;
                return;
            }
        };

        let single_session = self.engine.config().single_session_per_user;
        if single_session && !self.engine.active_users.try_claim(&user.user_id, self.id) {
            info!(conn_id = %self.id, user_id = %user.user_id, "Rejecting second session for user");
            self.reject(
                &mut socket,
                ServerMessage::error("User already has an active session"),
                close_code::POLICY,
            )
            .await;
            return;
        }

        self.transition(SessionState::Active);
        info!(conn_id = %self.id, user_id = %user.user_id, "Session active");

        let outbound = self.engine.broadcast.register(token.clone(), self.id).await;
        let exit = self.serve(socket, &user, outbound).await;

        self.engine.broadcast.unregister(&token, self.id).await;
        if single_session {
            self.engine.active_users.release(&user.user_id, self.id);
        }
        self.transition(SessionState::Closed);

        match exit {
            Exit::PeerClosed => {
                info!(conn_id = %self.id, user_id = %user.user_id, "Session closed by peer")
            }
            Exit::ReadFailed(reason) | Exit::WriteFailed(reason) => {
                info!(conn_id = %self.id, user_id = %user.user_id, reason = %reason, "Session ended")
            }
            Exit::Fatal(err) if err.is(ErrorKind::Protocol) => {
                info!(conn_id = %self.id, user_id = %user.user_id, reason = %err.message, "Session closed for protocol violation")
            }
            Exit::Fatal(err) => {
                error!(conn_id = %self.id, user_id = %user.user_id, error = %err, "Session closed after error")
            }
        }
    }

    /// Resolves the cookie to a live, unexpired user.
    ///
    /// A missing, unknown, or expired credential is an
    /// [`ErrorKind::Authentication`] error; a failed lookup keeps the kind
    /// the store gave it.
    async fn authenticate(
        &self,
        token: Option<SessionToken>,
    ) -> AppResult<(SessionToken, AuthenticatedUser)> {
        let token = token.ok_or_else(|| AppError::authentication("No session cookie"))?;
        match self.engine.authenticator.authenticate(&token).await? {
            Some(user) if user.is_expired() => Err(AppError::authentication(format!(
                "Session of {} expired",
                user.user_id
            ))),
            Some(user) => Ok((token, user)),
            None => Err(AppError::authentication("Unknown session token")),
        }
    }

    /// Sends a final message and closes a connection that never became active.
    async fn reject(&mut self, socket: &mut WebSocket, message: ServerMessage, code: u16) {
        let reason = match &message {
            ServerMessage::Error { reason } => reason.clone(),
            _ => String::new(),
        };
        if let Err(err) = socket.send(Message::Text(message.encode().into())).await {
            debug!(conn_id = %self.id, error = %err, "Failed to send rejection");
        }
        let _ = socket.send(close_message(code, &reason)).await;
        self.transition(SessionState::Closed);
    }

    /// The dispatch loop. Only this loop writes to the socket.
    async fn serve(
        &mut self,
        socket: WebSocket,
        user: &AuthenticatedUser,
        mut outbound: mpsc::Receiver<String>,
    ) -> Exit {
        let (mut sink, stream) = socket.split();
        let (inbound_tx, mut inbound) = mpsc::channel(1);
        let reader = tokio::spawn(read_frames(stream, inbound_tx));
        let mut outbound_open = true;

        let exit = loop {
            tokio::select! {
                queued = outbound.recv(), if outbound_open => match queued {
                    Some(text) => {
                        if let Err(err) = sink.send(Message::Text(text.into())).await {
                            break Exit::WriteFailed(err.to_string());
                        }
                    }
                    None => {
                        // Another connection took over this session token.
                        debug!(conn_id = %self.id, "Broadcast queue detached");
                        outbound_open = false;
                    }
                },
                received = inbound.recv() => match received {
                    Some(Inbound::Frame(frame)) => match self.handle_frame(user, &frame).await {
                        Ok(Some(reply)) => {
                            if let Err(err) = sink.send(Message::Text(reply.encode().into())).await {
                                break Exit::WriteFailed(err.to_string());
                            }
                        }
                        Ok(None) => {}
                        Err(err) => break Exit::Fatal(err),
                    },
                    Some(Inbound::Failed(reason)) => break Exit::ReadFailed(reason),
                    Some(Inbound::Closed) | None => break Exit::PeerClosed,
                },
            }
        };

        self.transition(SessionState::Closing);
        reader.abort();

        if let Exit::Fatal(err) = &exit {
            let diagnostic = ServerMessage::error(err.message.clone());
            if sink.send(Message::Text(diagnostic.encode().into())).await.is_ok() {
                let _ = sink
                    .send(close_message(close_code::PROTOCOL, &err.message))
                    .await;
            }
        } else {
            let _ = sink.close().await;
        }
        exit
    }

    async fn handle_frame(
        &self,
        user: &AuthenticatedUser,
        frame: &[u8],
    ) -> AppResult<Option<ServerMessage>> {
        let fields = self.engine.codec.decode(frame);
        match ClientCommand::parse(&fields)? {
            ClientCommand::Hello => Ok(Some(ServerMessage::Hi)),
            ClientCommand::CourseCount => Ok(None),
            ClientCommand::Choose { course_id, raw } => {
                let reply = match self.engine.allocator.choose(&user.user_id, course_id).await? {
                    Allocation::Accepted { .. } | Allocation::Reaffirmed => {
                        ServerMessage::Accepted { course: raw }
                    }
                    Allocation::Full => ServerMessage::full(raw),
                };
                Ok(Some(reply))
            }
        }
    }
}

/// Forwards frames from the socket until it ends or the session stops
/// listening.
async fn read_frames(mut stream: SplitStream<WebSocket>, inbound: mpsc::Sender<Inbound>) {
    while let Some(received) = stream.next().await {
        let item = match received {
            Ok(Message::Text(text)) => Inbound::Frame(text.as_str().as_bytes().to_vec()),
            Ok(Message::Binary(bytes)) => Inbound::Frame(bytes.to_vec()),
            Ok(Message::Ping(_) | Message::Pong(_)) => continue,
            Ok(Message::Close(_)) => Inbound::Closed,
            Err(err) => Inbound::Failed(err.to_string()),
        };
        let terminal = !matches!(item, Inbound::Frame(_));
        if inbound.send(item).await.is_err() || terminal {
            return;
        }
    }
    let _ = inbound.send(Inbound::Closed).await;
}

fn close_message(code: u16, reason: &str) -> Message {
    let mut end = reason.len().min(MAX_CLOSE_REASON);
    while !reason.is_char_boundary(end) {
        end -= 1;
    }
    Message::Close(Some(CloseFrame {
        code,
        reason: reason[..end].to_string().into(),
    }))
}
