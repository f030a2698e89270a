//! Shared fixture: the real router on an ephemeral port over in-memory stores.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use coursehub_api::{AppState, run_server};
use coursehub_core::config::{AppConfig, RealtimeConfig};
use coursehub_core::types::{CourseDefinition, CourseId};
use coursehub_database::memory::{MemoryAuthenticator, MemoryChoiceStore, MemoryCourseSource};
use coursehub_realtime::RealtimeEngine;

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct TestServer {
    pub addr: SocketAddr,
    pub auth: MemoryAuthenticator,
    pub store: MemoryChoiceStore,
    pub state: AppState,
    shutdown: Option<oneshot::Sender<()>>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

pub fn course(id: i64, max: i32) -> CourseDefinition {
    CourseDefinition {
        id: CourseId(id),
        max,
        title: format!("Course {id}"),
        course_type: "Culture".into(),
        teacher: "Ms. Noether".into(),
        location: "Room 101".into(),
    }
}

pub fn app_state(realtime: RealtimeConfig) -> (AppState, MemoryAuthenticator, MemoryChoiceStore) {
    let mut config = AppConfig::from_toml(
        r#"
        [database]
        url = "postgres://unused/coursehub"
        "#,
    )
    .expect("test config parses");
    config.realtime = realtime.clone();

    let auth = MemoryAuthenticator::new();
    let store = MemoryChoiceStore::new();
    let engine = RealtimeEngine::new(realtime, Arc::new(store.clone()), Arc::new(auth.clone()));
    (AppState::new(config, engine, None), auth, store)
}

pub async fn spawn_server(courses: Vec<CourseDefinition>) -> TestServer {
    spawn_server_with(courses, RealtimeConfig::default()).await
}

pub async fn spawn_server_with(
    courses: Vec<CourseDefinition>,
    realtime: RealtimeConfig,
) -> TestServer {
    let (state, auth, store) = app_state(realtime);
    state
        .realtime
        .reload_courses(&MemoryCourseSource::new(courses))
        .await
        .expect("courses load");

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let (tx, rx) = oneshot::channel::<()>();
    let server_state = state.clone();
    tokio::spawn(async move {
        let _ = run_server(listener, server_state, async {
            let _ = rx.await;
        })
        .await;
    });

    TestServer {
        addr,
        auth,
        store,
        state,
        shutdown: Some(tx),
    }
}

impl TestServer {
    /// Registers `token` for `user`, valid for an hour.
    pub fn login(&self, token: &str, user: &str) {
        self.auth
            .insert(token, user, Utc::now() + chrono::Duration::hours(1));
    }

    /// Opens a WebSocket, sending `session=<token>` when given.
    pub async fn connect(&self, token: Option<&str>) -> Client {
        let mut request = format!("ws://{}/ws", self.addr)
            .into_client_request()
            .expect("valid request");
        if let Some(token) = token {
            request.headers_mut().insert(
                "Cookie",
                format!("session={token}").parse().expect("header value"),
            );
        }
        let (client, _response) = tokio_tungstenite::connect_async(request)
            .await
            .expect("upgrade succeeds");
        client
    }

    /// Connects as `user` and waits until the session is serving commands.
    pub async fn connect_as(&self, token: &str, user: &str) -> Client {
        self.login(token, user);
        let mut client = self.connect(Some(token)).await;
        send(&mut client, "HELLO").await;
        assert_eq!(recv_text(&mut client).await, "HI");
        client
    }
}

pub async fn send(client: &mut Client, frame: &str) {
    client
        .send(Message::text(frame.to_string()))
        .await
        .expect("send frame");
}

/// Next text frame, skipping control frames.
pub async fn recv_text(client: &mut Client) -> String {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("connection ended")
            .expect("websocket error");
        match message {
            Message::Text(text) => return text.as_str().to_owned(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("expected text frame, got {other:?}"),
        }
    }
}

/// Waits for the server to close the connection and returns its close frame.
pub async fn recv_close(client: &mut Client) -> Option<CloseFrame> {
    loop {
        let next = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for close");
        match next {
            Some(Ok(Message::Close(frame))) => return frame,
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
            Some(Ok(other)) => panic!("expected close, got {other:?}"),
            Some(Err(_)) | None => return None,
        }
    }
}

/// Proves nothing was queued for the client: a HELLO round trip must come
/// back before any other frame.
pub async fn assert_quiet(client: &mut Client) {
    send(client, "HELLO").await;
    assert_eq!(recv_text(client).await, "HI");
}
