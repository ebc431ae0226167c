//! Shared helpers for the integration tests.
//!
//! Each test starts its own server in-process on an ephemeral port.

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tablesync_server::{
    bootstrap::{AppConfig, build_state},
    domain::UserId,
    infrastructure::auth::JwtTokenVerifier,
    ui::{AppState, REALTIME_PATH, router},
};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub const SECRET: &str = "integration-secret";

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Helper struct to manage an in-process server
pub struct TestApp {
    pub addr: SocketAddr,
    pub state: Arc<AppState>,
    pub http: reqwest::Client,
    signer: JwtTokenVerifier,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let state = Arc::new(build_state(&AppConfig::new(SECRET)));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let app = router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        TestApp {
            addr,
            state,
            http: reqwest::Client::new(),
            signer: JwtTokenVerifier::new(SECRET),
        }
    }

    pub fn token(&self, user: &str) -> String {
        self.signer
            .sign(&UserId::new(user.to_string()).unwrap(), chrono::Duration::hours(1))
            .unwrap()
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn post(&self, user: &str, path: &str, body: Value) -> reqwest::Response {
        self.http
            .post(self.url(path))
            .bearer_auth(self.token(user))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    pub async fn get(&self, user: &str, path: &str) -> reqwest::Response {
        self.http
            .get(self.url(path))
            .bearer_auth(self.token(user))
            .send()
            .await
            .unwrap()
    }

    /// Create a session owned by `owner` and return its id.
    pub async fn create_session(&self, owner: &str, visibility: &str) -> String {
        let res = self
            .post(owner, "/sessions", json!({"name": "table", "visibility": visibility}))
            .await;
        assert_eq!(res.status(), reqwest::StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        body["id"].as_str().unwrap().to_string()
    }

    /// Open a realtime connection and consume the welcome frame.
    pub async fn connect(&self) -> WsClient {
        let url = format!("ws://{}{}", self.addr, REALTIME_PATH);
        let (mut ws, _) = connect_async(url).await.expect("Failed to connect");
        let welcome = next_frame(&mut ws).await.expect("no welcome frame");
        assert_eq!(welcome, json!({"type": "welcome"}));
        ws
    }

    /// Connect and subscribe `user` to `session_id`, asserting success.
    pub async fn subscribed(&self, user: &str, session_id: &str) -> WsClient {
        let mut ws = self.connect().await;
        send_frame(
            &mut ws,
            json!({"type": "subscribe", "session_id": session_id, "token": self.token(user)}),
        )
        .await;
        let reply = next_frame(&mut ws).await.expect("no subscribe reply");
        assert_eq!(reply, json!({"type": "subscribed", "session_id": session_id}));
        ws
    }
}

pub async fn send_frame(ws: &mut WsClient, frame: Value) {
    send_text(ws, &frame.to_string()).await;
}

pub async fn send_text(ws: &mut WsClient, text: &str) {
    ws.send(Message::Text(text.to_string().into())).await.unwrap();
}

/// Next JSON text frame, or `None` if nothing arrives within 500ms.
pub async fn next_frame(ws: &mut WsClient) -> Option<Value> {
    next_frame_within(ws, Duration::from_millis(500)).await
}

pub async fn next_frame_within(ws: &mut WsClient, timeout: Duration) -> Option<Value> {
    loop {
        let msg = tokio::time::timeout(timeout, ws.next()).await.ok()??.ok()?;
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).ok();
        }
    }
}

/// Next `change` frame for `table`, skipping other tables.
pub async fn next_change(ws: &mut WsClient, table: &str) -> Option<Value> {
    loop {
        let frame = next_frame(ws).await?;
        if frame["type"] == "change" && frame["table"] == table {
            return Some(frame);
        }
    }
}
