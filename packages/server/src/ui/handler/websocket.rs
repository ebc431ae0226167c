//! Realtime gateway connection handler.
//!
//! Per connection: `Connected(unscoped)` → `Subscribed(session, user)` → closed.
//! Only `subscribe` frames are understood; anything else is dropped without
//! closing the connection.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, SessionId},
    infrastructure::dto::websocket::{ClientFrame, ServerFrame},
    ui::state::AppState,
    usecase::SubscribeError,
};

pub async fn realtime_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that forwards frames queued for this connection to the
/// WebSocket sink.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();

    let (tx, rx) = mpsc::unbounded_channel();
    let connection_id = state
        .connect_client_usecase
        .execute(tx, &ServerFrame::Welcome.to_json())
        .await;
    tracing::info!("Connection '{}' opened", connection_id);

    let mut send_task = pusher_loop(rx, sender);

    let state_clone = state.clone();
    let mut recv_task = tokio::spawn(async move {
        let mut scope: Option<SessionId> = None;
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::debug!("WebSocket error on '{}': {}", connection_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    handle_frame(&state_clone, connection_id, &mut scope, text.as_str()).await;
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", connection_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state
        .disconnect_client_usecase
        .execute(&connection_id)
        .await;
    tracing::info!("Connection '{}' closed", connection_id);
}

async fn handle_frame(
    state: &AppState,
    connection_id: ConnectionId,
    scope: &mut Option<SessionId>,
    text: &str,
) {
    let frame = match serde_json::from_str::<ClientFrame>(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!("Ignoring frame from '{}': {}", connection_id, e);
            return;
        }
    };

    match frame {
        ClientFrame::Subscribe { session_id, token } => {
            if let Some(current) = scope {
                tracing::warn!(
                    "Connection '{}' is already subscribed to '{}'; ignoring subscribe",
                    connection_id,
                    current
                );
                return;
            }

            let usecase = &state.subscribe_session_usecase;
            match usecase.execute(&connection_id, &session_id, &token).await {
                Ok(session_id) => {
                    let reply = ServerFrame::Subscribed {
                        session_id: session_id.to_string(),
                    };
                    usecase.reply(&connection_id, &reply.to_json()).await;
                    *scope = Some(session_id);
                }
                Err(SubscribeError::AlreadySubscribed) => {
                    tracing::warn!("Connection '{}' is already subscribed", connection_id);
                }
                Err(e) => {
                    tracing::warn!("Subscribe from '{}' rejected: {}", connection_id, e);
                    usecase
                        .reply(&connection_id, &ServerFrame::error(e.to_string()).to_json())
                        .await;
                }
            }
        }
    }
}
