//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続中の WebSocket の `UnboundedSender` を管理
//! - 接続ごとのセッションスコープ（未購読 / 購読済み）を管理
//! - セッション単位のブロードキャスト
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された sender を受け取り、メッセージ送信に使用します。
//!
//! 接続テーブルとセッション索引は 1 つの `RwLock` の内側にまとめてあるため、
//! 登録・削除・購読の途中状態がブロードキャストから見えることはありません。

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{ConnectionId, MessagePushError, MessagePusher, PusherChannel, SessionId, UserId};

/// Session scope of a live connection.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Scope {
    Unscoped,
    Subscribed { session_id: SessionId, user_id: UserId },
}

struct ConnectionEntry {
    sender: PusherChannel,
    scope: Scope,
}

#[derive(Default)]
struct Registry {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    by_session: HashMap<SessionId, HashSet<ConnectionId>>,
}

impl Registry {
    fn detach_from_session(&mut self, connection_id: &ConnectionId, session_id: &SessionId) {
        if let Some(members) = self.by_session.get_mut(session_id) {
            members.remove(connection_id);
            if members.is_empty() {
                self.by_session.remove(session_id);
            }
        }
    }

    /// Hand `content` to the connections of `session_id` whose user passes
    /// `accept`. Unbounded sends never wait, so one stalled socket cannot hold
    /// up the rest.
    fn deliver(&self, session_id: &SessionId, content: &str, accept: impl Fn(&UserId) -> bool) -> usize {
        let Some(members) = self.by_session.get(session_id) else {
            return 0;
        };

        let mut delivered = 0;
        for connection_id in members {
            let Some(entry) = self.connections.get(connection_id) else {
                continue;
            };
            let Scope::Subscribed { user_id, .. } = &entry.scope else {
                continue;
            };
            if !accept(user_id) {
                continue;
            }
            match entry.sender.send(content.to_string()) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::debug!("Dropped event for connection '{}': {}", connection_id, e);
                }
            }
        }
        delivered
    }
}

/// WebSocket を使った MessagePusher 実装
///
/// ## 使用例
///
/// ```ignore
/// let pusher = WebSocketMessagePusher::new();
/// pusher.register_connection(connection_id, tx).await;
/// pusher.bind_session(&connection_id, session_id.clone(), user_id).await?;
/// pusher.broadcast_to_session(&session_id, "{\"type\":\"change\"}").await;
/// ```
#[derive(Default)]
pub struct WebSocketMessagePusher {
    registry: RwLock<Registry>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session and user a connection is scoped to, if it has subscribed.
    pub async fn subscription_of(&self, connection_id: &ConnectionId) -> Option<(SessionId, UserId)> {
        let registry = self.registry.read().await;
        match &registry.connections.get(connection_id)?.scope {
            Scope::Subscribed { session_id, user_id } => Some((session_id.clone(), user_id.clone())),
            Scope::Unscoped => None,
        }
    }

    /// Number of open connections, scoped or not.
    pub async fn connection_count(&self) -> usize {
        self.registry.read().await.connections.len()
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_connection(&self, connection_id: ConnectionId, sender: PusherChannel) {
        let mut registry = self.registry.write().await;
        registry.connections.insert(
            connection_id,
            ConnectionEntry {
                sender,
                scope: Scope::Unscoped,
            },
        );
        tracing::debug!("Connection '{}' registered to MessagePusher", connection_id);
    }

    async fn unregister_connection(&self, connection_id: &ConnectionId) {
        let mut registry = self.registry.write().await;
        if let Some(entry) = registry.connections.remove(connection_id) {
            if let Scope::Subscribed { session_id, .. } = entry.scope {
                registry.detach_from_session(connection_id, &session_id);
            }
            tracing::debug!("Connection '{}' unregistered from MessagePusher", connection_id);
        }
    }

    async fn bind_session(
        &self,
        connection_id: &ConnectionId,
        session_id: SessionId,
        user_id: UserId,
    ) -> Result<(), MessagePushError> {
        let mut registry = self.registry.write().await;
        let entry = registry
            .connections
            .get_mut(connection_id)
            .ok_or_else(|| MessagePushError::ConnectionNotFound(connection_id.to_string()))?;

        if entry.scope != Scope::Unscoped {
            return Err(MessagePushError::AlreadySubscribed(connection_id.to_string()));
        }
        entry.scope = Scope::Subscribed {
            session_id: session_id.clone(),
            user_id,
        };
        registry
            .by_session
            .entry(session_id.clone())
            .or_default()
            .insert(*connection_id);

        tracing::debug!("Connection '{}' scoped to session '{}'", connection_id, session_id);
        Ok(())
    }

    async fn push_to(&self, connection_id: &ConnectionId, content: &str) -> Result<(), MessagePushError> {
        let registry = self.registry.read().await;
        let entry = registry
            .connections
            .get(connection_id)
            .ok_or_else(|| MessagePushError::ConnectionNotFound(connection_id.to_string()))?;
        entry
            .sender
            .send(content.to_string())
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))
    }

    async fn broadcast_to_session(&self, session_id: &SessionId, content: &str) -> usize {
        self.registry
            .read()
            .await
            .deliver(session_id, content, |_| true)
    }

    async fn broadcast_to_users(&self, session_id: &SessionId, users: &[UserId], content: &str) -> usize {
        self.registry
            .read()
            .await
            .deliver(session_id, content, |user_id| users.contains(user_id))
    }
}
