//! UseCase: リアルタイム接続の受け付け
//!
//! 接続直後はどのセッションにもスコープされていない状態です。
//! subscribe が成功するまでイベントは一切配信されません。

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, PusherChannel};

/// 接続受け付けのユースケース
pub struct ConnectClientUseCase {
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl ConnectClientUseCase {
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    /// Register a fresh, unscoped connection and greet it.
    ///
    /// # Arguments
    ///
    /// * `sender` - クライアントへのメッセージ送信用チャンネル
    /// * `welcome` - 接続直後に送るフレーム（JSON）
    pub async fn execute(&self, sender: PusherChannel, welcome: &str) -> ConnectionId {
        let connection_id = ConnectionId::generate();
        self.message_pusher
            .register_connection(connection_id, sender)
            .await;
        if let Err(e) = self.message_pusher.push_to(&connection_id, welcome).await {
            tracing::warn!("Failed to greet connection '{}': {}", connection_id, e);
        }
        connection_id
    }
}
