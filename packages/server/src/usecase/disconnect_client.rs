//! UseCase: リアルタイム接続の切断

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher};

/// 切断のユースケース
pub struct DisconnectClientUseCase {
    message_pusher: Arc<dyn MessagePusher>,
}

impl DisconnectClientUseCase {
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    /// Drop the connection from the registry. Safe to call more than once.
    pub async fn execute(&self, connection_id: &ConnectionId) {
        self.message_pusher
            .unregister_connection(connection_id)
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SessionId, UserId};
    use crate::infrastructure::message_pusher::WebSocketMessagePusher;

    #[tokio::test]
    async fn test_disconnect_stops_delivery() {
        // テスト項目: 切断後の接続にはブロードキャストが届かない
        // given (前提条件):
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let session_id = SessionId::generate();
        let connection_id = ConnectionId::generate();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        pusher.register_connection(connection_id, tx).await;
        pusher
            .bind_session(&connection_id, session_id.clone(), UserId::new("alice".to_string()).unwrap())
            .await
            .unwrap();
        let usecase = DisconnectClientUseCase::new(pusher.clone());

        // when (操作):
        usecase.execute(&connection_id).await;
        usecase.execute(&connection_id).await;

        // then (期待する結果):
        assert_eq!(pusher.connection_count().await, 0);
        assert_eq!(pusher.broadcast_to_session(&session_id, "{}").await, 0);
    }
}
