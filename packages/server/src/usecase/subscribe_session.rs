//! UseCase: セッションへの購読（subscribe ハンドシェイク）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SubscribeSessionUseCase::execute() の認証・認可・スコープ確定
//!
//! ### どのような状況を想定しているか
//! - 正常系：正しいトークンと参加者でスコープが確定する
//! - 異常系：空の入力、無効なトークン、非参加者
//! - エッジケース：スコープ確定済みの接続への再 subscribe

use std::sync::Arc;

use crate::domain::{
    ConnectionId, MessagePushError, MessagePusher, ParticipantCheck, SessionId, TokenVerifier,
};

use super::error::SubscribeError;

/// 購読のユースケース
pub struct SubscribeSessionUseCase {
    /// TokenVerifier（トークン検証の抽象化）
    token_verifier: Arc<dyn TokenVerifier>,
    /// ParticipantCheck（参加者確認の抽象化）
    participant_check: Arc<dyn ParticipantCheck>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl SubscribeSessionUseCase {
    pub fn new(
        token_verifier: Arc<dyn TokenVerifier>,
        participant_check: Arc<dyn ParticipantCheck>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            token_verifier,
            participant_check,
            message_pusher,
        }
    }

    /// Scope `connection_id` to `session_id` for the token's user.
    ///
    /// On any error the connection stays unscoped and may retry.
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        session_id: &str,
        token: &str,
    ) -> Result<SessionId, SubscribeError> {
        let session_id = SessionId::try_from(session_id).map_err(|_| SubscribeError::InvalidPayload)?;
        if token.trim().is_empty() {
            return Err(SubscribeError::InvalidPayload);
        }

        let user = self
            .token_verifier
            .verify(token)
            .await
            .ok_or(SubscribeError::Unauthorized)?;

        if !self
            .participant_check
            .is_participant(token, &session_id, &user.user_id)
            .await
        {
            tracing::warn!(
                "User '{}' is not a participant of session '{}'",
                user.user_id,
                session_id
            );
            return Err(SubscribeError::Forbidden);
        }

        match self
            .message_pusher
            .bind_session(connection_id, session_id.clone(), user.user_id.clone())
            .await
        {
            Ok(()) => {
                tracing::info!(
                    "Connection '{}' subscribed to session '{}' as '{}'",
                    connection_id,
                    session_id,
                    user.user_id
                );
                Ok(session_id)
            }
            Err(MessagePushError::AlreadySubscribed(_)) => Err(SubscribeError::AlreadySubscribed),
            Err(e) => {
                // The socket closed while the handshake was in flight.
                tracing::debug!("Subscribe for '{}' dropped: {}", connection_id, e);
                Err(SubscribeError::Unauthorized)
            }
        }
    }

    /// Send a handshake reply frame to this connection only.
    pub async fn reply(&self, connection_id: &ConnectionId, frame: &str) {
        if let Err(e) = self.message_pusher.push_to(connection_id, frame).await {
            tracing::debug!("Failed to reply to '{}': {}", connection_id, e);
        }
    }
}
