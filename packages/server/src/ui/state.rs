//! Shared application state.

use std::sync::Arc;

use crate::{
    domain::TokenVerifier,
    usecase::{
        BoardUseCase, ChangeNotifier, ChatTabUseCase, ChatUseCase, ConnectClientUseCase,
        DisconnectClientUseCase, SceneUseCase, SessionUseCase, SubscribeSessionUseCase,
    },
};

/// Shared application state
pub struct AppState {
    /// TokenVerifier（HTTP の Bearer 認証）
    pub token_verifier: Arc<dyn TokenVerifier>,
    pub session_usecase: Arc<SessionUseCase>,
    pub chat_tab_usecase: Arc<ChatTabUseCase>,
    pub chat_usecase: Arc<ChatUseCase>,
    pub scene_usecase: Arc<SceneUseCase>,
    pub board_usecase: Arc<BoardUseCase>,
    /// ConnectClientUseCase（接続受け付けのユースケース）
    pub connect_client_usecase: Arc<ConnectClientUseCase>,
    /// SubscribeSessionUseCase（購読ハンドシェイクのユースケース）
    pub subscribe_session_usecase: Arc<SubscribeSessionUseCase>,
    /// DisconnectClientUseCase（切断のユースケース）
    pub disconnect_client_usecase: Arc<DisconnectClientUseCase>,
    /// Fan-out entry point for mutations performed outside the use cases
    pub notifier: Arc<ChangeNotifier>,
}
