//! Composition root: wires the record store, the realtime registry and the
//! use cases into an `AppState`.
//!
//! Initialization order:
//! 1. Repository (in-memory record store)
//! 2. MessagePusher (WebSocket connection registry)
//! 3. Collaborators (token verifier, participant check, clock)
//! 4. UseCases
//! 5. AppState

use std::sync::Arc;

use tablesync_shared::time::{Clock, SystemClock};

use crate::{
    domain::{DEFAULT_MASK_RANGE, MaskRange},
    infrastructure::{
        auth::{JwtTokenVerifier, StoreParticipantCheck},
        message_pusher::WebSocketMessagePusher,
        repository::InMemoryRecordStore,
    },
    ui::AppState,
    usecase::{
        BoardUseCase, ChangeNotifier, ChatTabUseCase, ChatUseCase, ConnectClientUseCase,
        DisconnectClientUseCase, MembershipResolver, SceneUseCase, SessionUseCase,
        SubscribeSessionUseCase,
    },
};

/// Runtime configuration of the server.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HS256 secret shared with the token issuer
    pub jwt_secret: String,
    /// Length range of redaction masks
    pub mask_range: MaskRange,
}

impl AppConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            mask_range: DEFAULT_MASK_RANGE,
        }
    }
}

/// Build the application state on the system clock.
pub fn build_state(config: &AppConfig) -> AppState {
    build_state_with_clock(config, Arc::new(SystemClock))
}

pub fn build_state_with_clock(config: &AppConfig, clock: Arc<dyn Clock>) -> AppState {
    // 1. Repository
    let store = Arc::new(InMemoryRecordStore::new());

    // 2. MessagePusher
    let message_pusher = Arc::new(WebSocketMessagePusher::new());

    // 3. Collaborators
    let token_verifier = Arc::new(JwtTokenVerifier::new(&config.jwt_secret));
    let participant_check = Arc::new(StoreParticipantCheck::new(store.clone()));

    // 4. UseCases
    let membership = Arc::new(MembershipResolver::new(store.clone()));
    let notifier = Arc::new(ChangeNotifier::new(message_pusher.clone()));
    let board_usecase = Arc::new(BoardUseCase::new(
        store.clone(),
        membership.clone(),
        notifier.clone(),
        clock.clone(),
    ));
    let session_usecase = Arc::new(SessionUseCase::new(
        store.clone(),
        store.clone(),
        membership.clone(),
        notifier.clone(),
        clock.clone(),
    ));
    let chat_tab_usecase = Arc::new(ChatTabUseCase::new(
        store.clone(),
        membership.clone(),
        notifier.clone(),
        clock.clone(),
    ));
    let chat_usecase = Arc::new(ChatUseCase::new(
        store.clone(),
        store.clone(),
        membership.clone(),
        notifier.clone(),
        clock.clone(),
        config.mask_range,
    ));
    let scene_usecase = Arc::new(SceneUseCase::new(
        store.clone(),
        membership,
        board_usecase.clone(),
        notifier.clone(),
        clock,
    ));
    let connect_client_usecase = Arc::new(ConnectClientUseCase::new(message_pusher.clone()));
    let subscribe_session_usecase = Arc::new(SubscribeSessionUseCase::new(
        token_verifier.clone(),
        participant_check,
        message_pusher.clone(),
    ));
    let disconnect_client_usecase = Arc::new(DisconnectClientUseCase::new(message_pusher));

    // 5. AppState
    AppState {
        token_verifier,
        session_usecase,
        chat_tab_usecase,
        chat_usecase,
        scene_usecase,
        board_usecase,
        connect_client_usecase,
        subscribe_session_usecase,
        disconnect_client_usecase,
        notifier,
    }
}
