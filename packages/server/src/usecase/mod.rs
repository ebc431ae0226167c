//! UseCase 層
//!
//! HTTP / WebSocket ハンドラから呼ばれる操作を、関心ごとに 1 つの構造体として提供します。
//! 各ユースケースは Domain 層のトレイト（`Arc<dyn Trait>`）にのみ依存します。

pub mod board;
pub mod chat;
pub mod chat_tab;
pub mod connect_client;
pub mod disconnect_client;
pub mod error;
pub mod fanout;
pub mod membership;
pub mod scene;
pub mod session;
pub mod subscribe_session;

pub use board::{BoardUseCase, NewBoardToken};
pub use chat::{ChatUseCase, PostMessage};
pub use chat_tab::{ChatTabPatch, ChatTabUseCase, NewChatTab};
pub use connect_client::ConnectClientUseCase;
pub use disconnect_client::DisconnectClientUseCase;
pub use error::{ServiceError, SubscribeError};
pub use fanout::ChangeNotifier;
pub use membership::MembershipResolver;
pub use scene::{PlaceWithPatterns, SceneProgress, SceneUseCase, SceneView, SceneWithSteps, StepView};
pub use session::{DEFAULT_TAB_NAME, JoinOutcome, SessionDetail, SessionUseCase};
pub use subscribe_session::SubscribeSessionUseCase;
