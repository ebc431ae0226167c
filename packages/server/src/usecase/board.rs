//! UseCase: ボードと背景同期

use std::sync::Arc;

use tablesync_shared::time::Clock;

use crate::domain::{
    Board, BoardId, BoardRepository, BoardToken, BoardUpsert, ChangeAction, ChangeEvent, Name,
    SessionId, Timestamp, TokenId, UserId,
};

use super::{error::ServiceError, fanout::ChangeNotifier, membership::MembershipResolver};

/// Input for a new board token.
#[derive(Debug, Clone, Default)]
pub struct NewBoardToken {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub image_url: Option<String>,
}

/// ボードのユースケース
pub struct BoardUseCase {
    boards: Arc<dyn BoardRepository>,
    membership: Arc<MembershipResolver>,
    notifier: Arc<ChangeNotifier>,
    clock: Arc<dyn Clock>,
}

impl BoardUseCase {
    pub fn new(
        boards: Arc<dyn BoardRepository>,
        membership: Arc<MembershipResolver>,
        notifier: Arc<ChangeNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            boards,
            membership,
            notifier,
            clock,
        }
    }

    /// Point the session's board at `background_url`, creating the board if
    /// needed.
    ///
    /// Emits `boards/insert` or `boards/update`. Calling again with the
    /// background already in place changes nothing and emits nothing.
    pub async fn sync_board_background(
        &self,
        session_id: &SessionId,
        background_url: Option<String>,
    ) -> Result<Board, ServiceError> {
        let now = Timestamp::new(self.clock.now_millis());
        let outcome = self
            .boards
            .upsert_board_background(session_id, BoardId::generate(), background_url, now)
            .await?;
        let action = match &outcome {
            BoardUpsert::Inserted(_) => ChangeAction::Insert,
            BoardUpsert::Updated(_) => ChangeAction::Update,
            BoardUpsert::Unchanged(board) => return Ok(board.clone()),
        };
        let board = outcome.into_board();
        self.notifier
            .emit(ChangeEvent::board(action, board.clone()))
            .await;
        Ok(board)
    }

    /// `None` when the session has no board yet.
    pub async fn get_board(&self, user_id: &UserId, session_id: &SessionId) -> Result<Option<Board>, ServiceError> {
        self.membership.require_member(session_id, user_id).await?;
        Ok(self.boards.find_board(session_id).await?)
    }

    pub async fn update_board(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
        background_url: Option<String>,
    ) -> Result<Board, ServiceError> {
        self.membership.require_owner(session_id, user_id).await?;
        self.sync_board_background(session_id, background_url).await
    }

    pub async fn place_token(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
        input: NewBoardToken,
    ) -> Result<BoardToken, ServiceError> {
        let name = Name::new(input.name).map_err(|_| ServiceError::Validation("name is required".to_string()))?;
        if !input.x.is_finite() || !input.y.is_finite() {
            return Err(ServiceError::Validation("x, y must be numbers".to_string()));
        }
        self.membership.require_member(session_id, user_id).await?;

        let token = BoardToken {
            id: TokenId::generate(),
            session_id: session_id.clone(),
            name,
            x: input.x,
            y: input.y,
            image_url: input.image_url,
            updated_at: Timestamp::new(self.clock.now_millis()),
        };
        self.boards.insert_token(token.clone()).await?;
        self.notifier
            .emit(ChangeEvent::token(ChangeAction::Insert, token.clone()))
            .await;
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            ConnectionId, MessagePusher, Participant, ParticipantId, Role, SessionRepository,
        },
        infrastructure::{message_pusher::WebSocketMessagePusher, repository::InMemoryRecordStore},
    };
    use tablesync_shared::time::FixedClock;
    use tokio::sync::mpsc;

    struct Fixture {
        usecase: BoardUseCase,
        session_id: SessionId,
        events: mpsc::UnboundedReceiver<String>,
    }

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryRecordStore::new());
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let session_id = SessionId::generate();
        for (member, role) in [("gm", Role::Owner), ("pl", Role::Participant)] {
            store
                .insert_participant(Participant {
                    id: ParticipantId::generate(),
                    session_id: session_id.clone(),
                    user_id: user(member),
                    role,
                    created_at: Timestamp::new(0),
                })
                .await
                .unwrap();
        }
        let (tx, events) = mpsc::unbounded_channel();
        let connection_id = ConnectionId::generate();
        pusher.register_connection(connection_id, tx).await;
        pusher
            .bind_session(&connection_id, session_id.clone(), user("pl"))
            .await
            .unwrap();

        let usecase = BoardUseCase::new(
            store.clone(),
            Arc::new(MembershipResolver::new(store)),
            Arc::new(ChangeNotifier::new(pusher)),
            Arc::new(FixedClock::new(42)),
        );
        Fixture {
            usecase,
            session_id,
            events,
        }
    }

    fn action_of(frame: &str) -> (String, String) {
        let value: serde_json::Value = serde_json::from_str(frame).unwrap();
        (
            value["table"].as_str().unwrap().to_string(),
            value["action"].as_str().unwrap().to_string(),
        )
    }

    #[tokio::test]
    async fn test_sync_creates_then_updates_board() {
        // テスト項目: 初回は insert、背景が変わると update が通知される
        // given (前提条件):
        let mut f = fixture().await;

        // when (操作):
        let created = f
            .usecase
            .sync_board_background(&f.session_id, Some("p1.png".to_string()))
            .await
            .unwrap();
        let updated = f
            .usecase
            .sync_board_background(&f.session_id, Some("p2.png".to_string()))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(created.id, updated.id);
        assert_eq!(updated.background_url.as_deref(), Some("p2.png"));
        assert_eq!(
            action_of(&f.events.recv().await.unwrap()),
            ("boards".to_string(), "insert".to_string())
        );
        assert_eq!(
            action_of(&f.events.recv().await.unwrap()),
            ("boards".to_string(), "update".to_string())
        );
    }

    #[tokio::test]
    async fn test_concurrent_syncs_on_missing_board_both_succeed() {
        // テスト項目: ボードのないセッションで同時に同期しても失敗せず、insert は 1 回だけ
        // given (前提条件):
        let mut f = fixture().await;

        // when (操作):
        let (a, b) = tokio::join!(
            f.usecase
                .sync_board_background(&f.session_id, Some("p1.png".to_string())),
            f.usecase
                .sync_board_background(&f.session_id, Some("p2.png".to_string())),
        );

        // then (期待する結果):
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(a.id, b.id);
        assert_eq!(
            action_of(&f.events.recv().await.unwrap()),
            ("boards".to_string(), "insert".to_string())
        );
        assert_eq!(
            action_of(&f.events.recv().await.unwrap()),
            ("boards".to_string(), "update".to_string())
        );
        assert!(f.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_sync_with_same_background_is_idempotent() {
        // テスト項目: 同じ背景での再同期はイベントを発行しない
        // given (前提条件):
        let mut f = fixture().await;
        f.usecase
            .sync_board_background(&f.session_id, Some("p1.png".to_string()))
            .await
            .unwrap();
        f.events.recv().await.unwrap();

        // when (操作):
        f.usecase
            .sync_board_background(&f.session_id, Some("p1.png".to_string()))
            .await
            .unwrap();

        // then (期待する結果):
        assert!(f.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_update_board_owner_only() {
        // テスト項目: ボード更新はオーナーのみ、取得は参加者なら可能
        let f = fixture().await;

        assert_eq!(
            f.usecase
                .update_board(&user("pl"), &f.session_id, Some("x.png".to_string()))
                .await,
            Err(ServiceError::Forbidden)
        );
        assert_eq!(f.usecase.get_board(&user("pl"), &f.session_id).await, Ok(None));
        assert_eq!(
            f.usecase.get_board(&user("mallory"), &f.session_id).await,
            Err(ServiceError::Forbidden)
        );
    }

    #[tokio::test]
    async fn test_place_token_emits_insert() {
        // テスト項目: コマ配置で tokens/insert が通知される
        let mut f = fixture().await;

        let token = f
            .usecase
            .place_token(
                &user("pl"),
                &f.session_id,
                NewBoardToken {
                    name: "goblin".to_string(),
                    x: 1.5,
                    y: -2.0,
                    image_url: None,
                },
            )
            .await
            .unwrap();

        let frame: serde_json::Value = serde_json::from_str(&f.events.recv().await.unwrap()).unwrap();
        assert_eq!(frame["table"], "tokens");
        assert_eq!(frame["record"]["id"], token.id.as_str());
    }
}
