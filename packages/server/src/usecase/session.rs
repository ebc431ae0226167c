//! UseCase: セッションと参加者
//!
//! ## 何をテストしているか
//! - セッション作成（オーナー登録・デフォルトタブ作成・変更通知）
//! - 公開範囲ごとのセッション詳細の見え方
//! - 参加トークンでの参加、オーナーによる参加者追加

use std::sync::Arc;

use tablesync_shared::time::Clock;

use crate::domain::{
    ChangeAction, ChangeEvent, ChatRepository, ChatTab, JoinToken, Membership, Name, Participant,
    ParticipantId, RepositoryError, Role, Session, SessionId, SessionRepository, SessionSummary,
    SessionVisibility, TabId, Timestamp, UserId,
};

use super::{error::ServiceError, fanout::ChangeNotifier, membership::MembershipResolver};

/// Name of the tab every new session starts with.
pub const DEFAULT_TAB_NAME: &str = "全体";

/// Session metadata as seen by one caller.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionDetail {
    pub session: SessionSummary,
    /// Only populated for owners.
    pub join_token: Option<JoinToken>,
    /// `None` for non-members.
    pub participant_role: Option<Role>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome {
    Joined(Participant),
    AlreadyMember,
}

/// セッションと参加者のユースケース
pub struct SessionUseCase {
    sessions: Arc<dyn SessionRepository>,
    chat: Arc<dyn ChatRepository>,
    membership: Arc<MembershipResolver>,
    notifier: Arc<ChangeNotifier>,
    clock: Arc<dyn Clock>,
}

impl SessionUseCase {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        chat: Arc<dyn ChatRepository>,
        membership: Arc<MembershipResolver>,
        notifier: Arc<ChangeNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sessions,
            chat,
            membership,
            notifier,
            clock,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }

    /// Create a session owned by `user_id`, together with its default tab.
    pub async fn create_session(
        &self,
        user_id: &UserId,
        name: String,
        visibility: Option<&str>,
    ) -> Result<Session, ServiceError> {
        let name = Name::new(name).map_err(|_| ServiceError::Validation("name is required".to_string()))?;
        let created_at = self.now();
        let session = Session::new(
            SessionId::generate(),
            name,
            SessionVisibility::normalize(visibility),
            created_at,
        );
        self.sessions.insert_session(session.clone()).await?;

        self.sessions
            .insert_participant(Participant {
                id: ParticipantId::generate(),
                session_id: session.id().clone(),
                user_id: user_id.clone(),
                role: Role::Owner,
                created_at,
            })
            .await?;

        self.chat
            .insert_tab(ChatTab {
                id: TabId::generate(),
                session_id: session.id().clone(),
                name: Name::new(DEFAULT_TAB_NAME.to_string())?,
                allowed_roles: Vec::new(),
                allowed_users: Vec::new(),
                toast_enabled: true,
                is_default: true,
                created_at,
                updated_at: created_at,
            })
            .await?;

        tracing::info!("Session '{}' created by '{}'", session.id(), user_id);
        self.notifier
            .emit(ChangeEvent::session(ChangeAction::Insert, session.summary()))
            .await;
        Ok(session)
    }

    /// Non-members only see `public` and `link` sessions, always without the
    /// join token.
    pub async fn session_detail(&self, user_id: &UserId, session_id: &SessionId) -> Result<SessionDetail, ServiceError> {
        let membership = self.membership.resolve(session_id, user_id).await?;
        let session = self
            .sessions
            .find_session(session_id)
            .await?
            .ok_or(ServiceError::NotFound("session"))?;

        match membership {
            Membership::NonMember if session.visibility().is_discoverable() => Ok(SessionDetail {
                session: session.summary(),
                join_token: None,
                participant_role: None,
            }),
            Membership::NonMember => Err(ServiceError::Forbidden),
            Membership::Member(participant) => Ok(SessionDetail {
                session: session.summary(),
                join_token: match participant.role {
                    Role::Owner => session.join_token().cloned(),
                    Role::Participant => None,
                },
                participant_role: Some(participant.role),
            }),
        }
    }

    /// Sessions the user belongs to plus every public one, newest first.
    pub async fn list_sessions(&self, user_id: &UserId) -> Result<Vec<SessionSummary>, ServiceError> {
        let mut sessions: Vec<SessionSummary> = Vec::new();
        let member = self.sessions.list_member_sessions(user_id).await?;
        let public = self.sessions.list_public_sessions().await?;
        for session in member.iter().chain(public.iter()) {
            if !sessions.iter().any(|s| &s.id == session.id()) {
                sessions.push(session.summary());
            }
        }
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    /// Join a `link` session with its token, or any `public` session.
    pub async fn join_with_token(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
        token: Option<&str>,
    ) -> Result<JoinOutcome, ServiceError> {
        let session = self
            .sessions
            .find_session(session_id)
            .await?
            .ok_or(ServiceError::NotFound("session"))?;

        if self.membership.resolve(session_id, user_id).await?.is_member() {
            return Ok(JoinOutcome::AlreadyMember);
        }

        let allowed = match session.visibility() {
            SessionVisibility::Public => true,
            SessionVisibility::Link => match (session.join_token(), token) {
                (Some(expected), Some(candidate)) => expected.matches(candidate),
                _ => false,
            },
            SessionVisibility::Private => false,
        };
        if !allowed {
            tracing::warn!("User '{}' was refused joining session '{}'", user_id, session_id);
            return Err(ServiceError::Forbidden);
        }

        self.insert_participant(session_id, user_id.clone(), Role::Participant)
            .await
    }

    /// Owner-only. Adding an existing member is a no-op.
    pub async fn add_participant(
        &self,
        owner_id: &UserId,
        session_id: &SessionId,
        user_id: String,
    ) -> Result<JoinOutcome, ServiceError> {
        let user_id = UserId::new(user_id).map_err(|_| ServiceError::Validation("user_id is required".to_string()))?;
        self.membership.require_owner(session_id, owner_id).await?;
        self.insert_participant(session_id, user_id, Role::Participant)
            .await
    }

    pub async fn list_participants(&self, user_id: &UserId, session_id: &SessionId) -> Result<Vec<Participant>, ServiceError> {
        self.membership.require_member(session_id, user_id).await?;
        Ok(self.sessions.list_participants(session_id).await?)
    }

    async fn insert_participant(
        &self,
        session_id: &SessionId,
        user_id: UserId,
        role: Role,
    ) -> Result<JoinOutcome, ServiceError> {
        let participant = Participant {
            id: ParticipantId::generate(),
            session_id: session_id.clone(),
            user_id,
            role,
            created_at: self.now(),
        };
        match self.sessions.insert_participant(participant.clone()).await {
            Ok(()) => {
                tracing::info!(
                    "User '{}' joined session '{}' as {}",
                    participant.user_id,
                    session_id,
                    role.as_str()
                );
                self.notifier
                    .emit(ChangeEvent::participant(ChangeAction::Insert, participant.clone()))
                    .await;
                Ok(JoinOutcome::Joined(participant))
            }
            Err(RepositoryError::Conflict(_)) => Ok(JoinOutcome::AlreadyMember),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        infrastructure::{message_pusher::WebSocketMessagePusher, repository::InMemoryRecordStore},
        domain::{ConnectionId, MessagePusher},
    };
    use tablesync_shared::time::ManualClock;
    use tokio::sync::mpsc;

    struct Fixture {
        usecase: SessionUseCase,
        store: Arc<InMemoryRecordStore>,
        pusher: Arc<WebSocketMessagePusher>,
        clock: Arc<ManualClock>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryRecordStore::new());
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let clock = Arc::new(ManualClock::new(1_000));
        let usecase = SessionUseCase::new(
            store.clone(),
            store.clone(),
            Arc::new(MembershipResolver::new(store.clone())),
            Arc::new(ChangeNotifier::new(pusher.clone())),
            clock.clone(),
        );
        Fixture {
            usecase,
            store,
            pusher,
            clock,
        }
    }

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_create_session_registers_owner_and_default_tab() {
        // テスト項目: 作成者がオーナーになり、デフォルトタブが作られる
        // given (前提条件):
        let f = fixture();

        // when (操作):
        let session = f
            .usecase
            .create_session(&user("alice"), "Friday table".to_string(), Some("link"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(session.visibility(), SessionVisibility::Link);
        assert!(session.join_token().is_some());
        let owner = f.store.find_participant(session.id(), &user("alice")).await.unwrap().unwrap();
        assert_eq!(owner.role, Role::Owner);
        let tab = f.store.find_default_tab(session.id()).await.unwrap().unwrap();
        assert!(tab.is_default);
        assert_eq!(tab.name.as_str(), DEFAULT_TAB_NAME);
    }

    #[tokio::test]
    async fn test_create_session_normalizes_unknown_visibility() {
        // テスト項目: 不明な公開範囲は private になり、参加トークンはない
        let f = fixture();
        let session = f
            .usecase
            .create_session(&user("alice"), "table".to_string(), Some("everyone"))
            .await
            .unwrap();
        assert_eq!(session.visibility(), SessionVisibility::Private);
        assert!(session.join_token().is_none());
    }

    #[tokio::test]
    async fn test_create_session_requires_name() {
        // テスト項目: 名前が空ならバリデーションエラー
        let f = fixture();
        let result = f.usecase.create_session(&user("alice"), "  ".to_string(), None).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_private_session_detail_forbidden_for_non_member() {
        // テスト項目: private セッションの詳細は非参加者には Forbidden
        // given (前提条件):
        let f = fixture();
        let session = f
            .usecase
            .create_session(&user("alice"), "table".to_string(), Some("private"))
            .await
            .unwrap();

        // when (操作):
        let result = f.usecase.session_detail(&user("mallory"), session.id()).await;

        // then (期待する結果):
        assert_eq!(result, Err(ServiceError::Forbidden));
    }

    #[tokio::test]
    async fn test_discoverable_session_detail_strips_join_token() {
        // テスト項目: public / link セッションは非参加者にも見えるが参加トークンは除かれる
        let f = fixture();
        for visibility in ["public", "link"] {
            // given (前提条件):
            let session = f
                .usecase
                .create_session(&user("alice"), "table".to_string(), Some(visibility))
                .await
                .unwrap();

            // when (操作):
            let detail = f.usecase.session_detail(&user("bob"), session.id()).await.unwrap();

            // then (期待する結果):
            assert_eq!(detail.session, session.summary());
            assert_eq!(detail.join_token, None);
            assert_eq!(detail.participant_role, None);
        }
    }

    #[tokio::test]
    async fn test_only_owner_sees_join_token() {
        // テスト項目: 参加トークンはオーナーにのみ返される
        // given (前提条件):
        let f = fixture();
        let session = f
            .usecase
            .create_session(&user("alice"), "table".to_string(), Some("link"))
            .await
            .unwrap();
        let token = session.join_token().unwrap().as_str().to_string();
        f.usecase
            .join_with_token(&user("bob"), session.id(), Some(&token))
            .await
            .unwrap();

        // when (操作):
        let owner_view = f.usecase.session_detail(&user("alice"), session.id()).await.unwrap();
        let member_view = f.usecase.session_detail(&user("bob"), session.id()).await.unwrap();

        // then (期待する結果):
        assert_eq!(owner_view.join_token.as_ref(), session.join_token());
        assert_eq!(owner_view.participant_role, Some(Role::Owner));
        assert_eq!(member_view.join_token, None);
        assert_eq!(member_view.participant_role, Some(Role::Participant));
    }

    #[tokio::test]
    async fn test_session_detail_unknown_session() {
        // テスト項目: 存在しないセッションは NotFound
        let f = fixture();
        let result = f
            .usecase
            .session_detail(&user("alice"), &SessionId::generate())
            .await;
        assert_eq!(result, Err(ServiceError::NotFound("session")));
    }

    #[tokio::test]
    async fn test_join_with_token_rules() {
        // テスト項目: link は正しいトークンのみ、private は常に拒否
        // given (前提条件):
        let f = fixture();
        let link = f
            .usecase
            .create_session(&user("alice"), "link".to_string(), Some("link"))
            .await
            .unwrap();
        let private = f
            .usecase
            .create_session(&user("alice"), "private".to_string(), None)
            .await
            .unwrap();

        // when (操作) / then (期待する結果):
        assert_eq!(
            f.usecase.join_with_token(&user("bob"), link.id(), Some("wrong")).await,
            Err(ServiceError::Forbidden)
        );
        assert_eq!(
            f.usecase.join_with_token(&user("bob"), link.id(), None).await,
            Err(ServiceError::Forbidden)
        );
        assert_eq!(
            f.usecase.join_with_token(&user("bob"), private.id(), None).await,
            Err(ServiceError::Forbidden)
        );
        let token = link.join_token().unwrap().as_str().to_string();
        assert!(matches!(
            f.usecase.join_with_token(&user("bob"), link.id(), Some(&token)).await,
            Ok(JoinOutcome::Joined(_))
        ));
        assert_eq!(
            f.usecase.join_with_token(&user("bob"), link.id(), Some(&token)).await,
            Ok(JoinOutcome::AlreadyMember)
        );
    }

    #[tokio::test]
    async fn test_add_participant_is_owner_only_and_idempotent() {
        // テスト項目: 参加者追加はオーナーのみ、重複は no-op
        // given (前提条件):
        let f = fixture();
        let session = f
            .usecase
            .create_session(&user("alice"), "table".to_string(), None)
            .await
            .unwrap();

        // when (操作):
        let first = f
            .usecase
            .add_participant(&user("alice"), session.id(), "bob".to_string())
            .await;
        let again = f
            .usecase
            .add_participant(&user("alice"), session.id(), "bob".to_string())
            .await;
        let by_member = f
            .usecase
            .add_participant(&user("bob"), session.id(), "carol".to_string())
            .await;

        // then (期待する結果):
        assert!(matches!(first, Ok(JoinOutcome::Joined(_))));
        assert_eq!(again, Ok(JoinOutcome::AlreadyMember));
        assert_eq!(by_member, Err(ServiceError::Forbidden));
        let participants = f
            .usecase
            .list_participants(&user("bob"), session.id())
            .await
            .unwrap();
        let ids: Vec<&str> = participants.iter().map(|p| p.user_id.as_str()).collect();
        assert_eq!(ids, vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn test_list_sessions_merges_member_and_public_newest_first() {
        // テスト項目: 参加セッションと公開セッションを重複なく新しい順で返す
        // given (前提条件):
        let f = fixture();
        let own_public = f
            .usecase
            .create_session(&user("alice"), "mine".to_string(), Some("public"))
            .await
            .unwrap();
        f.clock.advance(10);
        let foreign_public = f
            .usecase
            .create_session(&user("bob"), "theirs".to_string(), Some("public"))
            .await
            .unwrap();
        f.clock.advance(10);
        f.usecase
            .create_session(&user("bob"), "hidden".to_string(), Some("private"))
            .await
            .unwrap();

        // when (操作):
        let sessions = f.usecase.list_sessions(&user("alice")).await.unwrap();

        // then (期待する結果):
        let ids: Vec<&SessionId> = sessions.iter().map(|s| &s.id).collect();
        assert_eq!(ids, vec![foreign_public.id(), own_public.id()]);
    }

    #[tokio::test]
    async fn test_join_emits_participant_insert_to_session_subscribers() {
        // テスト項目: 参加時に session_participants/insert が購読者へ配信される
        // given (前提条件):
        let f = fixture();
        let session = f
            .usecase
            .create_session(&user("alice"), "table".to_string(), Some("public"))
            .await
            .unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let connection_id = ConnectionId::generate();
        f.pusher.register_connection(connection_id, tx).await;
        f.pusher
            .bind_session(&connection_id, session.id().clone(), user("alice"))
            .await
            .unwrap();

        // when (操作):
        f.usecase
            .join_with_token(&user("bob"), session.id(), None)
            .await
            .unwrap();

        // then (期待する結果):
        let frame: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(frame["table"], "session_participants");
        assert_eq!(frame["action"], "insert");
        assert_eq!(frame["record"]["user_id"], "bob");
        assert_eq!(frame["record"]["role"], "participant");
    }
}
