//! UseCase: チャットタブ
//!
//! Tab listing is filtered through `can_view_tab`; every request that targets
//! a tab goes through `resolve_tab`, either by explicit id or by falling back
//! to the session's default tab.

use std::sync::Arc;

use tablesync_shared::time::Clock;

use crate::domain::{
    ChangeAction, ChangeEvent, ChatRepository, ChatTab, Name, Participant, SessionId, TabId,
    TabSelector, Timestamp, UserId, can_view_tab,
    policy::{normalize_roles, normalize_user_ids},
};

use super::{error::ServiceError, fanout::ChangeNotifier, membership::MembershipResolver};

/// Input for a new tab. Allow-list entries are raw strings from the request.
#[derive(Debug, Clone, Default)]
pub struct NewChatTab {
    pub name: String,
    pub allowed_roles: Vec<String>,
    pub allowed_users: Vec<String>,
    pub toast_enabled: Option<bool>,
}

/// Partial update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ChatTabPatch {
    pub name: Option<String>,
    pub allowed_roles: Option<Vec<String>>,
    pub allowed_users: Option<Vec<String>>,
    pub toast_enabled: Option<bool>,
}

/// Resolve the tab a chat request targets and check the caller may see it.
///
/// An explicit id from another session is reported as not found; a hidden
/// tab (explicit or default) as forbidden.
pub async fn resolve_tab(
    chat: &dyn ChatRepository,
    session_id: &SessionId,
    selector: &TabSelector,
    participant: &Participant,
) -> Result<ChatTab, ServiceError> {
    let tab = match selector {
        TabSelector::Explicit(tab_id) => chat
            .find_tab(tab_id)
            .await?
            .filter(|tab| &tab.session_id == session_id),
        TabSelector::Default => chat.find_default_tab(session_id).await?,
    }
    .ok_or(ServiceError::NotFound("chat tab"))?;

    if !can_view_tab(&tab, Some(participant.role), &participant.user_id) {
        return Err(ServiceError::Forbidden);
    }
    Ok(tab)
}

/// チャットタブのユースケース
pub struct ChatTabUseCase {
    chat: Arc<dyn ChatRepository>,
    membership: Arc<MembershipResolver>,
    notifier: Arc<ChangeNotifier>,
    clock: Arc<dyn Clock>,
}

impl ChatTabUseCase {
    pub fn new(
        chat: Arc<dyn ChatRepository>,
        membership: Arc<MembershipResolver>,
        notifier: Arc<ChangeNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            chat,
            membership,
            notifier,
            clock,
        }
    }

    /// Tabs the caller can view, default first then by creation.
    pub async fn list_tabs(&self, user_id: &UserId, session_id: &SessionId) -> Result<Vec<ChatTab>, ServiceError> {
        let participant = self.membership.require_member(session_id, user_id).await?;
        let tabs = self.chat.list_tabs(session_id).await?;
        Ok(tabs
            .into_iter()
            .filter(|tab| can_view_tab(tab, Some(participant.role), user_id))
            .collect())
    }

    pub async fn resolve_tab(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
        selector: &TabSelector,
    ) -> Result<ChatTab, ServiceError> {
        let participant = self.membership.require_member(session_id, user_id).await?;
        resolve_tab(self.chat.as_ref(), session_id, selector, &participant).await
    }

    pub async fn create_tab(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
        input: NewChatTab,
    ) -> Result<ChatTab, ServiceError> {
        let name = Name::new(input.name).map_err(|_| ServiceError::Validation("name is required".to_string()))?;
        self.membership.require_owner(session_id, user_id).await?;

        let now = Timestamp::new(self.clock.now_millis());
        let tab = ChatTab {
            id: TabId::generate(),
            session_id: session_id.clone(),
            name,
            allowed_roles: normalize_roles(&input.allowed_roles),
            allowed_users: normalize_user_ids(&input.allowed_users),
            toast_enabled: input.toast_enabled.unwrap_or(true),
            is_default: false,
            created_at: now,
            updated_at: now,
        };
        self.chat.insert_tab(tab.clone()).await?;
        self.emit_tab(ChangeAction::Insert, tab.clone()).await;
        Ok(tab)
    }

    pub async fn update_tab(&self, user_id: &UserId, tab_id: &TabId, patch: ChatTabPatch) -> Result<ChatTab, ServiceError> {
        let mut tab = self
            .chat
            .find_tab(tab_id)
            .await?
            .ok_or(ServiceError::NotFound("chat tab"))?;
        self.membership.require_owner(&tab.session_id, user_id).await?;

        if let Some(name) = patch.name {
            tab.name = Name::new(name).map_err(|_| ServiceError::Validation("name must not be empty".to_string()))?;
        }
        if let Some(roles) = patch.allowed_roles {
            tab.allowed_roles = normalize_roles(&roles);
        }
        if let Some(users) = patch.allowed_users {
            tab.allowed_users = normalize_user_ids(&users);
        }
        if let Some(toast_enabled) = patch.toast_enabled {
            tab.toast_enabled = toast_enabled;
        }
        tab.updated_at = Timestamp::new(self.clock.now_millis());

        self.chat.update_tab(tab.clone()).await?;
        self.emit_tab(ChangeAction::Update, tab.clone()).await;
        Ok(tab)
    }

    /// The default tab cannot be deleted.
    pub async fn delete_tab(&self, user_id: &UserId, tab_id: &TabId) -> Result<(), ServiceError> {
        let tab = self
            .chat
            .find_tab(tab_id)
            .await?
            .ok_or(ServiceError::NotFound("chat tab"))?;
        self.membership.require_owner(&tab.session_id, user_id).await?;
        if tab.is_default {
            return Err(ServiceError::InvalidState("default tab cannot be deleted".to_string()));
        }

        if self.chat.delete_tab(tab_id).await? {
            self.emit_tab(ChangeAction::Delete, tab).await;
        }
        Ok(())
    }

    /// Tab events only reach participants who can view the tab as stored.
    async fn emit_tab(&self, action: ChangeAction, tab: ChatTab) {
        match self.membership.tab_viewers(&tab).await {
            Ok(viewers) => {
                self.notifier
                    .emit(ChangeEvent::chat_tab(action, tab).restricted_to(viewers))
                    .await;
            }
            Err(e) => {
                tracing::warn!("Skipped {:?} event for tab '{}': {}", action, tab.id, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ConnectionId, MessagePusher, ParticipantId, Role, SessionRepository},
        infrastructure::{message_pusher::WebSocketMessagePusher, repository::InMemoryRecordStore},
    };
    use tablesync_shared::time::ManualClock;
    use tokio::sync::mpsc;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - タブの可視性（ロール / ユーザー許可リスト）
    // - デフォルトタブへのフォールバックと 403 / 404 の区別
    // - デフォルトタブの削除禁止
    // - 制限付きタブの変更イベントは閲覧できる参加者にだけ届くこと
    // ========================================

    struct Fixture {
        usecase: ChatTabUseCase,
        store: Arc<InMemoryRecordStore>,
        pusher: Arc<WebSocketMessagePusher>,
        clock: Arc<ManualClock>,
        session_id: SessionId,
    }

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryRecordStore::new());
        let clock = Arc::new(ManualClock::new(0));
        let session_id = SessionId::generate();
        for (user_id, role) in [("gm", Role::Owner), ("pl", Role::Participant)] {
            store
                .insert_participant(Participant {
                    id: ParticipantId::generate(),
                    session_id: session_id.clone(),
                    user_id: user(user_id),
                    role,
                    created_at: Timestamp::new(0),
                })
                .await
                .unwrap();
        }
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let usecase = ChatTabUseCase::new(
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
            session_id,
        }
    }

    async fn subscribe(f: &Fixture, user_id: &str) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection_id = ConnectionId::generate();
        f.pusher.register_connection(connection_id, tx).await;
        f.pusher
            .bind_session(&connection_id, f.session_id.clone(), user(user_id))
            .await
            .unwrap();
        rx
    }

    fn new_tab(name: &str, roles: &[&str], users: &[&str]) -> NewChatTab {
        NewChatTab {
            name: name.to_string(),
            allowed_roles: roles.iter().map(|r| r.to_string()).collect(),
            allowed_users: users.iter().map(|u| u.to_string()).collect(),
            toast_enabled: None,
        }
    }

    #[tokio::test]
    async fn test_create_tab_normalizes_allow_lists() {
        // テスト項目: 許可リストは trim され、空要素と未知ロールは除かれる
        // given (前提条件):
        let f = fixture().await;

        // when (操作):
        let tab = f
            .usecase
            .create_tab(
                &user("gm"),
                &f.session_id,
                new_tab("secret", &["owner", "wizard"], &[" pl ", "", "pl"]),
            )
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(tab.allowed_roles, vec![Role::Owner]);
        assert_eq!(tab.allowed_users, vec![user("pl")]);
        assert!(!tab.is_default);
        assert!(tab.toast_enabled);
    }

    #[tokio::test]
    async fn test_restricted_tab_events_reach_only_viewers() {
        // テスト項目: オーナー限定タブの作成イベントはオーナーにだけ届き、無制限タブは全員に届く
        // given (前提条件):
        let f = fixture().await;
        let mut gm = subscribe(&f, "gm").await;
        let mut pl = subscribe(&f, "pl").await;

        // when (操作):
        f.usecase
            .create_tab(&user("gm"), &f.session_id, new_tab("gm secret", &["owner"], &[]))
            .await
            .unwrap();
        f.usecase
            .create_tab(&user("gm"), &f.session_id, new_tab("open", &[], &[]))
            .await
            .unwrap();

        // then (期待する結果):
        let name_of = |frame: String| {
            let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
            value["record"]["name"].as_str().unwrap().to_string()
        };
        assert_eq!(name_of(gm.try_recv().unwrap()), "gm secret");
        assert_eq!(name_of(gm.try_recv().unwrap()), "open");
        assert_eq!(name_of(pl.try_recv().unwrap()), "open");
        assert!(pl.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_create_tab_owner_only() {
        // テスト項目: 参加者はタブを作成できない
        let f = fixture().await;
        let result = f
            .usecase
            .create_tab(&user("pl"), &f.session_id, new_tab("side", &[], &[]))
            .await;
        assert_eq!(result, Err(ServiceError::Forbidden));
    }

    #[tokio::test]
    async fn test_list_tabs_hides_restricted_tabs() {
        // テスト項目: 見えないタブは一覧に含まれない
        // given (前提条件):
        let f = fixture().await;
        let open = f
            .usecase
            .create_tab(&user("gm"), &f.session_id, new_tab("open", &[], &[]))
            .await
            .unwrap();
        f.clock.advance(1);
        let gm_only = f
            .usecase
            .create_tab(&user("gm"), &f.session_id, new_tab("gm only", &["owner"], &[]))
            .await
            .unwrap();

        // when (操作):
        let for_player = f.usecase.list_tabs(&user("pl"), &f.session_id).await.unwrap();
        let for_owner = f.usecase.list_tabs(&user("gm"), &f.session_id).await.unwrap();

        // then (期待する結果):
        assert_eq!(for_player, vec![open.clone()]);
        assert_eq!(for_owner, vec![open, gm_only]);
    }

    #[tokio::test]
    async fn test_resolve_tab_distinguishes_forbidden_and_not_found() {
        // テスト項目: 見えないタブは 403、他セッションや存在しないタブは 404
        // given (前提条件):
        let f = fixture().await;
        let gm_only = f
            .usecase
            .create_tab(&user("gm"), &f.session_id, new_tab("gm only", &["owner"], &[]))
            .await
            .unwrap();
        let foreign = ChatTab {
            id: TabId::generate(),
            session_id: SessionId::generate(),
            ..gm_only.clone()
        };
        f.store.insert_tab(foreign.clone()).await.unwrap();

        // when (操作) / then (期待する結果):
        assert_eq!(
            f.usecase
                .resolve_tab(&user("pl"), &f.session_id, &TabSelector::Explicit(gm_only.id.clone()))
                .await,
            Err(ServiceError::Forbidden)
        );
        assert_eq!(
            f.usecase
                .resolve_tab(&user("gm"), &f.session_id, &TabSelector::Explicit(foreign.id))
                .await,
            Err(ServiceError::NotFound("chat tab"))
        );
        assert_eq!(
            f.usecase
                .resolve_tab(&user("gm"), &f.session_id, &TabSelector::Explicit(TabId::generate()))
                .await,
            Err(ServiceError::NotFound("chat tab"))
        );
    }

    #[tokio::test]
    async fn test_hidden_default_tab_is_forbidden_not_missing() {
        // テスト項目: 見えないデフォルトタブは 404 ではなく 403
        // given (前提条件):
        let f = fixture().await;
        f.store
            .insert_tab(ChatTab {
                id: TabId::generate(),
                session_id: f.session_id.clone(),
                name: Name::new("main".to_string()).unwrap(),
                allowed_roles: vec![Role::Owner],
                allowed_users: vec![],
                toast_enabled: true,
                is_default: true,
                created_at: Timestamp::new(0),
                updated_at: Timestamp::new(0),
            })
            .await
            .unwrap();

        // when (操作):
        let result = f
            .usecase
            .resolve_tab(&user("pl"), &f.session_id, &TabSelector::Default)
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(ServiceError::Forbidden));
    }

    #[tokio::test]
    async fn test_resolve_default_tab_without_any_tab() {
        // テスト項目: タブが 1 つもなければ NotFound
        let f = fixture().await;
        let result = f
            .usecase
            .resolve_tab(&user("gm"), &f.session_id, &TabSelector::Default)
            .await;
        assert_eq!(result, Err(ServiceError::NotFound("chat tab")));
    }

    #[tokio::test]
    async fn test_update_tab_applies_patch() {
        // テスト項目: 指定したフィールドのみ更新される
        // given (前提条件):
        let f = fixture().await;
        let tab = f
            .usecase
            .create_tab(&user("gm"), &f.session_id, new_tab("side", &["owner"], &[]))
            .await
            .unwrap();
        f.clock.advance(5);

        // when (操作):
        let updated = f
            .usecase
            .update_tab(
                &user("gm"),
                &tab.id,
                ChatTabPatch {
                    allowed_roles: Some(vec![]),
                    toast_enabled: Some(false),
                    ..ChatTabPatch::default()
                },
            )
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(updated.name, tab.name);
        assert!(updated.is_unrestricted());
        assert!(!updated.toast_enabled);
        assert_eq!(updated.updated_at, Timestamp::new(5));
        assert_eq!(f.store.find_tab(&tab.id).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_delete_default_tab_is_invalid_state() {
        // テスト項目: デフォルトタブは削除できない
        // given (前提条件):
        let f = fixture().await;
        let default_tab = ChatTab {
            id: TabId::generate(),
            session_id: f.session_id.clone(),
            name: Name::new("main".to_string()).unwrap(),
            allowed_roles: vec![],
            allowed_users: vec![],
            toast_enabled: true,
            is_default: true,
            created_at: Timestamp::new(0),
            updated_at: Timestamp::new(0),
        };
        f.store.insert_tab(default_tab.clone()).await.unwrap();
        let side = f
            .usecase
            .create_tab(&user("gm"), &f.session_id, new_tab("side", &[], &[]))
            .await
            .unwrap();

        // when (操作):
        let default_result = f.usecase.delete_tab(&user("gm"), &default_tab.id).await;
        let side_result = f.usecase.delete_tab(&user("gm"), &side.id).await;

        // then (期待する結果):
        assert!(matches!(default_result, Err(ServiceError::InvalidState(_))));
        assert_eq!(side_result, Ok(()));
        assert_eq!(f.store.find_tab(&side.id).await.unwrap(), None);
        assert!(f.store.find_tab(&default_tab.id).await.unwrap().is_some());
    }
}
