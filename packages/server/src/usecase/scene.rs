//! UseCase: 場所・シーンとシーン進行
//!
//! シーン進行は `{アクティブなシーンなし}` → `{シーン S, インデックス i}` の
//! 状態機械です。Activate / Advance はオーナーのみ実行でき、どちらも
//! ボード背景を現在のステップのパターンに同期します。

use std::sync::Arc;

use tablesync_shared::time::Clock;

use crate::domain::{
    ChangeAction, ChangeEvent, Name, Pattern, PatternId, Place, PlaceId, Scene, SceneId,
    SceneRepository, SceneState, SceneStep, SessionId, StepId, Timestamp, UserId,
    scene::{clamp_step_index, next_step_index, next_step_position},
};

use super::{board::BoardUseCase, error::ServiceError, fanout::ChangeNotifier, membership::MembershipResolver};

/// A scene step with its pattern's background.
#[derive(Debug, Clone, PartialEq)]
pub struct StepView {
    pub step: SceneStep,
    pub background_url: Option<String>,
}

/// Result of Activate / Advance.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneProgress {
    pub state: SceneState,
    pub step: StepView,
}

/// Result of Read. Both parts are `None` when no scene is active; `step` is
/// `None` when the active scene has no steps.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneView {
    pub state: Option<SceneState>,
    pub step: Option<StepView>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaceWithPatterns {
    pub place: Place,
    pub patterns: Vec<Pattern>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneWithSteps {
    pub scene: Scene,
    pub steps: Vec<SceneStep>,
}

fn required_name(value: String) -> Result<Name, ServiceError> {
    Name::new(value).map_err(|_| ServiceError::Validation("name is required".to_string()))
}

/// シーンのユースケース
pub struct SceneUseCase {
    scenes: Arc<dyn SceneRepository>,
    membership: Arc<MembershipResolver>,
    board: Arc<BoardUseCase>,
    notifier: Arc<ChangeNotifier>,
    clock: Arc<dyn Clock>,
}

impl SceneUseCase {
    pub fn new(
        scenes: Arc<dyn SceneRepository>,
        membership: Arc<MembershipResolver>,
        board: Arc<BoardUseCase>,
        notifier: Arc<ChangeNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            scenes,
            membership,
            board,
            notifier,
            clock,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }

    async fn background_of(&self, step: &SceneStep) -> Result<Option<String>, ServiceError> {
        Ok(self
            .scenes
            .find_pattern(&step.pattern_id)
            .await?
            .and_then(|pattern| pattern.background_url))
    }

    async fn view_of(&self, step: SceneStep) -> Result<StepView, ServiceError> {
        let background_url = self.background_of(&step).await?;
        Ok(StepView { step, background_url })
    }

    // ========================================
    // Places / patterns / scenes
    // ========================================

    pub async fn create_place(&self, user_id: &UserId, session_id: &SessionId, name: String) -> Result<Place, ServiceError> {
        let name = required_name(name)?;
        self.membership.require_owner(session_id, user_id).await?;
        let place = Place {
            id: PlaceId::generate(),
            session_id: session_id.clone(),
            name,
            created_at: self.now(),
        };
        self.scenes.insert_place(place.clone()).await?;
        Ok(place)
    }

    pub async fn create_pattern(
        &self,
        user_id: &UserId,
        place_id: &PlaceId,
        name: String,
        background_url: Option<String>,
    ) -> Result<Pattern, ServiceError> {
        let name = required_name(name)?;
        let place = self
            .scenes
            .find_place(place_id)
            .await?
            .ok_or(ServiceError::NotFound("place"))?;
        self.membership.require_owner(&place.session_id, user_id).await?;
        let pattern = Pattern {
            id: PatternId::generate(),
            place_id: place.id,
            name,
            background_url,
            created_at: self.now(),
        };
        self.scenes.insert_pattern(pattern.clone()).await?;
        Ok(pattern)
    }

    pub async fn list_places(&self, user_id: &UserId, session_id: &SessionId) -> Result<Vec<PlaceWithPatterns>, ServiceError> {
        self.membership.require_member(session_id, user_id).await?;
        let mut result = Vec::new();
        for place in self.scenes.list_places(session_id).await? {
            let patterns = self.scenes.list_patterns(&place.id).await?;
            result.push(PlaceWithPatterns { place, patterns });
        }
        Ok(result)
    }

    pub async fn create_scene(&self, user_id: &UserId, session_id: &SessionId, name: String) -> Result<Scene, ServiceError> {
        let name = required_name(name)?;
        self.membership.require_owner(session_id, user_id).await?;
        let scene = Scene {
            id: SceneId::generate(),
            session_id: session_id.clone(),
            name,
            created_at: self.now(),
        };
        self.scenes.insert_scene(scene.clone()).await?;
        Ok(scene)
    }

    /// Append a (place, pattern) step at the end of the scene.
    ///
    /// The place must belong to the scene's session and the pattern to the
    /// place.
    pub async fn append_step(
        &self,
        user_id: &UserId,
        scene_id: &SceneId,
        place_id: &str,
        pattern_id: &str,
    ) -> Result<SceneStep, ServiceError> {
        let (Ok(place_id), Ok(pattern_id)) = (PlaceId::try_from(place_id), PatternId::try_from(pattern_id)) else {
            return Err(ServiceError::Validation("place_id and pattern_id are required".to_string()));
        };
        let scene = self
            .scenes
            .find_scene(scene_id)
            .await?
            .ok_or(ServiceError::NotFound("scene"))?;
        self.membership.require_owner(&scene.session_id, user_id).await?;

        match self.scenes.find_place(&place_id).await? {
            Some(place) if place.session_id == scene.session_id => {}
            _ => return Err(ServiceError::Validation("invalid place".to_string())),
        }
        match self.scenes.find_pattern(&pattern_id).await? {
            Some(pattern) if pattern.place_id == place_id => {}
            _ => return Err(ServiceError::Validation("invalid pattern".to_string())),
        }

        let position = next_step_position(self.scenes.last_step_position(&scene.id).await?);
        let step = SceneStep {
            id: StepId::generate(),
            scene_id: scene.id,
            place_id,
            pattern_id,
            position,
            created_at: self.now(),
        };
        self.scenes.insert_step(step.clone()).await?;
        Ok(step)
    }

    /// Scenes of the session with their steps in order.
    pub async fn list_scenes(&self, user_id: &UserId, session_id: &SessionId) -> Result<Vec<SceneWithSteps>, ServiceError> {
        self.membership.require_member(session_id, user_id).await?;
        let mut result = Vec::new();
        for scene in self.scenes.list_scenes(session_id).await? {
            let steps = self.scenes.list_steps(&scene.id).await?;
            result.push(SceneWithSteps { scene, steps });
        }
        Ok(result)
    }

    // ========================================
    // Scene progression
    // ========================================

    /// Start `scene_id` at its first step.
    pub async fn activate(&self, user_id: &UserId, session_id: &SessionId, scene_id: &SceneId) -> Result<SceneProgress, ServiceError> {
        self.membership.require_owner(session_id, user_id).await?;
        let scene = self
            .scenes
            .find_scene(scene_id)
            .await?
            .filter(|scene| &scene.session_id == session_id)
            .ok_or(ServiceError::NotFound("scene"))?;

        let first = self
            .scenes
            .list_steps(&scene.id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::InvalidState("scene has no steps".to_string()))?;
        let step = self.view_of(first).await?;

        let action = match self.scenes.find_scene_state(session_id).await? {
            Some(_) => ChangeAction::Update,
            None => ChangeAction::Insert,
        };
        let state = SceneState {
            session_id: session_id.clone(),
            scene_id: scene.id,
            step_index: 0,
            updated_at: self.now(),
        };
        self.scenes.upsert_scene_state(state.clone()).await?;
        tracing::info!("Scene '{}' activated in session '{}'", state.scene_id, session_id);
        self.notifier
            .emit(ChangeEvent::scene_state(action, state.clone()))
            .await;

        self.board
            .sync_board_background(session_id, step.background_url.clone())
            .await?;
        Ok(SceneProgress { state, step })
    }

    /// Move to the next step, wrapping to the first after the last.
    pub async fn advance(&self, user_id: &UserId, session_id: &SessionId) -> Result<SceneProgress, ServiceError> {
        self.membership.require_owner(session_id, user_id).await?;
        let current = self
            .scenes
            .find_scene_state(session_id)
            .await?
            .ok_or(ServiceError::NotFound("scene state"))?;

        let mut steps = self.scenes.list_steps(&current.scene_id).await?;
        let next_index = next_step_index(current.step_index, steps.len())
            .ok_or_else(|| ServiceError::InvalidState("scene has no steps".to_string()))?;
        let step = self.view_of(steps.swap_remove(next_index)).await?;

        let state = self
            .scenes
            .update_step_index(session_id, next_index, self.now())
            .await?
            .ok_or(ServiceError::NotFound("scene state"))?;
        tracing::debug!("Session '{}' advanced to step {}", session_id, next_index);
        self.notifier
            .emit(ChangeEvent::scene_state(ChangeAction::Update, state.clone()))
            .await;

        self.board
            .sync_board_background(session_id, step.background_url.clone())
            .await?;
        Ok(SceneProgress { state, step })
    }

    /// Current step for any participant. A stale index is clamped.
    pub async fn read(&self, user_id: &UserId, session_id: &SessionId) -> Result<SceneView, ServiceError> {
        self.membership.require_member(session_id, user_id).await?;
        let Some(state) = self.scenes.find_scene_state(session_id).await? else {
            return Ok(SceneView::default());
        };

        let mut steps = self.scenes.list_steps(&state.scene_id).await?;
        let step = match clamp_step_index(state.step_index, steps.len()) {
            Some(index) => Some(self.view_of(steps.swap_remove(index)).await?),
            None => None,
        };
        Ok(SceneView {
            state: Some(state),
            step,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{BoardRepository, Participant, ParticipantId, Role, SessionRepository},
        infrastructure::{message_pusher::WebSocketMessagePusher, repository::InMemoryRecordStore},
    };
    use tablesync_shared::time::ManualClock;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - Activate / Advance / Read の状態遷移
    // - 最終ステップからの折り返し（wraparound）
    // - ボード背景の同期
    // - ステップ追加時の検証（場所・パターンの所属）
    // ========================================

    struct Fixture {
        usecase: SceneUseCase,
        store: Arc<InMemoryRecordStore>,
        session_id: SessionId,
    }

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    fn gm() -> UserId {
        user("gm")
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryRecordStore::new());
        let clock = Arc::new(ManualClock::new(0));
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
        let membership = Arc::new(MembershipResolver::new(store.clone()));
        let notifier = Arc::new(ChangeNotifier::new(Arc::new(WebSocketMessagePusher::new())));
        let board = Arc::new(BoardUseCase::new(
            store.clone(),
            membership.clone(),
            notifier.clone(),
            clock.clone(),
        ));
        let usecase = SceneUseCase::new(store.clone(), membership, board, notifier, clock);
        Fixture {
            usecase,
            store,
            session_id,
        }
    }

    /// Scene with one step per background, all on the same place.
    async fn scene_with_backgrounds(f: &Fixture, name: &str, backgrounds: &[&str]) -> Scene {
        let place = f
            .usecase
            .create_place(&gm(), &f.session_id, format!("{name} place"))
            .await
            .unwrap();
        let scene = f
            .usecase
            .create_scene(&gm(), &f.session_id, name.to_string())
            .await
            .unwrap();
        for background in backgrounds {
            let pattern = f
                .usecase
                .create_pattern(&gm(), &place.id, background.to_string(), Some(background.to_string()))
                .await
                .unwrap();
            f.usecase
                .append_step(&gm(), &scene.id, place.id.as_str(), pattern.id.as_str())
                .await
                .unwrap();
        }
        scene
    }

    async fn board_background(f: &Fixture) -> Option<String> {
        f.store
            .find_board(&f.session_id)
            .await
            .unwrap()
            .and_then(|board| board.background_url)
    }

    #[tokio::test]
    async fn test_activate_advance_wraparound_with_board_sync() {
        // テスト項目: Scene1 [P1, P2] で Activate → Advance → Advance が 0 → 1 → 0 と進み、背景も追従する
        // given (前提条件):
        let f = fixture().await;
        let scene = scene_with_backgrounds(&f, "Scene1", &["p1.png", "p2.png"]).await;

        // when (操作) / then (期待する結果):
        let activated = f.usecase.activate(&gm(), &f.session_id, &scene.id).await.unwrap();
        assert_eq!(activated.state.scene_id, scene.id);
        assert_eq!(activated.state.step_index, 0);
        assert_eq!(board_background(&f).await.as_deref(), Some("p1.png"));

        let second = f.usecase.advance(&gm(), &f.session_id).await.unwrap();
        assert_eq!(second.state.step_index, 1);
        assert_eq!(board_background(&f).await.as_deref(), Some("p2.png"));

        let wrapped = f.usecase.advance(&gm(), &f.session_id).await.unwrap();
        assert_eq!(wrapped.state.step_index, 0);
        assert_eq!(wrapped.step.background_url.as_deref(), Some("p1.png"));
        assert_eq!(board_background(&f).await.as_deref(), Some("p1.png"));
    }

    #[tokio::test]
    async fn test_n_advances_return_to_start() {
        // テスト項目: N ステップのシーンで N 回進めると元のインデックスに戻る
        // given (前提条件):
        let f = fixture().await;
        let scene = scene_with_backgrounds(&f, "loop", &["a", "b", "c"]).await;
        f.usecase.activate(&gm(), &f.session_id, &scene.id).await.unwrap();

        // when (操作):
        let mut visited = Vec::new();
        for _ in 0..3 {
            visited.push(f.usecase.advance(&gm(), &f.session_id).await.unwrap().state.step_index);
        }

        // then (期待する結果):
        assert_eq!(visited, vec![1, 2, 0]);
    }

    #[tokio::test]
    async fn test_activate_empty_scene_is_invalid_and_leaves_no_state() {
        // テスト項目: ステップのないシーンの Activate は InvalidState で、状態行は作られない
        // given (前提条件):
        let f = fixture().await;
        let scene = scene_with_backgrounds(&f, "empty", &[]).await;

        // when (操作):
        let result = f.usecase.activate(&gm(), &f.session_id, &scene.id).await;

        // then (期待する結果):
        assert!(matches!(result, Err(ServiceError::InvalidState(_))));
        assert_eq!(f.store.find_scene_state(&f.session_id).await, Ok(None));
    }

    #[tokio::test]
    async fn test_progression_is_owner_only() {
        // テスト項目: Activate / Advance はオーナーのみ、Read は参加者も可能
        let f = fixture().await;
        let scene = scene_with_backgrounds(&f, "Scene1", &["p1.png"]).await;

        assert_eq!(
            f.usecase.activate(&user("pl"), &f.session_id, &scene.id).await,
            Err(ServiceError::Forbidden)
        );
        f.usecase.activate(&gm(), &f.session_id, &scene.id).await.unwrap();
        assert_eq!(
            f.usecase.advance(&user("pl"), &f.session_id).await,
            Err(ServiceError::Forbidden)
        );
        let view = f.usecase.read(&user("pl"), &f.session_id).await.unwrap();
        assert_eq!(view.step.unwrap().background_url.as_deref(), Some("p1.png"));
    }

    #[tokio::test]
    async fn test_advance_without_state_is_not_found() {
        // テスト項目: 状態がない場合の Advance は NotFound
        let f = fixture().await;
        assert_eq!(
            f.usecase.advance(&gm(), &f.session_id).await,
            Err(ServiceError::NotFound("scene state"))
        );
    }

    #[tokio::test]
    async fn test_read_without_state_returns_empty_view() {
        // テスト項目: 状態がなければエラーではなく空のビュー
        let f = fixture().await;
        assert_eq!(f.usecase.read(&gm(), &f.session_id).await, Ok(SceneView::default()));
    }

    #[tokio::test]
    async fn test_read_clamps_stale_index() {
        // テスト項目: 範囲外のインデックスは最後のステップに丸められる
        // given (前提条件):
        let f = fixture().await;
        let scene = scene_with_backgrounds(&f, "Scene1", &["p1.png", "p2.png"]).await;
        f.store
            .upsert_scene_state(SceneState {
                session_id: f.session_id.clone(),
                scene_id: scene.id.clone(),
                step_index: 7,
                updated_at: Timestamp::new(0),
            })
            .await
            .unwrap();

        // when (操作):
        let view = f.usecase.read(&gm(), &f.session_id).await.unwrap();

        // then (期待する結果):
        let step = view.step.unwrap();
        assert_eq!(step.step.position, 1);
        assert_eq!(step.background_url.as_deref(), Some("p2.png"));
        assert_eq!(view.state.unwrap().step_index, 7);
    }

    #[tokio::test]
    async fn test_activate_scene_from_other_session_is_not_found() {
        // テスト項目: 別セッションのシーンは Activate できない
        let f = fixture().await;
        let foreign = Scene {
            id: SceneId::generate(),
            session_id: SessionId::generate(),
            name: Name::new("elsewhere".to_string()).unwrap(),
            created_at: Timestamp::new(0),
        };
        f.store.insert_scene(foreign.clone()).await.unwrap();

        assert_eq!(
            f.usecase.activate(&gm(), &f.session_id, &foreign.id).await,
            Err(ServiceError::NotFound("scene"))
        );
    }

    #[tokio::test]
    async fn test_append_step_validates_place_and_pattern() {
        // テスト項目: 場所は同じセッション、パターンはその場所に属している必要がある
        // given (前提条件):
        let f = fixture().await;
        let scene = scene_with_backgrounds(&f, "Scene1", &[]).await;
        let place = f
            .usecase
            .create_place(&gm(), &f.session_id, "tavern".to_string())
            .await
            .unwrap();
        let other_place = f
            .usecase
            .create_place(&gm(), &f.session_id, "forest".to_string())
            .await
            .unwrap();
        let pattern = f
            .usecase
            .create_pattern(&gm(), &other_place.id, "day".to_string(), None)
            .await
            .unwrap();

        // when (操作) / then (期待する結果):
        assert_eq!(
            f.usecase
                .append_step(&gm(), &scene.id, place.id.as_str(), pattern.id.as_str())
                .await,
            Err(ServiceError::Validation("invalid pattern".to_string()))
        );
        assert_eq!(
            f.usecase
                .append_step(&gm(), &scene.id, "missing", pattern.id.as_str())
                .await,
            Err(ServiceError::Validation("invalid place".to_string()))
        );
        assert!(matches!(
            f.usecase.append_step(&gm(), &scene.id, "", "").await,
            Err(ServiceError::Validation(_))
        ));

        let first = f
            .usecase
            .append_step(&gm(), &scene.id, other_place.id.as_str(), pattern.id.as_str())
            .await
            .unwrap();
        let second = f
            .usecase
            .append_step(&gm(), &scene.id, other_place.id.as_str(), pattern.id.as_str())
            .await
            .unwrap();
        assert_eq!((first.position, second.position), (0, 1));
    }

    #[tokio::test]
    async fn test_list_scenes_and_places_require_membership() {
        // テスト項目: 一覧取得は参加者のみ
        let f = fixture().await;
        scene_with_backgrounds(&f, "Scene1", &["p1.png"]).await;

        let scenes = f.usecase.list_scenes(&user("pl"), &f.session_id).await.unwrap();
        let places = f.usecase.list_places(&user("pl"), &f.session_id).await.unwrap();

        assert_eq!(scenes.len(), 1);
        assert_eq!(scenes[0].steps.len(), 1);
        assert_eq!(places.len(), 1);
        assert_eq!(places[0].patterns.len(), 1);
        assert_eq!(
            f.usecase.list_scenes(&user("mallory"), &f.session_id).await,
            Err(ServiceError::Forbidden)
        );
    }
}
