//! UseCase: チャット投稿とログ取得
//!
//! A message with an explicit audience is stamped with the resolved
//! `visible_user_ids` (always including the author). When the poster asks for
//! redaction, a masked ghost entry is stored and broadcast after the real one.
//! The ghost is best-effort: its failure is logged and never fails the post.
//!
//! Realtime delivery mirrors what `list_logs` returns: entries only reach
//! participants who can view the tab, and the ghost skips whoever already
//! receives the real message.

use std::sync::Arc;

use tablesync_shared::time::Clock;

use crate::domain::{
    ChangeAction, ChangeEvent, ChatRepository, ChatTab, LogId, MaskRange, MessageKind, SessionId,
    SessionLog, SessionRepository, Speaker, SpeakerType, TabSelector, Timestamp, UserId,
    policy::{normalize_user_ids, restricted_audience},
    redaction::ghost_mask,
};

use super::{chat_tab::resolve_tab, error::ServiceError, fanout::ChangeNotifier, membership::MembershipResolver};

/// Chat post as received from the client, before normalization.
#[derive(Debug, Clone, Default)]
pub struct PostMessage {
    pub tab: Option<String>,
    pub message: String,
    pub message_type: Option<String>,
    pub speaker_type: Option<String>,
    pub speaker_name: Option<String>,
    pub speaker_color: Option<String>,
    pub speaker_image_url: Option<String>,
    pub message_font: Option<String>,
    pub dice_result: Option<serde_json::Value>,
    pub visible_user_ids: Vec<String>,
    pub redact_for_others: bool,
}

/// Speaker descriptor with the image kept only for character speakers.
fn normalize_speaker(input: &PostMessage) -> Speaker {
    let speaker_type = SpeakerType::normalize(input.speaker_type.as_deref());
    let speaker_image_url = match speaker_type {
        SpeakerType::Character => input
            .speaker_image_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string),
        _ => None,
    };
    Speaker {
        speaker_type,
        speaker_name: input.speaker_name.clone(),
        speaker_color: input.speaker_color.clone(),
        speaker_image_url,
    }
}

/// Masked companion of a restricted message.
fn ghost_of(original: &SessionLog, body: String, created_at: Timestamp) -> SessionLog {
    SessionLog {
        id: LogId::generate(),
        session_id: original.session_id.clone(),
        tab_id: original.tab_id.clone(),
        user_id: original.user_id.clone(),
        message: body,
        message_type: MessageKind::Redacted,
        speaker: Speaker {
            speaker_image_url: None,
            ..original.speaker.clone()
        },
        message_font: original.message_font.clone(),
        dice_result: None,
        visible_user_ids: None,
        redacted_for_id: Some(original.id.clone()),
        created_at,
    }
}

/// チャットのユースケース
pub struct ChatUseCase {
    chat: Arc<dyn ChatRepository>,
    sessions: Arc<dyn SessionRepository>,
    membership: Arc<MembershipResolver>,
    notifier: Arc<ChangeNotifier>,
    clock: Arc<dyn Clock>,
    mask_range: MaskRange,
}

impl ChatUseCase {
    pub fn new(
        chat: Arc<dyn ChatRepository>,
        sessions: Arc<dyn SessionRepository>,
        membership: Arc<MembershipResolver>,
        notifier: Arc<ChangeNotifier>,
        clock: Arc<dyn Clock>,
        mask_range: MaskRange,
    ) -> Self {
        Self {
            chat,
            sessions,
            membership,
            notifier,
            clock,
            mask_range,
        }
    }

    async fn resolve_for(&self, user_id: &UserId, session_id: &SessionId, tab: Option<&str>) -> Result<ChatTab, ServiceError> {
        let participant = self.membership.require_member(session_id, user_id).await?;
        resolve_tab(
            self.chat.as_ref(),
            session_id,
            &TabSelector::from_optional(tab),
            &participant,
        )
        .await
    }

    /// Audience of a restricted message, or `None` when nobody was named.
    async fn resolve_audience(
        &self,
        session_id: &SessionId,
        author: &UserId,
        requested: &[String],
    ) -> Result<Option<Vec<UserId>>, ServiceError> {
        let mut candidates = normalize_user_ids(requested);
        if candidates.is_empty() {
            return Ok(None);
        }
        if !candidates.contains(author) {
            candidates.push(author.clone());
        }
        let members = self.sessions.filter_participants(session_id, &candidates).await?;
        Ok(Some(restricted_audience(members, author)))
    }

    /// Store and broadcast a chat message; returns the real (non-ghost) entry.
    pub async fn post_message(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
        input: PostMessage,
    ) -> Result<SessionLog, ServiceError> {
        if input.message.is_empty() {
            return Err(ServiceError::Validation("message is required".to_string()));
        }
        let tab = self.resolve_for(user_id, session_id, input.tab.as_deref()).await?;
        let audience = self
            .resolve_audience(session_id, user_id, &input.visible_user_ids)
            .await?;
        let redact = input.redact_for_others && audience.is_some();
        let viewers = self.membership.tab_viewers(&tab).await?;

        let log = SessionLog {
            id: LogId::generate(),
            session_id: session_id.clone(),
            tab_id: tab.id,
            user_id: user_id.clone(),
            message_type: MessageKind::from_request(input.message_type.as_deref()),
            speaker: normalize_speaker(&input),
            message: input.message,
            message_font: input.message_font,
            dice_result: input.dice_result,
            visible_user_ids: audience,
            redacted_for_id: None,
            created_at: Timestamp::new(self.clock.now_millis()),
        };
        self.chat.insert_log(log.clone()).await?;
        self.notifier
            .emit(ChangeEvent::session_log(ChangeAction::Insert, log.clone()).restricted_to(viewers.clone()))
            .await;

        if redact {
            self.post_ghost(&log, viewers).await;
        }
        Ok(log)
    }

    async fn post_ghost(&self, original: &SessionLog, viewers: Option<Vec<UserId>>) {
        let body = ghost_mask(self.mask_range, &mut rand::rng());
        let ghost = ghost_of(original, body, Timestamp::new(self.clock.now_millis()));
        if let Err(e) = self.chat.insert_log(ghost.clone()).await {
            tracing::warn!("Failed to store ghost for message '{}': {}", original.id, e);
            return;
        }
        match self.ghost_recipients(original, viewers).await {
            Ok(recipients) => {
                self.notifier
                    .emit(ChangeEvent::session_log(ChangeAction::Insert, ghost).restricted_to(Some(recipients)))
                    .await;
            }
            Err(e) => {
                tracing::warn!("Skipped ghost event for message '{}': {}", original.id, e);
            }
        }
    }

    /// Tab viewers outside the original message's audience.
    async fn ghost_recipients(
        &self,
        original: &SessionLog,
        viewers: Option<Vec<UserId>>,
    ) -> Result<Vec<UserId>, ServiceError> {
        let viewers = match viewers {
            Some(viewers) => viewers,
            None => self
                .sessions
                .list_participants(&original.session_id)
                .await?
                .into_iter()
                .map(|participant| participant.user_id)
                .collect(),
        };
        let audience = original.visible_user_ids.as_deref().unwrap_or_default();
        Ok(viewers
            .into_iter()
            .filter(|user_id| !audience.contains(user_id))
            .collect())
    }

    /// Logs of the targeted tab as the caller may see them, oldest first.
    pub async fn list_logs(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
        tab: Option<&str>,
    ) -> Result<Vec<SessionLog>, ServiceError> {
        let tab = self.resolve_for(user_id, session_id, tab).await?;
        Ok(self.chat.list_logs(session_id, &tab.id, user_id).await?)
    }
}
