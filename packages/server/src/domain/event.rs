//! Change events pushed to realtime subscribers.
//!
//! Each event is `{type: "change", table, action, record}` on the wire. The
//! target session is derived from the record: a session's own id for the
//! `sessions` table, the record's `session_id` everywhere else.

use std::str::FromStr;

use serde::Serialize;

use super::{
    entity::{Board, BoardToken, ChatTab, Participant, SceneState, SessionLog, SessionSummary},
    value_object::{SessionId, UserId},
};

/// Table a change happened in.
///
/// Tables owned by mutation handlers outside this crate travel as `Other`
/// and keep their raw name on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Sessions,
    SessionParticipants,
    ChatTabs,
    SessionLogs,
    Boards,
    Tokens,
    SceneStates,
    #[serde(untagged)]
    Other(String),
}

impl FromStr for Table {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err("empty table name".to_string()),
            "sessions" => Ok(Table::Sessions),
            "session_participants" => Ok(Table::SessionParticipants),
            "chat_tabs" => Ok(Table::ChatTabs),
            "session_logs" => Ok(Table::SessionLogs),
            "boards" => Ok(Table::Boards),
            "tokens" => Ok(Table::Tokens),
            "scene_states" => Ok(Table::SceneStates),
            other => Ok(Table::Other(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Insert,
    Update,
    Delete,
}

impl FromStr for ChangeAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "insert" => Ok(ChangeAction::Insert),
            "update" => Ok(ChangeAction::Update),
            "delete" => Ok(ChangeAction::Delete),
            other => Err(format!("unknown action '{other}'")),
        }
    }
}

/// Record carried by a change event.
///
/// `Json` is the escape hatch for mutation handlers living outside this crate;
/// its session scope is read from the record fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChangeRecord {
    Session(SessionSummary),
    Participant(Participant),
    ChatTab(ChatTab),
    SessionLog(SessionLog),
    Board(Board),
    Token(BoardToken),
    SceneState(SceneState),
    Json(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "change")]
pub struct ChangeEvent {
    pub table: Table,
    pub action: ChangeAction,
    pub record: ChangeRecord,
    /// Users allowed to receive the event, set by the emitter when the record
    /// lives in a restricted tab. Never serialized.
    #[serde(skip)]
    pub recipients: Option<Vec<UserId>>,
}

impl ChangeEvent {
    pub fn new(table: Table, action: ChangeAction, record: ChangeRecord) -> Self {
        Self {
            table,
            action,
            record,
            recipients: None,
        }
    }

    /// Narrow delivery to `users`. `None` keeps the event session-wide.
    pub fn restricted_to(mut self, users: Option<Vec<UserId>>) -> Self {
        self.recipients = users;
        self
    }

    pub fn session(action: ChangeAction, session: SessionSummary) -> Self {
        Self::new(Table::Sessions, action, ChangeRecord::Session(session))
    }

    pub fn participant(action: ChangeAction, participant: Participant) -> Self {
        Self::new(
            Table::SessionParticipants,
            action,
            ChangeRecord::Participant(participant),
        )
    }

    pub fn chat_tab(action: ChangeAction, tab: ChatTab) -> Self {
        Self::new(Table::ChatTabs, action, ChangeRecord::ChatTab(tab))
    }

    pub fn session_log(action: ChangeAction, log: SessionLog) -> Self {
        Self::new(Table::SessionLogs, action, ChangeRecord::SessionLog(log))
    }

    pub fn board(action: ChangeAction, board: Board) -> Self {
        Self::new(Table::Boards, action, ChangeRecord::Board(board))
    }

    pub fn token(action: ChangeAction, token: BoardToken) -> Self {
        Self::new(Table::Tokens, action, ChangeRecord::Token(token))
    }

    pub fn scene_state(action: ChangeAction, state: SceneState) -> Self {
        Self::new(Table::SceneStates, action, ChangeRecord::SceneState(state))
    }

    /// Users allowed to receive this event, when narrower than the session.
    ///
    /// Combines the emitter's `recipients` with the `visible_user_ids` of a
    /// chat log; a user must pass both.
    pub fn audience(&self) -> Option<Vec<UserId>> {
        let visible = self.visible_user_ids();
        match (&self.recipients, visible) {
            (None, None) => None,
            (Some(recipients), None) => Some(recipients.clone()),
            (None, Some(visible)) => Some(visible),
            (Some(recipients), Some(visible)) => Some(
                visible
                    .into_iter()
                    .filter(|user| recipients.contains(user))
                    .collect(),
            ),
        }
    }

    fn visible_user_ids(&self) -> Option<Vec<UserId>> {
        match &self.record {
            ChangeRecord::SessionLog(log) => log.visible_user_ids.clone(),
            ChangeRecord::Json(value) if self.table == Table::SessionLogs => value
                .get("visible_user_ids")
                .and_then(serde_json::Value::as_array)
                .map(|users| {
                    users
                        .iter()
                        .filter_map(serde_json::Value::as_str)
                        .filter_map(|raw| UserId::new(raw.to_string()).ok())
                        .collect()
                }),
            _ => None,
        }
    }

    /// Session this event is scoped to, if any.
    pub fn session_id(&self) -> Option<SessionId> {
        match &self.record {
            ChangeRecord::Session(session) => Some(session.id.clone()),
            ChangeRecord::Participant(participant) => Some(participant.session_id.clone()),
            ChangeRecord::ChatTab(tab) => Some(tab.session_id.clone()),
            ChangeRecord::SessionLog(log) => Some(log.session_id.clone()),
            ChangeRecord::Board(board) => Some(board.session_id.clone()),
            ChangeRecord::Token(token) => Some(token.session_id.clone()),
            ChangeRecord::SceneState(state) => Some(state.session_id.clone()),
            ChangeRecord::Json(value) => {
                let key = match self.table {
                    Table::Sessions => "id",
                    _ => "session_id",
                };
                value
                    .get(key)
                    .and_then(serde_json::Value::as_str)
                    .and_then(|raw| SessionId::new(raw.to_string()).ok())
            }
        }
    }
}
