//! InMemory record store.
//!
//! Implements every repository trait the domain declares on top of plain
//! vectors guarded by a single `tokio::sync::Mutex`. Each trait method takes
//! the lock once, so every read and write is atomic with respect to the
//! others, the same guarantee a single SQL statement gives.

mod board;
mod chat;
mod scene;
mod session;

use tokio::sync::Mutex;

use crate::domain::{
    Board, BoardToken, ChatTab, Participant, Pattern, Place, Scene, SceneState, SceneStep, Session,
    SessionLog,
};

#[derive(Default)]
struct Tables {
    sessions: Vec<Session>,
    participants: Vec<Participant>,
    chat_tabs: Vec<ChatTab>,
    session_logs: Vec<SessionLog>,
    places: Vec<Place>,
    patterns: Vec<Pattern>,
    scenes: Vec<Scene>,
    scene_steps: Vec<SceneStep>,
    scene_states: Vec<SceneState>,
    boards: Vec<Board>,
    tokens: Vec<BoardToken>,
}

/// In-memory implementation of the record store
#[derive(Default)]
pub struct InMemoryRecordStore {
    tables: Mutex<Tables>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}
