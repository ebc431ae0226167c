//! `BoardRepository` for the in-memory store.

use async_trait::async_trait;

use crate::domain::{
    Board, BoardId, BoardRepository, BoardToken, BoardUpsert, RepositoryError, SessionId, Timestamp,
};

use super::InMemoryRecordStore;

#[async_trait]
impl BoardRepository for InMemoryRecordStore {
    async fn find_board(&self, session_id: &SessionId) -> Result<Option<Board>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.boards.iter().find(|b| &b.session_id == session_id).cloned())
    }

    async fn upsert_board_background(
        &self,
        session_id: &SessionId,
        new_id: BoardId,
        background_url: Option<String>,
        updated_at: Timestamp,
    ) -> Result<BoardUpsert, RepositoryError> {
        let mut tables = self.tables.lock().await;
        match tables.boards.iter_mut().find(|b| &b.session_id == session_id) {
            Some(board) if board.background_url == background_url => Ok(BoardUpsert::Unchanged(board.clone())),
            Some(board) => {
                board.background_url = background_url;
                board.updated_at = updated_at;
                Ok(BoardUpsert::Updated(board.clone()))
            }
            None => {
                let board = Board {
                    id: new_id,
                    session_id: session_id.clone(),
                    background_url,
                    updated_at,
                };
                tables.boards.push(board.clone());
                Ok(BoardUpsert::Inserted(board))
            }
        }
    }

    async fn insert_token(&self, token: BoardToken) -> Result<(), RepositoryError> {
        self.tables.lock().await.tokens.push(token);
        Ok(())
    }
}
