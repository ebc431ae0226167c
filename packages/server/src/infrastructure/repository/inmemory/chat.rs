//! `ChatRepository` for the in-memory store.

use std::cmp::Reverse;

use async_trait::async_trait;

use crate::domain::{
    ChatRepository, ChatTab, RepositoryError, SessionId, SessionLog, TabId, UserId,
};

use super::InMemoryRecordStore;

/// Default tab first, then by creation time. The sort is stable, so tabs
/// created at the same instant keep insertion order.
fn sort_tabs(tabs: &mut [ChatTab]) {
    tabs.sort_by_key(|tab| (Reverse(tab.is_default), tab.created_at));
}

#[async_trait]
impl ChatRepository for InMemoryRecordStore {
    async fn insert_tab(&self, tab: ChatTab) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().await;
        if tables.chat_tabs.iter().any(|t| t.id == tab.id) {
            return Err(RepositoryError::Conflict(format!("chat tab '{}' already exists", tab.id)));
        }
        tables.chat_tabs.push(tab);
        Ok(())
    }

    async fn find_tab(&self, tab_id: &TabId) -> Result<Option<ChatTab>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.chat_tabs.iter().find(|t| &t.id == tab_id).cloned())
    }

    async fn find_default_tab(&self, session_id: &SessionId) -> Result<Option<ChatTab>, RepositoryError> {
        Ok(self.list_tabs(session_id).await?.into_iter().next())
    }

    async fn list_tabs(&self, session_id: &SessionId) -> Result<Vec<ChatTab>, RepositoryError> {
        let tables = self.tables.lock().await;
        let mut tabs: Vec<ChatTab> = tables
            .chat_tabs
            .iter()
            .filter(|t| &t.session_id == session_id)
            .cloned()
            .collect();
        sort_tabs(&mut tabs);
        Ok(tabs)
    }

    async fn update_tab(&self, tab: ChatTab) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().await;
        match tables.chat_tabs.iter_mut().find(|t| t.id == tab.id) {
            Some(existing) => {
                *existing = tab;
                Ok(())
            }
            None => Err(RepositoryError::Storage(format!("chat tab '{}' vanished", tab.id))),
        }
    }

    async fn delete_tab(&self, tab_id: &TabId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let before = tables.chat_tabs.len();
        tables.chat_tabs.retain(|t| &t.id != tab_id);
        Ok(tables.chat_tabs.len() != before)
    }

    async fn insert_log(&self, log: SessionLog) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().await;
        tables.session_logs.push(log);
        Ok(())
    }

    async fn list_logs(
        &self,
        session_id: &SessionId,
        tab_id: &TabId,
        viewer: &UserId,
    ) -> Result<Vec<SessionLog>, RepositoryError> {
        let tables = self.tables.lock().await;
        let in_tab: Vec<&SessionLog> = tables
            .session_logs
            .iter()
            .filter(|log| &log.session_id == session_id && &log.tab_id == tab_id)
            .collect();

        let mut logs: Vec<SessionLog> = in_tab
            .iter()
            .filter(|log| log.is_visible_to(viewer))
            .filter(|log| match &log.redacted_for_id {
                // hide the ghost from whoever can already read the original
                Some(original_id) => !in_tab
                    .iter()
                    .any(|original| &original.id == original_id && original.is_visible_to(viewer)),
                None => true,
            })
            .map(|log| (*log).clone())
            .collect();
        logs.sort_by_key(|log| log.created_at);
        Ok(logs)
    }
}
