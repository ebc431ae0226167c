//! `SceneRepository` for the in-memory store.

use async_trait::async_trait;

use crate::domain::{
    Pattern, PatternId, Place, PlaceId, RepositoryError, Scene, SceneId, SceneRepository,
    SceneState, SceneStep, SessionId, Timestamp,
};

use super::InMemoryRecordStore;

#[async_trait]
impl SceneRepository for InMemoryRecordStore {
    async fn insert_place(&self, place: Place) -> Result<(), RepositoryError> {
        self.tables.lock().await.places.push(place);
        Ok(())
    }

    async fn find_place(&self, place_id: &PlaceId) -> Result<Option<Place>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.places.iter().find(|p| &p.id == place_id).cloned())
    }

    async fn list_places(&self, session_id: &SessionId) -> Result<Vec<Place>, RepositoryError> {
        let tables = self.tables.lock().await;
        let mut places: Vec<Place> = tables
            .places
            .iter()
            .filter(|p| &p.session_id == session_id)
            .cloned()
            .collect();
        places.sort_by_key(|p| p.created_at);
        Ok(places)
    }

    async fn insert_pattern(&self, pattern: Pattern) -> Result<(), RepositoryError> {
        self.tables.lock().await.patterns.push(pattern);
        Ok(())
    }

    async fn find_pattern(&self, pattern_id: &PatternId) -> Result<Option<Pattern>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.patterns.iter().find(|p| &p.id == pattern_id).cloned())
    }

    async fn list_patterns(&self, place_id: &PlaceId) -> Result<Vec<Pattern>, RepositoryError> {
        let tables = self.tables.lock().await;
        let mut patterns: Vec<Pattern> = tables
            .patterns
            .iter()
            .filter(|p| &p.place_id == place_id)
            .cloned()
            .collect();
        patterns.sort_by_key(|p| p.created_at);
        Ok(patterns)
    }

    async fn insert_scene(&self, scene: Scene) -> Result<(), RepositoryError> {
        self.tables.lock().await.scenes.push(scene);
        Ok(())
    }

    async fn find_scene(&self, scene_id: &SceneId) -> Result<Option<Scene>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.scenes.iter().find(|s| &s.id == scene_id).cloned())
    }

    async fn list_scenes(&self, session_id: &SessionId) -> Result<Vec<Scene>, RepositoryError> {
        let tables = self.tables.lock().await;
        let mut scenes: Vec<Scene> = tables
            .scenes
            .iter()
            .filter(|s| &s.session_id == session_id)
            .cloned()
            .collect();
        scenes.sort_by_key(|s| s.created_at);
        Ok(scenes)
    }

    async fn insert_step(&self, step: SceneStep) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().await;
        if tables
            .scene_steps
            .iter()
            .any(|s| s.scene_id == step.scene_id && s.position == step.position)
        {
            return Err(RepositoryError::Conflict(format!(
                "scene '{}' already has a step at position {}",
                step.scene_id, step.position
            )));
        }
        tables.scene_steps.push(step);
        Ok(())
    }

    async fn last_step_position(&self, scene_id: &SceneId) -> Result<Option<u32>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .scene_steps
            .iter()
            .filter(|s| &s.scene_id == scene_id)
            .map(|s| s.position)
            .max())
    }

    async fn list_steps(&self, scene_id: &SceneId) -> Result<Vec<SceneStep>, RepositoryError> {
        let tables = self.tables.lock().await;
        let mut steps: Vec<SceneStep> = tables
            .scene_steps
            .iter()
            .filter(|s| &s.scene_id == scene_id)
            .cloned()
            .collect();
        steps.sort_by_key(|s| s.position);
        Ok(steps)
    }

    async fn find_scene_state(&self, session_id: &SessionId) -> Result<Option<SceneState>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .scene_states
            .iter()
            .find(|s| &s.session_id == session_id)
            .cloned())
    }

    async fn upsert_scene_state(&self, state: SceneState) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().await;
        match tables
            .scene_states
            .iter_mut()
            .find(|s| s.session_id == state.session_id)
        {
            Some(existing) => *existing = state,
            None => tables.scene_states.push(state),
        }
        Ok(())
    }

    async fn update_step_index(
        &self,
        session_id: &SessionId,
        step_index: usize,
        updated_at: Timestamp,
    ) -> Result<Option<SceneState>, RepositoryError> {
        let mut tables = self.tables.lock().await;
        Ok(tables
            .scene_states
            .iter_mut()
            .find(|s| &s.session_id == session_id)
            .map(|state| {
                state.step_index = step_index;
                state.updated_at = updated_at;
                state.clone()
            }))
    }
}
