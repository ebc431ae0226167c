//! Server execution logic.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, patch, post},
};
use tower_http::trace::TraceLayer;

use super::{
    handler::{
        activate_scene, add_participant, advance_scene, append_step, create_pattern, create_place,
        create_scene, create_session, create_tab, delete_tab, get_board, get_scene_state,
        get_session, health_check, join_session, list_logs, list_participants, list_places,
        list_scenes, list_sessions, list_tabs, place_token, post_message, realtime_handler,
        update_board, update_tab,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Path of the realtime gateway.
pub const REALTIME_PATH: &str = "/realtime";

/// Build the application router over `state`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Realtime gateway
        .route(REALTIME_PATH, get(realtime_handler))
        // HTTP エンドポイント
        .route("/api/health", get(health_check))
        .route("/sessions", get(list_sessions).post(create_session))
        .route("/sessions/{session_id}", get(get_session))
        .route("/sessions/{session_id}/join", post(join_session))
        .route(
            "/sessions/{session_id}/participants",
            get(list_participants).post(add_participant),
        )
        .route(
            "/sessions/{session_id}/chat-tabs",
            get(list_tabs).post(create_tab),
        )
        .route("/chat-tabs/{tab_id}", patch(update_tab).delete(delete_tab))
        .route("/sessions/{session_id}/logs", get(list_logs))
        .route("/sessions/{session_id}/chat", post(post_message))
        .route(
            "/sessions/{session_id}/places",
            get(list_places).post(create_place),
        )
        .route("/places/{place_id}/patterns", post(create_pattern))
        .route(
            "/sessions/{session_id}/scenes",
            get(list_scenes).post(create_scene),
        )
        .route("/scenes/{scene_id}/steps", post(append_step))
        .route(
            "/sessions/{session_id}/scene-state",
            get(get_scene_state).post(activate_scene),
        )
        .route("/sessions/{session_id}/scene-next", post(advance_scene))
        .route(
            "/sessions/{session_id}/board",
            get(get_board).post(update_board),
        )
        .route("/sessions/{session_id}/tokens", post(place_token))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Session synchronization server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(build_state(&config));
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Run the server until a shutdown signal arrives.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let app = router(self.state);

        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        tracing::info!("Session server listening on {}", listener.local_addr()?);
        tracing::info!("Realtime gateway: ws://{}{}", bind_addr, REALTIME_PATH);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
