//! HTTP and WebSocket handlers.

mod board;
mod chat;
mod health;
mod scene;
mod session;
mod websocket;

pub use board::{get_board, place_token, update_board};
pub use chat::{create_tab, delete_tab, list_logs, list_tabs, post_message, update_tab};
pub use health::health_check;
pub use scene::{
    activate_scene, advance_scene, append_step, create_pattern, create_place, create_scene,
    get_scene_state, list_places, list_scenes,
};
pub use session::{
    add_participant, create_session, get_session, join_session, list_participants, list_sessions,
};
pub use websocket::realtime_handler;
