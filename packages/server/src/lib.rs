//! Real-time session synchronization server for collaborative tabletop RPG play.
//!
//! This library keeps session state (boards, chat, scenes) in a record store,
//! enforces the participant/role/tab-visibility model, and fans out change
//! notifications to WebSocket subscribers scoped to exactly one session.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// composition root
pub mod bootstrap;
