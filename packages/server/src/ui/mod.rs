//! HTTP and realtime surface of the session server.

mod error;
mod extract;
mod handler;
mod server;
mod signal;
pub mod state;

pub use server::{REALTIME_PATH, Server, router};
pub use state::AppState;
