//! Change notification fan-out.
//!
//! Every mutating operation hands its event to `ChangeNotifier::emit`, which
//! derives the session scope and forwards the serialized frame to the
//! realtime gateway. Delivery is best-effort and never fails the caller.

use std::sync::Arc;

use crate::domain::{ChangeAction, ChangeEvent, ChangeRecord, MessagePusher, Table};

pub struct ChangeNotifier {
    message_pusher: Arc<dyn MessagePusher>,
}

impl ChangeNotifier {
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    /// Deliver `event` to the connections subscribed to its session.
    ///
    /// Events without a session scope are dropped. Chat logs with an explicit
    /// audience only reach connections of those users.
    pub async fn emit(&self, event: ChangeEvent) {
        let Some(session_id) = event.session_id() else {
            tracing::debug!("Dropped {:?} event without session scope", event.table);
            return;
        };
        let payload = match serde_json::to_string(&event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("Failed to serialize change event: {}", e);
                return;
            }
        };
        let delivered = match event.audience() {
            Some(users) => {
                self.message_pusher
                    .broadcast_to_users(&session_id, &users, &payload)
                    .await
            }
            None => {
                self.message_pusher
                    .broadcast_to_session(&session_id, &payload)
                    .await
            }
        };
        tracing::debug!(
            "Emitted {:?}/{:?} to {} connection(s) in session '{}'",
            event.table,
            event.action,
            delivered,
            session_id
        );
    }

    /// Entry point for mutation handlers that only have the table and action
    /// names and a JSON record. Tables this crate does not own are routed by
    /// their record's `session_id` like any other; an unknown action or a
    /// blank table name is dropped.
    pub async fn emit_raw(&self, table: &str, action: &str, record: serde_json::Value) {
        let (table, action) = match (table.parse::<Table>(), action.parse::<ChangeAction>()) {
            (Ok(table), Ok(action)) => (table, action),
            (Err(e), _) | (_, Err(e)) => {
                tracing::debug!("Dropped raw change event: {}", e);
                return;
            }
        };
        self.emit(ChangeEvent::new(table, action, ChangeRecord::Json(record)))
            .await;
    }
}
