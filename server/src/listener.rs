//! PostgreSQL `LISTEN` relay.
//!
//! The items trigger publishes each row change on [`CHANNEL`]. Payloads are
//! forwarded to every WebSocket client exactly as received; decoding them
//! here only serves the server's own logs.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgListener;
use tokio::task::JoinHandle;

use crate::websocket::ConnectionManager;

/// Notification channel written by `notify_item_changes()`.
pub const CHANNEL: &str = "item_changes";

const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Forward one notification payload to all connected clients.
///
/// Returns the number of recipients. Payloads that do not decode are still
/// forwarded; clients log and skip them.
pub fn relay(payload: &str, conn_manager: &ConnectionManager) -> usize {
    match plank_engine::decode(payload) {
        Ok(event) => tracing::info!(channel = CHANNEL, "{}", event.summary()),
        Err(e) => tracing::warn!(channel = CHANNEL, "Relaying undecodable payload: {}", e),
    }

    conn_manager.broadcast(payload)
}

/// Connect a dedicated listener and relay notifications until the task is
/// aborted.
///
/// The initial connection must succeed. Later connection losses are logged
/// and the listener reconnects on its own.
pub async fn spawn(
    database_url: &str,
    conn_manager: Arc<ConnectionManager>,
) -> Result<JoinHandle<()>, sqlx::Error> {
    let mut listener = PgListener::connect(database_url).await?;
    listener.listen(CHANNEL).await?;
    tracing::info!(channel = CHANNEL, "Listening for notifications");

    Ok(tokio::spawn(async move {
        loop {
            match listener.recv().await {
                Ok(notification) => {
                    relay(notification.payload(), &conn_manager);
                }
                Err(e) => {
                    tracing::warn!(channel = CHANNEL, "Listener error: {}", e);
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_relay_forwards_payload_verbatim() {
        let manager = ConnectionManager::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        manager.register(tx);

        let payload = r#"{"table": "items", "action": "DELETE", "id": 3, "data": {"id": 3, "name": "A", "value": 1, "created_at": "2024-01-15T10:30:00.123456", "updated_at": "2024-01-15T10:30:00.123456"}}"#;
        assert_eq!(relay(payload, &manager), 1);
        assert_eq!(rx.try_recv().unwrap(), payload);
    }

    #[test]
    fn test_relay_forwards_undecodable_payload() {
        let manager = ConnectionManager::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        manager.register(tx);

        assert_eq!(relay("not json", &manager), 1);
        assert_eq!(rx.try_recv().unwrap(), "not json");
    }

    #[test]
    fn test_relay_without_clients() {
        let manager = ConnectionManager::new();
        assert_eq!(relay("{}", &manager), 0);
    }
}
