//! WebSocket connection manager.
//!
//! Tracks active WebSocket connections and fans notifications out to them.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;

/// Sender for outgoing text frames.
pub type MessageSender = mpsc::UnboundedSender<String>;

/// A single WebSocket connection.
#[derive(Debug)]
pub struct Connection {
    /// Unique identifier for this connection
    pub id: String,
    /// Channel drained by the connection's writer task
    pub sender: MessageSender,
}

/// Manages active WebSocket connections.
///
/// Thread-safe and can be shared across handlers via `Arc`.
#[derive(Debug, Default)]
pub struct ConnectionManager {
    /// All active connections, keyed by connection ID.
    connections: DashMap<String, Connection>,
}

impl ConnectionManager {
    /// Create a new connection manager.
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Create a new connection manager wrapped in Arc for sharing.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a new connection.
    ///
    /// Returns the connection ID.
    pub fn register(&self, sender: MessageSender) -> String {
        let conn_id = uuid::Uuid::new_v4().to_string();

        self.connections.insert(
            conn_id.clone(),
            Connection {
                id: conn_id.clone(),
                sender,
            },
        );

        tracing::info!(
            conn_id = %conn_id,
            total = self.connections.len(),
            "WebSocket connection registered"
        );

        conn_id
    }

    /// Unregister a connection.
    pub fn unregister(&self, conn_id: &str) {
        if self.connections.remove(conn_id).is_some() {
            tracing::info!(
                conn_id = %conn_id,
                total = self.connections.len(),
                "WebSocket connection unregistered"
            );
        }
    }

    /// Send a text frame to every connection.
    ///
    /// Connections whose writer has gone away are dropped. Returns the number
    /// of connections that received the message.
    pub fn broadcast(&self, message: &str) -> usize {
        let mut sent_count = 0;
        let mut dead = Vec::new();

        for entry in self.connections.iter() {
            let conn = entry.value();
            if conn.sender.send(message.to_string()).is_ok() {
                sent_count += 1;
            } else {
                dead.push(conn.id.clone());
            }
        }

        for conn_id in dead {
            tracing::warn!(conn_id = %conn_id, "Dropping connection with closed writer");
            self.unregister(&conn_id);
        }

        tracing::debug!(recipients = sent_count, "Broadcast message to connections");

        sent_count
    }

    /// Send a text frame to a specific connection.
    pub fn send_to(&self, conn_id: &str, message: String) -> bool {
        match self.connections.get(conn_id) {
            Some(conn) => conn.sender.send(message).is_ok(),
            None => false,
        }
    }

    /// Get the number of active connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}
