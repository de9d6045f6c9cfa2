//! # Plank Client
//!
//! Real-time sync client: keeps a local, ordered copy of a database table in
//! step with the row-change notifications pushed over a WebSocket, and
//! reconnects with backoff when the connection drops.
//!
//! The deterministic parts (decoding, reducing, lifecycle) live in
//! [`plank_engine`]; this crate supplies the socket, the timers, the HTTP
//! calls and the [`SyncClient`] facade that ties them together.
//!
//! ```rust,no_run
//! use plank_client::{ClientConfig, SyncClient};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let client = SyncClient::spawn_default(ClientConfig::from_env()?);
//! client.refresh();
//! client.connect();
//!
//! let mut updates = client.subscribe();
//! while updates.changed().await.is_ok() {
//!     let snapshot = updates.borrow_and_update().clone();
//!     println!("{} items, connected: {}", snapshot.items.len(), snapshot.connected);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod transport;

pub use api::{HttpItemsApi, ItemsApi};
pub use client::{Snapshot, SyncClient};
pub use config::{BackendConfig, ClientConfig, Environment};
pub use error::{ConfigError, MutationError, TransportError};
pub use transport::{Socket, Transport, WebSocketTransport};

pub use plank_engine::{ConnectionState, LogEntry, LogKind, NewRecord, Record, RecordId};
