//! # Plank Engine
//!
//! The deterministic core of a real-time sync client: it keeps a local,
//! ordered copy of a database table in step with row-change notifications
//! delivered over a socket.
//!
//! ## Design Principles
//!
//! - **No IO**: no sockets, timers or clocks; time is passed in
//! - **Deterministic**: same inputs always produce the same state
//! - **Testable**: the whole lifecycle can be driven from unit tests
//!
//! ## Core Concepts
//!
//! ### Codec
//!
//! [`decode`] turns the text of one socket message into a [`ChangeEvent`]:
//! an insert, update or delete scoped to a table. Bad payloads produce a
//! [`DecodeError`] that callers log and move past.
//!
//! ### Collection
//!
//! [`Collection::apply`] is a pure reducer. Inserts go to the front, updates
//! replace in place, deletes remove; at most one record exists per id.
//!
//! ### Connection
//!
//! [`Connection`] is the socket lifecycle state machine. Each transition
//! returns [`Effect`]s (open a socket, arm a retry timer, ...) for an I/O
//! shell to carry out, with reconnection paced by a [`ReconnectPolicy`].
//!
//! ### Event log
//!
//! [`EventLog`] is the human-readable history of connection and data events.
//!
//! ## Quick Start
//!
//! ```rust
//! use plank_engine::{Effect, Input, LogKind, ReconnectPolicy, SyncState};
//!
//! let mut state = SyncState::new("items", ReconnectPolicy::default());
//!
//! // The shell opens a socket when asked to
//! assert_eq!(state.handle(Input::Connect, 0), vec![Effect::OpenSocket]);
//! state.handle(Input::Opened, 0);
//! assert!(state.is_connected());
//!
//! // ...and forwards every text frame
//! let frame = r#"{"action":"INSERT","table":"items","data":{"id":1,"name":"A","value":5,
//!     "created_at":"2024-01-15T10:30:00","updated_at":"2024-01-15T10:30:00"}}"#;
//! state.handle(Input::Message(frame.to_string()), 0);
//!
//! assert_eq!(state.collection().ids(), vec![1]);
//! assert_eq!(state.log().last().unwrap().kind, LogKind::Insert);
//! ```

pub mod codec;
pub mod collection;
pub mod connection;
pub mod error;
pub mod log;
pub mod record;
pub mod state;

// Re-export main types at crate root
pub use codec::{decode, Action, Change, ChangeEvent, Notification};
pub use collection::Collection;
pub use connection::{Backoff, Connection, ConnectionState, Effect, ReconnectPolicy};
pub use error::DecodeError;
pub use log::{EventLog, LogEntry, LogKind};
pub use record::{NewRecord, Record};
pub use state::{Input, SyncState};

/// Type aliases for clarity
pub type RecordId = i64;
pub type TableName = String;
pub type Timestamp = u64;

/// Table tracked when none is configured.
pub const DEFAULT_TABLE: &str = "items";
