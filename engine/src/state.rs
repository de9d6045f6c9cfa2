//! SyncState - everything the sync client knows, advanced one input at a time.
//!
//! Composes the connection machine, the collection and the event log. The
//! I/O shell feeds it [`Input`]s and performs the [`Effect`]s it returns;
//! log effects are consumed here and never reach the shell.

use crate::{
    decode, Collection, Connection, ConnectionState, Effect, EventLog, LogEntry, LogKind, Record,
    ReconnectPolicy, TableName, Timestamp,
};

/// Something that happened, from the user or from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Connect,
    Disconnect,
    Toggle,
    /// Socket handshake completed
    Opened,
    /// Transport-level failure; a `Closed` follows
    TransportError(String),
    /// Socket closed or could not be opened
    Closed,
    /// Retry timer fired
    RetryElapsed,
    /// Text frame received
    Message(String),
    /// Full listing fetched
    Loaded(Vec<Record>),
    /// Full listing could not be fetched
    LoadFailed(String),
    /// Free-form entry from a collaborator, e.g. the result of a mutation
    Note { kind: LogKind, message: String },
    /// Drop all log entries
    ClearLog,
}

/// Composite client state.
#[derive(Debug, Clone)]
pub struct SyncState {
    table: TableName,
    connection: Connection,
    collection: Collection,
    log: EventLog,
}

impl SyncState {
    /// Track `table` with an unbounded log.
    pub fn new(table: impl Into<TableName>, policy: ReconnectPolicy) -> Self {
        Self::with_log(table, policy, EventLog::new())
    }

    pub fn with_log(table: impl Into<TableName>, policy: ReconnectPolicy, log: EventLog) -> Self {
        Self {
            table: table.into(),
            connection: Connection::new(policy),
            collection: Collection::new(),
            log,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.state().is_connected()
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn log_entries(&self) -> Vec<LogEntry> {
        self.log.snapshot()
    }

    /// Advance by one input. Returns the I/O effects still to perform.
    pub fn handle(&mut self, input: Input, now: Timestamp) -> Vec<Effect> {
        let effects = match input {
            Input::Connect => self.connection.connect(),
            Input::Disconnect => self.connection.disconnect(),
            Input::Toggle => self.connection.toggle(),
            Input::Opened => self.connection.on_open(),
            Input::TransportError(reason) => self.connection.on_error(&reason),
            Input::Closed => self.connection.on_close(),
            Input::RetryElapsed => self.connection.retry_elapsed(),
            Input::Message(raw) => {
                self.on_message(&raw, now);
                Vec::new()
            }
            Input::Loaded(records) => {
                self.collection.replace_all(records);
                let message = format!("Loaded {} items from database", self.collection.len());
                self.log.append(message, LogKind::Info, now);
                Vec::new()
            }
            Input::LoadFailed(reason) => {
                let message = format!("Error fetching items: {}", reason);
                self.log.append(message, LogKind::Error, now);
                Vec::new()
            }
            Input::Note { kind, message } => {
                self.log.append(message, kind, now);
                Vec::new()
            }
            Input::ClearLog => {
                self.log.clear();
                Vec::new()
            }
        };

        self.absorb_logs(effects, now)
    }

    fn on_message(&mut self, raw: &str, now: Timestamp) {
        // Frames from a socket that is no longer the live one
        if !self.connection.state().is_connected() {
            return;
        }

        match decode(raw) {
            Ok(event) if event.table == self.table => {
                self.log.append(event.summary(), event.action().into(), now);
                let collection = std::mem::take(&mut self.collection);
                self.collection = collection.apply(&event.change);
            }
            Ok(event) => {
                let message = format!(
                    "Ignored {} on untracked table '{}'",
                    event.action(),
                    event.table
                );
                self.log.append(message, LogKind::Info, now);
            }
            Err(_) => {
                self.log
                    .append(format!("Received: {}", raw), LogKind::Info, now);
            }
        }
    }

    fn absorb_logs(&mut self, effects: Vec<Effect>, now: Timestamp) -> Vec<Effect> {
        effects
            .into_iter()
            .filter_map(|effect| match effect {
                Effect::Log { kind, message } => {
                    self.log.append(message, kind, now);
                    None
                }
                other => Some(other),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Action;
    use serde_json::json;

    const NOW: Timestamp = 1_706_745_600_000;

    fn row(id: i64, name: &str, value: i64) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "value": value,
            "created_at": "2024-01-15T10:30:00",
            "updated_at": "2024-01-15T10:30:00"
        })
    }

    fn open_state() -> SyncState {
        let mut state = SyncState::new("items", ReconnectPolicy::default());
        state.handle(Input::Connect, NOW);
        state.handle(Input::Opened, NOW);
        state.handle(Input::ClearLog, NOW);
        state
    }

    fn kinds(state: &SyncState) -> Vec<LogKind> {
        state.log().entries().map(|e| e.kind).collect()
    }

    #[test]
    fn insert_scenario() {
        let mut state = open_state();
        let raw = json!({"action": "INSERT", "table": "items", "data": row(1, "A", 5)});
        state.handle(Input::Message(raw.to_string()), NOW);

        assert_eq!(state.collection().ids(), vec![1]);
        let record = state.collection().get(1).unwrap();
        assert_eq!((record.name.as_str(), record.value), ("A", 5));
        assert_eq!(kinds(&state), vec![LogKind::Insert]);
    }

    #[test]
    fn delete_scenario() {
        let mut state = open_state();
        let raw = json!({"action": "INSERT", "table": "items", "data": row(1, "A", 5)});
        state.handle(Input::Message(raw.to_string()), NOW);
        state.handle(
            Input::Message(r#"{"action":"DELETE","table":"items","id":1}"#.into()),
            NOW,
        );

        assert!(state.collection().is_empty());
        assert_eq!(kinds(&state), vec![LogKind::Insert, LogKind::Delete]);
    }

    #[test]
    fn malformed_scenario() {
        let mut state = open_state();
        state.handle(Input::Loaded(vec![]), NOW);
        state.handle(Input::ClearLog, NOW);
        let before = state.collection().clone();

        let effects = state.handle(Input::Message("not json".into()), NOW);

        assert!(effects.is_empty());
        assert_eq!(state.collection(), &before);
        let entries = state.log_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, LogKind::Info);
        assert!(entries[0].message.contains("not json"));
        assert!(state.is_connected());
    }

    #[test]
    fn absent_update_and_delete_log_no_errors() {
        let mut state = open_state();
        let update = json!({"action": "UPDATE", "table": "items", "data": row(9, "X", 1)});
        state.handle(Input::Message(update.to_string()), NOW);
        state.handle(
            Input::Message(r#"{"action":"DELETE","table":"items","id":9}"#.into()),
            NOW,
        );

        assert!(state.collection().is_empty());
        assert!(!kinds(&state).contains(&LogKind::Error));
    }

    #[test]
    fn other_tables_are_ignored() {
        let mut state = open_state();
        let raw = json!({"action": "INSERT", "table": "orders", "data": row(1, "A", 5)});
        state.handle(Input::Message(raw.to_string()), NOW);

        assert!(state.collection().is_empty());
        assert_eq!(kinds(&state), vec![LogKind::Info]);
    }

    #[test]
    fn messages_ignored_unless_open() {
        let mut state = SyncState::new("items", ReconnectPolicy::default());
        let raw = json!({"action": "INSERT", "table": "items", "data": row(1, "A", 5)});
        state.handle(Input::Message(raw.to_string()), NOW);
        assert!(state.collection().is_empty());
        assert!(state.log().is_empty());
    }

    #[test]
    fn load_replaces_and_logs_count_once() {
        let mut state = open_state();
        let raw = json!({"action": "INSERT", "table": "items", "data": row(1, "A", 5)});
        state.handle(Input::Message(raw.to_string()), NOW);
        state.handle(Input::ClearLog, NOW);

        let records: Vec<Record> =
            serde_json::from_value(json!([row(3, "C", 3), row(2, "B", 2)])).unwrap();
        state.handle(Input::Loaded(records), NOW);

        assert_eq!(state.collection().ids(), vec![3, 2]);
        let entries = state.log_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "Loaded 2 items from database");
    }

    #[test]
    fn connection_logs_are_absorbed() {
        let mut state = SyncState::new("items", ReconnectPolicy::default());
        assert_eq!(state.handle(Input::Connect, NOW), vec![Effect::OpenSocket]);
        assert!(state.handle(Input::Opened, NOW).is_empty());
        assert!(state.is_connected());
        assert_eq!(
            state.log().last().map(|e| e.message.as_str()),
            Some("Connected to WebSocket")
        );
    }

    #[test]
    fn transport_error_logs_error_kind() {
        let mut state = SyncState::new("items", ReconnectPolicy::default());
        state.handle(Input::Connect, NOW);
        state.handle(Input::TransportError("refused".into()), NOW);
        let effects = state.handle(Input::Closed, NOW);

        assert!(kinds(&state).contains(&LogKind::Error));
        assert!(matches!(
            effects.as_slice(),
            [Effect::ScheduleRetry { attempt: 1, .. }]
        ));
        assert_eq!(
            state.connection_state(),
            ConnectionState::Reconnecting { attempt: 1 }
        );
    }

    #[test]
    fn note_appends_with_given_kind() {
        let mut state = SyncState::new("items", ReconnectPolicy::default());
        state.handle(
            Input::Note {
                kind: LogKind::Error,
                message: "Error creating item: 500".into(),
            },
            NOW,
        );
        assert_eq!(kinds(&state), vec![LogKind::Error]);
    }

    #[test]
    fn kind_follows_action() {
        let mut state = open_state();
        let update = json!({"action": "UPDATE", "table": "items", "data": row(1, "A", 6)});
        state.handle(Input::Message(update.to_string()), NOW);
        assert_eq!(kinds(&state), vec![LogKind::from(Action::Update)]);
    }
}
