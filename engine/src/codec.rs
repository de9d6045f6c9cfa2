//! Notification codec.
//!
//! Turns the text payload of one socket message into a typed [`ChangeEvent`].
//! The wire format is the JSON object published by the database trigger:
//!
//! ```json
//! {"action": "INSERT", "table": "items", "id": 1, "data": {"id": 1, "name": "A", ...}}
//! ```
//!
//! `data` is required for `INSERT` and `UPDATE`; `id` is required for `DELETE`.

use crate::error::{DecodeError, Result};
use crate::{Record, RecordId, TableName};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of row change carried by a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Insert,
    Update,
    Delete,
}

impl Action {
    /// Wire spelling of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Insert => "INSERT",
            Action::Update => "UPDATE",
            Action::Delete => "DELETE",
        }
    }

    fn parse(raw: &str) -> Result<Self> {
        match raw {
            "INSERT" => Ok(Action::Insert),
            "UPDATE" => Ok(Action::Update),
            "DELETE" => Ok(Action::Delete),
            other => Err(DecodeError::UnknownAction(other.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The change itself, independent of which table it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Insert(Record),
    Update(Record),
    Delete(RecordId),
}

impl Change {
    pub fn action(&self) -> Action {
        match self {
            Change::Insert(_) => Action::Insert,
            Change::Update(_) => Action::Update,
            Change::Delete(_) => Action::Delete,
        }
    }

    /// Id of the affected record.
    pub fn record_id(&self) -> RecordId {
        match self {
            Change::Insert(record) | Change::Update(record) => record.id,
            Change::Delete(id) => *id,
        }
    }
}

/// A decoded notification, scoped to its source table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: TableName,
    pub change: Change,
}

impl ChangeEvent {
    pub fn new(table: impl Into<TableName>, change: Change) -> Self {
        Self {
            table: table.into(),
            change,
        }
    }

    pub fn action(&self) -> Action {
        self.change.action()
    }

    /// Short human-readable description used in the event log.
    pub fn summary(&self) -> String {
        match &self.change {
            Change::Insert(record) | Change::Update(record) => format!(
                "{} {} #{}: {} = {}",
                self.action(),
                self.table,
                record.id,
                record.name,
                record.value
            ),
            Change::Delete(id) => format!("{} {} #{}", self.action(), self.table, id),
        }
    }

    /// Wire form of this event.
    pub fn to_notification(&self) -> Notification {
        let (data, id) = match &self.change {
            Change::Insert(record) | Change::Update(record) => (Some(record.clone()), record.id),
            Change::Delete(id) => (None, *id),
        };

        Notification {
            action: self.action(),
            table: self.table.clone(),
            data,
            id: Some(id),
        }
    }
}

/// Wire representation of a change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub action: Action,
    pub table: TableName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
}

impl Notification {
    /// Serialize to the JSON text sent over the socket.
    pub fn encode(&self) -> String {
        // Only strings, integers and formatted timestamps: cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Loosely typed envelope so the action can be checked before the payload.
#[derive(Deserialize)]
struct Envelope {
    action: String,
    table: TableName,
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    id: Option<serde_json::Value>,
}

/// Decode the text of one inbound socket message.
pub fn decode(raw: &str) -> Result<ChangeEvent> {
    let envelope: Envelope =
        serde_json::from_str(raw).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    let action = Action::parse(&envelope.action)?;

    let change = match action {
        Action::Insert => Change::Insert(required_record(action, envelope.data)?),
        Action::Update => Change::Update(required_record(action, envelope.data)?),
        Action::Delete => Change::Delete(delete_target(envelope.id, envelope.data)?),
    };

    Ok(ChangeEvent {
        table: envelope.table,
        change,
    })
}

fn required_record(action: Action, data: Option<serde_json::Value>) -> Result<Record> {
    let data = data.ok_or(DecodeError::MissingField {
        action: action.as_str(),
        field: "data",
    })?;
    serde_json::from_value(data).map_err(|e| DecodeError::Malformed(format!("data: {}", e)))
}

/// The trigger sends both `id` and the old row; prefer `id`, fall back to `data.id`.
fn delete_target(
    id: Option<serde_json::Value>,
    data: Option<serde_json::Value>,
) -> Result<RecordId> {
    if let Some(id) = id {
        return serde_json::from_value(id).map_err(|e| DecodeError::Malformed(format!("id: {}", e)));
    }

    data.as_ref()
        .and_then(|d| d.get("id"))
        .and_then(serde_json::Value::as_i64)
        .ok_or(DecodeError::MissingField {
            action: Action::Delete.as_str(),
            field: "id",
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use serde_json::json;

    fn ts() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2024-01-15 10:30:00", "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn row(id: RecordId, name: &str, value: i64) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "value": value,
            "created_at": "2024-01-15T10:30:00",
            "updated_at": "2024-01-15T10:30:00"
        })
    }

    #[test]
    fn decode_insert() {
        let raw = json!({"action": "INSERT", "table": "items", "data": row(1, "A", 5)}).to_string();
        let event = decode(&raw).unwrap();

        assert_eq!(event.table, "items");
        assert_eq!(event.action(), Action::Insert);
        assert_eq!(event.change, Change::Insert(Record::new(1, "A", 5, ts())));
    }

    #[test]
    fn decode_update() {
        let raw = json!({"action": "UPDATE", "table": "items", "id": 3, "data": row(3, "B", 9)})
            .to_string();
        let event = decode(&raw).unwrap();
        assert!(matches!(event.change, Change::Update(ref r) if r.id == 3 && r.value == 9));
    }

    #[test]
    fn decode_delete_by_id() {
        let event = decode(r#"{"action":"DELETE","table":"items","id":1}"#).unwrap();
        assert_eq!(event.change, Change::Delete(1));
    }

    #[test]
    fn decode_delete_falls_back_to_data_id() {
        let raw = json!({"action": "DELETE", "table": "items", "data": row(4, "C", 1)}).to_string();
        assert_eq!(decode(&raw).unwrap().change, Change::Delete(4));
    }

    #[test]
    fn not_json_is_malformed() {
        assert!(matches!(decode("not json"), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn non_object_is_malformed() {
        assert!(matches!(decode("[1, 2, 3]"), Err(DecodeError::Malformed(_))));
        assert!(matches!(decode("42"), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn unknown_action() {
        let err = decode(r#"{"action":"TRUNCATE","table":"items"}"#).unwrap_err();
        assert_eq!(err, DecodeError::UnknownAction("TRUNCATE".into()));

        // Actions are case sensitive on the wire
        let err = decode(r#"{"action":"insert","table":"items"}"#).unwrap_err();
        assert_eq!(err, DecodeError::UnknownAction("insert".into()));
    }

    #[test]
    fn insert_without_data() {
        let err = decode(r#"{"action":"INSERT","table":"items","id":1}"#).unwrap_err();
        assert_eq!(
            err,
            DecodeError::MissingField {
                action: "INSERT",
                field: "data"
            }
        );
    }

    #[test]
    fn delete_without_id() {
        let err = decode(r#"{"action":"DELETE","table":"items"}"#).unwrap_err();
        assert_eq!(
            err,
            DecodeError::MissingField {
                action: "DELETE",
                field: "id"
            }
        );
    }

    #[test]
    fn data_with_wrong_shape_is_malformed() {
        let err = decode(r#"{"action":"UPDATE","table":"items","data":{"id":"x"}}"#).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn missing_table_is_malformed() {
        assert!(matches!(
            decode(r#"{"action":"DELETE","id":1}"#),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn encode_then_decode_matches() {
        let event = ChangeEvent::new("items", Change::Update(Record::new(2, "Z", -3, ts())));
        let text = event.to_notification().encode();
        assert!(text.contains(r#""action":"UPDATE""#));
        assert_eq!(decode(&text).unwrap(), event);
    }

    #[test]
    fn summary_mentions_action_and_id() {
        let event = ChangeEvent::new("items", Change::Delete(9));
        assert_eq!(event.summary(), "DELETE items #9");

        let event = ChangeEvent::new("items", Change::Insert(Record::new(1, "A", 5, ts())));
        assert_eq!(event.summary(), "INSERT items #1: A = 5");
    }
}
