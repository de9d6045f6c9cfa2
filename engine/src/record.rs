//! Record types mirrored from the tracked table.

use crate::RecordId;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A row of the tracked table.
///
/// Field names follow the database columns (snake_case). Timestamps carry no
/// offset because the column type is `TIMESTAMP`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Primary key, stable for the lifetime of the row
    pub id: RecordId,
    /// Display name
    pub name: String,
    /// Numeric payload
    pub value: i64,
    /// When the row was inserted
    pub created_at: NaiveDateTime,
    /// When the row was last modified
    pub updated_at: NaiveDateTime,
}

impl Record {
    /// Create a record whose creation and update times coincide.
    pub fn new(id: RecordId, name: impl Into<String>, value: i64, at: NaiveDateTime) -> Self {
        Self {
            id,
            name: name.into(),
            value,
            created_at: at,
            updated_at: at,
        }
    }
}

/// Body of a create request: everything the database does not assign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    pub name: String,
    pub value: i64,
}

impl NewRecord {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_row_to_json_output() {
        // Shape produced by PostgreSQL row_to_json on the items table
        let raw = json!({
            "id": 7,
            "name": "Widget",
            "value": 42,
            "created_at": "2024-01-15T10:30:00.123456",
            "updated_at": "2024-01-15T10:31:00"
        });

        let record: Record = serde_json::from_value(raw).unwrap();
        assert_eq!(record.id, 7);
        assert_eq!(record.name, "Widget");
        assert_eq!(record.value, 42);
        assert!(record.created_at < record.updated_at);
    }

    #[test]
    fn new_sets_both_timestamps() {
        let at = NaiveDateTime::parse_from_str("2024-01-15 10:30:00", "%Y-%m-%d %H:%M:%S")
            .unwrap();
        let record = Record::new(1, "A", 5, at);
        assert_eq!(record.created_at, record.updated_at);
    }

    #[test]
    fn new_record_body_has_only_name_and_value() {
        let body = serde_json::to_value(NewRecord::new("A", 5)).unwrap();
        assert_eq!(body, json!({"name": "A", "value": 5}));
    }

    #[test]
    fn missing_timestamp_is_rejected() {
        let raw = json!({"id": 1, "name": "A", "value": 5});
        assert!(serde_json::from_value::<Record>(raw).is_err());
    }
}
