//! Collection - the ordered, keyed list of records shown to the user.
//!
//! Records are kept newest-insert-first. At most one record exists per id;
//! every mutation path below preserves that.

use crate::{Change, Record, RecordId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Ordered records, unique by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection {
    records: Vec<Record>,
}

impl Collection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Build a collection from a full listing (the refresh path).
    ///
    /// Order is kept as given. If the listing repeats an id, the first
    /// occurrence wins.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut seen = HashSet::new();
        let records = records
            .into_iter()
            .filter(|r| seen.insert(r.id))
            .collect();
        Self { records }
    }

    /// Replace the whole contents with a fresh listing.
    pub fn replace_all(&mut self, records: impl IntoIterator<Item = Record>) {
        *self = Self::from_records(records);
    }

    /// Apply a change event, returning the new collection.
    ///
    /// - Insert prepends; an existing entry with the same id is removed first
    ///   (last write wins, position moves to the front).
    /// - Update replaces in place; absent id is a no-op.
    /// - Delete removes; absent id is a no-op.
    pub fn apply(mut self, change: &Change) -> Self {
        match change {
            Change::Insert(record) => {
                self.records.retain(|r| r.id != record.id);
                self.records.insert(0, record.clone());
            }
            Change::Update(record) => {
                if let Some(slot) = self.records.iter_mut().find(|r| r.id == record.id) {
                    *slot = record.clone();
                }
            }
            Change::Delete(id) => {
                self.records.retain(|r| r.id != *id);
            }
        }
        self
    }

    /// Get a record by id.
    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[Record] {
        &self.records
    }

    /// Ids in display order.
    pub fn ids(&self) -> Vec<RecordId> {
        self.records.iter().map(|r| r.id).collect()
    }
}

impl FromIterator<Record> for Collection {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self::from_records(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn ts(sec: u32) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("2024-01-15 10:30:{:02}", sec), "%Y-%m-%d %H:%M:%S")
            .unwrap()
    }

    fn rec(id: RecordId, name: &str, value: i64) -> Record {
        Record::new(id, name, value, ts(0))
    }

    #[test]
    fn insert_prepends() {
        let collection = Collection::new()
            .apply(&Change::Insert(rec(1, "A", 1)))
            .apply(&Change::Insert(rec(2, "B", 2)));

        assert_eq!(collection.ids(), vec![2, 1]);
    }

    #[test]
    fn duplicate_insert_replaces_and_moves_to_front() {
        let collection = Collection::new()
            .apply(&Change::Insert(rec(1, "A", 1)))
            .apply(&Change::Insert(rec(2, "B", 2)))
            .apply(&Change::Insert(rec(1, "A2", 10)));

        assert_eq!(collection.ids(), vec![1, 2]);
        assert_eq!(collection.get(1).unwrap().name, "A2");
        assert_eq!(collection.get(1).unwrap().value, 10);
    }

    #[test]
    fn update_keeps_position() {
        let mut updated = rec(1, "A", 99);
        updated.updated_at = ts(30);

        let collection = Collection::new()
            .apply(&Change::Insert(rec(1, "A", 1)))
            .apply(&Change::Insert(rec(2, "B", 2)))
            .apply(&Change::Update(updated.clone()));

        assert_eq!(collection.ids(), vec![2, 1]);
        assert_eq!(collection.get(1), Some(&updated));
    }

    #[test]
    fn update_of_absent_id_is_noop() {
        let before = Collection::new().apply(&Change::Insert(rec(1, "A", 1)));
        let after = before.clone().apply(&Change::Update(rec(5, "X", 0)));
        assert_eq!(before, after);
    }

    #[test]
    fn delete_removes() {
        let collection = Collection::new()
            .apply(&Change::Insert(rec(1, "A", 1)))
            .apply(&Change::Delete(1));
        assert!(collection.is_empty());
    }

    #[test]
    fn delete_of_absent_id_is_noop() {
        let before = Collection::new().apply(&Change::Insert(rec(1, "A", 1)));
        let after = before.clone().apply(&Change::Delete(2));
        assert_eq!(before, after);
    }

    #[test]
    fn from_records_drops_later_duplicates() {
        let collection = Collection::from_records(vec![rec(3, "C", 3), rec(1, "A", 1), rec(3, "C'", 0)]);
        assert_eq!(collection.ids(), vec![3, 1]);
        assert_eq!(collection.get(3).unwrap().name, "C");
    }

    #[test]
    fn replace_all_discards_previous_contents() {
        let mut collection = Collection::new().apply(&Change::Insert(rec(1, "A", 1)));
        collection.replace_all(vec![rec(7, "G", 7), rec(8, "H", 8)]);
        assert_eq!(collection.ids(), vec![7, 8]);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_change() -> impl Strategy<Value = Change> {
            let id = 0i64..8;
            prop_oneof![
                (id.clone(), any::<i64>()).prop_map(|(id, v)| Change::Insert(rec(id, "ins", v))),
                (id.clone(), any::<i64>()).prop_map(|(id, v)| Change::Update(rec(id, "upd", v))),
                id.prop_map(Change::Delete),
            ]
        }

        proptest! {
            #[test]
            fn prop_ids_stay_unique(changes in prop::collection::vec(arb_change(), 0..64)) {
                let collection = changes
                    .iter()
                    .fold(Collection::new(), |c, change| c.apply(change));

                let ids = collection.ids();
                let unique: HashSet<_> = ids.iter().copied().collect();
                prop_assert_eq!(ids.len(), unique.len());
            }

            #[test]
            fn prop_insert_is_idempotent(
                changes in prop::collection::vec(arb_change(), 0..32),
                id in 0i64..8,
                value in any::<i64>(),
            ) {
                let base = changes
                    .iter()
                    .fold(Collection::new(), |c, change| c.apply(change));
                let insert = Change::Insert(rec(id, "again", value));

                let once = base.clone().apply(&insert);
                let twice = once.clone().apply(&insert);
                prop_assert_eq!(once, twice);
            }

            #[test]
            fn prop_absent_update_and_delete_are_noops(
                changes in prop::collection::vec(arb_change(), 0..32),
                value in any::<i64>(),
            ) {
                let base = changes
                    .iter()
                    .fold(Collection::new(), |c, change| c.apply(change));
                // Generated ids never reach 100
                let absent = 100;

                prop_assert_eq!(&base.clone().apply(&Change::Update(rec(absent, "x", value))), &base);
                prop_assert_eq!(&base.clone().apply(&Change::Delete(absent)), &base);
            }
        }
    }
}
