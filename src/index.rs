use std::collections::{BTreeMap, BTreeSet};

use crate::value::Value;

/// A secondary index over one column: maps a column value to the set of row
/// ids currently holding it.
///
/// Indexes are derived state. They are never persisted; the table rebuilds
/// them from its rows after a load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Index {
    column: String,
    map: BTreeMap<Value, BTreeSet<i64>>,
}

impl Index {
    /// Creates an empty index for the given column.
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            map: BTreeMap::new(),
        }
    }

    /// The name of the column this index covers.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Inserts `row_id` into the bucket for `value`, creating the bucket if
    /// absent. Idempotent if the entry is already present.
    pub fn add(&mut self, value: Value, row_id: i64) {
        self.map.entry(value).or_default().insert(row_id);
    }

    /// Removes `row_id` from `value`'s bucket, pruning the bucket if it
    /// becomes empty. No-op if the value or row id is absent.
    pub fn remove(&mut self, value: &Value, row_id: i64) {
        if let Some(bucket) = self.map.get_mut(value) {
            bucket.remove(&row_id);
            if bucket.is_empty() {
                self.map.remove(value);
            }
        }
    }

    /// Returns a copy of the bucket for `value`, or an empty set if none.
    /// The copy keeps callers from corrupting internal state.
    pub fn lookup(&self, value: &Value) -> BTreeSet<i64> {
        self.map.get(value).cloned().unwrap_or_default()
    }

    /// Number of distinct values currently indexed.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_lookup() {
        let mut index = Index::new("name");
        index.add(Value::Text("alice".into()), 0);
        index.add(Value::Text("alice".into()), 2);
        index.add(Value::Text("bob".into()), 1);

        let bucket = index.lookup(&Value::Text("alice".into()));
        assert_eq!(bucket.into_iter().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(index.lookup(&Value::Text("carol".into())).len(), 0);
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut index = Index::new("n");
        index.add(Value::Integer(1), 5);
        index.add(Value::Integer(1), 5);
        assert_eq!(index.lookup(&Value::Integer(1)).len(), 1);
    }

    #[test]
    fn test_remove_prunes_empty_buckets() {
        let mut index = Index::new("n");
        index.add(Value::Integer(1), 5);
        assert_eq!(index.len(), 1);

        index.remove(&Value::Integer(1), 5);
        assert_eq!(index.len(), 0);
        assert!(index.is_empty());
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut index = Index::new("n");
        index.add(Value::Integer(1), 5);

        index.remove(&Value::Integer(2), 5);
        index.remove(&Value::Integer(1), 99);
        assert_eq!(index.lookup(&Value::Integer(1)).len(), 1);
    }

    #[test]
    fn test_lookup_returns_a_copy() {
        let mut index = Index::new("n");
        index.add(Value::Integer(1), 5);

        let mut bucket = index.lookup(&Value::Integer(1));
        bucket.clear();
        assert_eq!(index.lookup(&Value::Integer(1)).len(), 1);
    }
}
