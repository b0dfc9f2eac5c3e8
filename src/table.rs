use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::ast::Expr;
use crate::column::Column;
use crate::data_type::DataType;
use crate::error::{DbError, DbResult};
use crate::index::Index;
use crate::value::Value;

/// A stored row: column name mapped to its typed value. Every stored row's
/// key set exactly equals the table's column names.
pub type Row = BTreeMap<String, Value>;

/// A table: column schema, rows keyed by row id, secondary indexes and the
/// auto-increment counter.
///
/// Row ids are monotonic and never reused after a delete. Rows iterate in
/// ascending row id order, which is the select order.
#[derive(Debug, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    columns: Vec<Column>,
    #[serde(default)]
    rows: BTreeMap<i64, Row>,
    #[serde(default)]
    next_id: i64,
    /// Names of all indexed columns, including ones added via CREATE INDEX.
    /// Persisted so explicit indexes survive a reload; the index contents
    /// themselves are derived state, rebuilt by [Table::rebuild_indexes].
    #[serde(default)]
    indexed_columns: BTreeSet<String>,
    #[serde(skip)]
    indexes: HashMap<String, Index>,
}

impl Table {
    /// Creates an empty table, building an index for every primary-key or
    /// unique column up front.
    ///
    /// # Errors
    /// Fails with a schema error if more than one column is declared
    /// PRIMARY KEY.
    pub fn new(name: String, columns: Vec<Column>) -> DbResult<Self> {
        let pk_count = columns.iter().filter(|c| c.primary_key).count();
        if pk_count > 1 {
            return Err(DbError::Schema(format!(
                "table {name} declares {pk_count} primary key columns"
            )));
        }

        let indexed_columns: BTreeSet<String> = columns
            .iter()
            .filter(|c| c.is_indexed())
            .map(|c| c.name.clone())
            .collect();
        let indexes = indexed_columns
            .iter()
            .map(|name| (name.clone(), Index::new(name.clone())))
            .collect();

        Ok(Self {
            name,
            columns,
            rows: BTreeMap::new(),
            next_id: 0,
            indexed_columns,
            indexes,
        })
    }

    /// The table's column schema, in declaration order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    fn primary_key_column(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.primary_key)
    }

    /// Number of rows currently stored.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The next row id the auto-increment counter would assign.
    pub fn next_id(&self) -> i64 {
        self.next_id
    }

    /// The index over `column`, if one exists.
    pub fn index(&self, column: &str) -> Option<&Index> {
        self.indexes.get(column)
    }

    /// Validates a full row against the schema and returns the stored form:
    /// unknown columns rejected, missing columns filled with NULL, values
    /// type-checked (INTEGER accepted into REAL columns), not-null and
    /// uniqueness constraints enforced. `exclude` names a row id to skip in
    /// uniqueness checks, so an update never conflicts with itself.
    fn validate_row(&self, row: &Row, exclude: Option<i64>) -> DbResult<Row> {
        for key in row.keys() {
            if self.column(key).is_none() {
                return Err(DbError::UnknownColumn(key.clone()));
            }
        }

        let mut validated = Row::new();
        for col in &self.columns {
            let value = row.get(&col.name).cloned().unwrap_or(Value::Null);

            if value.is_null() {
                if !col.nullable || col.primary_key {
                    return Err(DbError::NullViolation(col.name.clone()));
                }
                validated.insert(col.name.clone(), Value::Null);
                continue;
            }

            let value = match (col.data_type, value) {
                (DataType::Integer, v @ Value::Integer(_)) => v,
                (DataType::Real, v @ Value::Real(_)) => v,
                (DataType::Real, Value::Integer(i)) => Value::Real(i as f64),
                (DataType::Text, v @ Value::Text(_)) => v,
                (DataType::Boolean, v @ Value::Boolean(_)) => v,
                (expected, v) => {
                    return Err(DbError::TypeMismatch {
                        column: col.name.clone(),
                        expected,
                        found: v.to_string(),
                    });
                }
            };

            if col.is_indexed() {
                if let Some(index) = self.indexes.get(&col.name) {
                    let mut existing = index.lookup(&value);
                    if let Some(row_id) = exclude {
                        existing.remove(&row_id);
                    }
                    if !existing.is_empty() {
                        return Err(DbError::UniqueViolation(col.name.clone()));
                    }
                }
            }

            validated.insert(col.name.clone(), value);
        }

        Ok(validated)
    }

    /// Inserts a row and returns its assigned row id.
    ///
    /// If the schema declares an INTEGER primary key and the input omits it
    /// (or supplies NULL), the auto-increment counter assigns the value and
    /// it doubles as the row id. An explicitly supplied primary key becomes
    /// the row id, and advances the counter past it when needed so future
    /// auto-assigned ids never collide.
    ///
    /// Validation happens before any mutation, so a failed insert leaves
    /// the table and its indexes untouched.
    pub fn insert(&mut self, row: Row) -> DbResult<i64> {
        let mut row = row;

        let (row_id, next_id) = match self.primary_key_column() {
            Some(pk) if pk.data_type == DataType::Integer => {
                match row.get(&pk.name) {
                    None | Some(Value::Null) => {
                        let id = self.next_id;
                        row.insert(pk.name.clone(), Value::Integer(id));
                        (id, id + 1)
                    }
                    Some(Value::Integer(v)) => {
                        let v = *v;
                        (v, if v >= self.next_id { v + 1 } else { self.next_id })
                    }
                    Some(other) => {
                        return Err(DbError::TypeMismatch {
                            column: pk.name.clone(),
                            expected: DataType::Integer,
                            found: other.to_string(),
                        });
                    }
                }
            }
            _ => (self.next_id, self.next_id + 1),
        };

        let validated = self.validate_row(&row, None)?;

        // An earlier update may have moved a primary-key value away from its
        // original row id, so the slot itself still needs to be free.
        if self.rows.contains_key(&row_id) {
            let column = self
                .primary_key_column()
                .map(|c| c.name.clone())
                .unwrap_or_else(|| "rowid".into());
            return Err(DbError::UniqueViolation(column));
        }

        self.next_id = next_id;
        for (col_name, index) in &mut self.indexes {
            if let Some(value) = validated.get(col_name)
                && !value.is_null()
            {
                index.add(value.clone(), row_id);
            }
        }
        self.rows.insert(row_id, validated);

        Ok(row_id)
    }

    /// Applies a partial update to one row, re-validating the merged row
    /// exactly like an insert (minus the self-conflict in uniqueness).
    /// Only indexes whose column appears in `updates` are touched: the old
    /// value's entry is removed and the new value's entry added.
    pub fn update(&mut self, row_id: i64, updates: Row) -> DbResult<()> {
        let old_row = self
            .rows
            .get(&row_id)
            .ok_or(DbError::RowNotFound(row_id))?
            .clone();

        let mut merged = old_row.clone();
        merged.extend(updates.iter().map(|(k, v)| (k.clone(), v.clone())));
        let validated = self.validate_row(&merged, Some(row_id))?;

        for (col_name, index) in &mut self.indexes {
            if !updates.contains_key(col_name) {
                continue;
            }
            if let Some(old) = old_row.get(col_name)
                && !old.is_null()
            {
                index.remove(old, row_id);
            }
            if let Some(new) = validated.get(col_name)
                && !new.is_null()
            {
                index.add(new.clone(), row_id);
            }
        }

        self.rows.insert(row_id, validated);
        Ok(())
    }

    /// Deletes one row, removing every index entry that references it.
    /// The row id is never reassigned afterwards.
    pub fn delete(&mut self, row_id: i64) -> DbResult<()> {
        let row = self
            .rows
            .remove(&row_id)
            .ok_or(DbError::RowNotFound(row_id))?;

        for (col_name, index) in &mut self.indexes {
            if let Some(value) = row.get(col_name)
                && !value.is_null()
            {
                index.remove(value, row_id);
            }
        }

        Ok(())
    }

    /// Returns copies of all rows matching `filter` (all rows if `None`),
    /// in ascending row id order.
    pub fn select(&self, filter: Option<&Expr>) -> DbResult<Vec<(i64, Row)>> {
        let mut results = Vec::new();
        for (row_id, row) in &self.rows {
            let included = match filter {
                Some(expr) => expr.eval(row)?,
                None => true,
            };
            if included {
                results.push((*row_id, row.clone()));
            }
        }
        Ok(results)
    }

    /// Builds an index over `column` by scanning all current rows.
    /// No-op if the column is already indexed.
    pub fn create_index(&mut self, column: &str) -> DbResult<()> {
        if self.column(column).is_none() {
            return Err(DbError::UnknownColumn(column.to_string()));
        }
        if self.indexes.contains_key(column) {
            return Ok(());
        }

        let mut index = Index::new(column);
        for (row_id, row) in &self.rows {
            if let Some(value) = row.get(column)
                && !value.is_null()
            {
                index.add(value.clone(), *row_id);
            }
        }
        self.indexed_columns.insert(column.to_string());
        self.indexes.insert(column.to_string(), index);
        Ok(())
    }

    /// Rebuilds every index from the current rows. Called after loading a
    /// persisted table, since index contents are never stored on disk.
    pub(crate) fn rebuild_indexes(&mut self) {
        for col in &self.columns {
            if col.is_indexed() {
                self.indexed_columns.insert(col.name.clone());
            }
        }

        self.indexes.clear();
        for col_name in &self.indexed_columns {
            let mut index = Index::new(col_name.clone());
            for (row_id, row) in &self.rows {
                if let Some(value) = row.get(col_name)
                    && !value.is_null()
                {
                    index.add(value.clone(), *row_id);
                }
            }
            self.indexes.insert(col_name.clone(), index);
        }
    }
}
