use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::column::Column;
use crate::error::{DbError, DbResult};
use crate::table::Table;

/// A named collection of tables with JSON persistence.
///
/// The in-memory state is authoritative; [Database::save] snapshots it to
/// disk and [Database::load] restores it, rebuilding all derived index
/// state from the rows.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Database {
    tables: BTreeMap<String, Table>,
}

impl Database {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table.
    ///
    /// # Errors
    /// Fails if a table with the same name already exists or the column
    /// schema is invalid.
    pub fn create_table(&mut self, name: &str, columns: Vec<Column>) -> DbResult<()> {
        if self.tables.contains_key(name) {
            return Err(DbError::TableExists(name.to_string()));
        }
        let table = Table::new(name.to_string(), columns)?;
        self.tables.insert(name.to_string(), table);
        Ok(())
    }

    /// Removes a table and everything in it.
    ///
    /// # Errors
    /// Fails if the table does not exist.
    pub fn drop_table(&mut self, name: &str) -> DbResult<()> {
        self.tables
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| DbError::UnknownTable(name.to_string()))
    }

    /// Looks up a table by name.
    ///
    /// # Errors
    /// Fails if the table does not exist.
    pub fn table(&self, name: &str) -> DbResult<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| DbError::UnknownTable(name.to_string()))
    }

    /// Mutable variant of [Database::table].
    pub fn table_mut(&mut self, name: &str) -> DbResult<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| DbError::UnknownTable(name.to_string()))
    }

    /// Names of all tables, sorted.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    /// Writes the database to `path` as pretty-printed JSON.
    ///
    /// The snapshot goes to a temporary sibling file first and is renamed
    /// into place, so a crash mid-write never leaves a truncated file.
    ///
    /// # Errors
    /// Fails on serialization or I/O errors.
    pub fn save(&self, path: impl AsRef<Path>) -> DbResult<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;

        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Loads a database from `path`, rebuilding every table's indexes from
    /// its rows. A missing file yields an empty database, so first runs
    /// need no setup step.
    ///
    /// # Errors
    /// Fails with a corrupt-state error if the file exists but cannot be
    /// parsed, and with an I/O error if it cannot be read.
    pub fn load(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new());
        }

        let json = fs::read_to_string(path)?;
        let mut db: Database = serde_json::from_str(&json)?;
        for table in db.tables.values_mut() {
            table.rebuild_indexes();
        }
        Ok(db)
    }
}
