use std::fmt;
use std::path::{Path, PathBuf};

use crate::ast::{Delete, Insert, JoinClause, Select, Statement, Update};
use crate::database::Database;
use crate::error::{DbError, DbResult};
use crate::parser::Parser;
use crate::table::Row;
use crate::tokenizer::Tokenizer;

/// Outcome of a successfully executed statement.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecResult {
    TableCreated(String),
    TableDropped(String),
    Inserted(i64),
    Updated(usize),
    Deleted(usize),
    IndexCreated { table: String, column: String },
    /// Plain SELECT: `(row id, row)` pairs in ascending row id order.
    Rows(Vec<(i64, Row)>),
    /// JOIN SELECT: combined rows keyed by `table.column`.
    Joined(Vec<Row>),
}

fn write_row(f: &mut fmt::Formatter<'_>, row: &Row) -> fmt::Result {
    write!(f, "{{")?;
    for (i, (key, value)) in row.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{key}: {value}")?;
    }
    write!(f, "}}")
}

impl fmt::Display for ExecResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecResult::TableCreated(name) => write!(f, "Table {name} created"),
            ExecResult::TableDropped(name) => write!(f, "Table {name} dropped"),
            ExecResult::Inserted(id) => write!(f, "Inserted row with id {id}"),
            ExecResult::Updated(n) => write!(f, "Updated {n} rows"),
            ExecResult::Deleted(n) => write!(f, "Deleted {n} rows"),
            ExecResult::IndexCreated { table, column } => {
                write!(f, "Index created on {table}.{column}")
            }
            ExecResult::Rows(rows) => {
                if rows.is_empty() {
                    return write!(f, "No rows returned");
                }
                for (i, (row_id, row)) in rows.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "ID {row_id}: ")?;
                    write_row(f, row)?;
                }
                Ok(())
            }
            ExecResult::Joined(rows) => {
                if rows.is_empty() {
                    return write!(f, "No rows returned");
                }
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write_row(f, row)?;
                }
                Ok(())
            }
        }
    }
}

/// Top-level façade: parses SQL, routes to the database, and persists the
/// full state after every mutating statement.
///
/// # Example
/// ```
/// use simpledb::Engine;
///
/// let mut engine = Engine::new();
/// engine
///     .execute("CREATE TABLE tasks (id INTEGER PRIMARY KEY, title TEXT NOT NULL)")
///     .unwrap();
/// let result = engine
///     .execute("INSERT INTO tasks (title) VALUES ('write docs')")
///     .unwrap();
/// assert_eq!(result.to_string(), "Inserted row with id 0");
/// ```
#[derive(Debug, Default)]
pub struct Engine {
    database: Database,
    path: Option<PathBuf>,
}

impl Engine {
    /// Creates an in-memory engine with no backing file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens an engine backed by `path`, loading existing state if the file
    /// is present. Every mutating statement rewrites the file.
    ///
    /// # Errors
    /// Fails if the file exists but cannot be read or parsed.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref().to_path_buf();
        let database = Database::load(&path)?;
        Ok(Self {
            database,
            path: Some(path),
        })
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn database_mut(&mut self) -> &mut Database {
        &mut self.database
    }

    /// Parses and executes one statement.
    ///
    /// # Errors
    /// Surfaces any syntax, schema, constraint or I/O error. Mutations are
    /// persisted before returning; a persistence failure fails the command.
    pub fn execute(&mut self, sql: &str) -> DbResult<ExecResult> {
        let tokens = Tokenizer::new(sql).tokenize()?;
        let statement = Parser::new(tokens).parse()?;

        match statement {
            Statement::CreateTable(stmt) => {
                self.database.create_table(&stmt.name, stmt.columns)?;
                self.persist()?;
                Ok(ExecResult::TableCreated(stmt.name))
            }
            Statement::DropTable(stmt) => {
                self.database.drop_table(&stmt.name)?;
                self.persist()?;
                Ok(ExecResult::TableDropped(stmt.name))
            }
            Statement::CreateIndex(stmt) => {
                self.database.table_mut(&stmt.table)?.create_index(&stmt.column)?;
                self.persist()?;
                Ok(ExecResult::IndexCreated {
                    table: stmt.table,
                    column: stmt.column,
                })
            }
            Statement::Insert(stmt) => {
                let id = self.execute_insert(stmt)?;
                self.persist()?;
                Ok(ExecResult::Inserted(id))
            }
            Statement::Update(stmt) => {
                let count = self.execute_update(stmt)?;
                self.persist()?;
                Ok(ExecResult::Updated(count))
            }
            Statement::Delete(stmt) => {
                let count = self.execute_delete(stmt)?;
                self.persist()?;
                Ok(ExecResult::Deleted(count))
            }
            Statement::Select(stmt) => self.execute_select(stmt),
        }
    }

    fn execute_insert(&mut self, stmt: Insert) -> DbResult<i64> {
        let row: Row = stmt
            .columns
            .into_iter()
            .zip(stmt.values)
            .collect();
        self.database.table_mut(&stmt.table)?.insert(row)
    }

    fn execute_update(&mut self, stmt: Update) -> DbResult<usize> {
        let table = self.database.table_mut(&stmt.table)?;
        let matched: Vec<i64> = table
            .select(stmt.where_clause.as_ref())?
            .into_iter()
            .map(|(id, _)| id)
            .collect();

        let updates: Row = stmt.assignments.into_iter().collect();
        for row_id in &matched {
            table.update(*row_id, updates.clone())?;
        }
        Ok(matched.len())
    }

    fn execute_delete(&mut self, stmt: Delete) -> DbResult<usize> {
        let table = self.database.table_mut(&stmt.table)?;
        let matched: Vec<i64> = table
            .select(stmt.where_clause.as_ref())?
            .into_iter()
            .map(|(id, _)| id)
            .collect();

        for row_id in &matched {
            table.delete(*row_id)?;
        }
        Ok(matched.len())
    }

    fn execute_select(&self, stmt: Select) -> DbResult<ExecResult> {
        let left = self.database.table(&stmt.table)?;
        let left_rows = left.select(stmt.where_clause.as_ref())?;

        let Some(join) = stmt.join else {
            return Ok(ExecResult::Rows(left_rows));
        };

        let joined = self.execute_join(&stmt.table, left_rows, &join)?;
        Ok(ExecResult::Joined(joined))
    }

    /// Nested-loop equi-join. The WHERE clause has already filtered the
    /// left (FROM) table's rows; the ON condition may name the two tables
    /// in either order. NULL keys never match. Output keys are prefixed
    /// with their table name so column collisions stay unambiguous.
    fn execute_join(
        &self,
        left_table: &str,
        left_rows: Vec<(i64, Row)>,
        join: &JoinClause,
    ) -> DbResult<Vec<Row>> {
        let right_table = &join.table;

        let (left_col, right_col) = if join.left.table == left_table {
            (&join.left.column, &join.right.column)
        } else if join.right.table == left_table {
            (&join.right.column, &join.left.column)
        } else {
            return Err(DbError::Syntax(format!(
                "join condition references neither {left_table} nor {right_table}"
            )));
        };

        let right = self.database.table(right_table)?;
        let right_rows = right.select(None)?;

        let left_has_col = self
            .database
            .table(left_table)?
            .columns()
            .iter()
            .any(|c| &c.name == left_col);
        if !left_has_col {
            return Err(DbError::UnknownColumn(format!("{left_table}.{left_col}")));
        }
        if !right.columns().iter().any(|c| &c.name == right_col) {
            return Err(DbError::UnknownColumn(format!("{right_table}.{right_col}")));
        }

        let mut joined = Vec::new();
        for (_, left_row) in &left_rows {
            let key = &left_row[left_col.as_str()];
            if key.is_null() {
                continue;
            }
            for (_, right_row) in &right_rows {
                if right_row[right_col.as_str()] != *key {
                    continue;
                }
                let mut combined = Row::new();
                for (col, value) in left_row {
                    combined.insert(format!("{left_table}.{col}"), value.clone());
                }
                for (col, value) in right_row {
                    combined.insert(format!("{right_table}.{col}"), value.clone());
                }
                joined.push(combined);
            }
        }
        Ok(joined)
    }

    fn persist(&self) -> DbResult<()> {
        match &self.path {
            Some(path) => self.database.save(path),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn engine_with_tasks() -> Engine {
        let mut engine = Engine::new();
        engine
            .execute("CREATE TABLE tasks (id INTEGER PRIMARY KEY, title TEXT NOT NULL, priority INTEGER)")
            .unwrap();
        engine
            .execute("INSERT INTO tasks (title, priority) VALUES ('low', 1)")
            .unwrap();
        engine
            .execute("INSERT INTO tasks (title, priority) VALUES ('mid', 2)")
            .unwrap();
        engine
            .execute("INSERT INTO tasks (title, priority) VALUES ('high', 3)")
            .unwrap();
        engine
    }

    #[test]
    fn test_status_strings() {
        let mut engine = Engine::new();
        let result = engine
            .execute("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)")
            .unwrap();
        assert_eq!(result.to_string(), "Table t created");

        let result = engine
            .execute("INSERT INTO t (name) VALUES ('a')")
            .unwrap();
        assert_eq!(result.to_string(), "Inserted row with id 0");

        let result = engine
            .execute("UPDATE t SET name = 'b' WHERE id = 0")
            .unwrap();
        assert_eq!(result.to_string(), "Updated 1 rows");

        let result = engine.execute("CREATE INDEX ON t (name)").unwrap();
        assert_eq!(result.to_string(), "Index created on t.name");

        let result = engine.execute("DELETE FROM t").unwrap();
        assert_eq!(result.to_string(), "Deleted 1 rows");

        let result = engine.execute("DROP TABLE t").unwrap();
        assert_eq!(result.to_string(), "Table t dropped");
    }

    #[test]
    fn test_where_filtering() {
        let mut engine = engine_with_tasks();
        let result = engine
            .execute("SELECT * FROM tasks WHERE priority = 2")
            .unwrap();

        let ExecResult::Rows(rows) = result else {
            panic!("expected rows");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].1.get("title"), Some(&Value::Text("mid".into())));
    }

    #[test]
    fn test_select_all_in_id_order() {
        let mut engine = engine_with_tasks();
        let ExecResult::Rows(rows) = engine.execute("SELECT * FROM tasks").unwrap() else {
            panic!("expected rows");
        };
        let ids: Vec<i64> = rows.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_update_and_delete_with_where() {
        let mut engine = engine_with_tasks();

        let result = engine
            .execute("UPDATE tasks SET priority = 9 WHERE priority > 1")
            .unwrap();
        assert_eq!(result, ExecResult::Updated(2));

        let result = engine
            .execute("DELETE FROM tasks WHERE priority = 9")
            .unwrap();
        assert_eq!(result, ExecResult::Deleted(2));

        let ExecResult::Rows(rows) = engine.execute("SELECT * FROM tasks").unwrap() else {
            panic!("expected rows");
        };
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_join_matches_single_row() {
        let mut engine = Engine::new();
        engine
            .execute("CREATE TABLE projects (id INTEGER PRIMARY KEY, name TEXT)")
            .unwrap();
        engine
            .execute("CREATE TABLE tasks (id INTEGER PRIMARY KEY, project_id INTEGER)")
            .unwrap();
        engine
            .execute("INSERT INTO projects (id, name) VALUES (1, 'x')")
            .unwrap();
        engine
            .execute("INSERT INTO tasks (id, project_id) VALUES (10, 1)")
            .unwrap();
        engine
            .execute("INSERT INTO tasks (id, project_id) VALUES (11, 2)")
            .unwrap();

        let result = engine
            .execute("SELECT * FROM tasks JOIN projects ON tasks.project_id = projects.id")
            .unwrap();
        let ExecResult::Joined(rows) = result else {
            panic!("expected joined rows");
        };

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("tasks.id"), Some(&Value::Integer(10)));
        assert_eq!(rows[0].get("projects.name"), Some(&Value::Text("x".into())));
    }

    #[test]
    fn test_join_on_sides_in_either_order() {
        let mut engine = Engine::new();
        engine
            .execute("CREATE TABLE a (id INTEGER PRIMARY KEY)")
            .unwrap();
        engine
            .execute("CREATE TABLE b (id INTEGER PRIMARY KEY, a_id INTEGER)")
            .unwrap();
        engine.execute("INSERT INTO a (id) VALUES (1)").unwrap();
        engine
            .execute("INSERT INTO b (id, a_id) VALUES (7, 1)")
            .unwrap();

        let forward = engine
            .execute("SELECT * FROM b JOIN a ON b.a_id = a.id")
            .unwrap();
        let reversed = engine
            .execute("SELECT * FROM b JOIN a ON a.id = b.a_id")
            .unwrap();
        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_join_with_where_on_left_table() {
        let mut engine = Engine::new();
        engine
            .execute("CREATE TABLE a (id INTEGER PRIMARY KEY)")
            .unwrap();
        engine
            .execute("CREATE TABLE b (id INTEGER PRIMARY KEY, a_id INTEGER)")
            .unwrap();
        engine.execute("INSERT INTO a (id) VALUES (1)").unwrap();
        engine
            .execute("INSERT INTO b (id, a_id) VALUES (1, 1)")
            .unwrap();
        engine
            .execute("INSERT INTO b (id, a_id) VALUES (2, 1)")
            .unwrap();

        let result = engine
            .execute("SELECT * FROM b WHERE id = 2 JOIN a ON b.a_id = a.id")
            .unwrap();
        let ExecResult::Joined(rows) = result else {
            panic!("expected joined rows");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("b.id"), Some(&Value::Integer(2)));
    }

    #[test]
    fn test_join_null_keys_never_match() {
        let mut engine = Engine::new();
        engine
            .execute("CREATE TABLE a (id INTEGER PRIMARY KEY, tag TEXT)")
            .unwrap();
        engine
            .execute("CREATE TABLE b (id INTEGER PRIMARY KEY, tag TEXT)")
            .unwrap();
        engine
            .execute("INSERT INTO a (tag) VALUES (NULL)")
            .unwrap();
        engine
            .execute("INSERT INTO b (tag) VALUES (NULL)")
            .unwrap();

        let result = engine
            .execute("SELECT * FROM a JOIN b ON a.tag = b.tag")
            .unwrap();
        assert_eq!(result, ExecResult::Joined(vec![]));
    }

    #[test]
    fn test_join_errors() {
        let mut engine = Engine::new();
        engine
            .execute("CREATE TABLE a (id INTEGER PRIMARY KEY)")
            .unwrap();
        engine
            .execute("CREATE TABLE b (id INTEGER PRIMARY KEY)")
            .unwrap();

        let result = engine.execute("SELECT * FROM a JOIN b ON c.id = d.id");
        assert!(matches!(result, Err(DbError::Syntax(_))));

        let result = engine.execute("SELECT * FROM a JOIN b ON a.bogus = b.id");
        assert!(matches!(result, Err(DbError::UnknownColumn(_))));
    }

    #[test]
    fn test_unknown_table() {
        let mut engine = Engine::new();
        assert!(matches!(
            engine.execute("SELECT * FROM ghosts"),
            Err(DbError::UnknownTable(name)) if name == "ghosts"
        ));
    }

    #[test]
    fn test_duplicate_unique_reports_column() {
        let mut engine = Engine::new();
        engine
            .execute("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT UNIQUE)")
            .unwrap();
        engine
            .execute("INSERT INTO t (name) VALUES ('a')")
            .unwrap();

        let result = engine.execute("INSERT INTO t (id, name) VALUES (5, 'a')");
        assert!(matches!(result, Err(DbError::UniqueViolation(c)) if c == "name"));
    }

    #[test]
    fn test_write_through_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");

        let mut engine = Engine::open(&path).unwrap();
        engine
            .execute("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)")
            .unwrap();
        engine
            .execute("INSERT INTO t (name) VALUES ('persisted')")
            .unwrap();
        // Every mutation lands on disk without an explicit save call.
        assert!(path.exists());

        let mut reopened = Engine::open(&path).unwrap();
        let ExecResult::Rows(rows) = reopened.execute("SELECT * FROM t").unwrap() else {
            panic!("expected rows");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].1.get("name"),
            Some(&Value::Text("persisted".into()))
        );
    }

    #[test]
    fn test_render_rows() {
        let mut engine = Engine::new();
        engine
            .execute("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)")
            .unwrap();

        let result = engine.execute("SELECT * FROM t").unwrap();
        assert_eq!(result.to_string(), "No rows returned");

        engine
            .execute("INSERT INTO t (name) VALUES ('a')")
            .unwrap();
        let result = engine.execute("SELECT * FROM t").unwrap();
        assert_eq!(result.to_string(), "ID 0: {id: 0, name: a}");
    }
}
