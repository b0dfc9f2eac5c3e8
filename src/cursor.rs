use std::collections::VecDeque;

use crate::data_type::DataType;
use crate::engine::{Engine, ExecResult};
use crate::error::{DbError, DbResult};
use crate::table::Row;
use crate::value::Value;

/// A positional-fetch view over an [Engine], for adapter code that expects
/// a classic cursor: execute with `?` placeholders, then drain results with
/// `fetchone`/`fetchmany`/`fetchall`.
///
/// Placeholders are substituted into the SQL text before parsing; the
/// engine itself never sees parameter slots.
#[derive(Debug)]
pub struct Cursor<'db> {
    engine: &'db mut Engine,
    results: VecDeque<Row>,
    lastrowid: Option<i64>,
    rowcount: i64,
}

impl<'db> Cursor<'db> {
    pub fn new(engine: &'db mut Engine) -> Self {
        Self {
            engine,
            results: VecDeque::new(),
            lastrowid: None,
            rowcount: -1,
        }
    }

    /// Executes one statement, substituting each `?` with the matching
    /// parameter rendered as a SQL literal. Question marks inside string
    /// literals are left alone.
    ///
    /// # Errors
    /// Fails with an arity error when the placeholder count and parameter
    /// count differ, and surfaces every engine error.
    pub fn execute(&mut self, sql: &str, params: &[Value]) -> DbResult<()> {
        let sql = bind_params(sql, params)?;
        let result = self.engine.execute(&sql)?;

        self.results.clear();
        self.lastrowid = None;
        self.rowcount = -1;

        match result {
            ExecResult::Inserted(id) => {
                self.lastrowid = Some(id);
                self.rowcount = 1;
            }
            ExecResult::Updated(n) | ExecResult::Deleted(n) => {
                self.rowcount = n as i64;
            }
            ExecResult::Rows(rows) => {
                self.rowcount = rows.len() as i64;
                self.results = rows.into_iter().map(|(_, row)| row).collect();
            }
            ExecResult::Joined(rows) => {
                self.rowcount = rows.len() as i64;
                self.results = rows.into();
            }
            ExecResult::TableCreated(_)
            | ExecResult::TableDropped(_)
            | ExecResult::IndexCreated { .. } => {}
        }
        Ok(())
    }

    /// Takes the next pending result row, if any.
    pub fn fetchone(&mut self) -> Option<Row> {
        self.results.pop_front()
    }

    /// Takes up to `n` pending result rows.
    pub fn fetchmany(&mut self, n: usize) -> Vec<Row> {
        let n = n.min(self.results.len());
        self.results.drain(..n).collect()
    }

    /// Takes all pending result rows.
    pub fn fetchall(&mut self) -> Vec<Row> {
        self.results.drain(..).collect()
    }

    /// Row id assigned by the most recent INSERT, if the last statement
    /// was one.
    pub fn lastrowid(&self) -> Option<i64> {
        self.lastrowid
    }

    /// Rows affected or returned by the last statement; `-1` when the
    /// statement has no row count (DDL, or nothing executed yet).
    pub fn rowcount(&self) -> i64 {
        self.rowcount
    }

    /// Names of all tables, sorted.
    pub fn table_names(&self) -> Vec<String> {
        self.engine
            .database()
            .table_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Schema of one table as `(column name, type, nullable)` triples, in
    /// declaration order.
    ///
    /// # Errors
    /// Fails if the table does not exist.
    pub fn describe(&self, table: &str) -> DbResult<Vec<(String, DataType, bool)>> {
        Ok(self
            .engine
            .database()
            .table(table)?
            .columns()
            .iter()
            .map(|c| (c.name.clone(), c.data_type, c.nullable && !c.primary_key))
            .collect())
    }
}

/// Substitutes `?` placeholders with rendered literals, skipping any inside
/// single-quoted strings.
fn bind_params(sql: &str, params: &[Value]) -> DbResult<String> {
    let placeholders = count_placeholders(sql);
    if placeholders != params.len() {
        return Err(DbError::ArityMismatch {
            expected: placeholders,
            got: params.len(),
        });
    }
    if params.is_empty() {
        return Ok(sql.to_string());
    }

    let mut out = String::with_capacity(sql.len());
    let mut next = params.iter();
    let mut in_string = false;
    for ch in sql.chars() {
        match ch {
            '\'' => {
                in_string = !in_string;
                out.push(ch);
            }
            '?' if !in_string => {
                // Counted above, so a parameter is always available.
                out.push_str(&sql_literal(next.next().expect("param count checked")));
            }
            _ => out.push(ch),
        }
    }
    Ok(out)
}

fn count_placeholders(sql: &str) -> usize {
    let mut count = 0;
    let mut in_string = false;
    for ch in sql.chars() {
        match ch {
            '\'' => in_string = !in_string,
            '?' if !in_string => count += 1,
            _ => {}
        }
    }
    count
}

/// Renders a value as a SQL literal the tokenizer will read back as the
/// same value. Quotes in text are doubled; reals always carry a decimal
/// point so they stay REAL on re-parse.
fn sql_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Boolean(true) => "TRUE".to_string(),
        Value::Boolean(false) => "FALSE".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(r) => {
            let s = r.to_string();
            if s.contains('.') || s.contains('e') {
                s
            } else {
                format!("{s}.0")
            }
        }
        Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with_users() -> Engine {
        let mut engine = Engine::new();
        engine
            .execute("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, age INTEGER)")
            .unwrap();
        engine
    }

    #[test]
    fn test_execute_with_params_and_lastrowid() {
        let mut engine = engine_with_users();
        let mut cursor = Cursor::new(&mut engine);

        cursor
            .execute(
                "INSERT INTO users (name, age) VALUES (?, ?)",
                &[Value::Text("alice".into()), Value::Integer(30)],
            )
            .unwrap();
        assert_eq!(cursor.lastrowid(), Some(0));
        assert_eq!(cursor.rowcount(), 1);
    }

    #[test]
    fn test_fetch_interfaces() {
        let mut engine = engine_with_users();
        let mut cursor = Cursor::new(&mut engine);
        for (name, age) in [("a", 1), ("b", 2), ("c", 3)] {
            cursor
                .execute(
                    "INSERT INTO users (name, age) VALUES (?, ?)",
                    &[Value::Text(name.into()), Value::Integer(age)],
                )
                .unwrap();
        }

        cursor.execute("SELECT * FROM users", &[]).unwrap();
        assert_eq!(cursor.rowcount(), 3);

        let first = cursor.fetchone().unwrap();
        assert_eq!(first.get("name"), Some(&Value::Text("a".into())));

        let next_two = cursor.fetchmany(5);
        assert_eq!(next_two.len(), 2);
        assert!(cursor.fetchone().is_none());
        assert!(cursor.fetchall().is_empty());
    }

    #[test]
    fn test_param_arity_checked() {
        let mut engine = engine_with_users();
        let mut cursor = Cursor::new(&mut engine);

        let result = cursor.execute(
            "INSERT INTO users (name, age) VALUES (?, ?)",
            &[Value::Text("a".into())],
        );
        assert!(matches!(
            result,
            Err(DbError::ArityMismatch { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn test_question_mark_inside_string_is_literal() {
        let mut engine = engine_with_users();
        let mut cursor = Cursor::new(&mut engine);

        cursor
            .execute(
                "INSERT INTO users (name, age) VALUES ('why?', ?)",
                &[Value::Integer(1)],
            )
            .unwrap();

        cursor.execute("SELECT * FROM users", &[]).unwrap();
        let row = cursor.fetchone().unwrap();
        assert_eq!(row.get("name"), Some(&Value::Text("why?".into())));
    }

    #[test]
    fn test_text_param_with_quote_round_trips() {
        let mut engine = engine_with_users();
        let mut cursor = Cursor::new(&mut engine);

        cursor
            .execute(
                "INSERT INTO users (name) VALUES (?)",
                &[Value::Text("o'brien".into())],
            )
            .unwrap();

        cursor
            .execute(
                "SELECT * FROM users WHERE name = ?",
                &[Value::Text("o'brien".into())],
            )
            .unwrap();
        assert_eq!(cursor.rowcount(), 1);
    }

    #[test]
    fn test_sql_literal_rendering() {
        assert_eq!(sql_literal(&Value::Null), "NULL");
        assert_eq!(sql_literal(&Value::Boolean(true)), "TRUE");
        assert_eq!(sql_literal(&Value::Integer(-3)), "-3");
        assert_eq!(sql_literal(&Value::Real(2.5)), "2.5");
        // A whole-number real keeps its decimal point.
        assert_eq!(sql_literal(&Value::Real(3.0)), "3.0");
        assert_eq!(sql_literal(&Value::Text("it's".into())), "'it''s'");
    }

    #[test]
    fn test_rowcount_after_update_and_ddl() {
        let mut engine = engine_with_users();
        let mut cursor = Cursor::new(&mut engine);
        for age in [1, 2, 3] {
            cursor
                .execute(
                    "INSERT INTO users (name, age) VALUES ('x', ?)",
                    &[Value::Integer(age)],
                )
                .unwrap();
        }

        cursor
            .execute("UPDATE users SET age = ? WHERE age > ?", &[
                Value::Integer(9),
                Value::Integer(1),
            ])
            .unwrap();
        assert_eq!(cursor.rowcount(), 2);
        assert_eq!(cursor.lastrowid(), None);

        cursor.execute("CREATE INDEX ON users (age)", &[]).unwrap();
        assert_eq!(cursor.rowcount(), -1);
    }

    #[test]
    fn test_introspection() {
        let mut engine = engine_with_users();
        let cursor = Cursor::new(&mut engine);

        assert_eq!(cursor.table_names(), vec!["users".to_string()]);

        let schema = cursor.describe("users").unwrap();
        assert_eq!(
            schema,
            vec![
                ("id".to_string(), DataType::Integer, false),
                ("name".to_string(), DataType::Text, false),
                ("age".to_string(), DataType::Integer, true),
            ]
        );

        assert!(matches!(
            cursor.describe("ghosts"),
            Err(DbError::UnknownTable(_))
        ));
    }
}
