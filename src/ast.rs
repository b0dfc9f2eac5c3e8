use std::cmp::Ordering;

use crate::column::Column;
use crate::error::{DbError, DbResult};
use crate::table::Row;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateTable(CreateTable),
    DropTable(DropTable),
    Insert(Insert),
    Select(Select),
    Update(Update),
    Delete(Delete),
    CreateIndex(CreateIndex),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    pub name: String,
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropTable {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: String,
    pub columns: Vec<String>,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub table: String,
    pub where_clause: Option<Expr>,
    pub join: Option<JoinClause>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub table: String,
    pub assignments: Vec<(String, Value)>,
    pub where_clause: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub table: String,
    pub where_clause: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndex {
    pub table: String,
    pub column: String,
}

/// A `<table>.<column>` reference, as written in an ON clause.
#[derive(Debug, Clone, PartialEq)]
pub struct QualifiedColumn {
    pub table: String,
    pub column: String,
}

/// `JOIN <table> ON <left> = <right>`. The two sides keep the order they
/// were written in; the engine orients them against the FROM table.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub table: String,
    pub left: QualifiedColumn,
    pub right: QualifiedColumn,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComparisonOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

/// A WHERE clause compiled into a small expression tree: comparisons of a
/// column against a literal, combined with AND/OR. Evaluated directly
/// against row values; nothing here ever executes as code.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Comparison {
        column: String,
        op: ComparisonOp,
        value: Value,
    },
    And {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Or {
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    /// Evaluates the expression against a single row.
    ///
    /// NULL compared to anything yields `false`. AND/OR short-circuit.
    ///
    /// # Errors
    /// Returns an error if a referenced column is missing from the row or
    /// if the compared types are incompatible.
    pub fn eval(&self, row: &Row) -> DbResult<bool> {
        match self {
            Expr::Comparison { column, op, value } => {
                let row_value = row
                    .get(column)
                    .ok_or_else(|| DbError::UnknownColumn(column.clone()))?;
                compare_values(column, row_value, *op, value)
            }
            Expr::And { left, right } => {
                if !left.eval(row)? {
                    return Ok(false);
                }
                right.eval(row)
            }
            Expr::Or { left, right } => {
                if left.eval(row)? {
                    return Ok(true);
                }
                right.eval(row)
            }
        }
    }
}

/// Compares a row value against a literal.
///
/// INTEGER and REAL compare numerically across each other; any other
/// cross-type comparison is an error.
fn compare_values(column: &str, left: &Value, op: ComparisonOp, right: &Value) -> DbResult<bool> {
    if left.is_null() || right.is_null() {
        return Ok(false);
    }

    let ordering = match (left, right) {
        (Value::Integer(l), Value::Integer(r)) => l.cmp(r),
        (Value::Real(l), Value::Real(r)) => l.total_cmp(r),
        (Value::Integer(l), Value::Real(r)) => (*l as f64).total_cmp(r),
        (Value::Real(l), Value::Integer(r)) => l.total_cmp(&(*r as f64)),
        (Value::Text(l), Value::Text(r)) => l.cmp(r),
        (Value::Boolean(l), Value::Boolean(r)) => l.cmp(r),
        _ => {
            return Err(DbError::TypeMismatch {
                column: column.to_string(),
                // non-null checked above
                expected: left.data_type().expect("non-null value has a type"),
                found: right.to_string(),
            });
        }
    };

    Ok(match op {
        ComparisonOp::Eq => ordering == Ordering::Equal,
        ComparisonOp::NotEq => ordering != Ordering::Equal,
        ComparisonOp::Lt => ordering == Ordering::Less,
        ComparisonOp::LtEq => ordering != Ordering::Greater,
        ComparisonOp::Gt => ordering == Ordering::Greater,
        ComparisonOp::GtEq => ordering != Ordering::Less,
    })
}
