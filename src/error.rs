use thiserror::Error;

use crate::data_type::DataType;

pub type DbResult<T> = Result<T, DbError>;

/// Every failure the engine can surface. All errors are synchronous and
/// deterministic; nothing here is transient or worth retrying.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("table {0} does not exist")]
    UnknownTable(String),

    #[error("column {0} does not exist")]
    UnknownColumn(String),

    #[error("table {0} already exists")]
    TableExists(String),

    #[error("expected {expected} values, got {got}")]
    ArityMismatch { expected: usize, got: usize },

    #[error("type mismatch: column {column} is {expected}, got {found}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        found: String,
    },

    #[error("column {0} cannot be NULL")]
    NullViolation(String),

    #[error("duplicate value for unique column {0}")]
    UniqueViolation(String),

    #[error("no row with id {0}")]
    RowNotFound(i64),

    #[error("invalid schema: {0}")]
    Schema(String),

    #[error("corrupt database file: {0}")]
    CorruptState(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for DbError {
    fn from(e: serde_json::Error) -> Self {
        DbError::CorruptState(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            DbError::UnknownTable("users".into()).to_string(),
            "table users does not exist"
        );
        assert_eq!(
            DbError::ArityMismatch {
                expected: 3,
                got: 2
            }
            .to_string(),
            "expected 3 values, got 2"
        );
        assert_eq!(
            DbError::TypeMismatch {
                column: "age".into(),
                expected: DataType::Integer,
                found: "abc".into(),
            }
            .to_string(),
            "type mismatch: column age is INTEGER, got abc"
        );
    }

    #[test]
    fn test_json_errors_map_to_corrupt_state() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err();
        assert!(matches!(DbError::from(parse_err), DbError::CorruptState(_)));
    }
}
