use std::fmt;

use serde::{Deserialize, Serialize};

/// Represents the supported data types in the database schema.
/// These types define the structure of columns and the expected format of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataType {
    /// A 64-bit signed integer.
    Integer,
    /// A variable-length UTF-8 character string.
    Text,
    /// A 64-bit floating-point number.
    Real,
    /// A boolean value (true or false).
    Boolean,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Integer => "INTEGER",
            DataType::Text => "TEXT",
            DataType::Real => "REAL",
            DataType::Boolean => "BOOLEAN",
        };
        f.write_str(name)
    }
}
