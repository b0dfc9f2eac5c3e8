use serde::{Deserialize, Serialize};

use crate::data_type::DataType;

/// A single column definition in a table schema.
///
/// A `primary_key` or `unique` column implicitly owns an index keyed by that
/// column's value; the table keeps it consistent on every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl Column {
    /// Creates a plain nullable column with no constraints.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            primary_key: false,
            unique: false,
            nullable: true,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// True for columns that own an index from table creation on
    /// (uniqueness is enforced through that index).
    pub fn is_indexed(&self) -> bool {
        self.primary_key || self.unique
    }
}
