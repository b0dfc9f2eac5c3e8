pub mod ast;
pub mod column;
pub mod cursor;
pub mod data_type;
pub mod database;
pub mod engine;
pub mod error;
pub mod index;
pub mod parser;
pub mod table;
pub mod tokenizer;
pub mod value;

pub use column::Column;
pub use cursor::Cursor;
pub use data_type::DataType;
pub use database::Database;
pub use engine::{Engine, ExecResult};
pub use error::{DbError, DbResult};
pub use index::Index;
pub use table::{Row, Table};
pub use value::Value;
