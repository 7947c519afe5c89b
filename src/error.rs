use thiserror::Error;

use crate::datatype::TypeTag;

#[derive(Error, Debug)]
pub enum TabulaError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Invalid delimiter: {0}")]
    InvalidDelimiter(String),
    #[error("An index needs at least one key field")]
    NoKeyFields,
    #[error("Key field not found in schema: {field}")]
    UnknownKeyField { field: String },
    #[error("Duplicate field name in schema: {field}")]
    DuplicateField { field: String },
    #[error("Record has {found} values but the schema has {expected} fields")]
    Arity { expected: usize, found: usize },
    #[error("Cannot convert {text:?} to {tag}")]
    Conversion { tag: TypeTag, text: String },
    /// For collections whose cursors can fail to open, such as file or database backed ones.
    #[error("Cursor error: {0}")]
    Cursor(String),
}

pub type Result<T> = std::result::Result<T, TabulaError>;

// Helper conversions
impl From<config::ConfigError> for TabulaError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
