#[cfg(test)]
mod tests;

pub mod pretty;

use serde::{Deserialize, Serialize};
use std::{io, path::PathBuf};
use thiserror::Error;
use types::{DataType, Value};

/// Number of fields a single table may declare.
pub const MAX_FIELDS_PER_TABLE: usize = 40;

/// Byte length cap (including the NUL terminator) for a field name.
pub const MAX_FIELD_NAME: usize = 20;

/// Logical page number within a page file. Page 0 is always the first page.
pub type PageNum = u32;

/// A single column declaration: bounded name plus its `DataType`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub data_type: DataType,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, data_type: DataType) -> EngineResult<Self> {
        let name = name.into();
        if name.is_empty() || name.len() >= MAX_FIELD_NAME {
            return Err(EngineError::SchemaMismatch(format!(
                "field name '{name}' must be 1..{} bytes",
                MAX_FIELD_NAME - 1
            )));
        }
        Ok(Self { name, data_type })
    }
}

/// Ordered sequence of field declarations; field order fixes the on-disk
/// record layout for every row in the table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    fields: Vec<FieldSpec>,
}

impl TableSchema {
    pub fn new(fields: Vec<FieldSpec>) -> EngineResult<Self> {
        if fields.is_empty() {
            return Err(EngineError::SchemaMismatch(
                "a table needs at least one field".into(),
            ));
        }
        if fields.len() > MAX_FIELDS_PER_TABLE {
            return Err(EngineError::SchemaMismatch(format!(
                "table declares {} fields, max is {MAX_FIELDS_PER_TABLE}",
                fields.len()
            )));
        }
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// One field's value within a record, tagged with its schema name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldValue {
    pub name: String,
    pub value: Value,
}

/// An ordered sequence of field values, position-matched against a
/// `TableSchema`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Record {
    pub fields: Vec<FieldValue>,
}

impl Record {
    pub fn new(fields: Vec<FieldValue>) -> Self {
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }
}

/// A materialized, ordered collection of records returned by `select`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResultSet {
    pub records: Vec<Record>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Comparison operator of a single-predicate `WHERE` clause.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    /// Apply the operator to the sign of `lhs - rhs` (in the comparison
    /// sense: negative, zero, positive).
    pub fn holds(self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match (self, ordering) {
            (CompareOp::Eq, Equal) => true,
            (CompareOp::Ne, Equal) => false,
            (CompareOp::Ne, _) => true,
            (CompareOp::Gt, Greater) => true,
            (CompareOp::Ge, Greater | Equal) => true,
            (CompareOp::Lt, Less) => true,
            (CompareOp::Le, Less | Equal) => true,
            _ => false,
        }
    }
}

/// A `select`/`delete` filter: either match every record, or compare one
/// named field against a literal. Replaces the source's sentinel
/// "empty field name" convention with an explicit tagged variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Condition {
    MatchAll,
    Compare {
        field: String,
        op: CompareOp,
        literal: Value,
    },
}

/// An ordered `SELECT` projection list. An empty list denotes `SELECT *`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldList {
    pub names: Vec<String>,
}

impl FieldList {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_all(&self) -> bool {
        self.names.is_empty()
    }
}

impl From<Vec<String>> for FieldList {
    fn from(names: Vec<String>) -> Self {
        Self { names }
    }
}

/// Canonical error type shared across the engine's subsystems.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("out of space: {0}")]
    OutOfSpace(String),
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),
    #[error("buffer pool exhausted: {0}")]
    Exhausted(String),
    #[error("parse error: {0}")]
    Parser(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result alias that carries an `EngineError`.
pub type EngineResult<T> = Result<T, EngineError>;

/// Runtime configuration for the engine.
///
/// # Example
/// ```
/// use common::EngineConfig;
/// use std::path::PathBuf;
///
/// let config = EngineConfig::builder()
///     .data_dir(PathBuf::from("./my_db"))
///     .num_buffers(8)
///     .build();
/// ```
#[derive(Clone, Debug, Serialize, Deserialize, bon::Builder)]
pub struct EngineConfig {
    /// Directory where table `.def`/`.dat` files live.
    #[builder(default = PathBuf::from("./db_data"))]
    pub data_dir: PathBuf,
    /// Number of pages the buffer pool keeps resident (the source's
    /// `NUM_BUFFER`). `page_size` is intentionally not configurable: it is
    /// baked into the on-disk slotted-page format.
    #[builder(default = 4)]
    pub num_buffers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./db_data"),
            num_buffers: 4,
        }
    }
}

/// Convenient re-exports for downstream crates.
pub mod prelude {
    pub use crate::{
        CompareOp, Condition, EngineConfig, EngineError, EngineResult, FieldList, FieldSpec,
        FieldValue, Record, ResultSet, TableSchema,
    };
    pub use types::{DataType, Value};
}
