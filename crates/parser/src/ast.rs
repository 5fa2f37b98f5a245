use common::{Condition, FieldList, TableSchema};
use types::Value;

/// A single parsed CLI command.
#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    CreateTable {
        table: String,
        schema: TableSchema,
    },
    DropTable {
        table: String,
    },
    /// Values are positional, matched against the target table's schema
    /// order at execution time (the grammar carries no field names).
    Insert {
        table: String,
        values: Vec<Value>,
    },
    Select {
        table: String,
        distinct: bool,
        projection: FieldList,
        condition: Condition,
    },
    Delete {
        table: String,
        condition: Condition,
    },
    Tables,
    Describe {
        table: String,
    },
    Quit,
}
