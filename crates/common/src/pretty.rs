use crate::{EngineError, ResultSet};
use tabled::{Table, Tabled, builder::Builder, settings};
use types::Value;

/// Predefined output styles that map to `tabled` styles.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TableStyleKind {
    #[default]
    Modern,
    Ascii,
    Plain,
}

impl TableStyleKind {
    fn apply(self, table: &mut Table) {
        match self {
            Self::Modern => table.with(settings::Style::modern()),
            Self::Ascii => table.with(settings::Style::ascii()),
            Self::Plain => table.with(settings::Style::empty()),
        };
    }
}

/// Render a `ResultSet` into a human-friendly table string.
///
/// `columns` names the projected fields in schema order; the record
/// manager knows projection order, the pretty printer only knows how to
/// lay text out.
pub fn render_result_set(columns: &[String], result: &ResultSet, style: TableStyleKind) -> String {
    if columns.is_empty() {
        return "<empty>".into();
    }

    let mut builder = Builder::default();
    builder.push_record(columns.iter().cloned());

    for record in &result.records {
        builder.push_record(record.fields.iter().map(|f| format_value(&f.value)));
    }

    let mut table = builder.build();
    style.apply(&mut table);
    table.to_string()
}

/// Render arbitrary string rows with the provided style.
pub fn render_string_table(
    headers: &[&str],
    rows: Vec<Vec<String>>,
    style: TableStyleKind,
) -> String {
    if headers.is_empty() && rows.is_empty() {
        return "<empty>".into();
    }

    let mut builder = Builder::default();

    if !headers.is_empty() {
        builder.push_record(headers.iter().copied());
    }

    for row in rows {
        builder.push_record(row);
    }

    let mut table = builder.build();
    style.apply(&mut table);
    table.to_string()
}

/// Render any `Tabled` rows with the provided style.
pub fn render_structured_rows<T>(rows: &[T], style: TableStyleKind) -> String
where
    T: Tabled + Clone,
{
    if rows.is_empty() {
        return "<empty>".into();
    }

    let mut table = Table::new(rows.to_vec());
    style.apply(&mut table);
    table.to_string()
}

/// Format a single value for display.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Int(v) => v.to_string(),
        Value::Text(text) => text.clone(),
    }
}

/// Translate an `EngineError` into the one fixed, human-readable sentence
/// the CLI shows the user, rather than a raw Debug dump.
pub fn error_message(err: &EngineError) -> String {
    match err {
        EngineError::NotFound(what) => format!("no such table: {what}"),
        EngineError::Decode(detail) => format!("the table's data is corrupt: {detail}"),
        EngineError::OutOfSpace(detail) => format!("record too large to store: {detail}"),
        EngineError::SchemaMismatch(detail) => {
            format!("does not match the table schema: {detail}")
        }
        EngineError::Exhausted(detail) => format!("internal buffer pool error: {detail}"),
        EngineError::Parser(detail) => format!("could not understand the command: {detail}"),
        EngineError::Io(e) => format!("I/O error: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FieldValue, Record};

    #[test]
    fn result_set_with_columns_renders_headers() {
        let mut result = ResultSet::new();
        result.push(Record::new(vec![
            FieldValue {
                name: "id".into(),
                value: Value::Int(1),
            },
            FieldValue {
                name: "name".into(),
                value: Value::Text("Ada".into()),
            },
        ]));

        let rendered = render_result_set(
            &["id".into(), "name".into()],
            &result,
            TableStyleKind::Modern,
        );
        assert!(rendered.contains("id"));
        assert!(rendered.contains("Ada"));
    }

    #[test]
    fn empty_projection_renders_placeholder() {
        let result = ResultSet::new();
        assert_eq!(
            render_result_set(&[], &result, TableStyleKind::Plain),
            "<empty>"
        );
    }

    #[test]
    fn error_messages_are_fixed_sentences() {
        let msg = error_message(&EngineError::NotFound("widgets".into()));
        assert_eq!(msg, "no such table: widgets");
    }
}
