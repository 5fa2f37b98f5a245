//! Interactive and one-shot command-line front end for the storage engine.
//!
//! A thin adapter: it tokenizes/parses a line with `parser`, dispatches the
//! resulting `Statement` against an `engine::Engine`, and renders the
//! outcome with `common::pretty`. No query logic lives here.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser as ClapParser;
use common::{EngineConfig, EngineError, FieldList, FieldValue, Record, pretty};
use engine::Engine;
use parser::Statement;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use types::DataType;

#[derive(ClapParser, Debug)]
#[command(name = "microdb", about = "A small slotted-page storage engine")]
struct Args {
    /// Directory holding table .def/.dat files.
    #[arg(long, default_value = "./db_data")]
    data_dir: PathBuf,

    /// Execute a single command and exit instead of starting the REPL.
    #[arg(short = 'e', long)]
    execute: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = EngineConfig::builder().data_dir(args.data_dir).build();
    let mut engine = Engine::new(config)?;

    if let Some(command) = args.execute {
        run_line(&mut engine, &command);
        engine.close()?;
        return Ok(());
    }

    interactive_loop(&mut engine)?;
    engine.close()?;
    Ok(())
}

/// Parse and execute one line, printing its result or error. Never returns
/// an error itself: a bad command ends the line, not the session.
fn run_line(engine: &mut Engine, line: &str) -> bool {
    let line = line.trim();
    if line.is_empty() {
        return true;
    }

    let statement = match parser::parse(line) {
        Ok(stmt) => stmt,
        Err(err) => {
            eprintln!("Error: {}", pretty::error_message(&err));
            return true;
        }
    };

    if matches!(statement, Statement::Quit) {
        return false;
    }

    match execute(engine, statement) {
        Ok(()) => {}
        Err(err) => eprintln!("Error: {}", pretty::error_message(&err)),
    }
    true
}

fn execute(engine: &mut Engine, statement: Statement) -> common::EngineResult<()> {
    match statement {
        Statement::CreateTable { table, schema } => {
            engine.create_table(&table, schema)?;
            println!("table '{table}' created");
        }
        Statement::DropTable { table } => {
            engine.drop_table(&table)?;
            println!("table '{table}' dropped");
        }
        Statement::Insert { table, values } => {
            let schema = engine.table_info(&table)?;
            let record = build_record(&schema, values)?;
            engine.insert(&table, &record)?;
            println!("1 row inserted");
        }
        Statement::Select { table, distinct, projection, condition } => {
            let schema = engine.table_info(&table)?;
            let result = engine.select(&table, &projection, &condition, distinct)?;
            let columns = projection_columns(&schema, &projection);
            println!("{}", pretty::render_result_set(&columns, &result, pretty::TableStyleKind::Modern));
        }
        Statement::Delete { table, condition } => {
            let removed = engine.delete(&table, &condition)?;
            println!("{removed} row(s) deleted");
        }
        Statement::Tables => {
            let names = engine.tables()?;
            for name in names {
                println!("{name}");
            }
        }
        Statement::Describe { table } => {
            let schema = engine.table_info(&table)?;
            print_schema(&table, &schema);
        }
        Statement::Quit => unreachable!("handled by the caller"),
    }
    Ok(())
}

/// Zip a parsed `insert`'s positional literals against the table's field
/// order into a `Record`, failing with `SchemaMismatch` on arity mismatch
/// (the positional values carry no field names of their own).
fn build_record(schema: &common::TableSchema, values: Vec<types::Value>) -> common::EngineResult<Record> {
    if values.len() != schema.fields().len() {
        return Err(EngineError::SchemaMismatch(format!(
            "table expects {} values, got {}",
            schema.fields().len(),
            values.len()
        )));
    }
    let fields = schema
        .fields()
        .iter()
        .zip(values)
        .map(|(spec, value)| FieldValue { name: spec.name.clone(), value })
        .collect();
    Ok(Record::new(fields))
}

fn projection_columns(schema: &common::TableSchema, projection: &FieldList) -> Vec<String> {
    if projection.is_all() {
        schema.fields().iter().map(|f| f.name.clone()).collect()
    } else {
        projection.names.clone()
    }
}

fn print_schema(table: &str, schema: &common::TableSchema) {
    println!("{table}:");
    for field in schema.fields() {
        let ty = match field.data_type {
            DataType::Integer => "int",
            DataType::String => "string",
        };
        println!("  {} {ty}", field.name);
    }
}

fn interactive_loop(engine: &mut Engine) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    println!("microdb REPL. Type 'quit' or 'exit' to leave.");

    loop {
        let readline = rl.readline("> ");
        let should_continue = match readline {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                run_line(engine, &line)
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                false
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                false
            }
            Err(err) => {
                eprintln!("Error: {err:?}");
                false
            }
        };

        if !should_continue {
            break;
        }
    }

    Ok(())
}
