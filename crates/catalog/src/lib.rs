//! Table schema persistence (the `.def` half of component C3).
//!
//! A table's schema lives in a single page of a `<table>.def` file, read
//! and written through the buffer pool like any other page. The data file
//! (`<table>.dat`, slotted-page records) is created and destroyed alongside
//! it but owned by the `recordmgr` crate.

use std::path::{Path, PathBuf};

use buffer::BufferPool;
use common::{EngineError, EngineResult, FieldSpec, MAX_FIELD_NAME, MAX_FIELDS_PER_TABLE, TableSchema};
use storage::{PAGE_SIZE, PageFile};
use types::DataType;

pub const DEF_SUFFIX: &str = "def";
pub const DAT_SUFFIX: &str = "dat";

pub fn def_path(data_dir: &Path, table: &str) -> PathBuf {
    data_dir.join(format!("{table}.{DEF_SUFFIX}"))
}

pub fn dat_path(data_dir: &Path, table: &str) -> PathBuf {
    data_dir.join(format!("{table}.{DAT_SUFFIX}"))
}

/// Create `<table>.def` and `<table>.dat`, writing `schema` to page 0 of
/// the definition file. If only one of the two files can be created, the
/// first is removed so the table is left in no partially-created state.
pub fn create_table(
    pool: &mut BufferPool,
    data_dir: &Path,
    table: &str,
    schema: &TableSchema,
) -> EngineResult<()> {
    let def = def_path(data_dir, table);
    let dat = dat_path(data_dir, table);

    if def.exists() || dat.exists() {
        return Err(EngineError::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("table '{table}' already exists"),
        )));
    }

    PageFile::create(&def)?;
    if let Err(err) = PageFile::create(&dat) {
        let _ = PageFile::delete(&def);
        return Err(err);
    }

    let handle = pool.open_file(&def)?;
    let page = encode_schema_page(schema)?;
    let result = pool.write(handle, 0, &page).and_then(|_| pool.close_file(handle));
    if let Err(err) = result {
        let _ = PageFile::delete(&def);
        let _ = PageFile::delete(&dat);
        return Err(err);
    }
    log::info!("created table '{table}' with {} fields", schema.fields().len());
    Ok(())
}

/// Delete both files backing `table`.
pub fn drop_table(data_dir: &Path, table: &str) -> EngineResult<()> {
    PageFile::delete(&def_path(data_dir, table))?;
    PageFile::delete(&dat_path(data_dir, table))?;
    log::info!("dropped table '{table}'");
    Ok(())
}

/// Read `<table>.def` and decode its schema.
pub fn get_table_info(pool: &mut BufferPool, data_dir: &Path, table: &str) -> EngineResult<TableSchema> {
    let handle = pool.open_file(def_path(data_dir, table))?;
    let mut page = [0u8; PAGE_SIZE];
    let read_result = pool.read(handle, 0, &mut page);
    pool.close_file(handle)?;
    read_result?;
    decode_schema_page(&page)
}

fn encode_schema_page(schema: &TableSchema) -> EngineResult<[u8; PAGE_SIZE]> {
    let fields = schema.fields();
    if fields.len() > MAX_FIELDS_PER_TABLE {
        return Err(EngineError::SchemaMismatch(format!(
            "table declares {} fields, max is {MAX_FIELDS_PER_TABLE}",
            fields.len()
        )));
    }

    let mut page = [0u8; PAGE_SIZE];
    page[0..4].copy_from_slice(&(fields.len() as i32).to_le_bytes());

    let mut offset = 4usize;
    for field in fields {
        let name_bytes = field.name.as_bytes();
        debug_assert!(name_bytes.len() < MAX_FIELD_NAME);
        page[offset..offset + name_bytes.len()].copy_from_slice(name_bytes);
        offset += MAX_FIELD_NAME;
        page[offset..offset + 4].copy_from_slice(&field.data_type.tag().to_le_bytes());
        offset += 4;
    }
    Ok(page)
}

fn decode_schema_page(page: &[u8; PAGE_SIZE]) -> EngineResult<TableSchema> {
    let count = i32::from_le_bytes(page[0..4].try_into().unwrap());
    if count < 0 || count as usize > MAX_FIELDS_PER_TABLE {
        return Err(EngineError::Decode(format!(
            "definition page has an invalid field count {count}"
        )));
    }

    let mut fields = Vec::with_capacity(count as usize);
    let mut offset = 4usize;
    for _ in 0..count {
        let name_bytes = &page[offset..offset + MAX_FIELD_NAME];
        let nul_at = name_bytes.iter().position(|&b| b == 0).unwrap_or(MAX_FIELD_NAME);
        let name = String::from_utf8(name_bytes[..nul_at].to_vec())
            .map_err(|e| EngineError::Decode(format!("field name is not valid utf-8: {e}")))?;
        offset += MAX_FIELD_NAME;

        let tag = i32::from_le_bytes(page[offset..offset + 4].try_into().unwrap());
        offset += 4;
        let data_type = DataType::from_tag(tag)
            .ok_or_else(|| EngineError::Decode(format!("unknown data type tag {tag}")))?;

        fields.push(FieldSpec::new(name, data_type)?);
    }
    TableSchema::new(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use types::DataType::{Integer, String as StringTy};

    fn sample_schema() -> TableSchema {
        TableSchema::new(vec![
            FieldSpec::new("id", Integer).unwrap(),
            FieldSpec::new("name", StringTy).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn create_then_get_table_info_round_trips() {
        let dir = tempdir().unwrap();
        let mut pool = BufferPool::new(4);
        let schema = sample_schema();

        create_table(&mut pool, dir.path(), "users", &schema).unwrap();
        assert!(def_path(dir.path(), "users").exists());
        assert!(dat_path(dir.path(), "users").exists());

        let loaded = get_table_info(&mut pool, dir.path(), "users").unwrap();
        assert_eq!(loaded, schema);
    }

    #[test]
    fn create_table_twice_fails_without_clobbering_first() {
        let dir = tempdir().unwrap();
        let mut pool = BufferPool::new(4);
        let schema = sample_schema();

        create_table(&mut pool, dir.path(), "users", &schema).unwrap();
        let err = create_table(&mut pool, dir.path(), "users", &schema).unwrap_err();
        assert!(matches!(err, EngineError::Io(_)));

        // Original table must still be intact.
        let loaded = get_table_info(&mut pool, dir.path(), "users").unwrap();
        assert_eq!(loaded, schema);
    }

    #[test]
    fn drop_table_removes_both_files() {
        let dir = tempdir().unwrap();
        let mut pool = BufferPool::new(4);
        let schema = sample_schema();

        create_table(&mut pool, dir.path(), "users", &schema).unwrap();
        drop_table(dir.path(), "users").unwrap();

        assert!(!def_path(dir.path(), "users").exists());
        assert!(!dat_path(dir.path(), "users").exists());
    }

    #[test]
    fn get_table_info_on_missing_table_is_not_found() {
        let dir = tempdir().unwrap();
        let mut pool = BufferPool::new(4);
        let err = get_table_info(&mut pool, dir.path(), "ghost").unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[test]
    fn decode_rejects_unknown_data_type_tag() {
        let mut page = [0u8; PAGE_SIZE];
        page[0..4].copy_from_slice(&1i32.to_le_bytes());
        page[4..7].copy_from_slice(b"id\0");
        page[4 + MAX_FIELD_NAME..4 + MAX_FIELD_NAME + 4].copy_from_slice(&99i32.to_le_bytes());

        let err = decode_schema_page(&page).unwrap_err();
        assert!(matches!(err, EngineError::Decode(_)));
    }
}
