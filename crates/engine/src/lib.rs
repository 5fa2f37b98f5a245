//! Wires the buffer pool, schema catalog, and record manager into one
//! `Engine` value exposing `create_table`/`drop_table`/`insert`/`select`/
//! `delete`. No process-wide state: constructing an `Engine` builds the
//! buffer pool's fixed-size entry list, and dropping it releases memory
//! (callers should `close` explicitly for durability guarantees).

use std::collections::HashMap;
use std::fs;

use buffer::BufferPool;
use common::{Condition, EngineConfig, EngineResult, FieldList, Record, ResultSet, TableSchema};
use storage::FileHandle;

/// A running database: one buffer pool shared across every open table's
/// data file, plus a small registry of which tables currently have their
/// `.dat` file open.
pub struct Engine {
    config: EngineConfig,
    pool: BufferPool,
    data_handles: HashMap<String, FileHandle>,
}

impl Engine {
    /// Open (creating if needed) the configured data directory and build
    /// the buffer pool.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        fs::create_dir_all(&config.data_dir)?;
        let pool = BufferPool::new(config.num_buffers);
        Ok(Self {
            config,
            pool,
            data_handles: HashMap::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Create `name.def`/`name.dat` for `schema`.
    pub fn create_table(&mut self, name: &str, schema: TableSchema) -> EngineResult<()> {
        catalog::create_table(&mut self.pool, &self.config.data_dir, name, &schema)
            .inspect_err(|e| log::warn!("create_table '{name}' failed: {e}"))
    }

    /// Delete both files backing `name`, closing any cached handle first.
    pub fn drop_table(&mut self, name: &str) -> EngineResult<()> {
        if let Some(handle) = self.data_handles.remove(name) {
            self.pool.close_file(handle)?;
        }
        catalog::drop_table(&self.config.data_dir, name)
            .inspect_err(|e| log::warn!("drop_table '{name}' failed: {e}"))
    }

    /// The schema a table was created with.
    pub fn table_info(&mut self, name: &str) -> EngineResult<TableSchema> {
        catalog::get_table_info(&mut self.pool, &self.config.data_dir, name)
            .inspect_err(|e| log::warn!("table_info '{name}' failed: {e}"))
    }

    /// All tables with a definition file in the data directory, sorted by
    /// name.
    pub fn tables(&self) -> EngineResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.config.data_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some(catalog::DEF_SUFFIX)
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn insert(&mut self, table: &str, record: &Record) -> EngineResult<()> {
        let schema = self.table_info(table)?;
        let handle = self.data_handle(table)?;
        recordmgr::insert(&mut self.pool, handle, &schema, record)
            .inspect_err(|e| log::warn!("insert into '{table}' failed: {e}"))
    }

    pub fn select(
        &mut self,
        table: &str,
        projection: &FieldList,
        condition: &Condition,
        distinct: bool,
    ) -> EngineResult<ResultSet> {
        let schema = self.table_info(table)?;
        let handle = self.data_handle(table)?;
        recordmgr::select(&mut self.pool, handle, &schema, projection, condition, distinct)
            .inspect_err(|e| log::warn!("select on '{table}' failed: {e}"))
    }

    /// Delete matching records, returning how many were removed.
    pub fn delete(&mut self, table: &str, condition: &Condition) -> EngineResult<usize> {
        let schema = self.table_info(table)?;
        let handle = self.data_handle(table)?;
        recordmgr::delete(&mut self.pool, handle, &schema, condition)
            .inspect_err(|e| log::warn!("delete on '{table}' failed: {e}"))
    }

    /// Flush and close every open data-file handle. Data for a table is
    /// durable only once this has returned successfully for it.
    pub fn close(mut self) -> EngineResult<()> {
        let handles: Vec<FileHandle> = self.data_handles.drain().map(|(_, h)| h).collect();
        for handle in handles {
            self.pool
                .close_file(handle)
                .inspect_err(|e| log::warn!("close failed to flush a table handle: {e}"))?;
        }
        Ok(())
    }

    fn data_handle(&mut self, table: &str) -> EngineResult<FileHandle> {
        if let Some(&handle) = self.data_handles.get(table) {
            return Ok(handle);
        }
        let handle = recordmgr::open_data_file(&mut self.pool, &self.config.data_dir, table)?;
        self.data_handles.insert(table.to_string(), handle);
        Ok(handle)
    }
}
