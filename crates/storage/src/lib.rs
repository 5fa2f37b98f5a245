//! Fixed-size paged I/O on a named byte file (component C1).
//!
//! `PageFile` knows nothing about slots or schemas; it exposes a byte file
//! as a zero-indexed array of `PAGE_SIZE`-byte pages. The buffer pool (crate
//! `buffer`) is the only caller.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use common::{EngineError, EngineResult, PageNum};

/// Fixed page size baked into the on-disk format. Not configurable: see
/// `common::EngineConfig` for the fields that are.
pub const PAGE_SIZE: usize = 4096;

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of an open page file. Two independent `open()` calls on the
/// same path produce distinct handles — the buffer pool keys its entries
/// by handle identity, not by filename (spec lookup contract).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FileHandle(u64);

/// An open, page-addressable file.
#[derive(Debug)]
pub struct PageFile {
    file: File,
    path: PathBuf,
    handle: FileHandle,
}

impl PageFile {
    /// Create an empty file at `path`. Fails if a file already exists there
    /// and cannot be truncated, or if creation is refused by the OS.
    pub fn create(path: impl AsRef<Path>) -> EngineResult<()> {
        let path = path.as_ref();
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(())
    }

    /// Remove the file at `path`.
    pub fn delete(path: impl AsRef<Path>) -> EngineResult<()> {
        fs::remove_file(path.as_ref())?;
        Ok(())
    }

    /// Open `path` for read/write, failing with `NotFound` if it doesn't
    /// exist.
    pub fn open(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(EngineError::NotFound(path.display().to_string()));
        }
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let handle = FileHandle(NEXT_HANDLE_ID.fetch_add(1, AtomicOrdering::Relaxed));
        Ok(Self {
            file,
            path: path.to_path_buf(),
            handle,
        })
    }

    /// This file's identity, used by the buffer pool as part of its cache
    /// key.
    pub fn handle(&self) -> FileHandle {
        self.handle
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of whole `PAGE_SIZE` pages currently in the file.
    pub fn num_pages(&self) -> EngineResult<PageNum> {
        let len = self.file.metadata()?.len();
        Ok((len.div_ceil(PAGE_SIZE as u64)) as PageNum)
    }

    /// Read page `n` into `out`. Reading past the current end of file is a
    /// logic error on the caller's part (spec: "callers must avoid it by
    /// checking `num_pages` first"); here it surfaces as a short-read `Io`
    /// error rather than silently zero-filling.
    pub fn read_page(&mut self, n: PageNum, out: &mut [u8; PAGE_SIZE]) -> EngineResult<()> {
        self.file.seek(SeekFrom::Start(n as u64 * PAGE_SIZE as u64))?;
        self.file.read_exact(out)?;
        Ok(())
    }

    /// Write `buf` to page `n`. Writing past the current end of file is
    /// valid and extends the file with a new page.
    pub fn write_page(&mut self, n: PageNum, buf: &[u8; PAGE_SIZE]) -> EngineResult<()> {
        self.file.seek(SeekFrom::Start(n as u64 * PAGE_SIZE as u64))?;
        self.file.write_all(buf)?;
        self.file.flush()?;
        Ok(())
    }

    /// Release the OS descriptor. Callers must have already flushed any
    /// buffer-pool entries bound to this handle.
    pub fn close(self) {
        drop(self);
    }
}

#[cfg(test)]
mod tests;
