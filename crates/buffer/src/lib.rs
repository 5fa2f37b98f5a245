//! Bounded LRU buffer pool over `storage::PageFile` (component C2).
//!
//! The pool owns every open `PageFile` it has been asked to track, keyed by
//! `FileHandle` identity, and interposes a fixed-capacity cache of
//! `NUM_BUFFER` pages between callers and disk I/O. Cache replacement is
//! `lru::LruCache`, with a separate `hashbrown::HashMap` tracking which
//! cached pages are dirty, mirroring the pager crates elsewhere in this
//! stack rather than hand-rolling a linked list over it.

#[cfg(test)]
mod tests;

use std::num::NonZeroUsize;
use std::path::Path;

use common::{EngineError, EngineResult, PageNum};
use hashbrown::HashMap;
use lru::LruCache;
use storage::{FileHandle, PAGE_SIZE, PageFile};

type PagePayload = Box<[u8; PAGE_SIZE]>;
type PageKey = (FileHandle, PageNum);

fn zeroed_payload() -> PagePayload {
    Box::new([0u8; PAGE_SIZE])
}

/// Fixed-capacity LRU cache of pages, with a registry of the open files it
/// serves. `capacity` is the spec's `NUM_BUFFER`.
#[derive(Debug)]
pub struct BufferPool {
    capacity: usize,
    cache: LruCache<PageKey, PagePayload>,
    dirty: HashMap<PageKey, bool>,
    files: std::collections::HashMap<FileHandle, PageFile>,
}

impl BufferPool {
    /// Build a pool that holds at most `capacity` pages. `capacity` must be
    /// positive.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "buffer pool capacity must be > 0");
        Self {
            capacity,
            cache: LruCache::new(NonZeroUsize::new(capacity).unwrap()),
            dirty: HashMap::new(),
            files: std::collections::HashMap::new(),
        }
    }

    /// Open `path` through `storage::PageFile` and register it with the
    /// pool, returning its handle.
    pub fn open_file(&mut self, path: impl AsRef<Path>) -> EngineResult<FileHandle> {
        let file = PageFile::open(path)?;
        let handle = file.handle();
        self.files.insert(handle, file);
        Ok(handle)
    }

    /// Flush and forget `handle`, then drop its `PageFile` (releasing the
    /// OS descriptor). Mirrors `closeFile`.
    pub fn close_file(&mut self, handle: FileHandle) -> EngineResult<()> {
        self.flush_handle(handle)?;
        self.files.remove(&handle);
        Ok(())
    }

    pub fn num_pages(&self, handle: FileHandle) -> EngineResult<PageNum> {
        self.files
            .get(&handle)
            .ok_or_else(|| EngineError::NotFound("unregistered file handle".into()))?
            .num_pages()
    }

    /// Read page `n` of `handle` into `out`, going through the cache.
    pub fn read(
        &mut self,
        handle: FileHandle,
        n: PageNum,
        out: &mut [u8; PAGE_SIZE],
    ) -> EngineResult<()> {
        if !self.files.contains_key(&handle) {
            return Err(EngineError::NotFound("unregistered file handle".into()));
        }

        let key = (handle, n);
        if let Some(payload) = self.cache.get(&key) {
            log::trace!("buffer pool hit for table page {n}");
            out.copy_from_slice(&**payload);
            return Ok(());
        }

        log::debug!("buffer pool miss for table page {n}, loading from disk");
        let mut payload = zeroed_payload();
        self.files
            .get_mut(&handle)
            .expect("checked above")
            .read_page(n, &mut payload)?;

        self.evict_if_needed()?;
        out.copy_from_slice(&*payload);
        self.cache.push(key, payload);
        Ok(())
    }

    /// Write page `n` of `handle` from `input`, going through the cache.
    /// Never reads the page's prior on-disk contents: a miss is treated as
    /// a full overwrite of the victim's payload.
    pub fn write(
        &mut self,
        handle: FileHandle,
        n: PageNum,
        input: &[u8; PAGE_SIZE],
    ) -> EngineResult<()> {
        if !self.files.contains_key(&handle) {
            return Err(EngineError::NotFound("unregistered file handle".into()));
        }

        let key = (handle, n);
        if let Some(payload) = self.cache.get_mut(&key) {
            payload.copy_from_slice(input);
            self.dirty.insert(key, true);
            return Ok(());
        }

        self.evict_if_needed()?;
        let mut payload = zeroed_payload();
        payload.copy_from_slice(input);
        self.cache.push(key, payload);
        self.dirty.insert(key, true);
        Ok(())
    }

    /// Write back and evict every cached page bound to `handle`.
    pub fn flush_handle(&mut self, handle: FileHandle) -> EngineResult<()> {
        let keys: Vec<PageKey> = self
            .cache
            .iter()
            .map(|(key, _)| *key)
            .filter(|&(h, _)| h == handle)
            .collect();

        for key in keys {
            let payload = self.cache.pop(&key).expect("key was just listed");
            if self.dirty.remove(&key).is_some() {
                self.write_page(key.0, key.1, &payload)?;
            }
        }
        Ok(())
    }

    /// Make room for one more cache entry if the pool is at capacity,
    /// evicting the least-recently-used page and writing it back if dirty.
    ///
    /// A write-back failure here means the pool genuinely could not evict
    /// to make room, so it surfaces as `Exhausted` rather than a bare `Io`
    /// error (contrast `flush_handle`, an explicit, intentional flush).
    fn evict_if_needed(&mut self) -> EngineResult<()> {
        if self.cache.len() < self.capacity {
            return Ok(());
        }

        let Some((key, payload)) = self.cache.pop_lru() else {
            return Ok(());
        };

        if self.dirty.remove(&key).is_some() {
            log::debug!("buffer pool evicting dirty page {}, writing back", key.1);
            self.write_page(key.0, key.1, &payload)
                .map_err(|e| EngineError::Exhausted(format!("eviction write-back failed: {e}")))?;
        } else {
            log::trace!("buffer pool evicting clean page {}", key.1);
        }
        Ok(())
    }

    fn write_page(&mut self, handle: FileHandle, n: PageNum, payload: &PagePayload) -> EngineResult<()> {
        let file = self
            .files
            .get_mut(&handle)
            .ok_or_else(|| EngineError::NotFound("unregistered file handle".into()))?;
        file.write_page(n, payload)
    }
}
