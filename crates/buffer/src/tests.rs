use super::*;
use tempfile::tempdir;

fn fresh_file(dir: &Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    PageFile::create(&path).unwrap();
    path
}

#[test]
fn write_then_read_round_trips_through_cache() {
    let dir = tempdir().unwrap();
    let path = fresh_file(dir.path(), "a.dat");
    let mut pool = BufferPool::new(4);
    let handle = pool.open_file(&path).unwrap();

    let mut page = [0u8; PAGE_SIZE];
    page[0] = 42;
    pool.write(handle, 0, &page).unwrap();

    let mut out = [0u8; PAGE_SIZE];
    pool.read(handle, 0, &mut out).unwrap();
    assert_eq!(out, page);
}

#[test]
fn write_then_read_survives_eviction() {
    let dir = tempdir().unwrap();
    let path = fresh_file(dir.path(), "a.dat");
    let mut pool = BufferPool::new(2);
    let handle = pool.open_file(&path).unwrap();

    let mut page0 = [0u8; PAGE_SIZE];
    page0[0] = 11;
    pool.write(handle, 0, &page0).unwrap();

    let mut page1 = [0u8; PAGE_SIZE];
    page1[0] = 22;
    pool.write(handle, 1, &page1).unwrap();

    // Third distinct page forces eviction of page 0 (least recently used).
    let mut page2 = [0u8; PAGE_SIZE];
    page2[0] = 33;
    pool.write(handle, 2, &page2).unwrap();

    let mut out = [0u8; PAGE_SIZE];
    pool.read(handle, 0, &mut out).unwrap();
    assert_eq!(out[0], 11, "evicted dirty page must be written back first");
}

#[test]
fn lru_evicts_least_recently_used() {
    let dir = tempdir().unwrap();
    let path = fresh_file(dir.path(), "a.dat");
    let mut pool = BufferPool::new(2);
    let handle = pool.open_file(&path).unwrap();

    let zero = [0u8; PAGE_SIZE];
    pool.write(handle, 0, &zero).unwrap();
    pool.write(handle, 1, &zero).unwrap();

    // Touch page 0 so page 1 becomes the LRU entry.
    let mut scratch = [0u8; PAGE_SIZE];
    pool.read(handle, 0, &mut scratch).unwrap();

    pool.write(handle, 2, &zero).unwrap();

    // Page 1 should have been evicted; page 0 stays resident (no error
    // either way, but we confirm both remain readable).
    pool.read(handle, 1, &mut scratch).unwrap();
    pool.read(handle, 0, &mut scratch).unwrap();
}

#[test]
fn close_file_flushes_dirty_entries() {
    let dir = tempdir().unwrap();
    let path = fresh_file(dir.path(), "a.dat");
    let mut pool = BufferPool::new(4);
    let handle = pool.open_file(&path).unwrap();

    let mut page = [0u8; PAGE_SIZE];
    page[5] = 77;
    pool.write(handle, 0, &page).unwrap();
    pool.close_file(handle).unwrap();

    // Reopen independently through a fresh pool/handle and confirm the
    // write reached disk.
    let mut pool2 = BufferPool::new(4);
    let handle2 = pool2.open_file(&path).unwrap();
    let mut out = [0u8; PAGE_SIZE];
    pool2.read(handle2, 0, &mut out).unwrap();
    assert_eq!(out[5], 77);
}

#[test]
fn independent_opens_are_independent_cache_entries() {
    let dir = tempdir().unwrap();
    let path = fresh_file(dir.path(), "a.dat");
    let mut pool = BufferPool::new(4);
    let h1 = pool.open_file(&path).unwrap();
    let h2 = pool.open_file(&path).unwrap();
    assert_ne!(h1, h2);
}

#[test]
fn reading_unregistered_handle_errors() {
    let dir = tempdir().unwrap();
    let path = fresh_file(dir.path(), "a.dat");
    let mut pool = BufferPool::new(4);
    let handle = pool.open_file(&path).unwrap();
    pool.close_file(handle).unwrap();

    let mut out = [0u8; PAGE_SIZE];
    let err = pool.read(handle, 0, &mut out).unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[test]
fn num_pages_reflects_written_pages() {
    let dir = tempdir().unwrap();
    let path = fresh_file(dir.path(), "a.dat");
    let mut pool = BufferPool::new(4);
    let handle = pool.open_file(&path).unwrap();

    let page = [0u8; PAGE_SIZE];
    pool.write(handle, 0, &page).unwrap();
    pool.write(handle, 1, &page).unwrap();
    assert_eq!(pool.num_pages(handle).unwrap(), 2);
}

proptest::proptest! {
    #[test]
    fn capacity_plus_one_distinct_pages_evicts_oldest(extra in 0u32..8) {
        let dir = tempdir().unwrap();
        let path = fresh_file(dir.path(), "a.dat");
        let mut pool = BufferPool::new(4);
        let handle = pool.open_file(&path).unwrap();

        let total = 4 + 1 + extra;
        let mut page = [0u8; PAGE_SIZE];
        for n in 0..total {
            page[0] = (n % 256) as u8;
            pool.write(handle, n, &page).unwrap();
        }

        // Every page ever written must still be readable (either resident
        // or recoverable from its write-back), regardless of pool size.
        for n in 0..total {
            let mut out = [0u8; PAGE_SIZE];
            pool.read(handle, n, &mut out).unwrap();
            prop_assert_eq!(out[0], (n % 256) as u8);
        }
    }
}
