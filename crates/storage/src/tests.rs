use super::*;
use tempfile::tempdir;

#[test]
fn create_then_open_starts_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.dat");
    PageFile::create(&path).unwrap();

    let file = PageFile::open(&path).unwrap();
    assert_eq!(file.num_pages().unwrap(), 0);
}

#[test]
fn write_then_read_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.dat");
    PageFile::create(&path).unwrap();
    let mut file = PageFile::open(&path).unwrap();

    let mut page = [0u8; PAGE_SIZE];
    page[0] = 0xAB;
    page[PAGE_SIZE - 1] = 0xCD;
    file.write_page(0, &page).unwrap();

    let mut out = [0u8; PAGE_SIZE];
    file.read_page(0, &mut out).unwrap();
    assert_eq!(out, page);
    assert_eq!(file.num_pages().unwrap(), 1);
}

#[test]
fn writing_past_end_extends_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.dat");
    PageFile::create(&path).unwrap();
    let mut file = PageFile::open(&path).unwrap();

    let page = [7u8; PAGE_SIZE];
    file.write_page(3, &page).unwrap();
    assert_eq!(file.num_pages().unwrap(), 4);

    let mut out = [0u8; PAGE_SIZE];
    file.read_page(0, &mut out).unwrap();
    assert_eq!(out, [0u8; PAGE_SIZE]);
}

#[test]
fn open_missing_file_is_not_found() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.dat");
    let err = PageFile::open(&path).unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[test]
fn delete_removes_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.dat");
    PageFile::create(&path).unwrap();
    PageFile::delete(&path).unwrap();
    assert!(!path.exists());
}

#[test]
fn independent_opens_have_distinct_handles() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.dat");
    PageFile::create(&path).unwrap();

    let a = PageFile::open(&path).unwrap();
    let b = PageFile::open(&path).unwrap();
    assert_ne!(a.handle(), b.handle());
}
