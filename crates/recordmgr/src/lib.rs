//! Slotted-page record store (the `.dat` half of component C3).
//!
//! Encodes records into fixed-layout pages with an intra-page slot
//! directory, and implements first-fit insert, full-scan select with
//! projection/filter/distinct, and in-place delete.


use std::collections::HashSet;
use std::path::Path;

use buffer::BufferPool;
use common::{
    Condition, EngineError, EngineResult, FieldList, FieldValue, Record, ResultSet, TableSchema,
};
use storage::{FileHandle, PAGE_SIZE};
use types::{DataType, Value, MAX_STRING_VALUE};

/// Bytes per slot-directory entry: 1-byte flag, 4-byte offset, 4-byte size.
const SLOT_BYTES: usize = 9;
/// Bytes reserved for the page's slot-count header.
const DIR_COUNT_BYTES: usize = 4;
/// Offset where the first free region begins on a freshly initialized page.
const INITIAL_FREE_OFFSET: usize = DIR_COUNT_BYTES + SLOT_BYTES;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SlotState {
    Free,
    Live,
}

impl SlotState {
    fn to_byte(self) -> u8 {
        match self {
            Self::Free => 0,
            Self::Live => 1,
        }
    }

    fn from_byte(byte: u8) -> EngineResult<Self> {
        match byte {
            0 => Ok(Self::Free),
            1 => Ok(Self::Live),
            other => Err(EngineError::Decode(format!(
                "invalid slot flag byte {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct SlotEntry {
    flag: SlotState,
    offset: u32,
    size: u32,
}

fn slot_byte_offset(slot_idx: usize) -> usize {
    DIR_COUNT_BYTES + slot_idx * SLOT_BYTES
}

fn read_count(page: &[u8; PAGE_SIZE]) -> i32 {
    i32::from_le_bytes(page[0..4].try_into().unwrap())
}

fn write_count(page: &mut [u8; PAGE_SIZE], count: i32) {
    page[0..4].copy_from_slice(&count.to_le_bytes());
}

fn read_slot(page: &[u8; PAGE_SIZE], slot_idx: usize) -> EngineResult<SlotEntry> {
    let start = slot_byte_offset(slot_idx);
    let end = start + SLOT_BYTES;
    if end > PAGE_SIZE {
        return Err(EngineError::Decode(format!(
            "slot {slot_idx} falls outside the page"
        )));
    }
    let flag = SlotState::from_byte(page[start])?;
    let offset = u32::from_le_bytes(page[start + 1..start + 5].try_into().unwrap());
    let size = u32::from_le_bytes(page[start + 5..start + 9].try_into().unwrap());
    Ok(SlotEntry { flag, offset, size })
}

fn write_slot(page: &mut [u8; PAGE_SIZE], slot_idx: usize, slot: &SlotEntry) -> EngineResult<()> {
    let start = slot_byte_offset(slot_idx);
    let end = start + SLOT_BYTES;
    if end > PAGE_SIZE {
        return Err(EngineError::OutOfSpace(format!(
            "slot directory has no room for slot {slot_idx}"
        )));
    }
    page[start] = slot.flag.to_byte();
    page[start + 1..start + 5].copy_from_slice(&slot.offset.to_le_bytes());
    page[start + 5..start + 9].copy_from_slice(&slot.size.to_le_bytes());
    Ok(())
}

/// A freshly initialized page: `K = 1`, slot 0 is a single free region
/// spanning everything after the initial 13-byte directory.
fn init_page() -> [u8; PAGE_SIZE] {
    let mut page = [0u8; PAGE_SIZE];
    write_count(&mut page, 1);
    write_slot(
        &mut page,
        0,
        &SlotEntry {
            flag: SlotState::Free,
            offset: INITIAL_FREE_OFFSET as u32,
            size: (PAGE_SIZE - INITIAL_FREE_OFFSET) as u32,
        },
    )
    .expect("the initial slot entry always fits in a fresh page");
    page
}

fn find_first_fit(page: &[u8; PAGE_SIZE], needed: usize) -> EngineResult<Option<usize>> {
    let k = read_count(page);
    if k < 0 {
        return Err(EngineError::Decode("negative slot count".into()));
    }
    for slot_idx in 0..k as usize {
        let slot = read_slot(page, slot_idx)?;
        if slot.flag == SlotState::Free && slot.size as usize >= needed {
            return Ok(Some(slot_idx));
        }
    }
    Ok(None)
}

/// Pack `bytes` against the high end of the free region at `slot_idx`,
/// flip that slot to LIVE, and append a new FREE slot for the leftover
/// space (if any). Never merges or compacts existing free slots.
fn insert_into_slot(page: &mut [u8; PAGE_SIZE], slot_idx: usize, bytes: &[u8]) -> EngineResult<()> {
    let slot = read_slot(page, slot_idx)?;
    let record_size = bytes.len() as u32;
    let write_at = slot.offset + slot.size - record_size;
    let write_at_usize = write_at as usize;
    page[write_at_usize..write_at_usize + bytes.len()].copy_from_slice(bytes);

    write_slot(
        page,
        slot_idx,
        &SlotEntry {
            flag: SlotState::Live,
            offset: write_at,
            size: record_size,
        },
    )?;

    let remaining = slot.size - record_size;
    if remaining > 0 {
        let k = read_count(page);
        write_slot(
            page,
            k as usize,
            &SlotEntry {
                flag: SlotState::Free,
                offset: slot.offset,
                size: remaining,
            },
        )?;
        write_count(page, k + 1);
    }
    Ok(())
}

fn validate_record_matches_schema(schema: &TableSchema, record: &Record) -> EngineResult<()> {
    let fields = schema.fields();
    if record.fields.len() != fields.len() {
        return Err(EngineError::SchemaMismatch(format!(
            "record has {} fields, schema has {}",
            record.fields.len(),
            fields.len()
        )));
    }
    for (spec, value) in fields.iter().zip(record.fields.iter()) {
        if spec.name != value.name {
            return Err(EngineError::SchemaMismatch(format!(
                "expected field '{}' at this position, found '{}'",
                spec.name, value.name
            )));
        }
        if spec.data_type != value.value.data_type() {
            return Err(EngineError::SchemaMismatch(format!(
                "field '{}' expects {:?}, got {:?}",
                spec.name,
                spec.data_type,
                value.value.data_type()
            )));
        }
    }
    Ok(())
}

/// Encode a record in schema order: integers as 4 raw bytes, strings as a
/// 4-byte length prefix followed by the string bytes and a trailing NUL.
/// Integer encoding and the length prefix both use the producing host's
/// native endianness (not portable across architectures — documented).
fn encode_record(schema: &TableSchema, record: &Record) -> EngineResult<Vec<u8>> {
    validate_record_matches_schema(schema, record)?;
    let mut bytes = Vec::new();
    for field in &record.fields {
        match &field.value {
            Value::Int(v) => bytes.extend_from_slice(&v.to_ne_bytes()),
            Value::Text(s) => {
                if s.len() > MAX_STRING_VALUE {
                    return Err(EngineError::OutOfSpace(format!(
                        "string field '{}' is {} bytes, max is {MAX_STRING_VALUE}",
                        field.name,
                        s.len()
                    )));
                }
                bytes.extend_from_slice(&(s.len() as i32).to_ne_bytes());
                bytes.extend_from_slice(s.as_bytes());
                bytes.push(0);
            }
        }
    }
    Ok(bytes)
}

fn decode_record(schema: &TableSchema, bytes: &[u8]) -> EngineResult<Record> {
    let mut cursor = 0usize;
    let mut fields = Vec::with_capacity(schema.fields().len());
    for spec in schema.fields() {
        match spec.data_type {
            DataType::Integer => {
                let raw = bytes
                    .get(cursor..cursor + 4)
                    .ok_or_else(|| EngineError::Decode("truncated integer field".into()))?;
                let v = i32::from_ne_bytes(raw.try_into().unwrap());
                cursor += 4;
                fields.push(FieldValue {
                    name: spec.name.clone(),
                    value: Value::Int(v),
                });
            }
            DataType::String => {
                let len_bytes = bytes
                    .get(cursor..cursor + 4)
                    .ok_or_else(|| EngineError::Decode("truncated string length".into()))?;
                let len = i32::from_ne_bytes(len_bytes.try_into().unwrap());
                if len < 0 || len as usize > MAX_STRING_VALUE {
                    return Err(EngineError::Decode(format!("invalid string length {len}")));
                }
                cursor += 4;
                let payload = bytes
                    .get(cursor..cursor + len as usize + 1)
                    .ok_or_else(|| EngineError::Decode("truncated string payload".into()))?;
                let text = String::from_utf8(payload[..len as usize].to_vec())
                    .map_err(|e| EngineError::Decode(format!("string field is not utf-8: {e}")))?;
                cursor += len as usize + 1;
                fields.push(FieldValue {
                    name: spec.name.clone(),
                    value: Value::Text(text),
                });
            }
        }
    }
    Ok(Record::new(fields))
}

fn predicate_holds(condition: &Condition, record: &Record) -> bool {
    match condition {
        Condition::MatchAll => true,
        Condition::Compare { field, op, literal } => match record.get(field) {
            Some(value) => match value.cmp_same_type(literal) {
                Some(ordering) => op.holds(ordering),
                None => false,
            },
            None => false,
        },
    }
}

/// Project `record` onto `projection`, preserving schema order and
/// dropping duplicate field names.
fn project_record(schema: &TableSchema, projection: &FieldList, record: &Record) -> Record {
    if projection.is_all() {
        return record.clone();
    }
    let mut seen = HashSet::new();
    let mut fields = Vec::new();
    for spec in schema.fields() {
        if projection.names.iter().any(|n| n == &spec.name) && seen.insert(spec.name.clone())
            && let Some(value) = record.get(&spec.name)
        {
            fields.push(FieldValue {
                name: spec.name.clone(),
                value: value.clone(),
            });
        }
    }
    Record::new(fields)
}

/// Open `<table>.dat` through the buffer pool.
pub fn open_data_file(
    pool: &mut BufferPool,
    data_dir: &Path,
    table: &str,
) -> EngineResult<FileHandle> {
    pool.open_file(catalog::dat_path(data_dir, table))
}

/// Insert `record` using first-fit free-space search, splitting the
/// winning slot and appending a new page only when no existing page has
/// room.
pub fn insert(
    pool: &mut BufferPool,
    handle: FileHandle,
    schema: &TableSchema,
    record: &Record,
) -> EngineResult<()> {
    let bytes = encode_record(schema, record)?;
    let usable = PAGE_SIZE - INITIAL_FREE_OFFSET;
    if bytes.len() > usable {
        return Err(EngineError::OutOfSpace(format!(
            "record of {} bytes exceeds the {usable} bytes usable in an empty page",
            bytes.len()
        )));
    }

    let num_pages = pool.num_pages(handle)?;
    for page_no in 0..num_pages {
        let mut page = [0u8; PAGE_SIZE];
        pool.read(handle, page_no, &mut page)?;
        if let Some(slot_idx) = find_first_fit(&page, bytes.len())? {
            insert_into_slot(&mut page, slot_idx, &bytes)?;
            pool.write(handle, page_no, &page)?;
            return Ok(());
        }
    }

    let mut page = init_page();
    insert_into_slot(&mut page, 0, &bytes)?;
    pool.write(handle, num_pages, &page)?;
    Ok(())
}

/// Full-scan select with projection, a single-predicate filter, and
/// optional DISTINCT.
pub fn select(
    pool: &mut BufferPool,
    handle: FileHandle,
    schema: &TableSchema,
    projection: &FieldList,
    condition: &Condition,
    distinct: bool,
) -> EngineResult<ResultSet> {
    let mut result = ResultSet::new();
    let num_pages = pool.num_pages(handle)?;
    for page_no in 0..num_pages {
        let mut page = [0u8; PAGE_SIZE];
        pool.read(handle, page_no, &mut page)?;
        let k = read_count(&page);
        for slot_idx in 0..k.max(0) as usize {
            let slot = read_slot(&page, slot_idx)?;
            if slot.flag == SlotState::Free {
                continue;
            }
            let start = slot.offset as usize;
            let end = start + slot.size as usize;
            let record = decode_record(schema, &page[start..end])?;

            if !predicate_holds(condition, &record) {
                continue;
            }

            let projected = project_record(schema, projection, &record);
            if distinct && result.records.contains(&projected) {
                continue;
            }
            result.push(projected);
        }
    }
    Ok(result)
}

/// Zero and free every LIVE slot whose record matches `condition`. Freed
/// slots are never merged with neighboring free slots (deliberate, see
/// design notes).
pub fn delete(
    pool: &mut BufferPool,
    handle: FileHandle,
    schema: &TableSchema,
    condition: &Condition,
) -> EngineResult<usize> {
    let mut deleted = 0usize;
    let num_pages = pool.num_pages(handle)?;
    for page_no in 0..num_pages {
        let mut page = [0u8; PAGE_SIZE];
        pool.read(handle, page_no, &mut page)?;
        let k = read_count(&page);
        let mut changed = false;

        for slot_idx in 0..k.max(0) as usize {
            let mut slot = read_slot(&page, slot_idx)?;
            if slot.flag == SlotState::Free {
                continue;
            }
            let start = slot.offset as usize;
            let end = start + slot.size as usize;
            let record = decode_record(schema, &page[start..end])?;

            if predicate_holds(condition, &record) {
                page[start..end].fill(0);
                slot.flag = SlotState::Free;
                write_slot(&mut page, slot_idx, &slot)?;
                changed = true;
                deleted += 1;
            }
        }

        if changed {
            pool.write(handle, page_no, &page)?;
        }
    }
    Ok(deleted)
}
