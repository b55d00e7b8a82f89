// Chunk offset repair
//
// stco and co64 store absolute file positions of media chunks. When bytes
// in front of mdat grow or shrink, every entry pointing past the change
// moves by the same signed delta.

use super::atom::{AtomId, AtomTree, CO64, STCO};
use crate::error::{MuxError, Result};
use crate::utils::{ByteCursor, Endian};

/// version/flags (4) + entry count (4)
const TABLE_HEADER: usize = 8;

/// Shift every chunk offset in `tree` that is `>= threshold` by `delta`.
///
/// `tree` must describe atoms inside `buf` (typically the rewritten moov).
/// Returns the number of entries changed.
pub fn shift_chunk_offsets(buf: &mut [u8], tree: &AtomTree, delta: i64, threshold: u64) -> Result<usize> {
    let mut tables: Vec<AtomId> = Vec::new();
    tree.walk(|id, atom, _| {
        if atom.kind == STCO || atom.kind == CO64 {
            tables.push(id);
        }
    });

    let mut cursor = ByteCursor::new(buf);
    let mut shifted = 0;
    for id in tables {
        let atom = tree.atom(id);
        let entry_size = if atom.kind == CO64 { 8 } else { 4 };
        let table = atom.payload_offset();
        let count = cursor.read_u32(table + 4, Endian::Big)? as usize;

        let needed = count
            .checked_mul(entry_size)
            .and_then(|n| n.checked_add(TABLE_HEADER));
        if needed.map_or(true, |n| n > atom.payload_len()) {
            return Err(MuxError::MalformedAtom {
                offset: atom.offset,
                reason: "chunk offset table larger than its atom",
            });
        }

        for index in 0..count {
            let at = table + TABLE_HEADER + index * entry_size;
            let changed = if entry_size == 8 {
                shift_co64_entry(&mut cursor, at, delta, threshold)?
            } else {
                shift_stco_entry(&mut cursor, at, delta, threshold)?
            };
            if changed {
                shifted += 1;
            }
        }
    }
    Ok(shifted)
}

fn shift_stco_entry(cursor: &mut ByteCursor<&mut [u8]>, at: usize, delta: i64, threshold: u64) -> Result<bool> {
    let value = cursor.read_u32(at, Endian::Big)?;
    if u64::from(value) < threshold {
        return Ok(false);
    }
    let shifted = i64::from(value)
        .checked_add(delta)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or(MuxError::OffsetOverflow { offset: at })?;
    cursor.write_u32(at, shifted, Endian::Big)?;
    Ok(true)
}

fn shift_co64_entry(cursor: &mut ByteCursor<&mut [u8]>, at: usize, delta: i64, threshold: u64) -> Result<bool> {
    let value = cursor.read_u64(at, Endian::Big)?;
    if value < threshold {
        return Ok(false);
    }
    let shifted = value
        .checked_add_signed(delta)
        .ok_or(MuxError::OffsetOverflow { offset: at })?;
    cursor.write_u64(at, shifted, Endian::Big)?;
    Ok(true)
}
