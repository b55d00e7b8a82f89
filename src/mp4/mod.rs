// MP4/M4A/AAC format support
//
// MP4 format uses "atoms" (boxes) to store metadata.
// iTunes-style metadata is stored in ilst atom under moov/udta/meta.
//
// MP4 File Structure:
// - ftyp: File type atom
// - moov: Movie atom (container)
//   - trak/mdia/minf/stbl: sample tables, including stco/co64 chunk offsets
//   - udta: User data atom
//     - meta: Metadata atom
//       - ilst: Information list atom (contains metadata items)
// - mdat: Media data atom

pub mod atom;
pub mod ilst;
pub mod offsets;

use log::debug;
use serde::Serialize;

pub use atom::{Atom, AtomId, AtomTree, FourCC};
pub use ilst::{assemble_udta, build_metadata_atoms};
pub use offsets::shift_chunk_offsets;

use crate::cover::CoverArt;
use crate::error::{MuxError, Result};
use crate::field_mapping::TagMap;
use crate::utils::encoding::key_from_fourcc;
use crate::utils::{ByteCursor, Endian};
use atom::{DATA, ILST, MDAT, META, MOOV, UDTA};

pub const MP4_SIGNATURE: &[u8; 4] = b"ftyp";

/// Replace the `moov/udta` tag tree of an MP4 file.
pub fn embed(data: &[u8], tags: &TagMap, cover: Option<&CoverArt>) -> Result<Vec<u8>> {
    let tree = AtomTree::parse(data)?;
    let moov = tree.find_root(MOOV).ok_or(MuxError::MissingMoov)?;
    let udta = assemble_udta(&build_metadata_atoms(tags, cover)?)?;
    rebuild(data, &tree, moov, &udta)
}

/// Reassemble the file around a new `moov` that ends with `new_udta`.
///
/// Atoms before and after `moov` are copied unchanged. When media data sits
/// behind `moov`, the chunk offset tables of the new `moov` are shifted by
/// the size difference.
pub fn rebuild(original: &[u8], tree: &AtomTree, moov_id: AtomId, new_udta: &[u8]) -> Result<Vec<u8>> {
    let moov = tree.atom(moov_id);
    let source = ByteCursor::new(original);

    let kept: Vec<&Atom> = tree.children(moov_id).filter(|a| a.kind != UDTA).collect();
    let new_size = 8 + kept.iter().map(|a| a.size).sum::<usize>() + new_udta.len();
    let new_size32 = u32::try_from(new_size).map_err(|_| MuxError::UnsupportedLargeAtom {
        kind: moov.name(),
        offset: moov.offset,
    })?;
    let delta = new_size as i64 - moov.size as i64;

    let mut out = Vec::with_capacity(original.len() + new_udta.len());
    out.extend_from_slice(source.slice(0, moov.offset)?);
    out.extend_from_slice(&new_size32.to_be_bytes());
    out.extend_from_slice(&MOOV);
    for child in &kept {
        out.extend_from_slice(source.slice(child.offset, child.size)?);
    }
    out.extend_from_slice(new_udta);
    out.extend_from_slice(source.slice(moov.end(), original.len() - moov.end())?);

    let media_after_moov = tree.roots().any(|a| a.kind == MDAT && a.offset > moov.offset);
    let mut shifted = 0;
    if media_after_moov && delta != 0 {
        let new_moov = AtomTree::parse_range(&out, moov.offset, moov.offset + new_size)?;
        shifted = shift_chunk_offsets(&mut out, &new_moov, delta, moov.end() as u64)?;
    }

    debug!(
        "MP4: moov {} -> {} bytes (delta {}), {} chunk offsets shifted, file {} -> {} bytes",
        moov.size,
        new_size,
        delta,
        shifted,
        original.len(),
        out.len()
    );
    Ok(out)
}

/// One atom as reported by `inspect`
#[derive(Debug, Clone, Serialize)]
pub struct AtomSummary {
    pub path: String,
    pub offset: usize,
    pub size: usize,
}

/// Structure and tags of an MP4 file
#[derive(Debug, Clone, Serialize)]
pub struct Mp4Summary {
    pub atoms: Vec<AtomSummary>,
    pub tags: Vec<(String, String)>,
}

/// Describe the atom tree and decode the `ilst` items of an MP4 file
pub fn inspect(data: &[u8]) -> Result<Mp4Summary> {
    let tree = AtomTree::parse(data)?;

    let mut atoms = Vec::with_capacity(tree.len());
    tree.walk(|id, atom, _| {
        atoms.push(AtomSummary {
            path: tree.path_of(id),
            offset: atom.offset,
            size: atom.size,
        })
    });

    let mut tags = Vec::new();
    if let Some(ilst) = tree.find_path(&[MOOV, UDTA, META, ILST]) {
        for item in tree.children(ilst) {
            tags.push((item.name(), describe_item(data, item)?));
        }
    }

    Ok(Mp4Summary { atoms, tags })
}

/// Render the first `data` atom of an ilst item as text
fn describe_item(data: &[u8], item: &Atom) -> Result<String> {
    let inner = AtomTree::parse_range(data, item.payload_offset(), item.end())?;
    let Some(value) = inner.roots().find(|a| a.kind == DATA) else {
        return Ok(String::new());
    };

    let cursor = ByteCursor::new(data);
    if value.payload_len() < 8 {
        return Ok(String::new());
    }
    let type_code = cursor.read_u32(value.payload_offset(), Endian::Big)? & 0x00FF_FFFF;
    let body = cursor.slice(value.payload_offset() + 8, value.payload_len() - 8)?;

    Ok(match type_code {
        1 => String::from_utf8_lossy(body).into_owned(),
        13 => format!("<jpeg, {} bytes>", body.len()),
        14 => format!("<png, {} bytes>", body.len()),
        0 if body.len() >= 6 => {
            let body_cursor = ByteCursor::new(body);
            let number = body_cursor.read_u16(2, Endian::Big)?;
            let total = body_cursor.read_u16(4, Endian::Big)?;
            if total > 0 {
                format!("{}/{}", number, total)
            } else {
                number.to_string()
            }
        }
        other => format!("<type {}, {} bytes, {}>", other, body.len(), key_from_fourcc(&item.kind)),
    })
}
