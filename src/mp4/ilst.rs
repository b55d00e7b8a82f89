// iTunes-style metadata atoms: ilst items and the udta/meta/hdlr wrapper
//
// moov
//   └── udta
//       └── meta (version/flags)
//           ├── hdlr (mdir / appl)
//           └── ilst
//               ├── ©nam → data
//               ├── trkn → data
//               └── covr → data

use log::warn;

use super::atom::{FourCC, DATA, HDLR, ILST, META, UDTA};
use crate::cover::{CoverArt, ImageFormat};
use crate::error::{MuxError, Result};
use crate::field_mapping::{TagMap, TagValue};
use crate::utils::encoding::{fourcc_from_key, key_from_fourcc};

pub const COVR: FourCC = *b"covr";
pub const TRKN: FourCC = *b"trkn";
pub const DISK: FourCC = *b"disk";

/// Well-known `data` atom type indicators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Implicit = 0,
    Utf8 = 1,
    Jpeg = 13,
    Png = 14,
}

impl DataType {
    pub fn for_image(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Png => DataType::Png,
            _ => DataType::Jpeg,
        }
    }
}

/// Wrap a payload in an atom header
pub fn make_atom(kind: &FourCC, payload: &[u8]) -> Result<Vec<u8>> {
    let size = u32::try_from(payload.len() + 8).map_err(|_| MuxError::UnsupportedLargeAtom {
        kind: key_from_fourcc(kind),
        offset: 0,
    })?;
    let mut atom = Vec::with_capacity(size as usize);
    atom.extend_from_slice(&size.to_be_bytes());
    atom.extend_from_slice(kind);
    atom.extend_from_slice(payload);
    Ok(atom)
}

/// `data` atom: 1 byte version, 3 bytes type, 4 bytes locale, then the value
fn data_atom(data_type: DataType, value: &[u8]) -> Result<Vec<u8>> {
    let mut payload = Vec::with_capacity(8 + value.len());
    payload.extend_from_slice(&(data_type as u32).to_be_bytes());
    payload.extend_from_slice(&[0u8; 4]);
    payload.extend_from_slice(value);
    make_atom(&DATA, &payload)
}

/// Number pair layout shared by `trkn` and `disk`
fn number_pair(number: u32) -> [u8; 8] {
    let number = u16::try_from(number).unwrap_or(u16::MAX);
    let mut value = [0u8; 8];
    value[2..4].copy_from_slice(&number.to_be_bytes());
    value
}

fn item_atom(kind: &FourCC, value: &TagValue) -> Result<Vec<u8>> {
    let data = match (kind, value) {
        (&TRKN, TagValue::Integer(n)) | (&DISK, TagValue::Integer(n)) => {
            data_atom(DataType::Implicit, &number_pair(*n))?
        }
        (&TRKN, TagValue::Text(s)) | (&DISK, TagValue::Text(s)) => {
            let n = s.split('/').next().unwrap_or("").trim().parse().unwrap_or(0);
            data_atom(DataType::Implicit, &number_pair(n))?
        }
        _ => data_atom(DataType::Utf8, value.to_text().as_bytes())?,
    };
    make_atom(kind, &data)
}

/// Build the children of `ilst`: one item per tag, then the cover.
pub fn build_metadata_atoms(tags: &TagMap, cover: Option<&CoverArt>) -> Result<Vec<u8>> {
    let mut items = Vec::new();
    for (key, value) in tags.iter() {
        match fourcc_from_key(key) {
            Some(kind) => items.extend(item_atom(&kind, value)?),
            None => warn!("skipping tag '{}': not a four-character item key", key),
        }
    }

    if let Some(cover) = cover.filter(|c| !c.is_empty()) {
        let data = data_atom(DataType::for_image(cover.format()), &cover.data)?;
        items.extend(make_atom(&COVR, &data)?);
    }
    Ok(items)
}

/// Metadata handler: handler type `mdir`, manufacturer `appl`
fn hdlr_atom() -> Result<Vec<u8>> {
    let mut payload = Vec::with_capacity(25);
    payload.extend_from_slice(&[0u8; 4]); // version/flags
    payload.extend_from_slice(&[0u8; 4]); // pre_defined
    payload.extend_from_slice(b"mdir");
    payload.extend_from_slice(b"appl");
    payload.extend_from_slice(&[0u8; 8]); // reserved
    payload.push(0); // empty name
    make_atom(&HDLR, &payload)
}

/// Wrap `ilst` children into a complete `udta` atom
pub fn assemble_udta(ilst_children: &[u8]) -> Result<Vec<u8>> {
    let ilst = make_atom(&ILST, ilst_children)?;
    let hdlr = hdlr_atom()?;

    let mut meta_payload = Vec::with_capacity(4 + hdlr.len() + ilst.len());
    meta_payload.extend_from_slice(&[0u8; 4]); // version/flags
    meta_payload.extend_from_slice(&hdlr);
    meta_payload.extend_from_slice(&ilst);

    let meta = make_atom(&META, &meta_payload)?;
    make_atom(&UDTA, &meta)
}
