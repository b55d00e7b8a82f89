// FLAC PICTURE block
//
// All integers are big-endian, unlike the Vorbis comment block:
//   type(4) mime_len(4) mime desc_len(4) desc width(4) height(4)
//   depth(4) colors(4) data_len(4) data

use crate::cover::CoverArt;
use crate::error::Result;
use crate::utils::{ByteCursor, Endian};

/// Picture type code shared with ID3v2 APIC frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PictureType(pub u32);

impl PictureType {
    pub const OTHER: PictureType = PictureType(0);
    pub const FRONT_COVER: PictureType = PictureType(3);
    pub const BACK_COVER: PictureType = PictureType(4);

    const LABELS: [&'static str; 21] = [
        "Other",
        "32x32 file icon",
        "Other file icon",
        "Cover (front)",
        "Cover (back)",
        "Leaflet page",
        "Media",
        "Lead artist",
        "Artist",
        "Conductor",
        "Band",
        "Composer",
        "Lyricist",
        "Recording location",
        "During recording",
        "During performance",
        "Video screen capture",
        "Bright coloured fish",
        "Illustration",
        "Band logo",
        "Publisher logo",
    ];

    pub fn label(&self) -> &'static str {
        Self::LABELS
            .get(self.0 as usize)
            .copied()
            .unwrap_or("Reserved")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlacPicture {
    pub picture_type: PictureType,
    pub mime_type: String,
    pub description: String,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub colors: u32,
    pub data: Vec<u8>,
}

impl FlacPicture {
    /// Front cover with unknown dimensions and an empty description
    pub fn front_cover(cover: &CoverArt) -> Self {
        FlacPicture {
            picture_type: PictureType::FRONT_COVER,
            mime_type: cover.mime_type().to_string(),
            description: String::new(),
            width: 0,
            height: 0,
            depth: 0,
            colors: 0,
            data: cover.data.clone(),
        }
    }

    /// Decode a PICTURE block payload
    pub fn read_from_data(data: &[u8]) -> Result<Self> {
        let cursor = ByteCursor::new(data);
        let mut pos = 0;

        let picture_type = PictureType(cursor.read_u32(pos, Endian::Big)?);
        pos += 4;
        let mime_type = String::from_utf8_lossy(read_prefixed(&cursor, &mut pos)?).into_owned();
        let description = String::from_utf8_lossy(read_prefixed(&cursor, &mut pos)?).into_owned();

        let mut dims = [0u32; 4];
        for (i, slot) in dims.iter_mut().enumerate() {
            *slot = cursor.read_u32(pos + i * 4, Endian::Big)?;
        }
        pos += 16;
        let image = read_prefixed(&cursor, &mut pos)?.to_vec();

        let [width, height, depth, colors] = dims;
        Ok(FlacPicture {
            picture_type,
            mime_type,
            description,
            width,
            height,
            depth,
            colors,
            data: image,
        })
    }

    /// Encode as a PICTURE block payload
    pub fn to_bytes(&self) -> Vec<u8> {
        fn prefixed(out: &mut Vec<u8>, bytes: &[u8]) {
            out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
            out.extend_from_slice(bytes);
        }

        let mut out = Vec::with_capacity(32 + self.mime_type.len() + self.description.len() + self.data.len());
        out.extend_from_slice(&self.picture_type.0.to_be_bytes());
        prefixed(&mut out, self.mime_type.as_bytes());
        prefixed(&mut out, self.description.as_bytes());
        for value in [self.width, self.height, self.depth, self.colors] {
            out.extend_from_slice(&value.to_be_bytes());
        }
        prefixed(&mut out, &self.data);
        out
    }
}

/// u32 length followed by that many bytes; advances `pos` past both
fn read_prefixed<'c>(cursor: &'c ByteCursor<&[u8]>, pos: &mut usize) -> Result<&'c [u8]> {
    let len = cursor.read_u32(*pos, Endian::Big)? as usize;
    let bytes = cursor.slice(*pos + 4, len)?;
    *pos += 4 + len;
    Ok(bytes)
}
