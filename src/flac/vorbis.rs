// VORBIS_COMMENT implementation for FLAC
//
// Unlike the surrounding FLAC structures, every length in a Vorbis comment
// is little-endian.

use crate::error::Result;
use crate::field_mapping::TagMap;
use crate::utils::{ByteCursor, Endian};

/// Vendor string written into every comment block we produce
pub const VENDOR_STRING: &str = concat!("muxtag ", env!("CARGO_PKG_VERSION"));

/// Vorbis comment structure
#[derive(Debug, Default, Clone, PartialEq)]
pub struct VorbisComment {
    pub vendor_string: String,
    pub comments: Vec<(String, String)>,
}

impl VorbisComment {
    /// Build a comment block from a tag map, keeping its order.
    pub fn from_tags(vendor: &str, tags: &TagMap) -> Self {
        VorbisComment {
            vendor_string: vendor.to_string(),
            comments: tags
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_text()))
                .collect(),
        }
    }

    /// Parse a VORBIS_COMMENT block payload
    pub fn read(data: &[u8]) -> Result<Self> {
        let cursor = ByteCursor::new(data);
        let mut pos = 0;

        let vendor_length = cursor.read_u32(pos, Endian::Little)? as usize;
        pos += 4;
        let vendor_string = String::from_utf8_lossy(cursor.slice(pos, vendor_length)?).into_owned();
        pos += vendor_length;

        let comment_count = cursor.read_u32(pos, Endian::Little)? as usize;
        pos += 4;

        // Each comment needs at least its 4-byte length
        let mut comments = Vec::with_capacity(comment_count.min(data.len() / 4));
        for _ in 0..comment_count {
            let length = cursor.read_u32(pos, Endian::Little)? as usize;
            pos += 4;
            let entry = String::from_utf8_lossy(cursor.slice(pos, length)?).into_owned();
            pos += length;

            // Parse comment (format: FIELD=value)
            if let Some((field, value)) = entry.split_once('=') {
                comments.push((field.to_string(), value.to_string()));
            }
        }

        Ok(VorbisComment {
            vendor_string,
            comments,
        })
    }

    /// Encode as a VORBIS_COMMENT block payload
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::new();

        result.extend_from_slice(&(self.vendor_string.len() as u32).to_le_bytes());
        result.extend_from_slice(self.vendor_string.as_bytes());

        result.extend_from_slice(&(self.comments.len() as u32).to_le_bytes());
        for (field, value) in &self.comments {
            let entry = format!("{}={}", field, value);
            result.extend_from_slice(&(entry.len() as u32).to_le_bytes());
            result.extend_from_slice(entry.as_bytes());
        }

        result
    }

    /// Get a comment value by field name
    pub fn get(&self, field: &str) -> Option<&String> {
        self.comments
            .iter()
            .find(|(f, _)| f.eq_ignore_ascii_case(field))
            .map(|(_, v)| v)
    }
}
