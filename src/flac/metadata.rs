// FLAC metadata block chain: parsing and reassembly

use log::trace;

use crate::error::{MuxError, Result};
use crate::utils::{ByteCursor, Endian};

/// FLAC file signature
pub const FLAC_SIGNATURE: &[u8; 4] = b"fLaC";

/// Largest payload a 24-bit block length can describe
pub const MAX_BLOCK_SIZE: usize = 0x00FF_FFFF;

/// FLAC metadata block types
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlacMetadataBlockType {
    StreamInfo = 0,
    Padding = 1,
    Application = 2,
    SeekTable = 3,
    VorbisComment = 4,
    CueSheet = 5,
    Picture = 6,
    Invalid = 127,
}

impl FlacMetadataBlockType {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0 => FlacMetadataBlockType::StreamInfo,
            1 => FlacMetadataBlockType::Padding,
            2 => FlacMetadataBlockType::Application,
            3 => FlacMetadataBlockType::SeekTable,
            4 => FlacMetadataBlockType::VorbisComment,
            5 => FlacMetadataBlockType::CueSheet,
            6 => FlacMetadataBlockType::Picture,
            _ => FlacMetadataBlockType::Invalid,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FlacMetadataBlockType::StreamInfo => "STREAMINFO",
            FlacMetadataBlockType::Padding => "PADDING",
            FlacMetadataBlockType::Application => "APPLICATION",
            FlacMetadataBlockType::SeekTable => "SEEKTABLE",
            FlacMetadataBlockType::VorbisComment => "VORBIS_COMMENT",
            FlacMetadataBlockType::CueSheet => "CUESHEET",
            FlacMetadataBlockType::Picture => "PICTURE",
            FlacMetadataBlockType::Invalid => "RESERVED",
        }
    }
}

/// FLAC metadata block header
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlacMetadataBlockHeader {
    pub is_last: bool,
    /// Raw 7-bit type code, kept so reserved types survive a rebuild
    pub type_code: u8,
    pub length: u32,
}

impl FlacMetadataBlockHeader {
    pub const HEADER_SIZE: usize = 4;

    /// Read a block header at `offset`
    pub fn read<B: AsRef<[u8]>>(cursor: &ByteCursor<B>, offset: usize) -> Result<Self> {
        let flags = cursor.read_u8(offset)?;
        let length = cursor.read_u24(offset + 1, Endian::Big)?;
        Ok(FlacMetadataBlockHeader {
            is_last: (flags & 0x80) != 0,
            type_code: flags & 0x7F,
            length,
        })
    }

    pub fn block_type(&self) -> FlacMetadataBlockType {
        FlacMetadataBlockType::from_byte(self.type_code)
    }

    pub fn to_bytes(&self) -> Result<[u8; 4]> {
        let mut cursor = ByteCursor::new([0u8; Self::HEADER_SIZE]);
        let flags = (if self.is_last { 0x80 } else { 0x00 }) | (self.type_code & 0x7F);
        cursor.write_u8(0, flags)?;
        cursor.write_u24(1, self.length, Endian::Big)?;
        Ok(cursor.into_inner())
    }
}

/// Location of one metadata block inside the source buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlacMetadataBlock {
    pub header: FlacMetadataBlockHeader,
    pub header_offset: usize,
    pub payload_offset: usize,
}

impl FlacMetadataBlock {
    pub fn size(&self) -> usize {
        self.header.length as usize
    }

    pub fn end(&self) -> usize {
        self.payload_offset + self.size()
    }

    pub fn payload<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &data[self.payload_offset..self.end()]
    }
}

/// Ordered metadata blocks plus the offset where audio frames start
#[derive(Debug, Clone)]
pub struct BlockChain {
    pub blocks: Vec<FlacMetadataBlock>,
    pub audio_offset: usize,
}

impl BlockChain {
    /// Walk the block chain of a FLAC file.
    ///
    /// A header or payload running past the end of the buffer is an
    /// `InvalidBlockSize` (soft). A chain that ends exactly at the end of the
    /// buffer without a last-block flag has no audio offset at all and is a
    /// hard `MissingAudioOffset`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let cursor = ByteCursor::new(data);
        if cursor.len() < FLAC_SIGNATURE.len() || cursor.slice(0, 4)? != FLAC_SIGNATURE {
            return Err(MuxError::InvalidSignature);
        }

        let mut blocks = Vec::new();
        let mut pos = FLAC_SIGNATURE.len();

        loop {
            if pos == cursor.len() {
                return Err(MuxError::MissingAudioOffset);
            }
            let available = cursor.len() - pos;
            if available < FlacMetadataBlockHeader::HEADER_SIZE {
                return Err(MuxError::InvalidBlockSize {
                    offset: pos,
                    size: FlacMetadataBlockHeader::HEADER_SIZE,
                    available,
                });
            }

            let header = FlacMetadataBlockHeader::read(&cursor, pos)?;
            let payload_offset = pos + FlacMetadataBlockHeader::HEADER_SIZE;
            let remaining = cursor.len() - payload_offset;
            if header.length as usize > remaining {
                return Err(MuxError::InvalidBlockSize {
                    offset: pos,
                    size: header.length as usize,
                    available: remaining,
                });
            }

            let block = FlacMetadataBlock {
                header,
                header_offset: pos,
                payload_offset,
            };
            trace!(
                "FLAC block {} at {} ({} bytes{})",
                header.block_type().name(),
                pos,
                header.length,
                if header.is_last { ", last" } else { "" }
            );
            blocks.push(block);
            pos = block.end();

            if header.is_last {
                return Ok(BlockChain {
                    blocks,
                    audio_offset: pos,
                });
            }
        }
    }

    /// Blocks of the given type, in file order
    pub fn blocks_of(&self, kind: FlacMetadataBlockType) -> impl Iterator<Item = &FlacMetadataBlock> {
        self.blocks
            .iter()
            .filter(move |b| b.header.block_type() == kind)
    }

    /// Reassemble a FLAC file with fresh comment and picture blocks.
    ///
    /// Existing VORBIS_COMMENT and PICTURE blocks are dropped, every other
    /// block is copied in its original order, then the new Vorbis comment
    /// and the optional picture are appended. The last block written carries
    /// the last-block flag and the audio frames follow byte for byte.
    pub fn rebuild(&self, original: &[u8], vorbis: &[u8], picture: Option<&[u8]>) -> Result<Vec<u8>> {
        check_block_size("VORBIS_COMMENT", vorbis.len())?;
        if let Some(picture) = picture {
            check_block_size("PICTURE", picture.len())?;
        }
        let source = ByteCursor::new(original);
        let audio = source.slice(self.audio_offset, source.len().saturating_sub(self.audio_offset))?;

        let kept: Vec<&FlacMetadataBlock> = self
            .blocks
            .iter()
            .filter(|b| {
                !matches!(
                    b.header.block_type(),
                    FlacMetadataBlockType::VorbisComment | FlacMetadataBlockType::Picture
                )
            })
            .collect();

        let mut out = Vec::with_capacity(
            self.audio_offset + vorbis.len() + picture.map_or(0, <[u8]>::len) + audio.len() + 8,
        );
        out.extend_from_slice(FLAC_SIGNATURE);

        for block in kept {
            let header = FlacMetadataBlockHeader {
                is_last: false,
                ..block.header
            };
            out.extend_from_slice(&header.to_bytes()?);
            out.extend_from_slice(source.slice(block.payload_offset, block.size())?);
        }

        let comment_header = FlacMetadataBlockHeader {
            is_last: picture.is_none(),
            type_code: FlacMetadataBlockType::VorbisComment as u8,
            length: vorbis.len() as u32,
        };
        out.extend_from_slice(&comment_header.to_bytes()?);
        out.extend_from_slice(vorbis);

        if let Some(picture) = picture {
            let picture_header = FlacMetadataBlockHeader {
                is_last: true,
                type_code: FlacMetadataBlockType::Picture as u8,
                length: picture.len() as u32,
            };
            out.extend_from_slice(&picture_header.to_bytes()?);
            out.extend_from_slice(picture);
        }

        out.extend_from_slice(audio);
        Ok(out)
    }
}

fn check_block_size(kind: &'static str, size: usize) -> Result<()> {
    if size > MAX_BLOCK_SIZE {
        return Err(MuxError::BlockTooLarge { kind, size });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(type_code: u8, is_last: bool, payload: &[u8]) -> Vec<u8> {
        let header = FlacMetadataBlockHeader {
            is_last,
            type_code,
            length: payload.len() as u32,
        };
        let mut out = header.to_bytes().unwrap().to_vec();
        out.extend_from_slice(payload);
        out
    }

    fn sample_file() -> Vec<u8> {
        let mut data = FLAC_SIGNATURE.to_vec();
        data.extend(block(0, false, &[0x11; 34]));
        data.extend(block(4, false, &[0x22; 10]));
        data.extend(block(1, false, &[0x00; 8]));
        data.extend(block(6, true, &[0x33; 5]));
        data.extend_from_slice(&[0xFF, 0xF8, 0xAA, 0xBB]);
        data
    }

    #[test]
    fn test_header_round_trip() {
        let header = FlacMetadataBlockHeader {
            is_last: true,
            type_code: 4,
            length: 0x010203,
        };
        let bytes = header.to_bytes().unwrap();
        assert_eq!(bytes, [0x84, 0x01, 0x02, 0x03]);
        let cursor = ByteCursor::new(&bytes[..]);
        assert_eq!(FlacMetadataBlockHeader::read(&cursor, 0).unwrap(), header);
    }

    #[test]
    fn test_parse_chain() {
        let data = sample_file();
        let chain = BlockChain::parse(&data).unwrap();

        assert_eq!(chain.blocks.len(), 4);
        assert_eq!(chain.blocks[0].header.block_type(), FlacMetadataBlockType::StreamInfo);
        assert_eq!(chain.blocks[0].payload_offset, 8);
        assert_eq!(chain.audio_offset, data.len() - 4);
        assert_eq!(chain.blocks_of(FlacMetadataBlockType::Picture).count(), 1);
    }

    #[test]
    fn test_bad_signature() {
        assert!(matches!(
            BlockChain::parse(b"OggS\0\0\0\0"),
            Err(MuxError::InvalidSignature)
        ));
        assert!(matches!(BlockChain::parse(b"fL"), Err(MuxError::InvalidSignature)));
    }

    #[test]
    fn test_truncated_payload_is_soft() {
        let mut data = FLAC_SIGNATURE.to_vec();
        data.extend(block(0, true, &[0u8; 34]));
        data.truncate(20);
        let err = BlockChain::parse(&data).unwrap_err();
        assert!(matches!(err, MuxError::InvalidBlockSize { offset: 4, size: 34, .. }));
        assert!(!err.is_hard());
    }

    #[test]
    fn test_chain_without_terminal_block_is_hard() {
        let mut data = FLAC_SIGNATURE.to_vec();
        data.extend(block(0, false, &[0u8; 34]));
        let err = BlockChain::parse(&data).unwrap_err();
        assert!(matches!(err, MuxError::MissingAudioOffset));
        assert!(err.is_hard());
    }

    #[test]
    fn test_rebuild_replaces_and_reflags() {
        let data = sample_file();
        let chain = BlockChain::parse(&data).unwrap();
        let out = chain.rebuild(&data, &[0x44; 6], Some(&[0x55u8; 3][..])).unwrap();
        let rebuilt = BlockChain::parse(&out).unwrap();

        let types: Vec<u8> = rebuilt.blocks.iter().map(|b| b.header.type_code).collect();
        assert_eq!(types, vec![0, 1, 4, 6]);
        let last_flags: Vec<bool> = rebuilt.blocks.iter().map(|b| b.header.is_last).collect();
        assert_eq!(last_flags, vec![false, false, false, true]);
        assert_eq!(rebuilt.blocks[0].payload(&out), &[0x11; 34][..]);
        assert_eq!(&out[rebuilt.audio_offset..], &[0xFF, 0xF8, 0xAA, 0xBB]);
    }

    #[test]
    fn test_rebuild_without_picture_flags_comment() {
        let data = sample_file();
        let chain = BlockChain::parse(&data).unwrap();
        let out = chain.rebuild(&data, &[0x44; 6], None).unwrap();
        let rebuilt = BlockChain::parse(&out).unwrap();

        let last = rebuilt.blocks.last().unwrap();
        assert_eq!(last.header.block_type(), FlacMetadataBlockType::VorbisComment);
        assert!(last.header.is_last);
        assert_eq!(rebuilt.blocks.iter().filter(|b| b.header.is_last).count(), 1);
    }

    #[test]
    fn test_rebuild_rejects_oversized_picture() {
        let data = sample_file();
        let chain = BlockChain::parse(&data).unwrap();
        let huge = vec![0u8; MAX_BLOCK_SIZE + 1];
        assert!(matches!(
            chain.rebuild(&data, &[], Some(huge.as_slice())),
            Err(MuxError::BlockTooLarge { kind: "PICTURE", .. })
        ));
    }
}
