// FLAC metadata handling module

pub mod metadata;
pub mod picture;
pub mod vorbis;

use log::debug;
use serde::Serialize;

pub use metadata::{BlockChain, FlacMetadataBlock, FlacMetadataBlockHeader, FlacMetadataBlockType, FLAC_SIGNATURE};
pub use picture::{FlacPicture, PictureType};
pub use vorbis::{VorbisComment, VENDOR_STRING};

use crate::cover::CoverArt;
use crate::error::Result;
use crate::field_mapping::TagMap;

/// Build a VORBIS_COMMENT payload from a tag map
pub fn build_vorbis_comment(vendor: &str, tags: &TagMap) -> Vec<u8> {
    VorbisComment::from_tags(vendor, tags).to_bytes()
}

/// Build a front-cover PICTURE payload
pub fn build_picture_block(cover: &CoverArt) -> Vec<u8> {
    FlacPicture::front_cover(cover).to_bytes()
}

/// Replace the comment and picture blocks of a FLAC file.
pub fn embed(data: &[u8], vendor: &str, tags: &TagMap, cover: Option<&CoverArt>) -> Result<Vec<u8>> {
    let chain = BlockChain::parse(data)?;
    let comment = build_vorbis_comment(vendor, tags);
    let picture = cover.filter(|c| !c.is_empty()).map(build_picture_block);

    let out = chain.rebuild(data, &comment, picture.as_deref())?;
    debug!(
        "FLAC: {} -> {} bytes, {} tags, picture: {}",
        data.len(),
        out.len(),
        tags.len(),
        picture.is_some()
    );
    Ok(out)
}

/// One metadata block as reported by `inspect`
#[derive(Debug, Clone, Serialize)]
pub struct BlockSummary {
    pub kind: &'static str,
    pub offset: usize,
    pub size: usize,
    pub is_last: bool,
}

/// Picture block descriptor, without the image bytes
#[derive(Debug, Clone, Serialize)]
pub struct PictureSummary {
    pub picture_type: &'static str,
    pub mime_type: String,
    pub size: usize,
}

/// Structure and tags of a FLAC file
#[derive(Debug, Clone, Serialize)]
pub struct FlacSummary {
    pub blocks: Vec<BlockSummary>,
    pub audio_offset: usize,
    pub vendor: Option<String>,
    pub comments: Vec<(String, String)>,
    pub pictures: Vec<PictureSummary>,
}

/// Describe the block chain, comments and pictures of a FLAC file
pub fn inspect(data: &[u8]) -> Result<FlacSummary> {
    let chain = BlockChain::parse(data)?;

    let mut summary = FlacSummary {
        blocks: Vec::with_capacity(chain.blocks.len()),
        audio_offset: chain.audio_offset,
        vendor: None,
        comments: Vec::new(),
        pictures: Vec::new(),
    };

    for block in &chain.blocks {
        summary.blocks.push(BlockSummary {
            kind: block.header.block_type().name(),
            offset: block.header_offset,
            size: block.size(),
            is_last: block.header.is_last,
        });

        match block.header.block_type() {
            FlacMetadataBlockType::VorbisComment => {
                let comment = VorbisComment::read(block.payload(data))?;
                summary.vendor = Some(comment.vendor_string);
                summary.comments.extend(comment.comments);
            }
            FlacMetadataBlockType::Picture => {
                let picture = FlacPicture::read_from_data(block.payload(data))?;
                summary.pictures.push(PictureSummary {
                    picture_type: picture.picture_type.label(),
                    mime_type: picture.mime_type,
                    size: picture.data.len(),
                });
            }
            _ => {}
        }
    }

    Ok(summary)
}
