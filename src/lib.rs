// muxtag - inject tags and cover art into FLAC and MP4 audio without re-encoding
//
// The muxer takes already-encoded audio bytes plus a track record and returns
// new bytes with a fresh tag block. Metadata is a best-effort enhancement: on
// malformed or unsupported input the original bytes come back unchanged.

pub mod cover;
pub mod error;
pub mod field_mapping;
pub mod flac;
pub mod mp4;
pub mod quality;
pub mod track;
pub mod utils;

use log::{debug, error, warn};

pub use cover::{CoverArt, CoverArtProvider, ImageFormat};
pub use error::{MuxError, Result};
pub use field_mapping::{flac_tags, mp4_tags, TagMap, TagValue};
pub use quality::{build_track_filename, AudioQuality, Container};
pub use track::{AlbumRef, ArtistRef, TrackMetadata};

/// Result of one mux attempt, before it is folded back into bytes
#[derive(Debug)]
pub enum MuxOutcome {
    /// Tags were written; these are the new file bytes
    Muxed(Vec<u8>),
    /// The input is not the container the quality asks for
    Unsupported { reason: String },
    /// The codec gave up; the caller should keep the original bytes
    OriginalReturned(MuxError),
}

impl MuxOutcome {
    pub fn is_muxed(&self) -> bool {
        matches!(self, MuxOutcome::Muxed(_))
    }

    /// Bytes to hand to the consumer: the muxed file, or a copy of `original`
    pub fn into_bytes(self, original: &[u8]) -> Vec<u8> {
        match self {
            MuxOutcome::Muxed(bytes) => bytes,
            _ => original.to_vec(),
        }
    }
}

/// Dispatches a mux call to the FLAC or MP4 codec.
///
/// ```no_run
/// use muxtag::{ContainerMuxer, TrackMetadata};
///
/// let audio = std::fs::read("track.flac").unwrap();
/// let track: TrackMetadata = serde_json::from_str(r#"{"title":"Song"}"#).unwrap();
/// let tagged = ContainerMuxer::new().mux(&audio, "LOSSLESS", &track, None).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ContainerMuxer {
    embed_cover: bool,
    vendor: String,
}

impl Default for ContainerMuxer {
    fn default() -> Self {
        Self {
            embed_cover: true,
            vendor: flac::VENDOR_STRING.to_string(),
        }
    }
}

impl ContainerMuxer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether cover art is written at all (default: true)
    pub fn embed_cover(mut self, embed: bool) -> Self {
        self.embed_cover = embed;
        self
    }

    /// Vendor string of the FLAC Vorbis comment block
    pub fn vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = vendor.into();
        self
    }

    /// Mux into the container that `quality` is delivered in
    pub fn mux_outcome(
        &self,
        audio: &[u8],
        quality: &str,
        track: &TrackMetadata,
        cover: Option<&CoverArt>,
    ) -> MuxOutcome {
        self.mux_as(Container::for_quality(quality), audio, track, cover)
    }

    /// Mux into an explicitly chosen container
    pub fn mux_as(
        &self,
        container: Container,
        audio: &[u8],
        track: &TrackMetadata,
        cover: Option<&CoverArt>,
    ) -> MuxOutcome {
        if let Some(found) = Container::sniff(audio) {
            if found != container {
                return MuxOutcome::Unsupported {
                    reason: format!("expected {} data but found {}", container, found),
                };
            }
        }

        let cover = cover.filter(|_| self.embed_cover);
        let result = match container {
            Container::Flac => flac::embed(audio, &self.vendor, &flac_tags(track), cover),
            Container::Mp4 => mp4::embed(audio, &mp4_tags(track), cover),
        };

        match result {
            Ok(bytes) => MuxOutcome::Muxed(bytes),
            Err(err) => MuxOutcome::OriginalReturned(err),
        }
    }

    /// Mux and fold the outcome into bytes.
    ///
    /// Soft failures are logged and yield a copy of `audio`. Only a hard
    /// failure is returned as an error.
    pub fn mux(
        &self,
        audio: &[u8],
        quality: &str,
        track: &TrackMetadata,
        cover: Option<&CoverArt>,
    ) -> Result<Vec<u8>> {
        match self.mux_outcome(audio, quality, track, cover) {
            MuxOutcome::Muxed(bytes) => {
                debug!(
                    "muxed {} bytes for quality {} ({:+} bytes)",
                    audio.len(),
                    quality,
                    bytes.len() as i64 - audio.len() as i64
                );
                Ok(bytes)
            }
            MuxOutcome::Unsupported { reason } => {
                warn!("metadata not written: {}", reason);
                Ok(audio.to_vec())
            }
            MuxOutcome::OriginalReturned(err) if err.is_hard() => {
                error!("metadata injection failed: {}", err);
                Err(err)
            }
            MuxOutcome::OriginalReturned(err) => {
                warn!("metadata not written, keeping original bytes: {}", err);
                Ok(audio.to_vec())
            }
        }
    }

    /// Mux with the album cover looked up through `provider`
    pub fn mux_track(
        &self,
        audio: &[u8],
        quality: &str,
        track: &TrackMetadata,
        provider: &dyn CoverArtProvider,
    ) -> Result<Vec<u8>> {
        let cover = if self.embed_cover {
            track.cover_id().and_then(|id| {
                let cover = provider.fetch_cover(id);
                if cover.is_none() {
                    debug!("no cover art available for '{}'", id);
                }
                cover
            })
        } else {
            None
        };
        self.mux(audio, quality, track, cover.as_ref())
    }
}

/// Tag `audio` with the default muxer settings
pub fn mux(audio: &[u8], quality: &str, track: &TrackMetadata, cover: Option<&[u8]>) -> Result<Vec<u8>> {
    let cover = cover.map(|bytes| CoverArt::new(bytes.to_vec()));
    ContainerMuxer::new().mux(audio, quality, track, cover.as_ref())
}
