// Cover art handed to the muxer

/// Image formats recognised by their leading magic bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    WebP,
    Unknown,
}

impl ImageFormat {
    pub fn sniff(data: &[u8]) -> Self {
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            ImageFormat::Jpeg
        } else if data.starts_with(b"\x89PNG\r\n\x1a\n") {
            ImageFormat::Png
        } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            ImageFormat::Gif
        } else if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            ImageFormat::WebP
        } else {
            ImageFormat::Unknown
        }
    }

    pub fn mime_type(&self) -> Option<&'static str> {
        match self {
            ImageFormat::Jpeg => Some("image/jpeg"),
            ImageFormat::Png => Some("image/png"),
            ImageFormat::Gif => Some("image/gif"),
            ImageFormat::WebP => Some("image/webp"),
            ImageFormat::Unknown => None,
        }
    }
}

/// Raw cover image plus the content type its source reported
#[derive(Debug, Clone, PartialEq)]
pub struct CoverArt {
    pub data: Vec<u8>,
    pub mime_type: Option<String>,
}

impl CoverArt {
    pub const DEFAULT_MIME_TYPE: &'static str = "image/jpeg";

    pub fn new(data: Vec<u8>) -> Self {
        CoverArt {
            data,
            mime_type: None,
        }
    }

    pub fn with_mime_type(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        CoverArt {
            data,
            mime_type: Some(mime_type.into()),
        }
    }

    /// Reported content type, falling back to JPEG
    pub fn mime_type(&self) -> &str {
        self.mime_type
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(Self::DEFAULT_MIME_TYPE)
    }

    pub fn format(&self) -> ImageFormat {
        ImageFormat::sniff(&self.data)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Source of cover images keyed by the catalogue's cover identifier.
///
/// Fetching is the provider's business; a `None` just means the file is
/// tagged without artwork.
pub trait CoverArtProvider {
    fn fetch_cover(&self, cover_id: &str) -> Option<CoverArt>;
}

impl<F> CoverArtProvider for F
where
    F: Fn(&str) -> Option<CoverArt>,
{
    fn fetch_cover(&self, cover_id: &str) -> Option<CoverArt> {
        self(cover_id)
    }
}
