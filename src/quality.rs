// Audio quality tokens and the container each one is delivered in

use std::fmt;

use crate::flac::FLAC_SIGNATURE;
use crate::mp4::MP4_SIGNATURE;
use crate::track::TrackMetadata;

/// Target container of a mux call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Flac,
    Mp4,
}

impl Container {
    /// LOW and HIGH are AAC streams in MP4; every other quality is FLAC.
    pub fn for_quality(quality: &str) -> Self {
        match AudioQuality::from_token(quality) {
            Some(AudioQuality::Low) | Some(AudioQuality::High) => Container::Mp4,
            _ => Container::Flac,
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.');
        if ext.eq_ignore_ascii_case("flac") {
            Some(Container::Flac)
        } else if ["m4a", "mp4", "m4b"]
            .iter()
            .any(|e| ext.eq_ignore_ascii_case(e))
        {
            Some(Container::Mp4)
        } else {
            None
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Container::Flac => "flac",
            Container::Mp4 => "m4a",
        }
    }

    /// Recognise a container from its leading bytes
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if data.starts_with(FLAC_SIGNATURE) {
            Some(Container::Flac)
        } else if data.len() >= 8 && &data[4..8] == MP4_SIGNATURE {
            Some(Container::Mp4)
        } else {
            None
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Container::Flac => write!(f, "FLAC"),
            Container::Mp4 => write!(f, "MP4"),
        }
    }
}

/// Streaming qualities offered by the catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioQuality {
    HiResLossless,
    Lossless,
    High,
    Low,
}

impl AudioQuality {
    const TOKENS: [(AudioQuality, &'static [&'static str]); 4] = [
        (
            AudioQuality::HiResLossless,
            &[
                "HI_RES_LOSSLESS",
                "HIRES_LOSSLESS",
                "HIRESLOSSLESS",
                "HIFI_PLUS",
                "HI_RES_FLAC",
                "HI_RES",
                "HIRES",
                "MASTER",
                "MASTER_QUALITY",
                "MQA",
            ],
        ),
        (AudioQuality::Lossless, &["LOSSLESS", "HIFI"]),
        (AudioQuality::High, &["HIGH", "HIGH_QUALITY"]),
        (AudioQuality::Low, &["LOW", "LOW_QUALITY"]),
    ];

    /// Parse a quality token, accepting the aliases upstream APIs use.
    pub fn from_token(token: &str) -> Option<Self> {
        let normalized = normalize_token(token);
        if normalized.is_empty() {
            return None;
        }
        Self::TOKENS
            .iter()
            .find(|(_, aliases)| aliases.contains(&normalized.as_str()))
            .map(|(quality, _)| *quality)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AudioQuality::HiResLossless => "HI_RES_LOSSLESS",
            AudioQuality::Lossless => "LOSSLESS",
            AudioQuality::High => "HIGH",
            AudioQuality::Low => "LOW",
        }
    }

    pub fn container(&self) -> Container {
        Container::for_quality(self.as_str())
    }
}

/// Uppercase, with every run of non-alphanumerics collapsed to `_`
fn normalize_token(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut in_gap = false;
    for c in token.trim().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_uppercase());
            in_gap = false;
        } else if !in_gap {
            out.push('_');
            in_gap = true;
        }
    }
    out
}

/// Replace characters that are illegal in file names on common platforms
pub fn sanitize_for_filename(value: Option<&str>) -> String {
    let value = match value {
        Some(v) if !v.is_empty() => v,
        _ => return "Unknown".to_string(),
    };
    let replaced: String = value
        .chars()
        .map(|c| match c {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// "Artist - Album - 07 Title.ext"
pub fn build_track_filename(track: &TrackMetadata, quality: &str) -> String {
    let extension = Container::for_quality(quality).extension();
    let number = match track.track_number {
        Some(n) if n > 0 => format!("{:02}", n),
        _ => "00".to_string(),
    };
    format!(
        "{} - {} - {} {}.{}",
        sanitize_for_filename(track.artist_name()),
        sanitize_for_filename(track.album_title()),
        number,
        sanitize_for_filename(track.title.as_deref()),
        extension
    )
}
