// Unified metadata field mapping system
//
// Turns a `TrackMetadata` record into the tag vocabulary of each container:
// - FLAC: Vorbis Comment keys (TITLE, ARTIST, ALBUM, etc.)
// - MP4: iTunes atoms (©nam, ©ART, ©alb, etc.)
//
// Absent or empty fields never produce a key.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::track::TrackMetadata;

/// Standard metadata fields, in the order they are emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardField {
    Title,
    Artist,
    Album,
    AlbumArtist,
    TrackNumber,
    TrackTotal,
    DiscNumber,
    DiscTotal,
    Date,
    Copyright,
    Isrc,
    Barcode,
}

impl StandardField {
    /// Get standard field name (lowercase)
    pub fn as_str(&self) -> &'static str {
        match self {
            StandardField::Title => "title",
            StandardField::Artist => "artist",
            StandardField::Album => "album",
            StandardField::AlbumArtist => "album_artist",
            StandardField::TrackNumber => "track_number",
            StandardField::TrackTotal => "track_total",
            StandardField::DiscNumber => "disc_number",
            StandardField::DiscTotal => "disc_total",
            StandardField::Date => "date",
            StandardField::Copyright => "copyright",
            StandardField::Isrc => "isrc",
            StandardField::Barcode => "barcode",
        }
    }
}

/// Format-specific field mappings
pub struct FieldMappings;

impl FieldMappings {
    // Vorbis Comment keys (FLAC)
    pub const VORBIS_TITLE: &'static str = "TITLE";
    pub const VORBIS_ARTIST: &'static str = "ARTIST";
    pub const VORBIS_ALBUM: &'static str = "ALBUM";
    pub const VORBIS_ALBUM_ARTIST: &'static str = "ALBUMARTIST";
    pub const VORBIS_TRACK: &'static str = "TRACKNUMBER";
    pub const VORBIS_TRACK_TOTAL: &'static str = "TRACKTOTAL";
    pub const VORBIS_DISC: &'static str = "DISCNUMBER";
    pub const VORBIS_DISC_TOTAL: &'static str = "DISCTOTAL";
    pub const VORBIS_DATE: &'static str = "DATE";
    pub const VORBIS_COPYRIGHT: &'static str = "COPYRIGHT";
    pub const VORBIS_ISRC: &'static str = "ISRC";
    pub const VORBIS_BARCODE: &'static str = "BARCODE";

    // MP4 iTunes atoms
    pub const MP4_TITLE: &'static str = "©nam";
    pub const MP4_ARTIST: &'static str = "©ART";
    pub const MP4_ALBUM: &'static str = "©alb";
    pub const MP4_ALBUM_ARTIST: &'static str = "aART";
    pub const MP4_TRACK: &'static str = "trkn";
    pub const MP4_DISC: &'static str = "disk";
    pub const MP4_YEAR: &'static str = "©day";
    pub const MP4_COPYRIGHT: &'static str = "cprt";

    /// Get Vorbis comment key for a standard field
    pub fn to_vorbis(field: &StandardField) -> &'static str {
        match field {
            StandardField::Title => Self::VORBIS_TITLE,
            StandardField::Artist => Self::VORBIS_ARTIST,
            StandardField::Album => Self::VORBIS_ALBUM,
            StandardField::AlbumArtist => Self::VORBIS_ALBUM_ARTIST,
            StandardField::TrackNumber => Self::VORBIS_TRACK,
            StandardField::TrackTotal => Self::VORBIS_TRACK_TOTAL,
            StandardField::DiscNumber => Self::VORBIS_DISC,
            StandardField::DiscTotal => Self::VORBIS_DISC_TOTAL,
            StandardField::Date => Self::VORBIS_DATE,
            StandardField::Copyright => Self::VORBIS_COPYRIGHT,
            StandardField::Isrc => Self::VORBIS_ISRC,
            StandardField::Barcode => Self::VORBIS_BARCODE,
        }
    }

    /// Get iTunes item key for a standard field, if MP4 carries it.
    ///
    /// Totals are not carried separately: `trkn`/`disk` hold the number only.
    pub fn to_mp4(field: &StandardField) -> Option<&'static str> {
        match field {
            StandardField::Title => Some(Self::MP4_TITLE),
            StandardField::Artist => Some(Self::MP4_ARTIST),
            StandardField::Album => Some(Self::MP4_ALBUM),
            StandardField::AlbumArtist => Some(Self::MP4_ALBUM_ARTIST),
            StandardField::TrackNumber => Some(Self::MP4_TRACK),
            StandardField::DiscNumber => Some(Self::MP4_DISC),
            StandardField::Date => Some(Self::MP4_YEAR),
            StandardField::Copyright => Some(Self::MP4_COPYRIGHT),
            StandardField::TrackTotal
            | StandardField::DiscTotal
            | StandardField::Isrc
            | StandardField::Barcode => None,
        }
    }
}

/// A single tag value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TagValue {
    Text(String),
    Integer(u32),
}

impl TagValue {
    /// Text rendering used by formats that store everything as strings
    pub fn to_text(&self) -> String {
        match self {
            TagValue::Text(s) => s.clone(),
            TagValue::Integer(n) => n.to_string(),
        }
    }
}

/// Insertion-ordered tag map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagMap {
    items: Vec<(String, TagValue)>,
}

impl TagMap {
    pub fn new() -> Self {
        TagMap::default()
    }

    /// Set a tag value, replacing an existing key in place or appending.
    pub fn insert(&mut self, key: &str, value: TagValue) {
        if let Some((_, v)) = self.items.iter_mut().find(|(k, _)| k == key) {
            *v = value;
        } else {
            self.items.push((key.to_string(), value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&TagValue> {
        self.items.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.items.iter().any(|(k, _)| k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TagValue)> {
        self.items.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Metadata value converter for handling format-specific value formats
pub struct ValueConverter;

impl ValueConverter {
    /// Extract the year from the date formats the catalogue API emits.
    pub fn release_year(raw: &str) -> Option<i32> {
        let s = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.year());
        }
        if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
            return Some(dt.year());
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(dt.year());
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Some(date.year());
        }
        if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
            return s.parse().ok();
        }
        None
    }

    /// Keep a text value only if it has visible content
    pub fn text(value: Option<&str>) -> Option<TagValue> {
        value
            .filter(|v| !v.trim().is_empty())
            .map(|v| TagValue::Text(v.to_string()))
    }

    /// Keep a count only if it is positive
    pub fn positive(value: Option<u32>) -> Option<TagValue> {
        value.filter(|&n| n > 0).map(TagValue::Integer)
    }
}

/// Collect every present field of a track in emission order.
pub fn standard_fields(track: &TrackMetadata) -> Vec<(StandardField, TagValue)> {
    let album = track.album.as_ref();
    let track_number = ValueConverter::positive(track.track_number);
    let disc_number = ValueConverter::positive(track.volume_number);

    // Totals only make sense next to the number they qualify
    let track_total = track_number
        .as_ref()
        .and_then(|_| ValueConverter::positive(album.and_then(|a| a.number_of_tracks)));
    let disc_total = disc_number
        .as_ref()
        .and_then(|_| ValueConverter::positive(album.and_then(|a| a.number_of_volumes)));

    let date = album
        .and_then(|a| a.release_date.as_deref())
        .and_then(ValueConverter::release_year)
        .or_else(|| {
            track
                .stream_start_date
                .as_deref()
                .and_then(ValueConverter::release_year)
        })
        .map(|year| TagValue::Text(year.to_string()));

    let candidates = [
        (StandardField::Title, ValueConverter::text(track.title.as_deref())),
        (StandardField::Artist, ValueConverter::text(track.artist_name())),
        (StandardField::Album, ValueConverter::text(track.album_title())),
        (
            StandardField::AlbumArtist,
            ValueConverter::text(track.album_artist_name()),
        ),
        (StandardField::TrackNumber, track_number),
        (StandardField::TrackTotal, track_total),
        (StandardField::DiscNumber, disc_number),
        (StandardField::DiscTotal, disc_total),
        (StandardField::Date, date),
        (
            StandardField::Copyright,
            ValueConverter::text(track.copyright.as_deref()),
        ),
        (StandardField::Isrc, ValueConverter::text(track.isrc.as_deref())),
        (
            StandardField::Barcode,
            ValueConverter::text(album.and_then(|a| a.upc.as_deref())),
        ),
    ];

    candidates
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field, v)))
        .collect()
}

/// Vorbis comment tags for a FLAC file
pub fn flac_tags(track: &TrackMetadata) -> TagMap {
    let mut tags = TagMap::new();
    for (field, value) in standard_fields(track) {
        tags.insert(FieldMappings::to_vorbis(&field), value);
    }
    tags
}

/// iTunes item tags for an MP4 file
pub fn mp4_tags(track: &TrackMetadata) -> TagMap {
    let mut tags = TagMap::new();
    for (field, value) in standard_fields(track) {
        if let Some(key) = FieldMappings::to_mp4(&field) {
            tags.insert(key, value);
        }
    }
    tags
}
