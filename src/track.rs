// Track record as delivered by the upstream catalogue API
//
// Field names follow the API's camelCase JSON so a track object can be
// deserialized directly. Every field is optional.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArtistRef {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlbumRef {
    pub title: Option<String>,
    pub artist: Option<ArtistRef>,
    pub number_of_tracks: Option<u32>,
    pub number_of_volumes: Option<u32>,
    pub release_date: Option<String>,
    pub upc: Option<String>,
    /// Cover art identifier resolved through a `CoverArtProvider`
    pub cover: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackMetadata {
    pub title: Option<String>,
    pub artist: Option<ArtistRef>,
    pub album: Option<AlbumRef>,
    pub track_number: Option<u32>,
    pub volume_number: Option<u32>,
    pub copyright: Option<String>,
    pub isrc: Option<String>,
    pub stream_start_date: Option<String>,
}

impl TrackMetadata {
    pub fn artist_name(&self) -> Option<&str> {
        self.artist.as_ref().and_then(|a| a.name.as_deref())
    }

    pub fn album_title(&self) -> Option<&str> {
        self.album.as_ref().and_then(|a| a.title.as_deref())
    }

    pub fn album_artist_name(&self) -> Option<&str> {
        self.album
            .as_ref()
            .and_then(|a| a.artist.as_ref())
            .and_then(|a| a.name.as_deref())
    }

    pub fn cover_id(&self) -> Option<&str> {
        self.album.as_ref().and_then(|a| a.cover.as_deref())
    }
}
