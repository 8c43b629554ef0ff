//! Domain models for the music library
//!
//! Entities produced by a sync run and persisted by the repositories. Ids are
//! opaque strings: locally created entities get a UUID v4, remote tracks keep
//! the id assigned by the catalog service.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

// =============================================================================
// ID Types
// =============================================================================

/// Unique identifier for a track
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct TrackId(pub String);

impl TrackId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for TrackId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an album
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct AlbumId(pub String);

impl AlbumId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AlbumId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AlbumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an artist
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct ArtistId(pub String);

impl ArtistId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ArtistId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ArtistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Domain Models
// =============================================================================

/// A performing artist. Unique by exact name within one sync run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Artist {
    pub id: ArtistId,
    pub name: String,
    /// Path of the resolved artwork file
    pub artwork: Option<String>,
    /// Set when every artwork provider came back empty
    pub no_artwork: bool,
}

impl Artist {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ArtistId::new(),
            name: name.into(),
            artwork: None,
            no_artwork: false,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Artist name cannot be empty".to_string());
        }
        Ok(())
    }

    /// Key used for alphabetical listing: a leading "The " or "A " is ignored.
    pub fn sort_key(&self) -> &str {
        self.name
            .strip_prefix("The ")
            .or_else(|| self.name.strip_prefix("A "))
            .unwrap_or(&self.name)
    }
}

/// An album. Unique by exact name within one sync run; keeps the first artist
/// it was seen with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Album {
    pub id: AlbumId,
    pub name: String,
    pub artwork: Option<String>,
    pub no_artwork: bool,
    pub artist_id: Option<ArtistId>,
}

impl Album {
    pub fn new(name: impl Into<String>, artist_id: Option<ArtistId>) -> Self {
        Self {
            id: AlbumId::new(),
            name: name.into(),
            artwork: None,
            no_artwork: false,
            artist_id,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Album name cannot be empty".to_string());
        }
        Ok(())
    }
}

/// One playable item, local file or remote stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Track {
    pub id: TrackId,
    /// Device media index id (local tracks only)
    pub library_id: Option<String>,
    pub track_no: Option<i64>,
    pub disk_no: Option<i64>,
    pub year: Option<i64>,
    pub title: String,
    pub album_artist: Option<String>,
    pub date: Option<String>,
    pub genre: Option<String>,
    /// Duration in seconds
    pub duration: f64,
    /// Epoch milliseconds
    pub creation_time: Option<i64>,
    /// Epoch milliseconds
    pub modification_time: Option<i64>,
    pub filename: String,
    /// File locator or streaming URL
    pub url: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub artwork: Option<String>,
    pub is_remote: bool,
    pub artist_id: Option<ArtistId>,
    pub album_id: Option<AlbumId>,
}

impl Track {
    /// A track with only the required fields set.
    pub fn new(title: impl Into<String>, url: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            id: TrackId::new(),
            library_id: None,
            track_no: None,
            disk_no: None,
            year: None,
            title: title.into(),
            album_artist: None,
            date: None,
            genre: None,
            duration: 0.0,
            creation_time: None,
            modification_time: None,
            filename: filename.into(),
            url: url.into(),
            artist: None,
            album: None,
            artwork: None,
            is_remote: false,
            artist_id: None,
            album_id: None,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Track title cannot be empty".to_string());
        }
        if self.url.is_empty() {
            return Err("Track url cannot be empty".to_string());
        }
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err("Duration must be a non-negative number".to_string());
        }
        Ok(())
    }
}

/// A row of the persisted play queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct QueuedTrack {
    pub id: String,
    pub position: i64,
    pub url: String,
    pub title: String,
    pub artist: Option<String>,
    pub duration: f64,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub date: Option<String>,
    pub artwork: Option<String>,
    pub track_id: TrackId,
}

impl QueuedTrack {
    pub fn from_track(track: &Track, position: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            position,
            url: track.url.clone(),
            title: track.title.clone(),
            artist: track.artist.clone(),
            duration: track.duration,
            album: track.album.clone(),
            genre: track.genre.clone(),
            date: track.date.clone(),
            artwork: track.artwork.clone(),
            track_id: track.id.clone(),
        }
    }
}
