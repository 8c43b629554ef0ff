//! # Library Builder
//!
//! Turns source items into a deduplicated artist/album/track graph for one run.
//!
//! ## Overview
//!
//! - Artists and albums are unique by exact, case-sensitive name
//! - Lookups go through name-keyed `HashMap` indexes into ordered vectors, so
//!   entities keep source-enumeration order
//! - Artwork is resolved once, when an artist or album is first created, and
//!   each resolution is awaited before the next item is handled
//! - An album keeps the first artist it was linked to; a later track only fills
//!   in an artist the album does not have yet
//!
//! The builder is the only writer of its indexes and takes `&mut self`, so a run
//! drives it from a single task.

use crate::source::SourceItem;
use crate::Result;
use bridge_traits::media::MediaAsset;
use core_library::models::{Album, Artist, Track};
use core_metadata::artwork::{ArtworkChain, ArtworkRequest};
use core_metadata::extractor::{parse_uri, MetadataExtractor};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Entities built by one run, in creation order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibraryGraph {
    pub artists: Vec<Artist>,
    pub albums: Vec<Album>,
    pub tracks: Vec<Track>,
}

impl LibraryGraph {
    pub fn is_empty(&self) -> bool {
        self.artists.is_empty() && self.albums.is_empty() && self.tracks.is_empty()
    }
}

/// Run-scoped dedup state
pub struct LibraryBuilder {
    artwork: Arc<ArtworkChain>,
    extractor: Arc<MetadataExtractor>,
    artists: Vec<Artist>,
    albums: Vec<Album>,
    tracks: Vec<Track>,
    artist_index: HashMap<String, usize>,
    album_index: HashMap<String, usize>,
}

impl LibraryBuilder {
    pub fn new(artwork: Arc<ArtworkChain>, extractor: Arc<MetadataExtractor>) -> Self {
        Self {
            artwork,
            extractor,
            artists: Vec::new(),
            albums: Vec::new(),
            tracks: Vec::new(),
            artist_index: HashMap::new(),
            album_index: HashMap::new(),
        }
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn artist_count(&self) -> usize {
        self.artists.len()
    }

    pub fn album_count(&self) -> usize {
        self.albums.len()
    }

    /// Add one source item. Returns whether it produced a track.
    ///
    /// Unreadable local files and unusable remote items are skipped without
    /// error.
    pub async fn add_item(&mut self, item: SourceItem) -> Result<bool> {
        let track = match item {
            SourceItem::Local(asset) => match self.local_track(asset).await {
                Some(track) => track,
                None => return Ok(false),
            },
            SourceItem::Remote(track) => track,
            SourceItem::Skipped { reason } => {
                debug!(reason = %reason, "Skipping source item");
                return Ok(false);
            }
        };

        self.add_track(track).await;
        Ok(true)
    }

    /// Attach a track to its artist and album, creating them on first sight.
    pub async fn add_track(&mut self, mut track: Track) {
        if let Some(name) = track.artist.clone() {
            let index = self.artist_for(&name, &track).await;
            track.artist_id = Some(self.artists[index].id.clone());
        }

        if let Some(name) = track.album.clone() {
            let index = self.album_for(&name, &track).await;
            let album = &self.albums[index];
            track.album_id = Some(album.id.clone());
            track.artwork = album.artwork.clone();
        }

        self.tracks.push(track);
    }

    pub fn into_graph(self) -> LibraryGraph {
        LibraryGraph {
            artists: self.artists,
            albums: self.albums,
            tracks: self.tracks,
        }
    }

    async fn local_track(&self, asset: MediaAsset) -> Option<Track> {
        let metadata = self.extractor.extract(Path::new(&asset.uri), false).await?;

        let mut track = Track::new(metadata.title, parse_uri(&asset.uri), asset.filename);
        track.library_id = Some(asset.id);
        track.artist = Some(metadata.artist);
        track.album = metadata.album;
        track.album_artist = metadata.album_artist;
        track.track_no = metadata.track_no;
        track.disk_no = metadata.disk_no;
        track.year = metadata.year;
        track.date = metadata.date;
        track.genre = metadata.genre;
        track.duration = if asset.duration.is_finite() && asset.duration > 0.0 {
            asset.duration
        } else {
            metadata.duration
        };
        track.creation_time = asset.creation_time;
        track.modification_time = asset.modification_time;
        track.is_remote = false;

        Some(track)
    }

    async fn artist_for(&mut self, name: &str, track: &Track) -> usize {
        if let Some(&index) = self.artist_index.get(name) {
            return index;
        }

        let mut artist = Artist::new(name);
        artist.artwork = self
            .artwork
            .resolve(&ArtworkRequest::artist(artist.id.as_str(), track))
            .await;
        artist.no_artwork = artist.artwork.is_none();

        debug!(artist = %artist.name, artwork = artist.artwork.is_some(), "New artist");
        let index = self.artists.len();
        self.artists.push(artist);
        self.artist_index.insert(name.to_string(), index);
        index
    }

    async fn album_for(&mut self, name: &str, track: &Track) -> usize {
        if let Some(&index) = self.album_index.get(name) {
            let album = &mut self.albums[index];
            if album.artist_id.is_none() {
                album.artist_id = track.artist_id.clone();
            }
            return index;
        }

        let mut album = Album::new(name, track.artist_id.clone());
        album.artwork = self
            .artwork
            .resolve(&ArtworkRequest::album(album.id.as_str(), track))
            .await;
        album.no_artwork = album.artwork.is_none();

        debug!(album = %album.name, artwork = album.artwork.is_some(), "New album");
        let index = self.albums.len();
        self.albums.push(album);
        self.album_index.insert(name.to_string(), index);
        index
    }
}
